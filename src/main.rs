use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};

use xyspec::{
    combine, load_series_with, merge_all, polarization_degree, resolve_reference_operand,
    save_series, Operator, ParseMode, Series, SOURCE_KEY,
};

/// Batch transforms for two-column spectrum files
#[derive(Parser, Debug)]
#[command(name = "xyspec")]
#[command(about = "Arithmetic, merging, filtering and calculus on two-column spectrum files")]
struct Args {
    /// Treat malformed lines as errors instead of metadata
    #[arg(long, global = true)]
    strict: bool,

    /// Directory for written files (defaults to each input's directory)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a reference file or number to each data file
    Add(OperandArgs),
    /// Subtract a reference file or number from each data file
    Sub(OperandArgs),
    /// Multiply each data file by a reference file or number
    Mul(OperandArgs),
    /// Divide each data file by a reference file or number
    Div(OperandArgs),
    /// Raise each data file to a reference file or number
    Pow(OperandArgs),
    /// Cut each file to an X window; pass `_` to leave a side open
    Xfilter(WindowArgs),
    /// Print the minimum inside an X window
    Min(WindowArgs),
    /// Split each file at the minimum inside an X window
    Split(WindowArgs),
    /// Print the trapezoidal area under each file
    Area { files: Vec<PathBuf> },
    /// Print the noise-floor estimate (most common integer Y) of each file
    Noise { files: Vec<PathBuf> },
    /// Write the numeric derivative of each file
    Deriv { files: Vec<PathBuf> },
    /// Savitzky-Golay smoothing
    Smooth {
        window: usize,
        order: usize,
        files: Vec<PathBuf>,
    },
    /// Collapse repeated X values, keeping the largest Y
    Dedup { files: Vec<PathBuf> },
    /// Merge overlapping files into one
    Merge {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
    },
    /// Degree of polarization (TE - TM) / (TE + TM)
    Polardeg { te: PathBuf, tm: PathBuf },
}

#[derive(ClapArgs, Debug)]
struct OperandArgs {
    /// A data file or a number
    #[arg(allow_hyphen_values = true)]
    reference: String,
    files: Vec<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct WindowArgs {
    #[arg(allow_hyphen_values = true)]
    xleft: Bound,
    #[arg(allow_hyphen_values = true)]
    xright: Bound,
    files: Vec<PathBuf>,
}

/// Optional X bound; `_` stands for "open".
#[derive(Debug, Clone, Copy)]
struct Bound(Option<f64>);

impl FromStr for Bound {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "_" {
            return Ok(Bound(None));
        }
        s.replace(',', ".")
            .parse()
            .map(|v| Bound(Some(v)))
            .map_err(|_| format!("not a number or '_': {s}"))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mode = if args.strict {
        ParseMode::Strict
    } else {
        ParseMode::Permissive
    };
    let out = Output {
        dir: args.output_dir.clone(),
    };

    match &args.command {
        Command::Add(a) => arithmetic(&out, mode, a, Operator::Add),
        Command::Sub(a) => arithmetic(&out, mode, a, Operator::Subtract),
        Command::Mul(a) => arithmetic(&out, mode, a, Operator::Multiply),
        Command::Div(a) => arithmetic(&out, mode, a, Operator::Divide),
        Command::Pow(a) => arithmetic(&out, mode, a, Operator::Power),
        Command::Xfilter(w) => {
            let (xl, xr) = (w.xleft.0, w.xright.0);
            if xl.is_none() && xr.is_none() {
                return Ok(());
            }
            let suffix = format!(
                "__[{},{}]",
                xl.map_or(":".to_string(), |v| format!("{v:.6}")),
                xr.map_or(":".to_string(), |v| format!("{v:.6}")),
            );
            for series in load_all(&w.files, mode)? {
                let cut = series.xfilter(xl, xr)?;
                out.write(&cut, &series, &suffix)?;
            }
            Ok(())
        }
        Command::Min(w) => {
            for series in load_all(&w.files, mode)? {
                let m = series.minimum(w.xleft.0, w.xright.0)?;
                println!(
                    "minpos = {}   xmin = {:.6}   ymin = {:.6}   {}",
                    m.index,
                    m.x,
                    m.y,
                    series.source().unwrap_or_default()
                );
            }
            Ok(())
        }
        Command::Split(w) => {
            for series in load_all(&w.files, mode)? {
                let split = series.split_at_minimum(w.xleft.0, w.xright.0)?;
                let xmin = split.minimum.x;
                if let Some(left) = split.left {
                    out.write_renamed(left, &series, &format!("__left(to_{xmin:?})"))?;
                } else {
                    log::info!("left side of {} is empty, omitting", label(&series));
                }
                if let Some(right) = split.right {
                    out.write_renamed(right, &series, &format!("__right(from_{xmin:?})"))?;
                } else {
                    log::info!("right side of {} is empty, omitting", label(&series));
                }
            }
            Ok(())
        }
        Command::Area { files } => {
            for series in load_all(files, mode)? {
                println!("{:>15}   {}", format!("{:.6}", series.area()), label(&series));
            }
            Ok(())
        }
        Command::Noise { files } => {
            for series in load_all(files, mode)? {
                match series.y_shift() {
                    Some(level) => println!("{}\t{level}", series.source().unwrap_or_default()),
                    None => log::warn!("{} has no finite Y values", label(&series)),
                }
            }
            Ok(())
        }
        Command::Deriv { files } => {
            for series in load_all(files, mode)? {
                out.write(&series.derivative()?, &series, "__deriv")?;
            }
            Ok(())
        }
        Command::Smooth {
            window,
            order,
            files,
        } => {
            for series in load_all(files, mode)? {
                let smoothed = series.savgol(*window, *order)?;
                out.write(&smoothed, &series, &format!("__savgol_{window}_{order}"))?;
            }
            Ok(())
        }
        Command::Dedup { files } => {
            for series in load_all(files, mode)? {
                out.write(&series.deduplicate_by(f64::max), &series, "__dedup")?;
            }
            Ok(())
        }
        Command::Merge { files } => {
            let batch = load_all(files, mode)?;
            let first = batch[0].clone();
            let merged = merge_all(batch)?;
            let path = out.path_for(&first, "merged_", "");
            save_series(&merged, &path)
        }
        Command::Polardeg { te, tm } => {
            let te = load_series_with(te, mode)?;
            let tm = load_series_with(tm, mode)?;
            let degree = polarization_degree(&te, &tm)?;
            out.write(&degree, &te, &format!("__TEdeg__{}", label(&tm)))
        }
    }
}

fn arithmetic(out: &Output, mode: ParseMode, args: &OperandArgs, op: Operator) -> Result<()> {
    let reference = resolve_reference_operand(&args.reference)
        .with_context(|| format!("resolving reference operand {:?}", args.reference))?;
    let suffix = format!("__{op}__{}", reference.label());
    for series in load_all(&args.files, mode)? {
        let result = combine(&series, &reference, op)
            .with_context(|| format!("{op} on {}", label(&series)))?;
        out.write(&result, &series, &suffix)?;
    }
    Ok(())
}

/// Load every readable file, warning about and skipping the others.
fn load_all(files: &[PathBuf], mode: ParseMode) -> Result<Vec<Series>> {
    let mut batch = Vec::with_capacity(files.len());
    for path in files {
        match load_series_with(path, mode) {
            Ok(series) => batch.push(series),
            Err(e) => log::warn!("cannot read {}: {e:#}. Skipping.", path.display()),
        }
    }
    if batch.is_empty() {
        bail!("no readable data files");
    }
    Ok(batch)
}

fn label(series: &Series) -> String {
    series
        .file_name()
        .unwrap_or_else(|| "<unnamed>".to_string())
}

struct Output {
    dir: Option<PathBuf>,
}

impl Output {
    /// `<dir>/<prefix><input file name><suffix>`, next to the input unless
    /// an output directory was given.
    fn path_for(&self, input: &Series, prefix: &str, suffix: &str) -> PathBuf {
        let source = PathBuf::from(input.source().unwrap_or("series"));
        let name = format!("{prefix}{}{suffix}", label(input));
        match &self.dir {
            Some(dir) => dir.join(name),
            None => source.with_file_name(name),
        }
    }

    fn write(&self, series: &Series, input: &Series, suffix: &str) -> Result<()> {
        let path = self.path_for(input, "", suffix);
        log::info!("{} -> {}", label(input), path.display());
        save_series(series, &path)
    }

    /// Like [`Output::write`], also pointing the written series' source at
    /// its new path.
    fn write_renamed(&self, mut series: Series, input: &Series, suffix: &str) -> Result<()> {
        let path = self.path_for(input, "", suffix);
        series
            .metadata_mut()
            .insert(SOURCE_KEY.to_string(), path.to_string_lossy().into_owned());
        log::info!("{} -> {}", label(input), path.display());
        save_series(&series, &path)
    }
}
