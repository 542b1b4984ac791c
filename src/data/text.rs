use crate::data::model::{Metadata, Series, SOURCE_KEY};
use crate::error::{Result, SeriesError};

/// How lines that do not hold two numbers are treated while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Any such line is metadata, split on the first `:`, `=` or run of
    /// whitespace; lines without a separator are dropped.
    #[default]
    Permissive,
    /// Metadata is only accepted before the first data line and must carry
    /// a separator; anything else is a [`SeriesError::MalformedLine`].
    Strict,
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Render a series in the text format: a metadata block of
/// `key:\tvalue` lines with keys right-justified to the longest one, a blank
/// line, then one `x\ty` line per sample with six decimals.
///
/// Values come back from [`from_text`] verbatim. Keys are trimmed on the
/// way back and end at the first `:`, so a key with surrounding whitespace
/// or a `:` of its own does not survive the round trip.
pub fn to_text(series: &Series) -> String {
    let width = series
        .metadata()
        .keys()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (key, value) in series.metadata() {
        out.push_str(&format!("{key:>width$}:\t{value}\n"));
    }
    out.push('\n');
    for (x, y) in series.points() {
        out.push_str(&format!("{x:.6}\t{y:.6}\n"));
    }
    out
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the text format. The metadata starts with `SOURCE_KEY = source`;
/// later metadata lines with the same key overwrite earlier values.
pub fn from_text(source: &str, text: &str, mode: ParseMode) -> Result<Series> {
    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.to_string(), source.to_string());
    let mut x = Vec::new();
    let mut y = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((xv, yv)) = parse_pair(line) {
            x.push(xv);
            y.push(yv);
            continue;
        }

        let malformed = || SeriesError::MalformedLine {
            line_no: idx + 1,
            content: line.to_string(),
        };
        if mode == ParseMode::Strict && !x.is_empty() {
            return Err(malformed());
        }
        match split_metadata(line) {
            Some((key, value)) => {
                metadata.insert(key.to_string(), value.to_string());
            }
            None if mode == ParseMode::Strict => return Err(malformed()),
            None => log::debug!("{source}:{}: ignoring line {line:?}", idx + 1),
        }
    }

    Series::new(x, y, Some(metadata))
}

/// Two leading whitespace-separated numbers; a comma counts as a decimal
/// point.
fn parse_pair(line: &str) -> Option<(f64, f64)> {
    let normalized = line.replace(',', ".");
    let mut fields = normalized.split_whitespace();
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    Some((x, y))
}

fn split_metadata(line: &str) -> Option<(&str, &str)> {
    if let Some((key, value)) = line.split_once(':') {
        // `to_text` writes exactly one tab after the colon
        let value = value.strip_prefix('\t').unwrap_or_else(|| value.trim());
        return Some((key.trim(), value));
    }
    let (key, value) = line
        .split_once('=')
        .or_else(|| line.trim().split_once(char::is_whitespace))?;
    Some((key.trim(), value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_right_justified_keys() {
        let s = Series::new(vec![0.0, 1.5], vec![2.0, -3.25], None)
            .unwrap()
            .with_meta("filepath", "a.txt")
            .with_meta("T", "300 K");
        assert_eq!(
            to_text(&s),
            "filepath:\ta.txt\n       T:\t300 K\n\n0.000000\t2.000000\n1.500000\t-3.250000\n"
        );
    }

    #[test]
    fn parses_interleaved_metadata() {
        let text = "Sample: A12\n1 10\ntemperature = 77\n0 5\nslit 0.5 mm\n";
        let s = from_text("in.dat", text, ParseMode::Permissive).unwrap();
        assert_eq!(s.x(), &[0.0, 1.0]);
        assert_eq!(s.y(), &[5.0, 10.0]);
        assert_eq!(s.metadata()["filepath"], "in.dat");
        assert_eq!(s.metadata()["Sample"], "A12");
        assert_eq!(s.metadata()["temperature"], "77");
        assert_eq!(s.metadata()["slit"], "0.5 mm");
    }

    #[test]
    fn hand_written_colon_values_are_trimmed() {
        let s = from_text("h", "grating :  2 \n0 0\n", ParseMode::Permissive).unwrap();
        assert_eq!(s.metadata()["grating"], "2");
    }

    #[test]
    fn commas_are_decimal_points() {
        let s = from_text("c", "1,5\t2,25\n", ParseMode::Permissive).unwrap();
        assert_eq!(s.x(), &[1.5]);
        assert_eq!(s.y(), &[2.25]);
    }

    #[test]
    fn later_keys_overwrite_earlier_ones() {
        let text = "filepath: old.txt\nmode: a\nmode: b\n0 0\n";
        let s = from_text("new.txt", text, ParseMode::Permissive).unwrap();
        assert_eq!(s.metadata()["filepath"], "old.txt");
        assert_eq!(s.metadata()["mode"], "b");
        assert_eq!(s.metadata().len(), 2);
    }

    #[test]
    fn no_data_is_an_empty_series() {
        assert_eq!(
            from_text("x", "only: metadata\n", ParseMode::Permissive).unwrap_err(),
            SeriesError::EmptySeries
        );
    }

    #[test]
    fn strict_mode_rejects_garbage_inside_data() {
        let text = "name: x\n0 1\n1 oops\n2 3\n";
        assert!(from_text("p", text, ParseMode::Permissive).is_ok());
        assert_eq!(
            from_text("p", text, ParseMode::Strict).unwrap_err(),
            SeriesError::MalformedLine {
                line_no: 3,
                content: "1 oops".to_string()
            }
        );
    }

    #[test]
    fn strict_mode_requires_a_separator() {
        assert!(matches!(
            from_text("p", "lonely\n0 1\n", ParseMode::Strict),
            Err(SeriesError::MalformedLine { line_no: 1, .. })
        ));
    }

    #[test]
    fn round_trips_through_text() {
        let s = Series::new(vec![0.125, 1.0, 2.5], vec![3.0, -1.5, 1e-3], None)
            .unwrap()
            .with_meta(SOURCE_KEY, "orig.txt")
            .with_meta("added_to", "1.0, 2.0")
            .with_meta("note", "a=b")
            .with_meta("comment", "  indented: yes ");
        let back = from_text("ignored", &to_text(&s), ParseMode::Strict).unwrap();
        assert_eq!(back, s);
    }
}
