//! Reader for hairpin sequence sources.
//!
//! The format is a lenient FASTA: blank lines and lines starting with `#`
//! are skipped, `>name` starts a record and sequence lines are concatenated.
//! Records without a title are named `hairpin N`, N being their 1-based
//! rank in the file. A file holding a single untitled record names it after
//! the file stem.
//!
//! Supported extensions: any, gzip compressed when ending in `.gz` or `.bgz`.

use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::parsing::ParseError;
use crate::utils::validation::check_sequence_limit;

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// File name without directory nor extensions (`hp.fa.gz` gives `hp`)
fn file_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let stem = name.trim_start_matches('.').split('.').next().unwrap_or_default();
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Read named sequences from a source.
///
/// The source is a path to an existing file, or else a short inline
/// sequence (no `/` nor `.`) named `hairpin 1`.
///
/// # Errors
///
/// Returns `ParseError::Io` if the source is neither a readable file nor an
/// inline sequence, `ParseError::InvalidFormat` if no sequence is found, or
/// `ParseError::TooManyRecords` if the limit is exceeded.
pub fn read_sequences(source: &str) -> Result<Vec<(String, String)>, ParseError> {
    let path = Path::new(source);
    if path.is_file() {
        return parse_sequence_file(path);
    }

    if !source.is_empty() && !source.contains('/') && !source.contains('.') {
        return Ok(vec![("hairpin 1".to_string(), source.trim().to_string())]);
    }

    Err(ParseError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("sequence file not found: {source}"),
    )))
}

/// Parse a sequence file, gzip compressed or not
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::InvalidFormat`
/// if no sequence is found, or `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse_sequence_file(path: &Path) -> Result<Vec<(String, String)>, ParseError> {
    let file = std::fs::File::open(path)?;
    let stem = file_stem(path);
    let records = if is_gzipped(path) {
        parse_sequence_reader(BufReader::new(GzDecoder::new(file)), stem.as_deref())?
    } else {
        parse_sequence_reader(BufReader::new(file), stem.as_deref())?
    };

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(format!(
            "no sequence found in {}",
            path.display()
        )));
    }
    Ok(records)
}

/// Parse sequences from a reader.
///
/// `single_name` names the record when the stream holds a single untitled one.
///
/// # Errors
///
/// Returns `ParseError::Io` on read failures or `ParseError::TooManyRecords`
/// if the limit is exceeded.
pub fn parse_sequence_reader<R: BufRead>(
    reader: R,
    single_name: Option<&str>,
) -> Result<Vec<(String, String)>, ParseError> {
    let mut records: Vec<(String, String)> = Vec::new();
    let mut title: Option<String> = None;
    let mut sequence = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if !sequence.is_empty() {
                push_record(&mut records, title.take(), std::mem::take(&mut sequence))?;
            }
            let header = header.trim();
            title = (!header.is_empty()).then(|| header.to_string());
        } else {
            sequence.push_str(line);
        }
    }

    if !sequence.is_empty() {
        let title = match (title, single_name) {
            (None, Some(name)) if records.is_empty() => Some(name.to_string()),
            (title, _) => title,
        };
        push_record(&mut records, title, sequence)?;
    }

    Ok(records)
}

fn push_record(
    records: &mut Vec<(String, String)>,
    title: Option<String>,
    sequence: String,
) -> Result<(), ParseError> {
    if check_sequence_limit(records.len()).is_some() {
        return Err(ParseError::TooManyRecords(records.len()));
    }
    let name = title.unwrap_or_else(|| format!("hairpin {}", records.len() + 1));
    records.push((name, sequence));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_titled_and_untitled_records() {
        let text = "# comment\n\nacgt\nACGT\n>hp2\nttt\n\n>\ngg\n>hp4\ncc\n";
        let records = parse_sequence_reader(text.as_bytes(), Some("file")).unwrap();
        assert_eq!(
            records,
            vec![
                ("hairpin 1".to_string(), "acgtACGT".to_string()),
                ("hp2".to_string(), "ttt".to_string()),
                ("hairpin 3".to_string(), "gg".to_string()),
                ("hp4".to_string(), "cc".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_single_untitled_record_uses_name() {
        let records = parse_sequence_reader("aaa\nccc\n".as_bytes(), Some("myhp")).unwrap();
        assert_eq!(records, vec![("myhp".to_string(), "aaaccc".to_string())]);

        let records = parse_sequence_reader("aaa\n".as_bytes(), None).unwrap();
        assert_eq!(records, vec![("hairpin 1".to_string(), "aaa".to_string())]);
    }

    #[test]
    fn test_empty_records_are_skipped() {
        let records = parse_sequence_reader(">a\n>b\nat\n".as_bytes(), None).unwrap();
        assert_eq!(records, vec![("b".to_string(), "at".to_string())]);
    }

    #[test]
    fn test_read_sequences_from_file() {
        let mut file = NamedTempFile::with_suffix(".fasta").unwrap();
        writeln!(file, ">hp100\natcgATATATgtcgCCCaaGGG").unwrap();
        writeln!(file, ">hp101\nCCCatcgATATATgtcgaaGGG").unwrap();
        file.flush().unwrap();

        let records = read_sequences(&file.path().to_string_lossy()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, "hp100");
        assert_eq!(records[1].1, "CCCatcgATATATgtcgaaGGG");
    }

    #[test]
    fn test_read_sequences_gzipped_uses_stem() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut file = NamedTempFile::with_suffix(".fa.gz").unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"atcg\natcg\n").unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let records = read_sequences(&file.path().to_string_lossy()).unwrap();
        let stem = file_stem(file.path()).unwrap();
        assert_eq!(records, vec![(stem, "atcgatcg".to_string())]);
    }

    #[test]
    fn test_read_inline_sequence() {
        let records = read_sequences("atcgATATATgtcg").unwrap();
        assert_eq!(
            records,
            vec![("hairpin 1".to_string(), "atcgATATATgtcg".to_string())]
        );

        assert!(matches!(
            read_sequences("/no/such/file.fa"),
            Err(ParseError::Io(_))
        ));
    }
}
