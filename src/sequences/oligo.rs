use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("invalid symbol '{symbol}' in oligo '{token}'")]
    InvalidOligoSpec { token: String, symbol: char },

    #[error("marker '!' in oligo '{0}' must be followed by a base")]
    MisplacedMarker(String),
}

/// Marks the palindromic base of an oligo: the base following it.
pub const MARKER: char = '!';

/// Spellings of the closed hairpin sentinel (position 0)
pub const START_SYNONYMS: [&str; 7] = [
    "'",
    "0",
    "start",
    "first",
    "zero",
    "doublestrand",
    "closed",
];

/// Spellings of the fully open hairpin sentinel (position = sequence length)
pub const END_SYNONYMS: [&str; 7] = ["_", "singlestrand", "$", "-1", "last", "end", "open"];

/// Canonical spelling of the start sentinel
pub const START: &str = "0";

/// Canonical spelling of the end sentinel
pub const END: &str = "singlestrand";

const DELIMITERS: [char; 4] = [',', ';', ':', '|'];

/// Regex class matched by an IUPAC symbol, if it is one
#[must_use]
pub fn base_class(base: char) -> Option<&'static str> {
    Some(match base.to_ascii_lowercase() {
        'a' => "a",
        't' | 'u' => "t",
        'g' => "g",
        'c' => "c",
        'k' => "[gt]",
        'm' => "[ac]",
        'r' => "[ag]",
        'y' => "[ct]",
        's' => "[cg]",
        'w' => "[at]",
        'b' => "[^a]",
        'v' => "[^t]",
        'h' => "[^g]",
        'd' => "[^c]",
        'n' | 'x' => ".",
        _ => return None,
    })
}

/// Complement of an IUPAC symbol, case preserved. Other characters are
/// returned unchanged.
#[must_use]
pub fn complement(base: char) -> char {
    let lower = match base.to_ascii_lowercase() {
        'a' => 't',
        't' => 'a',
        'u' => 'a',
        'c' => 'g',
        'g' => 'c',
        'k' => 'm',
        'm' => 'k',
        'r' => 'y',
        'y' => 'r',
        'b' => 'v',
        'v' => 'b',
        'h' => 'd',
        'd' => 'h',
        other => other,
    };
    if base.is_ascii_uppercase() {
        lower.to_ascii_uppercase()
    } else {
        lower
    }
}

/// Reverse complement of a sequence.
///
/// An involution over the DNA alphabet; `u` maps to `a`.
#[must_use]
pub fn reverse_complement(sequence: &str) -> String {
    sequence.chars().rev().map(complement).collect()
}

/// Whether two oligos overlap by at least `minoverlap` bases (0 means 1).
///
/// The shorter oligo overlaps the longer if it is contained in it, or if
/// one of its ends matches the other end of the longer one.
#[must_use]
pub fn overlap(first: &str, second: &str, minoverlap: usize) -> bool {
    let first = first.to_ascii_lowercase();
    let second = second.to_ascii_lowercase();
    let (long, short) = if first.len() < second.len() {
        (second.as_bytes(), first.as_bytes())
    } else {
        (first.as_bytes(), second.as_bytes())
    };

    let minoverlap = minoverlap.max(1);
    if minoverlap > short.len() {
        return false;
    }

    if long.windows(short.len()).any(|w| w == short) {
        return true;
    }

    (minoverlap..short.len()).any(|i| {
        long.ends_with(&short[..i]) || long.starts_with(&short[short.len() - i..])
    })
}

/// Strands on which a motif is searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Both,
    Forward,
    Reverse,
}

/// One probe token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Oligo {
    /// Closed hairpin
    Start,
    /// Fully open hairpin
    End,
    /// Lower-case motif, possibly carrying markers
    Motif { strand: Strand, text: String },
}

impl Oligo {
    /// Parse a single token
    ///
    /// # Errors
    ///
    /// Returns `SequenceError` if the token contains symbols outside the
    /// IUPAC alphabet or a misplaced marker.
    pub fn parse(token: &str) -> Result<Self, SequenceError> {
        let lower = token.trim().to_ascii_lowercase();
        if START_SYNONYMS.contains(&lower.as_str()) {
            return Ok(Self::Start);
        }
        if END_SYNONYMS.contains(&lower.as_str()) {
            return Ok(Self::End);
        }

        let (strand, text) = if let Some(rest) = lower.strip_prefix('+') {
            (Strand::Forward, rest)
        } else if let Some(rest) = lower.strip_prefix('-') {
            (Strand::Reverse, rest)
        } else {
            (Strand::Both, lower.as_str())
        };

        if let Some(symbol) = text
            .chars()
            .find(|&c| c != MARKER && base_class(c).is_none())
        {
            return Err(SequenceError::InvalidOligoSpec {
                token: token.to_string(),
                symbol,
            });
        }

        let mut chars = text.chars().peekable();
        let mut bases = 0;
        while let Some(c) = chars.next() {
            if c == MARKER {
                if !matches!(chars.peek(), Some(&next) if next != MARKER) {
                    return Err(SequenceError::MisplacedMarker(token.to_string()));
                }
            } else {
                bases += 1;
            }
        }
        if bases == 0 {
            return Err(SequenceError::InvalidOligoSpec {
                token: token.to_string(),
                symbol: lower.chars().next().unwrap_or(MARKER),
            });
        }

        Ok(Self::Motif {
            strand,
            text: text.to_string(),
        })
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Start => 0,
            Self::End => 1,
            Self::Motif { .. } => 2,
        }
    }
}

impl fmt::Display for Oligo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "{START}"),
            Self::End => write!(f, "{END}"),
            Self::Motif { strand, text } => match strand {
                Strand::Both => write!(f, "{text}"),
                Strand::Forward => write!(f, "+{text}"),
                Strand::Reverse => write!(f, "-{text}"),
            },
        }
    }
}

impl Ord for Oligo {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.to_string().cmp(&other.to_string()))
    }
}

impl PartialOrd for Oligo {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Normalized, sorted and deduplicated set of probe tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct OligoSpec(Vec<Oligo>);

impl OligoSpec {
    /// Parse several specifications, each possibly holding delimited tokens
    ///
    /// # Errors
    ///
    /// Returns `SequenceError` on the first invalid token.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, SequenceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for spec in tokens {
            for token in spec
                .as_ref()
                .split(|c: char| c.is_whitespace() || DELIMITERS.contains(&c))
                .filter(|t| !t.is_empty())
            {
                set.insert(Oligo::parse(token)?);
            }
        }
        Ok(Self(set.into_iter().collect()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Oligo> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn has_start(&self) -> bool {
        self.0.contains(&Oligo::Start)
    }

    #[must_use]
    pub fn has_end(&self) -> bool {
        self.0.contains(&Oligo::End)
    }

    /// Canonical spelling of every token
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

/// Parse a delimited oligo specification
///
/// # Errors
///
/// Returns `SequenceError` if a token is invalid.
pub fn split(spec: &str) -> Result<OligoSpec, SequenceError> {
    OligoSpec::from_tokens([spec])
}

impl FromStr for OligoSpec {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split(s)
    }
}

impl fmt::Display for OligoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens().join(","))
    }
}

impl TryFrom<Vec<String>> for OligoSpec {
    type Error = SequenceError;

    fn try_from(tokens: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_tokens(tokens)
    }
}

impl From<OligoSpec> for Vec<String> {
    fn from(spec: OligoSpec) -> Self {
        spec.tokens()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentinels() {
        let spec = split("0,singlestrand,ATGC").unwrap();
        assert_eq!(spec.tokens(), vec!["0", "singlestrand", "atgc"]);

        let spec = split("closed;OPEN;$;first ATGC").unwrap();
        assert_eq!(spec.tokens(), vec!["0", "singlestrand", "atgc"]);
        assert!(spec.has_start());
        assert!(spec.has_end());
    }

    #[test]
    fn test_split_delimiters_and_strands() {
        assert_eq!(split("AtG").unwrap().tokens(), vec!["atg"]);
        assert_eq!(split(":AtG;").unwrap().tokens(), vec!["atg"]);
        assert_eq!(split("AtG;ttt;").unwrap().tokens(), vec!["atg", "ttt"]);
        assert_eq!(split("-AtG;ttwt;").unwrap().tokens(), vec!["-atg", "ttwt"]);
        assert_eq!(split("-1").unwrap().tokens(), vec!["singlestrand"]);
        assert!(split("").unwrap().is_empty());
    }

    #[test]
    fn test_split_is_idempotent() {
        for spec in ["0,singlestrand,ATGC", "-AtG;ttwt;", "a!tat !ccc +ggg", "end,kmrys"] {
            let once = split(spec).unwrap();
            let twice = split(&once.to_string()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_split_rejects_invalid_symbols() {
        assert_eq!(
            split("atg,aze"),
            Err(SequenceError::InvalidOligoSpec {
                token: "aze".to_string(),
                symbol: 'z',
            })
        );
        assert!(matches!(
            split("at!"),
            Err(SequenceError::MisplacedMarker(_))
        ));
        assert!(matches!(
            split("a!!t"),
            Err(SequenceError::MisplacedMarker(_))
        ));
        assert!(split("+").is_err());
    }

    #[test]
    fn test_oligo_spec_serde() {
        let spec: OligoSpec = serde_json::from_str(r#"["CCC", "atat;0"]"#).unwrap();
        assert_eq!(spec.tokens(), vec!["0", "atat", "ccc"]);
        assert_eq!(
            serde_json::to_string(&spec).unwrap(),
            r#"["0","atat","ccc"]"#
        );
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("atgcATGC"), "GCATgcat");
        assert_eq!(reverse_complement("kmrybvhd"), "hdbvrykm");
        assert_eq!(reverse_complement("a!tat"), "ata!t");
        for seq in ["", "a", "atcgATATATgtcgCCCaaGGG", "wsKMnx"] {
            assert_eq!(reverse_complement(&reverse_complement(seq)), seq);
        }
    }

    #[test]
    fn test_overlap() {
        assert!(overlap("atcg", "cgat", 1));
        assert!(overlap("atcg", "cgat", 2));
        assert!(!overlap("atcg", "cgat", 3));
        assert!(overlap("atcgat", "tcg", 0));
        assert!(!overlap("atcg", "ccc", 1));
        assert!(!overlap("atc", "at", 3));
        assert!(overlap("aaat", "tccc", 1));
        assert!(!overlap("aaat", "tccc", 2));

        let oligos = ["atcg", "cgat", "aaat", "tccc", "ta", "gatc"];
        for a in oligos {
            for b in oligos {
                for min in 0..5 {
                    assert_eq!(overlap(a, b, min), overlap(b, a, min));
                }
            }
        }
    }
}
