use std::collections::BTreeMap;

use regex::bytes::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sequences::oligo::{base_class, complement, Oligo, OligoSpec, Strand, MARKER};

/// A theoretical binding position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePeak {
    /// Base index, in `[0, len(sequence)]`
    pub position: usize,
    /// `true` for the forward strand
    pub orientation: bool,
}

/// Positions of a sequence bound by an oligo set, strictly ascending
pub type SequencePeakSet = Vec<SequencePeak>;

#[derive(Debug, Clone, Copy)]
struct Unit {
    base: char,
    marked: bool,
}

fn forward_units(text: &str) -> Vec<Unit> {
    let mut units = Vec::with_capacity(text.len());
    let mut marked = false;
    for c in text.chars() {
        if c == MARKER {
            marked = true;
        } else {
            units.push(Unit { base: c, marked });
            marked = false;
        }
    }
    units
}

fn reverse_units(units: &[Unit]) -> Vec<Unit> {
    units
        .iter()
        .rev()
        .map(|u| Unit {
            base: complement(u.base),
            marked: u.marked,
        })
        .collect()
}

fn compile(units: &[Unit]) -> Option<Regex> {
    let mut pattern = String::new();
    for unit in units {
        let class = base_class(unit.base)?;
        if unit.marked {
            pattern.push('(');
            pattern.push_str(class);
            pattern.push(')');
        } else {
            pattern.push_str(class);
        }
    }

    match RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .unicode(false)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!("Skipping oligo pattern {pattern}: {err}");
            None
        }
    }
}

/// Compiled search pattern for one strand of a motif
#[derive(Debug, Clone)]
struct Pattern {
    regex: Regex,
    orientation: bool,
    marked: bool,
}

impl Pattern {
    /// Yields a position per match, or per marked base within a match.
    ///
    /// Successive searches start one character after the previous match start.
    fn scan(&self, sequence: &[u8], out: &mut Vec<usize>) {
        let mut start = 0;
        while start <= sequence.len() {
            let Some(caps) = self.regex.captures_at(sequence, start) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };
            if self.marked {
                out.extend(caps.iter().skip(1).flatten().map(|m| m.end()));
            } else {
                out.push(whole.end());
            }
            start = whole.start() + 1;
        }
    }

    /// Yields the span of each match
    fn spans(&self, sequence: &[u8], out: &mut Vec<(usize, usize)>) {
        let mut start = 0;
        while start <= sequence.len() {
            let Some(found) = self.regex.find_at(sequence, start) else {
                break;
            };
            out.push((found.start(), found.end()));
            start = found.start() + 1;
        }
    }
}

/// Scans sequences for the binding positions of an oligo set.
///
/// Build once per oligo set and reuse over many sequences.
#[derive(Debug, Clone)]
pub struct Scanner {
    patterns: Vec<Pattern>,
    start: bool,
    end: bool,
}

impl Scanner {
    #[must_use]
    pub fn new(oligos: &OligoSpec) -> Self {
        let mut patterns = Vec::new();
        for oligo in oligos.iter() {
            let Oligo::Motif { strand, text } = oligo else {
                continue;
            };
            let units = forward_units(text);
            let marked = units.iter().any(|u| u.marked);
            if matches!(strand, Strand::Both | Strand::Reverse) {
                if let Some(regex) = compile(&reverse_units(&units)) {
                    patterns.push(Pattern {
                        regex,
                        orientation: false,
                        marked,
                    });
                }
            }
            if matches!(strand, Strand::Both | Strand::Forward) {
                if let Some(regex) = compile(&units) {
                    patterns.push(Pattern {
                        regex,
                        orientation: true,
                        marked,
                    });
                }
            }
        }

        Self {
            patterns,
            start: oligos.has_start(),
            end: oligos.has_end(),
        }
    }

    /// Binding positions in a sequence, sorted.
    ///
    /// Reverse strand positions are recorded first, so a forward strand
    /// match at the same position takes over its orientation.
    #[must_use]
    pub fn scan(&self, sequence: &str) -> SequencePeakSet {
        let bytes = sequence.as_bytes();
        let mut merged: BTreeMap<usize, bool> = BTreeMap::new();
        let mut found = Vec::new();

        let reverse = self.patterns.iter().filter(|p| !p.orientation);
        let forward = self.patterns.iter().filter(|p| p.orientation);
        for pattern in reverse.chain(forward) {
            found.clear();
            pattern.scan(bytes, &mut found);
            for &position in &found {
                merged.insert(position, pattern.orientation);
            }
        }

        if self.start {
            merged.insert(0, true);
        }
        if self.end {
            merged.insert(bytes.len(), true);
        }

        merged
            .into_iter()
            .map(|(position, orientation)| SequencePeak {
                position,
                orientation,
            })
            .collect()
    }

    /// Lower-cased sequence with every oligo match upper-cased
    #[must_use]
    pub fn mark(&self, sequence: &str) -> String {
        let mut bytes = sequence.to_ascii_lowercase().into_bytes();
        let mut spans = Vec::new();
        for pattern in &self.patterns {
            pattern.spans(&bytes, &mut spans);
        }
        for (start, end) in spans {
            bytes[start..end].make_ascii_uppercase();
        }
        String::from_utf8(bytes).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
    }
}

/// Binding positions and orientations of an oligo set in a sequence
#[must_use]
pub fn peaks(sequence: &str, oligos: &OligoSpec) -> SequencePeakSet {
    Scanner::new(oligos).scan(sequence)
}

/// Sequence with oligo matches upper-cased, for display
#[must_use]
pub fn mark_sequence(sequence: &str, oligos: &OligoSpec) -> String {
    Scanner::new(oligos).mark(sequence)
}
