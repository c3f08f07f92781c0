//! Oligo specifications and the sequence scanner.
//!
//! An oligo specification is a delimited list of motifs written with IUPAC
//! symbols. Each motif is searched on both strands unless prefixed with `+`
//! (forward only) or `-` (reverse complement only). A `!` marks the
//! palindromic base of a motif: the match then yields the position right
//! after that base instead of the end of the match.
//!
//! Two sentinel tokens stand for the ends of the hairpin:
//!
//! | Token | Position | Spellings |
//! |-------|----------|-----------|
//! | start | 0 | `'`, `0`, start, first, zero, doublestrand, closed |
//! | end | sequence length | `_`, singlestrand, `$`, `-1`, last, end, open |
//!
//! ## Example
//!
//! ```rust
//! use hairpin_solver::sequences::{peaks, split};
//!
//! let oligos = split("ATAT,CCC").unwrap();
//! let found = peaks("atcgATATATgtcgCCCaaGGG", &oligos);
//! let positions: Vec<usize> = found.iter().map(|p| p.position).collect();
//! assert_eq!(positions, vec![8, 10, 17, 22]);
//! ```

pub mod oligo;
pub mod scanner;

pub use oligo::{
    overlap, reverse_complement, split, Oligo, OligoSpec, SequenceError, Strand,
};
pub use scanner::{mark_sequence, peaks, Scanner, SequencePeak, SequencePeakSet};
