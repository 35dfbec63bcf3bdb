use super::matrix::SubstitutionMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

pub const DEFAULT_GAP_OPEN: i32 = -10;
pub const DEFAULT_GAP_EXTEND: i32 = -1;

/// Symbol used for gaps in aligned strings.
pub const GAP: char = '-';

// Stand-in for minus infinity that survives a few additions without overflow.
const NEG_INF: i32 = i32::MIN / 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("Traceback is inconsistent with the {matrix} matrix at ({row}, {column})")]
    InconsistentTraceback {
        matrix: &'static str,
        row: usize,
        column: usize,
    },
}

/// Global alignment with affine gap penalties (Gotoh).
///
/// A gap of length `k` costs `gap_open + (k - 1) * gap_extend`; both
/// penalties are given as negative scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Aligner {
    pub matrix: SubstitutionMatrix,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for Aligner {
    fn default() -> Self {
        Self {
            matrix: SubstitutionMatrix::Blosum62,
            gap_open: DEFAULT_GAP_OPEN,
            gap_extend: DEFAULT_GAP_EXTEND,
        }
    }
}

/// One column of an alignment: the index into each sequence, or `None` for a gap.
pub type Column = (Option<usize>, Option<usize>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub score: i32,
    pub aligned1: String,
    pub aligned2: String,
    pub columns: Vec<Column>,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index pairs of the columns without a gap, in alignment order.
    pub fn matched_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.columns.iter().filter_map(|column| match *column {
            (Some(i), Some(j)) => Some((i, j)),
            _ => None,
        })
    }

    /// Fraction of gap-free columns holding identical symbols.
    pub fn identity(&self) -> f64 {
        let (mut matched, mut identical) = (0usize, 0usize);
        for (a, b) in self.aligned1.chars().zip(self.aligned2.chars()) {
            if a != GAP && b != GAP {
                matched += 1;
                if a == b {
                    identical += 1;
                }
            }
        }
        if matched == 0 {
            0.0
        } else {
            identical as f64 / matched as f64
        }
    }
}

struct Grid {
    width: usize,
    cells: Vec<i32>,
}

impl Grid {
    fn new(rows: usize, columns: usize) -> Self {
        Self {
            width: columns,
            cells: vec![0; rows * columns],
        }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> i32 {
        self.cells[i * self.width + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: i32) {
        self.cells[i * self.width + j] = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    S,
    V,
    H,
}

impl Aligner {
    pub fn new(matrix: SubstitutionMatrix, gap_open: i32, gap_extend: i32) -> Self {
        Self {
            matrix,
            gap_open,
            gap_extend,
        }
    }

    /// Aligns two sequences end to end.
    ///
    /// `S` holds the best score of any alignment of the prefixes, `V` of
    /// those ending in a gap in `seq2` and `H` of those ending in a gap in
    /// `seq1`. The traceback starts from the best of the three final cells
    /// and prefers `S`, then `V`, then `H` on ties.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError::InconsistentTraceback`] if no move reproduces
    /// a cell's score during traceback.
    pub fn align(&self, seq1: &str, seq2: &str) -> Result<Alignment, AlignmentError> {
        let a: Vec<char> = seq1.chars().collect();
        let b: Vec<char> = seq2.chars().collect();
        let (n, m) = (a.len(), b.len());
        let score = |i: usize, j: usize| self.matrix.score(a[i], b[j]);

        let mut s = Grid::new(n + 1, m + 1);
        let mut v = Grid::new(n + 1, m + 1);
        let mut h = Grid::new(n + 1, m + 1);
        for i in 0..=n {
            s.set(i, 0, self.gap_open);
            h.set(i, 0, NEG_INF);
        }
        for j in 0..=m {
            s.set(0, j, self.gap_open);
            v.set(0, j, NEG_INF);
        }
        s.set(0, 0, 0);

        for i in 1..=n {
            for j in 1..=m {
                let vij = (s.get(i - 1, j) + self.gap_open).max(v.get(i - 1, j) + self.gap_extend);
                let hij = (s.get(i, j - 1) + self.gap_open).max(h.get(i, j - 1) + self.gap_extend);
                let sij = (s.get(i - 1, j - 1) + score(i - 1, j - 1)).max(vij).max(hij);
                v.set(i, j, vij);
                h.set(i, j, hij);
                s.set(i, j, sij);
            }
        }

        let (mut i, mut j) = (n, m);
        let (mut layer, total) = if s.get(i, j) >= v.get(i, j) && s.get(i, j) >= h.get(i, j) {
            (Layer::S, s.get(i, j))
        } else if v.get(i, j) >= h.get(i, j) {
            (Layer::V, v.get(i, j))
        } else {
            (Layer::H, h.get(i, j))
        };

        let mut columns: Vec<Column> = Vec::with_capacity(n + m);
        while i > 0 && j > 0 {
            match layer {
                Layer::S => {
                    if s.get(i, j) == s.get(i - 1, j - 1) + score(i - 1, j - 1) {
                        columns.push((Some(i - 1), Some(j - 1)));
                        i -= 1;
                        j -= 1;
                    } else if s.get(i, j) == v.get(i, j) {
                        layer = Layer::V;
                    } else if s.get(i, j) == h.get(i, j) {
                        layer = Layer::H;
                    } else {
                        return Err(inconsistent("S", i, j));
                    }
                }
                Layer::V => {
                    if v.get(i, j) == v.get(i - 1, j) + self.gap_extend {
                        columns.push((Some(i - 1), None));
                        i -= 1;
                    } else if v.get(i, j) == s.get(i - 1, j) + self.gap_open {
                        columns.push((Some(i - 1), None));
                        i -= 1;
                        layer = Layer::S;
                    } else {
                        return Err(inconsistent("V", i, j));
                    }
                }
                Layer::H => {
                    if h.get(i, j) == h.get(i, j - 1) + self.gap_extend {
                        columns.push((None, Some(j - 1)));
                        j -= 1;
                    } else if h.get(i, j) == s.get(i, j - 1) + self.gap_open {
                        columns.push((None, Some(j - 1)));
                        j -= 1;
                        layer = Layer::S;
                    } else {
                        return Err(inconsistent("H", i, j));
                    }
                }
            }
        }
        while i > 0 {
            columns.push((Some(i - 1), None));
            i -= 1;
        }
        while j > 0 {
            columns.push((None, Some(j - 1)));
            j -= 1;
        }
        columns.reverse();

        let render = |pick: fn(&Column) -> Option<usize>, symbols: &[char]| -> String {
            columns
                .iter()
                .map(|column| pick(column).map_or(GAP, |k| symbols[k]))
                .collect()
        };
        let aligned1 = render(|c| c.0, &a);
        let aligned2 = render(|c| c.1, &b);

        trace!(score = total, length = columns.len(), "Aligned sequences");
        Ok(Alignment {
            score: total,
            aligned1,
            aligned2,
            columns,
        })
    }
}

fn inconsistent(matrix: &'static str, row: usize, column: usize) -> AlignmentError {
    AlignmentError::InconsistentTraceback {
        matrix,
        row,
        column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_align_without_gaps() {
        let alignment = Aligner::default().align("ACDEFG", "ACDEFG").unwrap();
        let diagonal: i32 = "ACDEFG"
            .chars()
            .map(|c| SubstitutionMatrix::Blosum62.score(c, c))
            .sum();
        assert_eq!(alignment.score, diagonal);
        assert_eq!(alignment.score, 36);
        assert_eq!(alignment.aligned1, "ACDEFG");
        assert_eq!(alignment.aligned2, "ACDEFG");
        assert_eq!(alignment.matched_pairs().count(), 6);
        assert!((alignment.identity() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn aligned_strings_have_equal_length_and_preserve_sequences() {
        let alignment = Aligner::default()
            .align("MKTAYIAKQRQISFVKSHFSRQ", "MKTAYIAKQISFVKSHFSRQ")
            .unwrap();
        assert_eq!(alignment.aligned1.chars().count(), alignment.aligned2.chars().count());
        assert_eq!(alignment.aligned1.replace(GAP, ""), "MKTAYIAKQRQISFVKSHFSRQ");
        assert_eq!(alignment.aligned2.replace(GAP, ""), "MKTAYIAKQISFVKSHFSRQ");
        // A single two-residue gap is cheaper than two separate ones.
        assert_eq!(alignment.aligned2.matches("--").count(), 1);
        assert_eq!(alignment.matched_pairs().count(), 20);
    }

    #[test]
    fn columns_index_into_both_sequences() {
        let alignment = Aligner::new(SubstitutionMatrix::Identity, -2, -1)
            .align("GATTACA", "GATACA")
            .unwrap();
        for (column, (a, b)) in alignment
            .columns
            .iter()
            .zip(alignment.aligned1.chars().zip(alignment.aligned2.chars()))
        {
            assert_eq!(column.0.is_none(), a == GAP);
            assert_eq!(column.1.is_none(), b == GAP);
        }
        assert_eq!(alignment.len(), 7);
    }

    #[test]
    fn empty_sequence_aligns_against_gaps() {
        let alignment = Aligner::default().align("", "AC").unwrap();
        assert_eq!(alignment.aligned1, "--");
        assert_eq!(alignment.aligned2, "AC");
        assert_eq!(alignment.matched_pairs().count(), 0);
        assert_eq!(alignment.identity(), 0.0);
    }

    #[test]
    fn single_residue_against_two_takes_one_gap() {
        let alignment = Aligner::default().align("A", "AA").unwrap();
        assert_eq!(alignment.aligned1, "-A");
        assert_eq!(alignment.aligned2, "AA");
        assert_eq!(alignment.score, -6);
    }
}
