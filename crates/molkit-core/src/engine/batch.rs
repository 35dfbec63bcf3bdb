use std::iter::FusedIterator;
use std::ops::Range;

/// Splits `0..len` into consecutive index ranges of at most `batch_size`.
///
/// The iterator knows nothing about scheduling; callers decide what to do
/// between batches (report progress, yield, hand the range to a worker).
#[derive(Debug, Clone)]
pub struct Batches {
    next: usize,
    len: usize,
    batch_size: usize,
}

impl Batches {
    /// A `batch_size` of zero is treated as one.
    pub fn new(len: usize, batch_size: usize) -> Self {
        Self {
            next: 0,
            len,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Total number of batches, including those already yielded.
    pub fn batch_count(&self) -> usize {
        self.len.div_ceil(self.batch_size)
    }
}

impl Iterator for Batches {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let start = self.next;
        let end = (start + self.batch_size).min(self.len);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.next.min(self.len)).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches {}

impl FusedIterator for Batches {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_the_input_in_order() {
        let ranges: Vec<_> = Batches::new(25, 10).collect();
        assert_eq!(ranges, vec![0..10, 10..20, 20..25]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_batch() {
        let batches = Batches::new(20, 10);
        assert_eq!(batches.batch_count(), 2);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches.last(), Some(10..20));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(Batches::new(0, 10).next(), None);
        assert_eq!(Batches::new(0, 10).batch_count(), 0);
    }

    #[test]
    fn zero_batch_size_falls_back_to_single_items() {
        let batches = Batches::new(3, 0);
        assert_eq!(batches.batch_size(), 1);
        assert_eq!(batches.count(), 3);
    }

    #[test]
    fn size_hint_tracks_remaining_batches() {
        let mut batches = Batches::new(25, 10);
        batches.next();
        assert_eq!(batches.len(), 2);
    }
}
