use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    pub struct StructureId;
}

macro_rules! dense_index {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
            )]
            pub struct $name(pub usize);

            impl $name {
                #[inline]
                pub fn get(self) -> usize {
                    self.0
                }
            }

            impl From<usize> for $name {
                fn from(index: usize) -> Self {
                    Self(index)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

dense_index! {
    /// Local, zero-based index of an atom within its structure.
    AtomIndex,
    /// Local, zero-based index of a residue within its structure.
    ResidueIndex,
    /// Local, zero-based index of a chain within its structure.
    ChainIndex,
    /// Local, zero-based index of a model within its structure.
    ModelIndex,
    /// Position of a bond in the structure's bond set.
    BondIndex,
}

/// Hands out global atom indices that stay unique across every structure
/// built from the same allocator.
///
/// Structures built from independent allocators do not share an identity
/// space; a host that wants process-wide identities keeps a single allocator
/// (see [`StructureRegistry`](super::registry::StructureRegistry)).
#[derive(Debug, Default)]
pub struct GlobalIndexAllocator {
    next: u64,
}

impl GlobalIndexAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts numbering at `start`, e.g. to continue an identity space that
    /// was serialized earlier.
    pub fn starting_at(start: u64) -> Self {
        Self { next: start }
    }

    pub fn allocate(&mut self) -> u64 {
        let index = self.next;
        self.next += 1;
        index
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Makes sure future allocations never collide with `index`.
    pub fn reserve_through(&mut self, index: u64) {
        self.next = self.next.max(index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_hands_out_increasing_indices() {
        let mut allocator = GlobalIndexAllocator::new();
        assert_eq!(allocator.allocate(), 0);
        assert_eq!(allocator.allocate(), 1);
        assert_eq!(allocator.peek(), 2);
    }

    #[test]
    fn independent_allocators_do_not_share_state() {
        let mut a = GlobalIndexAllocator::new();
        let mut b = GlobalIndexAllocator::new();
        a.allocate();
        a.allocate();
        assert_eq!(b.allocate(), 0);
    }

    #[test]
    fn reserve_through_skips_past_known_indices() {
        let mut allocator = GlobalIndexAllocator::starting_at(3);
        allocator.reserve_through(10);
        assert_eq!(allocator.allocate(), 11);
        allocator.reserve_through(2);
        assert_eq!(allocator.allocate(), 12);
    }

    #[test]
    fn dense_indices_display_as_plain_numbers() {
        assert_eq!(AtomIndex(7).to_string(), "7");
        assert_eq!(ResidueIndex::from(3).get(), 3);
    }
}
