use super::ids::{ChainIndex, ModelIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub(crate) index: ModelIndex,
    pub(crate) chains: Vec<ChainIndex>,
}

impl Model {
    pub(crate) fn new(index: ModelIndex) -> Self {
        Self {
            index,
            chains: Vec::new(),
        }
    }

    pub fn index(&self) -> ModelIndex {
        self.index
    }

    pub fn chains(&self) -> &[ChainIndex] {
        &self.chains
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }
}
