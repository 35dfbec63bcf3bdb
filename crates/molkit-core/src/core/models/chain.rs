use super::ids::{ChainIndex, ModelIndex, ResidueIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub(crate) index: ChainIndex,
    pub(crate) model: ModelIndex,
    pub(crate) name: String, // Empty until named by the input or by auto-naming
    pub(crate) residues: Vec<ResidueIndex>,
}

impl Chain {
    pub(crate) fn new(index: ChainIndex, model: ModelIndex, name: &str) -> Self {
        Self {
            index,
            model,
            name: name.trim().to_string(),
            residues: Vec::new(),
        }
    }

    pub fn index(&self) -> ChainIndex {
        self.index
    }

    pub fn model(&self) -> ModelIndex {
        self.model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn residues(&self) -> &[ResidueIndex] {
        &self.residues
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }
}
