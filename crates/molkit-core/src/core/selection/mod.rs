//! The selection language.
//!
//! A [`Selection`] parses a string such as `"10-15:A and .CA"` once and
//! compiles it into eight predicates: a full and an "only" test for each of
//! atoms, residues, chains and models. Traversal methods on
//! [`Structure`](crate::core::models::structure::Structure) use the "only"
//! tests to skip whole models, chains and residues before looking at atoms.

pub mod ast;
pub mod error;
pub mod parser;
pub mod predicate;

use ast::Group;
use error::SelectionError;
use predicate::{AtomLevel, ChainLevel, Level, ModelLevel, Predicate, ResidueLevel};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct Tests<L: Level> {
    full: Option<Predicate<L>>,
    only: Option<Predicate<L>>,
}

impl<L: Level> Tests<L> {
    fn compile(root: &Arc<Group>) -> Self {
        Self {
            full: Predicate::compile(root, false),
            only: Predicate::compile(root, true),
        }
    }

    fn never() -> Self {
        Self {
            full: Some(Predicate::Never),
            only: Some(Predicate::Never),
        }
    }
}

/// A parsed, immutable selection.
///
/// Parse failures are kept on the value (see [`error`](Self::error)); such a
/// selection matches nothing.
#[derive(Debug, Clone)]
pub struct Selection {
    string: String,
    result: Result<Arc<Group>, SelectionError>,
    atom: Tests<AtomLevel>,
    residue: Tests<ResidueLevel>,
    chain: Tests<ChainLevel>,
    model: Tests<ModelLevel>,
}

impl Selection {
    pub fn new(string: &str) -> Self {
        let result = parser::parse(string).map(Arc::new);
        match &result {
            Ok(root) => Self {
                string: string.to_string(),
                atom: Tests::compile(root),
                residue: Tests::compile(root),
                chain: Tests::compile(root),
                model: Tests::compile(root),
                result,
            },
            Err(error) => {
                debug!(selection = string, %error, "Selection failed to parse");
                Self {
                    string: string.to_string(),
                    atom: Tests::never(),
                    residue: Tests::never(),
                    chain: Tests::never(),
                    model: Tests::never(),
                    result,
                }
            }
        }
    }

    /// Combines two selection strings with `AND`; either may be empty.
    pub fn with_extra(string: &str, extra: &str) -> Self {
        match (string.is_empty(), extra.is_empty()) {
            (true, true) => Self::new(""),
            (true, false) => Self::new(extra),
            (false, true) => Self::new(string),
            (false, false) => Self::new(&format!("( {string} ) and ( {extra} )")),
        }
    }

    /// The string this selection was parsed from.
    pub fn as_str(&self) -> &str {
        &self.string
    }

    /// The rule tree, unless parsing failed.
    pub fn ast(&self) -> Option<&Group> {
        self.result.as_deref().ok()
    }

    pub fn error(&self) -> Option<&SelectionError> {
        self.result.as_ref().err()
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_ok()
    }

    /// True for a valid selection without rules, which selects everything.
    pub fn is_empty(&self) -> bool {
        self.ast().is_some_and(Group::is_empty)
    }

    pub fn atom_test(&self) -> Option<&Predicate<AtomLevel>> {
        self.atom.full.as_ref()
    }

    pub fn atom_only_test(&self) -> Option<&Predicate<AtomLevel>> {
        self.atom.only.as_ref()
    }

    pub fn residue_test(&self) -> Option<&Predicate<ResidueLevel>> {
        self.residue.full.as_ref()
    }

    pub fn residue_only_test(&self) -> Option<&Predicate<ResidueLevel>> {
        self.residue.only.as_ref()
    }

    pub fn chain_test(&self) -> Option<&Predicate<ChainLevel>> {
        self.chain.full.as_ref()
    }

    pub fn chain_only_test(&self) -> Option<&Predicate<ChainLevel>> {
        self.chain.only.as_ref()
    }

    pub fn model_test(&self) -> Option<&Predicate<ModelLevel>> {
        self.model.full.as_ref()
    }

    pub fn model_only_test(&self) -> Option<&Predicate<ModelLevel>> {
        self.model.only.as_ref()
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::str::FromStr for Selection {
    type Err = SelectionError;

    /// Strict parsing: unlike [`Selection::new`], a syntax error is returned.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selection = Self::new(s);
        match selection.result {
            Ok(_) => Ok(selection),
            Err(error) => Err(error),
        }
    }
}

/// Prints the canonical form of the rule tree, or the stored error.
impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(root) => write!(f, "{root}"),
            Err(error) => write!(f, "{{error: {error}}}"),
        }
    }
}
