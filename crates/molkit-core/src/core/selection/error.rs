use thiserror::Error;

/// Why a selection string could not be parsed.
///
/// A failed parse is stored on the [`Selection`](super::Selection) instead of
/// being returned, and every predicate of that selection matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("resi must be an integer")]
    InvalidResidueNumber { token: String },

    #[error("resi range must contain one '-'")]
    InvalidResidueRange { token: String },

    #[error("atomname must be one to four characters")]
    InvalidAtomName { token: String },

    #[error("model must be an integer")]
    InvalidModel { token: String },

    #[error("globalindex must be an integer")]
    InvalidGlobalIndex { token: String },

    #[error("empty selection chunk")]
    EmptyChunk { token: String },
}

impl SelectionError {
    /// The whitespace-separated chunk that failed to parse.
    pub fn token(&self) -> &str {
        match self {
            Self::InvalidResidueNumber { token }
            | Self::InvalidResidueRange { token }
            | Self::InvalidAtomName { token }
            | Self::InvalidModel { token }
            | Self::InvalidGlobalIndex { token }
            | Self::EmptyChunk { token } => token,
        }
    }
}
