use thiserror::Error;

use super::config::ConfigError;
use crate::core::align::AlignmentError;
use crate::core::io::transfer::TransferError;
use crate::core::selection::error::SelectionError;
use crate::core::utils::superposition::SuperpositionError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Selection '{selection}' is invalid: {source}")]
    Selection {
        selection: String,
        #[source]
        source: SelectionError,
    },

    #[error("Sequence alignment failed: {source}")]
    Alignment {
        #[from]
        source: AlignmentError,
    },

    #[error("Superposition failed: {source}")]
    Superposition {
        #[from]
        source: SuperpositionError,
    },

    #[error("Transfer encoding is invalid: {source}")]
    Transfer {
        #[from]
        source: TransferError,
    },

    #[error("Structure '{name}' contains no atoms")]
    EmptyStructure { name: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
