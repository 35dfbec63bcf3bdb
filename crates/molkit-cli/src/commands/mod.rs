pub mod align;
pub mod inspect;
pub mod parse;
pub mod select;
pub mod superpose;

use molkit::core::selection::Selection;
use molkit::engine::error::EngineError;

/// Parses `string`, turning a syntax error into an engine error that names
/// the offending selection.
pub(crate) fn checked_selection(string: &str) -> Result<Selection, EngineError> {
    let selection = Selection::new(string);
    match selection.error() {
        Some(error) => Err(EngineError::Selection {
            selection: string.to_string(),
            source: error.clone(),
        }),
        None => Ok(selection),
    }
}
