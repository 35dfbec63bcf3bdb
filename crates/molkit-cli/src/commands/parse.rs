use crate::cli::ParseArgs;
use crate::error::Result;
use molkit::core::selection::Selection;
use tracing::{info, warn};

pub fn run(args: ParseArgs) -> Result<()> {
    let selection = Selection::new(&args.selection);
    println!("{}", render(&selection));
    match selection.error() {
        Some(error) => warn!("Selection '{}' did not parse: {}", args.selection, error),
        None => info!("Parsed selection '{}'.", args.selection),
    }
    Ok(())
}

/// The rule tree followed by its canonical string, or the stored error.
pub fn render(selection: &Selection) -> String {
    if selection.is_empty() {
        return "(empty selection: matches everything)".to_string();
    }
    match selection.ast() {
        Some(ast) => format!("{ast:#?}\n\ncanonical: {selection}"),
        None => selection.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_selections_print_tree_and_canonical_form() {
        let selection = Selection::new("10-15 or backbone and 30-35");
        let text = render(&selection);
        assert!(text.contains("canonical: "));
        assert!(text.ends_with(&selection.to_string()));
    }

    #[test]
    fn empty_selection_is_called_out() {
        assert!(render(&Selection::new("")).starts_with("(empty"));
    }

    #[test]
    fn invalid_selections_print_the_error() {
        let text = render(&Selection::new("1-2-3"));
        assert!(text.starts_with("{error: "));
    }
}
