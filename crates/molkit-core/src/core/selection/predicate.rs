//! Three-valued evaluation of a rule tree at one level of the hierarchy.

use super::ast::{Filter, Group, Keyword, Operator, Rule};
use crate::core::models::atom::AtomView;
use crate::core::models::secondary::SecondaryStructure;
use crate::core::models::view::{AtomHandle, ChainHandle, ModelHandle, ResidueHandle};
use crate::core::utils::identifiers;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Outcome of testing one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tristate {
    Match,
    NoMatch,
    /// The rule needs a field this entity does not have.
    NotApplicable,
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value { Self::Match } else { Self::NoMatch }
    }
}

/// A level of the hierarchy that rules can be evaluated against.
pub trait Level {
    type Entity<'a>;

    /// Evaluates one filter. `Keyword::All` never reaches this.
    fn evaluate_filter(filter: &Filter, entity: &Self::Entity<'_>) -> Tristate;

    /// Whether the "only" variant of this level's test ignores `filter`.
    fn ignores_in_only_test(filter: &Filter) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct AtomLevel;

#[derive(Debug, Clone, Copy)]
pub struct ResidueLevel;

#[derive(Debug, Clone, Copy)]
pub struct ChainLevel;

#[derive(Debug, Clone, Copy)]
pub struct ModelLevel;

fn is_backbone(atom: &AtomHandle<'_>) -> bool {
    let residue = atom.residue_handle();
    let name = atom.name();
    (residue.is_protein() && identifiers::is_protein_backbone_atom(name))
        || (residue.is_nucleic() && identifiers::is_nucleic_backbone_atom(name))
        || (residue.is_coarse_grained() && identifiers::is_coarse_grained_backbone_atom(name))
}

fn is_sidechain(atom: &AtomHandle<'_>) -> bool {
    let residue = atom.residue_handle();
    let name = atom.name();
    (residue.is_protein() && !identifiers::is_protein_backbone_atom(name))
        || (residue.is_nucleic() && !identifiers::is_nucleic_backbone_atom(name))
        || (residue.is_coarse_grained() && !identifiers::is_coarse_grained_backbone_atom(name))
}

impl Level for AtomLevel {
    type Entity<'a> = AtomHandle<'a>;

    fn evaluate_filter(filter: &Filter, atom: &AtomHandle<'_>) -> Tristate {
        let matched = match filter {
            Filter::Keyword(keyword) => {
                let residue = atom.residue_handle();
                match keyword {
                    Keyword::All => true,
                    Keyword::Hetero => atom.is_hetero(),
                    Keyword::Protein => residue.is_protein() || residue.is_coarse_grained(),
                    Keyword::Nucleic => residue.is_nucleic(),
                    Keyword::Rna => residue.is_rna(),
                    Keyword::Dna => residue.is_dna(),
                    Keyword::Polymer => residue.is_polymer(),
                    Keyword::Water => residue.is_water(),
                    Keyword::Helix => atom.secondary_structure().is_helix(),
                    Keyword::Sheet => atom.secondary_structure() == SecondaryStructure::Sheet,
                    Keyword::Backbone => is_backbone(atom),
                    Keyword::Sidechain => is_sidechain(atom),
                }
            }
            Filter::GlobalIndex(index) => *index == atom.global_index(),
            Filter::ResidueName(name) => name == atom.residue_name(),
            Filter::ChainName(name) => name == atom.chain_name(),
            Filter::AtomName(name) => name == atom.name(),
            Filter::Model(model) => *model == atom.model_index(),
            Filter::ResidueNumber(number) => number.contains(atom.residue_number()),
            Filter::Element(element) => element == atom.element(),
            Filter::AltLoc(alt_loc) => {
                let mut buffer = [0u8; 4];
                let own = atom.alt_loc().map_or("", |c| &*c.encode_utf8(&mut buffer));
                alt_loc == own
            }
        };
        matched.into()
    }

    fn ignores_in_only_test(filter: &Filter) -> bool {
        matches!(
            filter,
            Filter::Model(_)
                | Filter::ChainName(_)
                | Filter::ResidueName(_)
                | Filter::ResidueNumber(_)
        )
    }
}

impl Level for ResidueLevel {
    type Entity<'a> = ResidueHandle<'a>;

    fn evaluate_filter(filter: &Filter, residue: &ResidueHandle<'_>) -> Tristate {
        match filter {
            // Keywords only ever confirm a residue; one that does not hold
            // leaves the decision to the atom level.
            Filter::Keyword(keyword) => {
                let holds = match keyword {
                    Keyword::Hetero => residue.is_hetero(),
                    Keyword::Protein => residue.is_protein() || residue.is_coarse_grained(),
                    Keyword::Nucleic => residue.is_nucleic(),
                    Keyword::Rna => residue.is_rna(),
                    Keyword::Dna => residue.is_dna(),
                    Keyword::Polymer => residue.is_polymer(),
                    Keyword::Water => residue.is_water(),
                    _ => false,
                };
                if holds {
                    Tristate::Match
                } else {
                    Tristate::NotApplicable
                }
            }
            Filter::ResidueName(name) => (name == residue.name()).into(),
            // Auto-assigned chain names live on atoms only.
            Filter::ChainName(_) if residue.chain_name().is_empty() => Tristate::NotApplicable,
            Filter::ChainName(name) => (name == residue.chain_name()).into(),
            Filter::Model(model) => (*model == residue.model_index().get()).into(),
            Filter::ResidueNumber(number) => number.contains(residue.number()).into(),
            _ => Tristate::NotApplicable,
        }
    }

    fn ignores_in_only_test(filter: &Filter) -> bool {
        matches!(
            filter,
            Filter::Model(_)
                | Filter::GlobalIndex(_)
                | Filter::ChainName(_)
                | Filter::AtomName(_)
                | Filter::Element(_)
                | Filter::AltLoc(_)
        )
    }
}

impl Level for ChainLevel {
    type Entity<'a> = ChainHandle<'a>;

    fn evaluate_filter(filter: &Filter, chain: &ChainHandle<'_>) -> Tristate {
        match filter {
            Filter::ChainName(_) if chain.name().is_empty() => Tristate::NotApplicable,
            Filter::ChainName(name) => (name == chain.name()).into(),
            Filter::Model(model) => (*model == chain.model().get()).into(),
            _ => Tristate::NotApplicable,
        }
    }

    fn ignores_in_only_test(filter: &Filter) -> bool {
        !matches!(filter, Filter::Keyword(_) | Filter::ChainName(_))
    }
}

impl Level for ModelLevel {
    type Entity<'a> = ModelHandle<'a>;

    fn evaluate_filter(filter: &Filter, model: &ModelHandle<'_>) -> Tristate {
        match filter {
            Filter::Model(index) => (*index == model.index().get()).into(),
            _ => Tristate::NotApplicable,
        }
    }

    fn ignores_in_only_test(filter: &Filter) -> bool {
        !matches!(filter, Filter::Keyword(_) | Filter::Model(_))
    }
}

/// A compiled test for entities of level `L`.
pub enum Predicate<L: Level> {
    /// Produced by selections that failed to parse.
    Never,
    Rules(Arc<Group>, PhantomData<L>),
}

impl<L: Level> Predicate<L> {
    /// Compiles `root` for this level. Returns `None` when there is nothing
    /// to test, i.e. every entity passes.
    ///
    /// With `only`, the whole tree is kept if any of its filters is relevant
    /// to this level, and dropped otherwise.
    pub(crate) fn compile(root: &Arc<Group>, only: bool) -> Option<Self> {
        if root.is_empty() {
            return None;
        }
        if only && !Self::keeps_any(root) {
            return None;
        }
        Some(Self::Rules(Arc::clone(root), PhantomData))
    }

    fn keeps_any(group: &Group) -> bool {
        group.rules.iter().any(|rule| match rule {
            Rule::Filter(filter) => !L::ignores_in_only_test(filter),
            Rule::Group(group) => group.is_empty() || Self::keeps_any(group),
        })
    }

    pub fn evaluate(&self, entity: &L::Entity<'_>) -> Tristate {
        match self {
            Self::Never => Tristate::NoMatch,
            Self::Rules(root, _) => evaluate_group::<L>(root, entity),
        }
    }

    /// Anything but an explicit mismatch passes.
    pub fn passes(&self, entity: &L::Entity<'_>) -> bool {
        self.evaluate(entity) != Tristate::NoMatch
    }
}

fn evaluate_group<L: Level>(group: &Group, entity: &L::Entity<'_>) -> Tristate {
    if group.is_empty() {
        return Tristate::NotApplicable;
    }

    let and = group.operator == Some(Operator::And);
    let (t, f) = if group.negate {
        (Tristate::NoMatch, Tristate::Match)
    } else {
        (Tristate::Match, Tristate::NoMatch)
    };

    let mut not_applicable = false;
    for rule in &group.rules {
        let result = match rule {
            Rule::Group(child) => evaluate_group::<L>(child, entity),
            Rule::Filter(Filter::Keyword(Keyword::All)) => Tristate::Match,
            Rule::Filter(filter) => L::evaluate_filter(filter, entity),
        };
        match result {
            Tristate::NotApplicable => not_applicable = true,
            Tristate::Match if !and => return t,
            Tristate::NoMatch if and => return f,
            _ => {}
        }
    }

    if not_applicable {
        Tristate::NotApplicable
    } else if and {
        t
    } else {
        f
    }
}

impl<L: Level> Clone for Predicate<L> {
    fn clone(&self) -> Self {
        match self {
            Self::Never => Self::Never,
            Self::Rules(root, _) => Self::Rules(Arc::clone(root), PhantomData),
        }
    }
}

impl<L: Level> fmt::Debug for Predicate<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Rules(root, _) => f.debug_tuple("Rules").field(root).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::parser::parse;

    /// A level whose entities are plain residue numbers, to exercise the
    /// composition rules in isolation.
    struct NumberLevel;

    impl Level for NumberLevel {
        type Entity<'a> = Option<i32>;

        fn evaluate_filter(filter: &Filter, entity: &Option<i32>) -> Tristate {
            match (filter, entity) {
                (Filter::ResidueNumber(n), Some(value)) => n.contains(*value).into(),
                _ => Tristate::NotApplicable,
            }
        }

        fn ignores_in_only_test(filter: &Filter) -> bool {
            !matches!(filter, Filter::ResidueNumber(_) | Filter::Keyword(_))
        }
    }

    fn predicate(input: &str, only: bool) -> Option<Predicate<NumberLevel>> {
        Predicate::compile(&Arc::new(parse(input).unwrap()), only)
    }

    fn eval(input: &str, value: Option<i32>) -> Tristate {
        predicate(input, false).unwrap().evaluate(&value)
    }

    #[test]
    fn ranges_and_exact_numbers_match() {
        assert_eq!(eval("10-15", Some(12)), Tristate::Match);
        assert_eq!(eval("10-15", Some(16)), Tristate::NoMatch);
        assert_eq!(eval("7", Some(7)), Tristate::Match);
    }

    #[test]
    fn negation_inverts_only_definite_answers() {
        assert_eq!(eval("not 10-15", Some(12)), Tristate::NoMatch);
        assert_eq!(eval("not 10-15", Some(1)), Tristate::Match);
        assert_eq!(eval("not 10-15", None), Tristate::NotApplicable);
    }

    #[test]
    fn and_short_circuits_on_the_first_mismatch() {
        // The atom-name rule is never applicable here, so an AND that reached
        // it and found nothing else would report NotApplicable.
        assert_eq!(eval("1-5 and .CA", Some(9)), Tristate::NoMatch);
        assert_eq!(eval("1-5 and .CA", Some(3)), Tristate::NotApplicable);
    }

    #[test]
    fn or_skips_not_applicable_children() {
        assert_eq!(eval(".CA or 3", Some(3)), Tristate::Match);
        assert_eq!(eval(".CA or 3", Some(4)), Tristate::NotApplicable);
        assert_eq!(eval(".CA or .CB", Some(4)), Tristate::NotApplicable);
    }

    #[test]
    fn all_keyword_matches_everything() {
        assert_eq!(eval("*", None), Tristate::Match);
        assert_eq!(eval("not all", Some(1)), Tristate::NoMatch);
    }

    #[test]
    fn only_tests_are_dropped_without_relevant_filters() {
        assert!(predicate(".CA", true).is_none());
        assert!(predicate(".CA or 3", true).is_some());
        assert!(predicate("backbone", true).is_some());
        assert!(predicate("", false).is_none());
    }

    #[test]
    fn never_fails_everything() {
        let never: Predicate<NumberLevel> = Predicate::Never;
        assert!(!never.passes(&Some(1)));
        assert!(!never.passes(&None));
    }
}
