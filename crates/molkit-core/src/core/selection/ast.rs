use serde::{Deserialize, Serialize};
use std::fmt;

/// Named classes of atoms that a single selection word can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Keyword {
    All,
    Hetero,
    Water,
    Protein,
    Nucleic,
    Rna,
    Dna,
    Polymer,
    Helix,
    Sheet,
    Backbone,
    Sidechain,
}

impl Keyword {
    const NAMED: [Keyword; 11] = [
        Self::Hetero,
        Self::Water,
        Self::Protein,
        Self::Nucleic,
        Self::Rna,
        Self::Dna,
        Self::Polymer,
        Self::Helix,
        Self::Sheet,
        Self::Backbone,
        Self::Sidechain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Hetero => "HETERO",
            Self::Water => "WATER",
            Self::Protein => "PROTEIN",
            Self::Nucleic => "NUCLEIC",
            Self::Rna => "RNA",
            Self::Dna => "DNA",
            Self::Polymer => "POLYMER",
            Self::Helix => "HELIX",
            Self::Sheet => "SHEET",
            Self::Backbone => "BACKBONE",
            Self::Sidechain => "SIDECHAIN",
        }
    }

    /// Looks up an uppercase word among the keywords that stand for a
    /// single rule. `ALL` is not included; the parser has its own spellings
    /// for it.
    pub fn from_word(word: &str) -> Option<Self> {
        Self::NAMED.into_iter().find(|k| k.name() == word)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    And,
    Or,
}

/// A residue number constraint; ranges are inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidueNumber {
    Exact(i32),
    Range(i32, i32),
}

impl ResidueNumber {
    pub fn contains(self, number: i32) -> bool {
        match self {
            Self::Exact(n) => n == number,
            Self::Range(lo, hi) => lo <= number && number <= hi,
        }
    }
}

impl fmt::Display for ResidueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

/// A single constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    Keyword(Keyword),
    ResidueName(String),
    AtomName(String),
    ChainName(String),
    ResidueNumber(ResidueNumber),
    Model(usize),
    Element(String),
    AltLoc(String),
    GlobalIndex(u64),
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "{keyword}"),
            Self::ResidueName(name) => f.write_str(name),
            Self::AtomName(name) => write!(f, ".{name}"),
            Self::ChainName(name) => write!(f, ":{name}"),
            Self::ResidueNumber(number) => write!(f, "{number}"),
            Self::Model(model) => write!(f, "/{model}"),
            Self::Element(element) => write!(f, "#{element}"),
            Self::AltLoc(alt_loc) => write!(f, "~{alt_loc}"),
            Self::GlobalIndex(index) => write!(f, "@{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    Filter(Filter),
    Group(Group),
}

impl Rule {
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl From<Filter> for Rule {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl From<Group> for Rule {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

/// An operator applied to child rules, optionally negated.
///
/// A group without an operator combines its rules like `OR`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    pub operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,
    pub rules: Vec<Rule>,
}

impl Group {
    pub fn new(operator: Option<Operator>, rules: Vec<Rule>) -> Self {
        Self {
            operator,
            negate: false,
            rules,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    /// An `OR` over residue names.
    pub fn residue_names(names: &[&str]) -> Self {
        Self::new(
            Some(Operator::Or),
            names
                .iter()
                .map(|name| Filter::ResidueName(name.to_string()).into())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `visit` holds for any filter in the tree.
    pub fn any_filter<F>(&self, visit: &mut F) -> bool
    where
        F: FnMut(&Filter) -> bool,
    {
        self.rules.iter().any(|rule| match rule {
            Rule::Filter(filter) => visit(filter),
            Rule::Group(group) => group.any_filter(visit),
        })
    }

    fn fmt_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = match self.operator {
            Some(Operator::And) => " AND ",
            Some(Operator::Or) => " OR ",
            None => " ",
        };
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str(separator)?;
            }
            match rule {
                Rule::Filter(filter) => write!(f, "{filter}")?,
                Rule::Group(group) if group.negate => write!(f, "{group}")?,
                Rule::Group(group) => write!(f, "( {group} )")?,
            }
        }
        Ok(())
    }
}

// Negated groups print inline as `NOT x` so that re-parsing does not wrap
// them in an extra parenthesized group.
impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.negate {
            return self.fmt_body(f);
        }
        match self.rules.as_slice() {
            [Rule::Filter(filter)] => write!(f, "NOT {filter}"),
            [Rule::Group(group)] if group.negate => write!(f, "NOT {group}"),
            [Rule::Group(group)] => write!(f, "NOT ( {group} )"),
            _ => {
                f.write_str("NOT ( ")?;
                self.fmt_body(f)?;
                f.write_str(" )")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_number_ranges_are_inclusive() {
        let range = ResidueNumber::Range(10, 15);
        assert!(range.contains(10));
        assert!(range.contains(15));
        assert!(!range.contains(9));
        assert!(!range.contains(16));
        assert!(ResidueNumber::Exact(-3).contains(-3));
    }

    #[test]
    fn filters_print_in_selection_syntax() {
        assert_eq!(Filter::AtomName("CA".into()).to_string(), ".CA");
        assert_eq!(Filter::ChainName("B".into()).to_string(), ":B");
        assert_eq!(Filter::ResidueNumber(ResidueNumber::Range(-5, 3)).to_string(), "-5-3");
        assert_eq!(Filter::Model(2).to_string(), "/2");
        assert_eq!(Filter::Element("FE".into()).to_string(), "#FE");
        assert_eq!(Filter::AltLoc("A".into()).to_string(), "~A");
        assert_eq!(Filter::GlobalIndex(42).to_string(), "@42");
        assert_eq!(Filter::Keyword(Keyword::Backbone).to_string(), "BACKBONE");
    }

    #[test]
    fn groups_print_nested_groups_in_parentheses() {
        let group = Group::new(
            Some(Operator::Or),
            vec![
                Filter::ResidueNumber(ResidueNumber::Range(10, 15)).into(),
                Group::new(
                    Some(Operator::And),
                    vec![
                        Filter::Keyword(Keyword::Backbone).into(),
                        Filter::ResidueNumber(ResidueNumber::Range(30, 35)).into(),
                    ],
                )
                .into(),
            ],
        );
        assert_eq!(group.to_string(), "10-15 OR ( BACKBONE AND 30-35 )");
    }

    #[test]
    fn negated_groups_print_inline() {
        let inner = Group::new(None, vec![Filter::ResidueName("MET".into()).into()]).negated();
        let outer = Group::new(None, vec![inner.into()]).negated();
        assert_eq!(outer.to_string(), "NOT NOT MET");

        let turn = Group::new(
            Some(Operator::Or),
            vec![
                Filter::Keyword(Keyword::Helix).into(),
                Filter::Keyword(Keyword::Sheet).into(),
            ],
        )
        .negated();
        assert_eq!(turn.to_string(), "NOT ( HELIX OR SHEET )");
    }

    #[test]
    fn keywords_are_looked_up_by_uppercase_word() {
        assert_eq!(Keyword::from_word("BACKBONE"), Some(Keyword::Backbone));
        assert_eq!(Keyword::from_word("ALL"), None);
        assert_eq!(Keyword::from_word("backbone"), None);
    }

    #[test]
    fn any_filter_descends_into_groups() {
        let group = Group::new(
            Some(Operator::And),
            vec![Group::residue_names(&["GLY", "ALA"]).into()],
        );
        assert!(group.any_filter(&mut |f| matches!(f, Filter::ResidueName(n) if n == "ALA")));
        assert!(!group.any_filter(&mut |f| matches!(f, Filter::AtomName(_))));
    }
}
