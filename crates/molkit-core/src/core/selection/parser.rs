//! Stateful, left-to-right parser for selection strings.
//!
//! There is no operator precedence table. The parser keeps a stack of open
//! contexts and rewrites it as tokens arrive:
//!
//! - `AND` inside an `OR` context moves the last rule into a new `AND`
//!   context, so `a OR b AND c` reads as `a OR (b AND c)`;
//! - `OR` inside an `AND` context closes it;
//! - `NOT` opens a negated context that closes as soon as its one operand
//!   (a token, a parenthesized group or another `NOT`) is complete;
//! - parentheses open and close nested contexts; `)` also closes any
//!   `AND` context opened inside the parentheses.

use super::ast::{Filter, Group, Keyword, Operator, ResidueNumber, Rule};
use super::error::SelectionError;
use phf::{Map, phf_map};

const ALL_WORDS: [&str; 3] = ["*", "", "ALL"];

static RESIDUE_CLASSES: Map<&'static str, &'static [&'static str]> = phf_map! {
    "SMALL" => &["GLY", "ALA"],
    "NUCLEOPHILIC" => &["SER", "THR", "CYS"],
    "HYDROPHOBIC" => &["VAL", "LEU", "ILE", "MET", "PRO"],
    "AROMATIC" => &["PHE", "TYR", "TRP"],
    "AMIDE" => &["ASN", "GLN"],
    "ACIDIC" => &["ASP", "GLU"],
    "BASIC" => &["HIS", "LYS", "ARG"],
    "CHARGED" => &["ASP", "GLU", "HIS", "LYS", "ARG"],
    "POLAR" => &["ASP", "GLU", "HIS", "LYS", "ARG", "ASN", "GLN", "SER", "THR", "TYR"],
    "NONPOLAR" => &["ALA", "CYS", "GLY", "ILE", "LEU", "MET", "PHE", "PRO", "VAL", "TRP"],
};

enum Slot {
    Filter(Filter),
    Node(usize),
}

#[derive(Default)]
struct Node {
    operator: Option<Operator>,
    negate: bool,
    parenthesized: bool,
    rules: Vec<Slot>,
}

/// Open contexts, kept in an arena so the stack can refer to them by index.
struct Contexts {
    nodes: Vec<Node>,
    root: usize,
    current: usize,
    stack: Vec<usize>,
}

impl Contexts {
    fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            root: 0,
            current: 0,
            stack: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Node {
        &mut self.nodes[self.current]
    }

    fn allocate(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Opens a child context of the current one and makes it current.
    fn open(&mut self, operator: Option<Operator>) {
        let id = self.allocate(Node {
            operator,
            ..Node::default()
        });
        self.nodes[self.current].rules.push(Slot::Node(id));
        self.stack.push(self.current);
        self.current = id;
    }

    /// Returns to the parent context. Closing the root wraps it in a new
    /// root carrying `operator`.
    fn close(&mut self, operator: Option<Operator>) {
        let old = self.current;
        match self.stack.pop() {
            Some(parent) => self.current = parent,
            None => {
                let id = self.allocate(Node {
                    operator,
                    rules: vec![Slot::Node(old)],
                    ..Node::default()
                });
                self.root = id;
                self.current = id;
            }
        }
    }

    /// Moves the current context's rules into a child carrying its old
    /// operator and gives the current context `operator` instead.
    fn regroup(&mut self, operator: Operator) {
        let node = self.current();
        let child = Node {
            operator: node.operator.replace(operator),
            rules: std::mem::take(&mut node.rules),
            ..Node::default()
        };
        let id = self.allocate(child);
        self.current().rules.push(Slot::Node(id));
    }

    /// Closes every negated context whose operand is now complete.
    fn close_negations(&mut self) {
        while self.nodes[self.current].negate {
            self.close(None);
        }
    }

    /// Handles `)`: closes contexts up to and including the innermost
    /// parenthesized one. Without an open parenthesis only the current
    /// context is closed.
    fn close_parenthesis(&mut self) {
        let open = self.nodes[self.current].parenthesized
            || self.stack.iter().any(|&id| self.nodes[id].parenthesized);
        if !open {
            self.close(None);
            return;
        }
        loop {
            let parenthesized = self.nodes[self.current].parenthesized;
            self.close(None);
            if parenthesized {
                break;
            }
        }
    }

    fn push(&mut self, rule: Rule) {
        let slot = self.insert(rule);
        self.current().rules.push(slot);
    }

    fn insert(&mut self, rule: Rule) -> Slot {
        match rule {
            Rule::Filter(filter) => Slot::Filter(filter),
            Rule::Group(group) => {
                let rules = group.rules.into_iter().map(|r| self.insert(r)).collect();
                Slot::Node(self.allocate(Node {
                    operator: group.operator,
                    negate: group.negate,
                    parenthesized: false,
                    rules,
                }))
            }
        }
    }

    fn into_group(mut self) -> Group {
        let root = self.root;
        build(&mut self.nodes, root)
    }
}

fn build(nodes: &mut [Node], id: usize) -> Group {
    let node = std::mem::take(&mut nodes[id]);
    Group {
        operator: node.operator,
        negate: node.negate,
        rules: node
            .rules
            .into_iter()
            .map(|slot| match slot {
                Slot::Filter(filter) => Rule::Filter(filter),
                Slot::Node(child) => Rule::Group(build(nodes, child)),
            })
            .collect(),
    }
}

/// Parses a selection string into its rule tree.
///
/// The empty string parses to an empty group, which selects everything.
pub fn parse(input: &str) -> Result<Group, SelectionError> {
    if input.is_empty() {
        return Ok(Group::default());
    }

    let spaced = input.replace('(', " ( ").replace(')', " ) ");
    let mut text = spaced.trim();
    if text.starts_with('(') && text.ends_with(')') {
        text = text[1..text.len() - 1].trim();
    }
    let chunks: Vec<&str> = if text.is_empty() {
        vec![""]
    } else {
        text.split_whitespace().collect()
    };

    let mut contexts = Contexts::new();

    for chunk in chunks {
        match chunk {
            "(" => {
                contexts.open(None);
                contexts.current().parenthesized = true;
                continue;
            }
            ")" => {
                contexts.close_parenthesis();
                contexts.close_negations();
                continue;
            }
            _ => {}
        }

        let word = chunk.to_ascii_uppercase();
        match word.as_str() {
            "AND" => {
                if contexts.current().operator == Some(Operator::Or) {
                    let last = contexts.current().rules.pop();
                    contexts.open(Some(Operator::And));
                    if let Some(last) = last {
                        contexts.current().rules.push(last);
                    }
                } else {
                    contexts.current().operator = Some(Operator::And);
                }
            }
            "OR" => {
                if contexts.current().operator == Some(Operator::And) {
                    if contexts.current().parenthesized {
                        contexts.regroup(Operator::Or);
                    } else {
                        contexts.close(Some(Operator::Or));
                    }
                } else {
                    contexts.current().operator = Some(Operator::Or);
                }
            }
            "NOT" => {
                contexts.open(None);
                contexts.current().negate = true;
            }
            _ => {
                contexts.push(parse_chunk(chunk, &word)?);
                contexts.close_negations();
            }
        }
    }

    let mut root = contexts.into_group();
    if root.operator.is_none() && root.rules.len() == 1 && root.rules[0].is_group() {
        if let Some(Rule::Group(inner)) = root.rules.pop() {
            root = inner;
        }
    }
    Ok(root)
}

fn parse_chunk(chunk: &str, word: &str) -> Result<Rule, SelectionError> {
    if word == "HYDROGEN" {
        return Ok(Filter::Element("H".to_string()).into());
    }
    if let Some(keyword) = Keyword::from_word(word) {
        return Ok(Filter::Keyword(keyword).into());
    }
    if let Some(names) = RESIDUE_CLASSES.get(word) {
        return Ok(Group::residue_names(names).into());
    }
    match word {
        "TURN" => return Ok(turn().into()),
        "SIDECHAINATTACHED" => return Ok(sidechain_attached().into()),
        _ if ALL_WORDS.contains(&word) => return Ok(Filter::Keyword(Keyword::All).into()),
        _ => {}
    }

    if let Some(index) = chunk.strip_prefix('@') {
        return leading_integer(index)
            .and_then(|i| u64::try_from(i).ok())
            .map(|i| Filter::GlobalIndex(i).into())
            .ok_or_else(|| SelectionError::InvalidGlobalIndex {
                token: chunk.to_string(),
            });
    }
    if let Some(element) = chunk.strip_prefix('#') {
        return Ok(Filter::Element(element.to_ascii_uppercase()).into());
    }
    if let Some(alt_loc) = chunk.strip_prefix('~') {
        return Ok(Filter::AltLoc(alt_loc.to_string()).into());
    }
    if is_residue_name(chunk) {
        return Ok(Filter::ResidueName(word.to_string()).into());
    }

    parse_locus(chunk)
}

fn turn() -> Group {
    Group::new(
        Some(Operator::Or),
        vec![
            Filter::Keyword(Keyword::Helix).into(),
            Filter::Keyword(Keyword::Sheet).into(),
        ],
    )
    .negated()
}

fn sidechain_attached() -> Group {
    Group::new(
        Some(Operator::Or),
        vec![
            Group::new(
                Some(Operator::And),
                vec![
                    Filter::ResidueName("PRO".to_string()).into(),
                    Filter::AtomName("N".to_string()).into(),
                ],
            )
            .into(),
            Filter::Keyword(Keyword::Sidechain).into(),
            Filter::AtomName("CA".to_string()).into(),
            Filter::AtomName("BB".to_string()).into(),
        ],
    )
}

/// One to four characters, free of locus separators, not starting with a
/// number.
fn is_residue_name(chunk: &str) -> bool {
    (1..=4).contains(&chunk.chars().count())
        && !chunk.contains([':', '.', '/'])
        && leading_integer(chunk).is_none()
}

/// `[resno[-resno]][:chain][.atom][/model]`; each present part becomes its
/// own rule so that coarse levels can still evaluate the parts they know.
fn parse_locus(chunk: &str) -> Result<Rule, SelectionError> {
    let token = || chunk.to_string();
    let mut rules: Vec<Rule> = Vec::new();

    let mut model_parts = chunk.split('/');
    let head = model_parts.next().unwrap_or_default();
    if let Some(model) = model_parts.next().filter(|m| !m.is_empty()) {
        let model = leading_integer(model)
            .and_then(|m| usize::try_from(m).ok())
            .ok_or_else(|| SelectionError::InvalidModel { token: token() })?;
        rules.push(Filter::Model(model).into());
    }

    let mut atom_parts = head.split('.');
    let head = atom_parts.next().unwrap_or_default();
    if let Some(atom) = atom_parts.next().filter(|a| !a.is_empty()) {
        if atom.chars().count() > 4 {
            return Err(SelectionError::InvalidAtomName { token: token() });
        }
        rules.push(Filter::AtomName(atom.to_ascii_uppercase()).into());
    }

    let mut chain_parts = head.split(':');
    let mut residue = chain_parts.next().unwrap_or_default();
    let mut chain = chain_parts.next().filter(|c| !c.is_empty());

    // `A:10-15` names the chain first.
    if let Some(name) = chain {
        if !residue.is_empty()
            && leading_integer(residue).is_none()
            && parse_residue_number(name, chunk).is_ok()
        {
            chain = Some(residue);
            residue = name;
        }
    }

    if let Some(name) = chain {
        rules.push(Filter::ChainName(name.to_string()).into());
    }
    if !residue.is_empty() {
        rules.push(Filter::ResidueNumber(parse_residue_number(residue, chunk)?).into());
    }

    match rules.len() {
        0 => Err(SelectionError::EmptyChunk { token: token() }),
        1 => Ok(rules.remove(0)),
        _ => Ok(Group::new(Some(Operator::And), rules).into()),
    }
}

/// `n` or `lo-hi`. A `-` at the start of either bound is a sign.
fn parse_residue_number(text: &str, chunk: &str) -> Result<ResidueNumber, SelectionError> {
    let integer = |part: &str| {
        leading_integer(part)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| SelectionError::InvalidResidueNumber {
                token: chunk.to_string(),
            })
    };
    let separator = |part: &str| {
        part.char_indices()
            .skip(1)
            .find(|&(_, c)| c == '-')
            .map(|(i, _)| i)
    };

    match separator(text) {
        None => Ok(ResidueNumber::Exact(integer(text)?)),
        Some(i) => {
            let (lo, hi) = (&text[..i], &text[i + 1..]);
            if separator(hi).is_some() {
                return Err(SelectionError::InvalidResidueRange {
                    token: chunk.to_string(),
                });
            }
            Ok(ResidueNumber::Range(integer(lo)?, integer(hi)?))
        }
    }
}

/// The integer spelled by the start of `text` (optional sign, then digits),
/// ignoring whatever follows, so `"10A"` reads as 10.
fn leading_integer(text: &str) -> Option<i64> {
    let sign = usize::from(text.starts_with(['+', '-']));
    let digits = text[sign..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    text[..sign + digits].parse().ok()
}
