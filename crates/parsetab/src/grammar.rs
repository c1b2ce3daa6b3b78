//! Grammar types.

use crate::{
    types::{Map, Set},
    util::display_fn,
};
use once_cell::unsync::OnceCell;
use std::{
    fmt, fs,
    hash::{Hash, Hasher},
    io,
    path::Path,
    sync::Arc,
};

/// A grammar symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    /// A terminal or nonterminal symbol. Which one it is depends on the grammar:
    /// symbols that head a production are nonterminals.
    Symbol(Arc<str>),

    /// The end of input, written as `$`.
    Eof,

    /// The empty string, written as `ε`.
    Empty,
}

impl Token {
    pub fn symbol(name: &str) -> Self {
        Self::Symbol(name.into())
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(..))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Symbol(name) => name,
            Self::Eof => "$",
            Self::Empty => "ε",
        }
    }
}

impl From<&str> for Token {
    fn from(name: &str) -> Self {
        match name {
            "$" => Self::Eof,
            name => Self::symbol(name),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A production rule.
///
/// Equality only looks at the head and the body; `index` is a label for
/// diagnostics.
#[derive(Debug, Clone)]
pub enum Production {
    /// The implicit `$start -> S` rule seeding every LR automaton.
    Augmented,

    Rule {
        head: Token,
        body: Vec<Token>,
        index: usize,
    },
}

impl Production {
    pub fn rule<B, T>(head: impl Into<Token>, body: B, index: usize) -> Self
    where
        B: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        Self::Rule {
            head: head.into(),
            body: body.into_iter().map(Into::into).collect(),
            index,
        }
    }

    pub fn head(&self) -> Option<&Token> {
        match self {
            Self::Augmented => None,
            Self::Rule { head, .. } => Some(head),
        }
    }

    pub fn body(&self) -> &[Token] {
        match self {
            Self::Augmented => &[],
            Self::Rule { body, .. } => body,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Augmented => None,
            Self::Rule { index, .. } => Some(*index),
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Augmented => write!(f, "$start -> {}", g.start()),
            Self::Rule { head, body, .. } => {
                write!(f, "{} -> ", head)?;
                if body.is_empty() {
                    f.write_str("ε")
                } else {
                    crate::util::write_joined(f, body)
                }
            }
        })
    }
}

impl PartialEq for Production {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Augmented, Self::Augmented) => true,
            (
                Self::Rule { head, body, .. },
                Self::Rule {
                    head: other_head,
                    body: other_body,
                    ..
                },
            ) => head == other_head && body == other_body,
            _ => false,
        }
    }
}
impl Eq for Production {}

impl Hash for Production {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let Self::Rule { head, body, .. } = self {
            head.hash(state);
            body.hash(state);
        }
    }
}

/// The position of a production in its grammar.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}
impl ProductionID {
    /// Reserved for the augmented production. Reducing it means accept.
    pub const AUGMENTED: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    /// The ID of the user production with the given index.
    pub fn from_index(index: usize) -> Option<Self> {
        u16::try_from(index)
            .ok()?
            .checked_add(Self::OFFSET)
            .map(Self::new)
    }

    /// The index of the user production, or `None` for the augmented one.
    pub fn index(self) -> Option<usize> {
        self.raw.checked_sub(Self::OFFSET).map(usize::from)
    }

    #[inline]
    fn position(self) -> usize {
        usize::from(self.raw)
    }
}
impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "P#{:03}", index),
            None => f.write_str("P#accept"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(anyhow::Error),

    #[error("the grammar has no productions")]
    Empty,

    #[error("unexpected symbol `{}`", _0)]
    UnexpectedSymbol(Token),

    #[error("the grammar is cyclic: {}", cycle_path(_0))]
    Cyclic(Vec<Token>),

    #[error("Other error: {}", msg)]
    Other { msg: String },
}
fn cycle_path(cycle: &[Token]) -> String {
    cycle
        .iter()
        .map(Token::as_str)
        .collect::<Vec<_>>()
        .join(" => ")
}

impl From<&str> for GrammarError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}
impl From<String> for GrammarError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}

/// A context-free grammar together with its lazily computed properties.
#[derive(Debug)]
pub struct Grammar {
    /// All productions, the augmented one at position zero.
    productions: Vec<Production>,
    start: Token,
    terminals: Set<Token>,
    nonterminals: Set<Token>,
    /// Structurally distinct productions per nonterminal.
    alternatives: Map<Token, Vec<ProductionID>>,

    pub(crate) nullable: OnceCell<Set<Token>>,
    pub(crate) unreachable: OnceCell<Set<Token>>,
    pub(crate) unrealizable: OnceCell<Set<Token>>,
    pub(crate) first_cycle: OnceCell<Vec<Token>>,
    pub(crate) first_sets: OnceCell<Map<Token, Set<Token>>>,
    pub(crate) follow_sets: OnceCell<Map<Token, Set<Token>>>,
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        Self::from_str(&source)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Grammar, GrammarError> {
        let productions = crate::syntax::parse(source).map_err(GrammarError::Syntax)?;
        Self::new(productions)
    }

    /// Build a grammar from a list of productions.
    ///
    /// The head of the first production is the start symbol.
    #[tracing::instrument(skip_all)]
    pub fn new(rules: Vec<Production>) -> Result<Self, GrammarError> {
        if rules.is_empty() {
            return Err(GrammarError::Empty);
        }
        if ProductionID::from_index(rules.len()).is_none() {
            return Err("too many productions".into());
        }

        let mut nonterminals = Set::default();
        for rule in &rules {
            let head = rule
                .head()
                .ok_or_else(|| GrammarError::from("augmented production in rule list"))?;
            if !head.is_symbol() {
                return Err(GrammarError::UnexpectedSymbol(head.clone()));
            }
            if u16::try_from(rule.body().len()).is_err() {
                return Err(format!("production body of `{}` is too long", head).into());
            }
            nonterminals.insert(head.clone());
        }

        let mut terminals = Set::default();
        for token in rules.iter().flat_map(Production::body) {
            if !token.is_symbol() {
                return Err(GrammarError::UnexpectedSymbol(token.clone()));
            }
            if !nonterminals.contains(token) {
                terminals.insert(token.clone());
            }
        }

        let start = nonterminals[0].clone();

        let mut productions = Vec::with_capacity(rules.len() + 1);
        productions.push(Production::Augmented);
        productions.extend(rules);

        let mut alternatives: Map<Token, Vec<ProductionID>> = nonterminals
            .iter()
            .map(|n| (n.clone(), vec![]))
            .collect();
        let mut seen = Set::default();
        for (position, production) in productions.iter().enumerate().skip(1) {
            if !seen.insert(production) {
                tracing::debug!("duplicated production: {:?}", production);
                continue;
            }
            if let Some(head) = production.head() {
                alternatives[head].push(ProductionID::new(position as u16));
            }
        }

        tracing::debug!(
            "grammar: {} productions, {} terminals, {} nonterminals",
            productions.len() - 1,
            terminals.len(),
            nonterminals.len()
        );

        Ok(Self {
            productions,
            start,
            terminals,
            nonterminals,
            alternatives,
            nullable: OnceCell::new(),
            unreachable: OnceCell::new(),
            unrealizable: OnceCell::new(),
            first_cycle: OnceCell::new(),
            first_sets: OnceCell::new(),
            follow_sets: OnceCell::new(),
        })
    }

    /// The start symbol, i.e. the head of the first production.
    pub fn start(&self) -> &Token {
        &self.start
    }

    pub fn terminals(&self) -> &Set<Token> {
        &self.terminals
    }

    pub fn nonterminals(&self) -> &Set<Token> {
        &self.nonterminals
    }

    pub fn is_terminal(&self, token: &Token) -> bool {
        self.terminals.contains(token)
    }

    pub fn is_nonterminal(&self, token: &Token) -> bool {
        self.nonterminals.contains(token)
    }

    /// Look up a production. Panics on an ID from another grammar.
    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[id.position()]
    }

    /// The user productions, in their original order.
    pub fn productions(&self) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions
            .iter()
            .enumerate()
            .skip(1)
            .map(|(position, p)| (ProductionID::new(position as u16), p))
    }

    /// The user productions as `(id, head, body)`.
    pub(crate) fn rules(&self) -> impl Iterator<Item = (ProductionID, &Token, &[Token])> + '_ {
        self.productions()
            .filter_map(|(id, p)| Some((id, p.head()?, p.body())))
    }

    /// The body of a production. The augmented production derives the start symbol.
    pub fn body(&self, id: ProductionID) -> &[Token] {
        match self.production(id) {
            Production::Augmented => std::slice::from_ref(&self.start),
            production => production.body(),
        }
    }

    /// The structurally distinct productions headed by `nonterminal`.
    pub fn alternatives(&self, nonterminal: &Token) -> &[ProductionID] {
        self.alternatives
            .get(nonterminal)
            .map_or(&[], |ids| ids.as_slice())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, production) in self.productions() {
            if let Some(index) = id.index() {
                writeln!(f, "{}: {}", index, production.display(self))?;
            }
        }
        Ok(())
    }
}
