//! Kernel items of the LR automata.

use crate::{
    grammar::{Grammar, GrammarError, Production, ProductionID, Token},
    util::display_fn,
};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// The LR(0) item, a.k.a. LR item core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub production: ProductionID,
    pub index: u16,
}

impl LR0Item {
    pub const fn new(production: ProductionID, index: u16) -> Self {
        Self { production, index }
    }

    /// The symbol right after the dot.
    pub fn next_symbol<'g>(&self, g: &'g Grammar) -> Option<&'g Token> {
        g.body(self.production).get(usize::from(self.index))
    }

    /// The symbols following the one after the dot.
    pub fn rest<'g>(&self, g: &'g Grammar) -> &'g [Token] {
        g.body(self.production)
            .get(usize::from(self.index) + 1..)
            .unwrap_or(&[])
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.next_symbol(g).is_none()
    }

    pub fn shifted(self) -> Self {
        Self {
            index: self.index + 1,
            ..self
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = g.production(self.production);
            match production {
                Production::Augmented => f.write_str("$start ->")?,
                _ => write!(f, "{} ->", production.head().map_or("?", Token::as_str))?,
            }
            let body = g.body(self.production);
            for (i, symbol) in body.iter().enumerate() {
                if i == usize::from(self.index) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", symbol)?;
            }
            if body.len() == usize::from(self.index) {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// An LR(0) item carrying exactly one lookahead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR1Item {
    pub core: LR0Item,
    pub lookahead: Token,
}

/// An LR(0) item carrying the lookaheads of every LR(1) item merged into it.
///
/// Two items are equal when their cores are; the lookaheads are not compared.
#[derive(Debug, Clone)]
pub struct LALR1Item {
    pub core: LR0Item,
    lookaheads: Vec<Token>,
}

impl LALR1Item {
    pub fn new(core: LR0Item) -> Self {
        Self {
            core,
            lookaheads: vec![],
        }
    }

    /// Returns `false` if the lookahead was already present.
    pub fn add_lookahead(&mut self, token: Token) -> bool {
        match self.lookaheads.binary_search(&token) {
            Ok(_) => false,
            Err(pos) => {
                self.lookaheads.insert(pos, token);
                true
            }
        }
    }
}

impl PartialEq for LALR1Item {
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core
    }
}
impl Eq for LALR1Item {}

impl Hash for LALR1Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.core.hash(state);
    }
}

/// Common view over the item flavors.
pub trait Item: Clone + fmt::Debug {
    fn core(&self) -> LR0Item;

    /// The tokens on which a completed item reduces. Empty for LR(0) items.
    fn lookaheads(&self) -> &[Token];
}

impl Item for LR0Item {
    fn core(&self) -> LR0Item {
        *self
    }
    fn lookaheads(&self) -> &[Token] {
        &[]
    }
}

impl Item for LR1Item {
    fn core(&self) -> LR0Item {
        self.core
    }
    fn lookaheads(&self) -> &[Token] {
        std::slice::from_ref(&self.lookahead)
    }
}

impl Item for LALR1Item {
    fn core(&self) -> LR0Item {
        self.core
    }
    fn lookaheads(&self) -> &[Token] {
        &self.lookaheads
    }
}

/// Items from which the canonical collection is built.
///
/// Kernels of these items are compared as sorted vectors, so `Ord` and `Eq`
/// decide which states are the same.
pub trait KernelItem: Item + Ord + Hash {
    /// The item seeding the initial state.
    fn initial() -> Self;

    fn shifted(&self) -> Self;

    /// Push the items introduced by the nonterminal after the dot, if any.
    fn predict(&self, g: &Grammar, predicted: &mut Vec<Self>) -> Result<(), GrammarError>;
}

impl KernelItem for LR0Item {
    fn initial() -> Self {
        Self::new(ProductionID::AUGMENTED, 0)
    }

    fn shifted(&self) -> Self {
        LR0Item::shifted(*self)
    }

    fn predict(&self, g: &Grammar, predicted: &mut Vec<Self>) -> Result<(), GrammarError> {
        if let Some(next) = self.next_symbol(g) {
            for &production in g.alternatives(next) {
                predicted.push(Self::new(production, 0));
            }
        }
        Ok(())
    }
}

impl KernelItem for LR1Item {
    fn initial() -> Self {
        Self {
            core: LR0Item::initial(),
            lookahead: Token::Eof,
        }
    }

    fn shifted(&self) -> Self {
        Self {
            core: self.core.shifted(),
            lookahead: self.lookahead.clone(),
        }
    }

    fn predict(&self, g: &Grammar, predicted: &mut Vec<Self>) -> Result<(), GrammarError> {
        let next = match self.core.next_symbol(g) {
            Some(next) if g.is_nonterminal(next) => next,
            _ => return Ok(()),
        };
        let lookaheads = g.first_of(self.core.rest(g).iter().chain(Some(&self.lookahead)))?;
        for &production in g.alternatives(next) {
            for lookahead in &lookaheads {
                predicted.push(Self {
                    core: LR0Item::new(production, 0),
                    lookahead: lookahead.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn display<'g, I: Item>(item: &'g I, g: &'g Grammar) -> impl fmt::Display + 'g {
    display_fn(move |f| {
        let core = item.core();
        write!(f, "[{}", core.display(g))?;
        let lookaheads = item.lookaheads();
        if !lookaheads.is_empty() {
            f.write_str(", ")?;
            crate::util::write_joined(f, lookaheads)?;
        }
        f.write_str("]")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lalr(core: LR0Item, lookaheads: &[&str]) -> LALR1Item {
        let mut item = LALR1Item::new(core);
        for &t in lookaheads {
            item.add_lookahead(Token::from(t));
        }
        item
    }

    #[test]
    fn equality_by_flavor() {
        let p = ProductionID::from_index(0).unwrap();
        let core = LR0Item::new(p, 1);
        assert_eq!(core, LR0Item::new(p, 1));
        assert_ne!(core, core.shifted());

        let a = LR1Item {
            core,
            lookahead: Token::from("a"),
        };
        let b = LR1Item {
            core,
            lookahead: Token::from("b"),
        };
        assert_ne!(a, b);

        assert_eq!(lalr(core, &["a"]), lalr(core, &["b", "c"]));
        assert_ne!(lalr(core, &["a"]), lalr(core.shifted(), &["a"]));
    }

    #[test]
    fn lookaheads_stay_sorted_and_unique() {
        let mut item = LALR1Item::new(LR0Item::initial());
        assert!(item.add_lookahead(Token::from("b")));
        assert!(item.add_lookahead(Token::from("a")));
        assert!(!item.add_lookahead(Token::from("b")));
        assert!(item.add_lookahead(Token::Eof));
        assert_eq!(item.lookaheads().len(), 3);
        assert!(item.lookaheads().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn display_dot_position() {
        let g = Grammar::from_str("S -> a S b | ε").unwrap();
        let p = ProductionID::from_index(0).unwrap();
        assert_eq!(LR0Item::new(p, 1).display(&g).to_string(), "S -> a . S b");
        assert_eq!(LR0Item::new(p, 3).display(&g).to_string(), "S -> a S b .");
        assert_eq!(
            LR0Item::initial().display(&g).to_string(),
            "$start -> . S"
        );
        let item = LR1Item::initial();
        assert_eq!(display(&item, &g).to_string(), "[$start -> . S, $]");
    }
}
