//! Parse tables for the supported parsing disciplines, and the checks that
//! decide whether a grammar is deterministic under each of them.
//!
//! Building a table never fails on a conflict; conflicting actions are kept in
//! the table and reported by [`Parsing::classify`].

pub mod ll1;
pub mod lr0;
pub mod lr1;
pub mod slr1;

pub use self::{
    ll1::{LL1Parsing, LL1Table},
    lr0::{LR0Parsing, LR0Table},
    lr1::{Actions, LALR1Parsing, LR1Parsing, LR1Table},
    slr1::SLR1Parsing,
};

use crate::{
    grammar::{Grammar, GrammarError, ProductionID, Token},
    lr::{Automaton, Item, StateID},
};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Discipline {
    #[value(name = "ll1")]
    LL1,
    #[value(name = "lr0")]
    LR0,
    #[value(name = "slr1")]
    SLR1,
    #[value(name = "lr1")]
    LR1,
    #[value(name = "lalr1")]
    LALR1,
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LL1 => "LL(1)",
            Self::LR0 => "LR(0)",
            Self::SLR1 => "SLR(1)",
            Self::LR1 => "LR(1)",
            Self::LALR1 => "LALR(1)",
        })
    }
}

/// Why a grammar is not deterministic under a discipline.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("`{nonterminal}` derives ε through more than one production ({production:?})")]
    NullAmbiguity {
        nonterminal: Token,
        production: ProductionID,
    },

    #[error("alternatives of `{nonterminal}` may both begin with `{terminal}`")]
    FirstSetClash { nonterminal: Token, terminal: Token },

    #[error("`{terminal}` is both in FIRST and FOLLOW of nullable `{nonterminal}`")]
    FirstFollowClash { nonterminal: Token, terminal: Token },

    #[error("{discipline}: reduce/reduce conflict in state {state}{}", on_token(.token))]
    ReduceReduce {
        discipline: Discipline,
        state: StateID,
        /// `None` for LR(0), whose reductions ignore the lookahead.
        token: Option<Token>,
    },

    #[error("{discipline}: shift/reduce conflict in state {state}{}", on_token(.token))]
    ShiftReduce {
        discipline: Discipline,
        state: StateID,
        /// For LR(0), the first terminal the reducing state also shifts.
        token: Option<Token>,
    },
}

fn on_token(token: &Option<Token>) -> String {
    match token {
        Some(token) => format!(" on `{}`", token),
        None => String::new(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid grammar")]
    Grammar(
        #[from]
        #[source]
        GrammarError,
    ),

    #[error("grammar rejected")]
    Classification(
        #[from]
        #[source]
        ClassificationError,
    ),
}

/// Table construction and classification under one discipline.
///
/// Implementations borrow the grammar and build their automaton and table on
/// first use; later calls return the cached values.
///
/// A grammar with a FIRST cycle is rejected with [`GrammarError::Cyclic`]
/// before any table is built.
pub trait Parsing {
    type Table: Render;

    fn grammar(&self) -> &Grammar;

    fn discipline(&self) -> Discipline;

    fn table(&self) -> Result<&Self::Table, GrammarError>;

    /// Succeeds iff the table has no conflicting entries.
    fn classify(&self) -> Result<(), Error>;
}

/// The LR disciplines, whose tables are read off an automaton.
pub trait LRParsing: Parsing {
    type Item: Item;

    fn automaton(&self) -> Result<&Automaton<Self::Item>, GrammarError>;
}

/// Human-readable rendering of a parse table.
pub trait Render {
    fn render(&self, g: &Grammar, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Classify `g` under `discipline`.
pub fn classify(g: &Grammar, discipline: Discipline) -> Result<(), Error> {
    match discipline {
        Discipline::LL1 => LL1Parsing::new(g).classify(),
        Discipline::LR0 => LR0Parsing::new(g).classify(),
        Discipline::SLR1 => SLR1Parsing::new(g).classify(),
        Discipline::LR1 => LR1Parsing::new(g).classify(),
        Discipline::LALR1 => LALR1Parsing::new(g).classify(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = ClassificationError::ShiftReduce {
            discipline: Discipline::SLR1,
            state: StateID::from_raw(2),
            token: Some(Token::from("=")),
        };
        assert_eq!(
            err.to_string(),
            "SLR(1): shift/reduce conflict in state 2 on `=`"
        );

        let err = ClassificationError::ReduceReduce {
            discipline: Discipline::LR0,
            state: StateID::from_raw(4),
            token: None,
        };
        assert_eq!(err.to_string(), "LR(0): reduce/reduce conflict in state 4");
    }

    #[test]
    fn discipline_names() {
        use clap::ValueEnum as _;
        for discipline in Discipline::value_variants() {
            let name = discipline.to_possible_value().unwrap();
            assert_eq!(
                Discipline::from_str(name.get_name(), false),
                Ok(*discipline)
            );
        }
        assert_eq!(Discipline::from_str("lalr1", false), Ok(Discipline::LALR1));
        assert_eq!(Discipline::from_str("LL1", true), Ok(Discipline::LL1));
    }

    #[test]
    fn cyclic_grammars_are_rejected_first() {
        let g = Grammar::from_str("S -> x\nX -> Y\nY -> X").unwrap();
        for discipline in [
            Discipline::LL1,
            Discipline::LR0,
            Discipline::SLR1,
            Discipline::LR1,
            Discipline::LALR1,
        ] {
            match classify(&g, discipline) {
                Err(Error::Grammar(GrammarError::Cyclic(cycle))) => {
                    let names: Vec<_> = cycle.iter().map(Token::as_str).collect();
                    assert_eq!(names, ["X", "Y", "X"], "{}", discipline);
                }
                res => panic!("{}: expected a cyclic grammar error, got {:?}", discipline, res),
            }
        }

        assert!(matches!(
            LR1Parsing::new(&g).table(),
            Err(GrammarError::Cyclic(..))
        ));
        assert!(matches!(
            LR0Parsing::new(&g).automaton(),
            Err(GrammarError::Cyclic(..))
        ));
    }
}
