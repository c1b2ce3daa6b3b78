//! Context-free grammar analysis and parse table construction for the
//! LL(1), LR(0), SLR(1), LR(1) and LALR(1) disciplines.

mod analysis;

pub mod grammar;
pub mod lr;
pub mod relation;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;

pub use crate::{
    grammar::{Grammar, GrammarError, Production, ProductionID, Token},
    table::{
        classify, ClassificationError, Discipline, Error, LALR1Parsing, LL1Parsing, LR0Parsing,
        LR1Parsing, LRParsing, Parsing, Render, SLR1Parsing,
    },
};
