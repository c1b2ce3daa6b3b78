//! SLR(1): the LR(0) automaton with reductions keyed by FOLLOW sets.

use super::{Discipline, Error, LR1Table, LRParsing, Parsing};
use crate::{
    grammar::{Grammar, GrammarError, Token},
    lr::{Automaton, LR0Item},
};
use once_cell::unsync::OnceCell;

/// A completed item reduces on FOLLOW of its head; the augmented one on `$`.
pub fn generate(g: &Grammar, automaton: &Automaton<LR0Item>) -> LR1Table {
    LR1Table::generate(g, automaton, |item| {
        match g.production(item.production).head() {
            None => vec![Token::Eof],
            Some(head) => g
                .follow_sets()
                .get(head)
                .map(|follow| follow.iter().cloned().collect())
                .unwrap_or_default(),
        }
    })
}

#[derive(Debug)]
pub struct SLR1Parsing<'g> {
    grammar: &'g Grammar,
    automaton: OnceCell<Automaton<LR0Item>>,
    table: OnceCell<LR1Table>,
}

impl<'g> SLR1Parsing<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            automaton: OnceCell::new(),
            table: OnceCell::new(),
        }
    }
}

impl LRParsing for SLR1Parsing<'_> {
    type Item = LR0Item;

    fn automaton(&self) -> Result<&Automaton<LR0Item>, GrammarError> {
        self.automaton.get_or_try_init(|| {
            self.grammar.check_acyclic()?;
            Automaton::generate(self.grammar)
        })
    }
}

impl Parsing for SLR1Parsing<'_> {
    type Table = LR1Table;

    fn grammar(&self) -> &Grammar {
        self.grammar
    }

    fn discipline(&self) -> Discipline {
        Discipline::SLR1
    }

    fn table(&self) -> Result<&LR1Table, GrammarError> {
        self.table.get_or_try_init(|| {
            let automaton = self.automaton()?;
            Ok(generate(self.grammar, automaton))
        })
    }

    #[tracing::instrument(skip_all)]
    fn classify(&self) -> Result<(), Error> {
        self.table()?.classify(self.discipline())?;
        Ok(())
    }
}
