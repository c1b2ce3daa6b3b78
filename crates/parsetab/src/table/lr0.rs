//! LR(0) parse table.

use super::{ClassificationError, Discipline, Error, LRParsing, Parsing, Render};
use crate::{
    grammar::{Grammar, GrammarError, ProductionID, Token},
    lr::{Automaton, LR0Item, StateID},
    types::Map,
    util::display_fn,
};
use once_cell::unsync::OnceCell;
use std::fmt;

#[derive(Debug)]
pub struct LR0Table {
    pub states: Map<StateID, LR0Row>,
}

/// Reductions of an LR(0) state do not depend on the lookahead.
#[derive(Debug, Default)]
pub struct LR0Row {
    /// Transitions on terminals and nonterminals alike.
    pub shifts: Map<Token, StateID>,
    /// `ProductionID::AUGMENTED` here means accept.
    pub reduces: Vec<ProductionID>,
}

impl LR0Table {
    /// Rejects a state with two reductions, or with a reduction and a shift
    /// on a terminal.
    pub fn classify(&self, g: &Grammar) -> Result<(), ClassificationError> {
        for (&state, row) in &self.states {
            if row.reduces.len() > 1 {
                return Err(ClassificationError::ReduceReduce {
                    discipline: Discipline::LR0,
                    state,
                    token: None,
                });
            }
            if row.reduces.is_empty() {
                continue;
            }
            if let Some(token) = row.shifts.keys().find(|t| g.is_terminal(t)) {
                return Err(ClassificationError::ShiftReduce {
                    discipline: Discipline::LR0,
                    state,
                    token: Some(token.clone()),
                });
            }
        }
        Ok(())
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| self.render(g, f))
    }
}

impl Render for LR0Table {
    fn render(&self, g: &Grammar, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, row)) in self.states.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "#### State {:?}", id)?;
            if !row.shifts.is_empty() {
                writeln!(f, "## shifts")?;
                for (symbol, next) in &row.shifts {
                    writeln!(f, "- {} => shift({:?})", symbol, next)?;
                }
            }
            if !row.reduces.is_empty() {
                writeln!(f, "## reduces")?;
                for &reduce in &row.reduces {
                    match reduce {
                        ProductionID::AUGMENTED => writeln!(f, "- accept")?,
                        reduce => writeln!(f, "- {}", g.production(reduce).display(g))?,
                    }
                }
            }
        }
        Ok(())
    }
}

pub fn generate(g: &Grammar, automaton: &Automaton<LR0Item>) -> LR0Table {
    let mut states = Map::default();
    for (&id, state) in &automaton.states {
        let mut reduces = vec![];
        for item in state.completed(g) {
            if !reduces.contains(&item.production) {
                reduces.push(item.production);
            }
        }
        states.insert(
            id,
            LR0Row {
                shifts: state.transitions.clone(),
                reduces,
            },
        );
    }
    LR0Table { states }
}

#[derive(Debug)]
pub struct LR0Parsing<'g> {
    grammar: &'g Grammar,
    automaton: OnceCell<Automaton<LR0Item>>,
    table: OnceCell<LR0Table>,
}

impl<'g> LR0Parsing<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            automaton: OnceCell::new(),
            table: OnceCell::new(),
        }
    }
}

impl LRParsing for LR0Parsing<'_> {
    type Item = LR0Item;

    fn automaton(&self) -> Result<&Automaton<LR0Item>, GrammarError> {
        self.automaton.get_or_try_init(|| {
            self.grammar.check_acyclic()?;
            Automaton::generate(self.grammar)
        })
    }
}

impl Parsing for LR0Parsing<'_> {
    type Table = LR0Table;

    fn grammar(&self) -> &Grammar {
        self.grammar
    }

    fn discipline(&self) -> Discipline {
        Discipline::LR0
    }

    fn table(&self) -> Result<&LR0Table, GrammarError> {
        self.table.get_or_try_init(|| {
            let automaton = self.automaton()?;
            Ok(generate(self.grammar, automaton))
        })
    }

    #[tracing::instrument(skip_all)]
    fn classify(&self) -> Result<(), Error> {
        self.table()?.classify(self.grammar)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_state() {
        let g = Grammar::from_str("S -> ( S ) | x").unwrap();
        let parsing = LR0Parsing::new(&g);
        parsing.classify().unwrap();

        let table = parsing.table().unwrap();
        eprintln!("{}", table.display(&g));
        let accept = &table.states[&StateID::from_raw(1)];
        assert_eq!(accept.reduces, vec![ProductionID::AUGMENTED]);
        assert!(accept.shifts.is_empty());
    }

    #[test]
    fn epsilon_rules_conflict() {
        // the empty alternative reduces in the same state that shifts `a`.
        let g = Grammar::from_str("S -> a S | ε").unwrap();
        match LR0Parsing::new(&g).classify() {
            Err(Error::Classification(ClassificationError::ShiftReduce {
                discipline: Discipline::LR0,
                state,
                token,
            })) => {
                assert_eq!(state, StateID::INITIAL);
                assert_eq!(token, Some(Token::from("a")));
            }
            res => panic!("unexpected result: {:?}", res),
        }
    }

    #[test]
    fn reduce_reduce() {
        let g = Grammar::from_str("S -> A | B\nA -> x\nB -> x").unwrap();
        let err = LR0Parsing::new(&g).classify().unwrap_err();
        assert!(matches!(
            err,
            Error::Classification(ClassificationError::ReduceReduce { token: None, .. })
        ));
    }

    #[test]
    fn cached() {
        let g = Grammar::from_str("S -> x").unwrap();
        let parsing = LR0Parsing::new(&g);
        assert!(std::ptr::eq(
            parsing.automaton().unwrap(),
            parsing.automaton().unwrap()
        ));
        assert!(std::ptr::eq(parsing.table().unwrap(), parsing.table().unwrap()));
    }
}
