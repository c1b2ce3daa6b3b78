//! Lookahead-driven LR tables, shared by SLR(1), LR(1) and LALR(1).

use super::{ClassificationError, Discipline, Error, LRParsing, Parsing, Render};
use crate::{
    grammar::{Grammar, GrammarError, ProductionID, Token},
    lr::{lalr, Automaton, Item, LALR1Item, LR1Item, StateID},
    types::Map,
    util::display_fn,
};
use once_cell::unsync::OnceCell;
use std::fmt;

#[derive(Debug)]
pub struct LR1Table {
    pub states: Map<StateID, LR1Row>,
}

#[derive(Debug, Default)]
#[non_exhaustive]
pub struct LR1Row {
    pub actions: Map<Token, Actions>,
    pub gotos: Map<Token, StateID>,
}

/// Every action a state may take on one lookahead.
///
/// The entry is deterministic when it holds exactly one shift or exactly one
/// reduce. Adding the same reduction twice keeps a single copy.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Actions {
    pub shift: Option<StateID>,
    /// `ProductionID::AUGMENTED` here means accept.
    pub reduces: Vec<ProductionID>,
}

impl Actions {
    pub fn is_consistent(&self) -> bool {
        matches!((self.shift, self.reduces.len()), (Some(_), 0) | (None, 1))
    }

    fn add_reduce(&mut self, production: ProductionID) {
        if !self.reduces.contains(&production) {
            self.reduces.push(production);
        }
    }
}

impl LR1Table {
    /// Build a row per state; `reduce_on` lists the lookaheads of a completed item.
    pub fn generate<I, F>(g: &Grammar, automaton: &Automaton<I>, reduce_on: F) -> Self
    where
        I: Item,
        F: Fn(&I) -> Vec<Token>,
    {
        let mut states = Map::default();
        for (&id, state) in &automaton.states {
            let mut row = LR1Row::default();
            for (symbol, &next) in &state.transitions {
                if g.is_nonterminal(symbol) {
                    row.gotos.insert(symbol.clone(), next);
                } else {
                    row.actions.entry(symbol.clone()).or_default().shift = Some(next);
                }
            }
            for item in state.completed(g) {
                for token in reduce_on(item) {
                    row.actions
                        .entry(token)
                        .or_default()
                        .add_reduce(item.core().production);
                }
            }
            states.insert(id, row);
        }
        Self { states }
    }

    pub fn action(&self, state: StateID, token: &Token) -> Option<&Actions> {
        self.states.get(&state)?.actions.get(token)
    }

    /// Rejects any entry with two reductions, or with a shift and a reduction.
    pub fn classify(&self, discipline: Discipline) -> Result<(), ClassificationError> {
        for (&state, row) in &self.states {
            for (token, actions) in &row.actions {
                if actions.reduces.len() > 1 {
                    return Err(ClassificationError::ReduceReduce {
                        discipline,
                        state,
                        token: Some(token.clone()),
                    });
                }
                if actions.shift.is_some() && !actions.reduces.is_empty() {
                    return Err(ClassificationError::ShiftReduce {
                        discipline,
                        state,
                        token: Some(token.clone()),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| self.render(g, f))
    }
}

impl Render for LR1Table {
    fn render(&self, g: &Grammar, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, row)) in self.states.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            writeln!(f, "#### State {:?}", id)?;
            writeln!(f, "## actions")?;
            for (token, actions) in &row.actions {
                match (actions.shift, &actions.reduces[..]) {
                    (Some(next), []) => {
                        writeln!(f, "- {} => shift({:?})", token, next)?;
                    }
                    (None, [ProductionID::AUGMENTED]) => {
                        writeln!(f, "- {} => accept", token)?;
                    }
                    (None, [reduce]) => {
                        let reduce = g.production(*reduce);
                        writeln!(f, "- {} => reduce({})", token, reduce.display(g))?;
                    }
                    (shift, reduces) => {
                        writeln!(f, "- {} => inconsistent", token)?;
                        if let Some(next) = shift {
                            writeln!(f, "  - shift({:?})", next)?;
                        }
                        for reduce in reduces {
                            let reduce = g.production(*reduce);
                            writeln!(f, "  - reduce({})", reduce.display(g))?;
                        }
                    }
                }
            }

            if !row.gotos.is_empty() {
                writeln!(f, "## gotos")?;
                for (symbol, goto) in &row.gotos {
                    writeln!(f, "- {} => goto({:?})", symbol, goto)?;
                }
            }
        }
        Ok(())
    }
}

/// Completed items reduce on their own lookaheads.
fn lookaheads<I: Item>(item: &I) -> Vec<Token> {
    item.lookaheads().to_vec()
}

#[derive(Debug)]
pub struct LR1Parsing<'g> {
    grammar: &'g Grammar,
    automaton: OnceCell<Automaton<LR1Item>>,
    table: OnceCell<LR1Table>,
}

impl<'g> LR1Parsing<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            automaton: OnceCell::new(),
            table: OnceCell::new(),
        }
    }
}

impl LRParsing for LR1Parsing<'_> {
    type Item = LR1Item;

    /// The canonical LR(1) automaton.
    fn automaton(&self) -> Result<&Automaton<LR1Item>, GrammarError> {
        self.automaton.get_or_try_init(|| {
            self.grammar.check_acyclic()?;
            Automaton::generate(self.grammar)
        })
    }
}

impl Parsing for LR1Parsing<'_> {
    type Table = LR1Table;

    fn grammar(&self) -> &Grammar {
        self.grammar
    }

    fn discipline(&self) -> Discipline {
        Discipline::LR1
    }

    fn table(&self) -> Result<&LR1Table, GrammarError> {
        self.table.get_or_try_init(|| {
            let automaton = self.automaton()?;
            Ok(LR1Table::generate(self.grammar, automaton, lookaheads))
        })
    }

    #[tracing::instrument(skip_all)]
    fn classify(&self) -> Result<(), Error> {
        self.table()?.classify(self.discipline())?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct LALR1Parsing<'g> {
    lr1: LR1Parsing<'g>,
    automaton: OnceCell<Automaton<LALR1Item>>,
    table: OnceCell<LR1Table>,
}

impl<'g> LALR1Parsing<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            lr1: LR1Parsing::new(grammar),
            automaton: OnceCell::new(),
            table: OnceCell::new(),
        }
    }

    /// The canonical LR(1) automaton the merged one is derived from.
    pub fn lr1_automaton(&self) -> Result<&Automaton<LR1Item>, GrammarError> {
        self.lr1.automaton()
    }
}

impl LRParsing for LALR1Parsing<'_> {
    type Item = LALR1Item;

    fn automaton(&self) -> Result<&Automaton<LALR1Item>, GrammarError> {
        self.automaton
            .get_or_try_init(|| Ok(lalr::lalr1(self.lr1.automaton()?)))
    }
}

impl Parsing for LALR1Parsing<'_> {
    type Table = LR1Table;

    fn grammar(&self) -> &Grammar {
        self.lr1.grammar
    }

    fn discipline(&self) -> Discipline {
        Discipline::LALR1
    }

    fn table(&self) -> Result<&LR1Table, GrammarError> {
        self.table.get_or_try_init(|| {
            let automaton = self.automaton()?;
            Ok(LR1Table::generate(self.lr1.grammar, automaton, lookaheads))
        })
    }

    #[tracing::instrument(skip_all)]
    fn classify(&self) -> Result<(), Error> {
        self.table()?.classify(self.discipline())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTERS: &str = "\
S -> L = R | R
L -> * R | id
R -> L
";

    #[test]
    fn lr1_accepts_on_end_of_input() {
        let g = Grammar::from_str(POINTERS).unwrap();
        let parsing = LR1Parsing::new(&g);
        parsing.classify().unwrap();
        let table = parsing.table().unwrap();
        eprintln!("{}", table.display(&g));
        assert_eq!(
            table.action(StateID::from_raw(1), &Token::Eof),
            Some(&Actions {
                shift: None,
                reduces: vec![ProductionID::AUGMENTED],
            })
        );
    }

    #[test]
    fn lalr1_accepts_pointer_grammar() {
        let g = Grammar::from_str(POINTERS).unwrap();
        let parsing = LALR1Parsing::new(&g);
        parsing.classify().unwrap();
        assert!(parsing.automaton().unwrap().len() < parsing.lr1_automaton().unwrap().len());
    }

    #[test]
    fn duplicate_reductions_do_not_conflict() {
        let mut actions = Actions::default();
        let p = ProductionID::from_index(0).unwrap();
        actions.add_reduce(p);
        actions.add_reduce(p);
        assert_eq!(actions.reduces.len(), 1);
        assert!(actions.is_consistent());

        actions.shift = Some(StateID::from_raw(3));
        assert!(!actions.is_consistent());
    }
}
