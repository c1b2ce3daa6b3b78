//! LL(1) predictive parse table.

use super::{ClassificationError, Discipline, Error, Parsing, Render};
use crate::{
    grammar::{Grammar, GrammarError, ProductionID, Token},
    types::{Map, Set},
    util::display_fn,
};
use once_cell::unsync::OnceCell;
use std::fmt;

/// One row per nonterminal, keyed by lookahead terminal.
#[derive(Debug)]
pub struct LL1Table {
    pub rows: Map<Token, LL1Row>,
}

#[derive(Debug, Default)]
pub struct LL1Row {
    /// Productions predicted on each lookahead. More than one means a conflict.
    pub entries: Map<Token, Vec<ProductionID>>,
}

impl LL1Row {
    fn insert(&mut self, token: Token, production: ProductionID) {
        let entry = self.entries.entry(token).or_default();
        if !entry.contains(&production) {
            entry.push(production);
        }
    }
}

impl LL1Table {
    pub fn get(&self, nonterminal: &Token, terminal: &Token) -> &[ProductionID] {
        self.rows
            .get(nonterminal)
            .and_then(|row| row.entries.get(terminal))
            .map_or(&[], |entry| entry.as_slice())
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| self.render(g, f))
    }
}

impl Render for LL1Table {
    fn render(&self, g: &Grammar, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (nonterminal, row)) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "#### Nonterminal {}", nonterminal)?;
            for (token, productions) in &row.entries {
                match &productions[..] {
                    [production] => {
                        let production = g.production(*production);
                        writeln!(f, "- {} => {}", token, production.display(g))?;
                    }
                    productions => {
                        writeln!(f, "- {} => conflict", token)?;
                        for production in productions {
                            writeln!(f, "  - {}", g.production(*production).display(g))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Predict each production on FIRST of its body, and also on FOLLOW of its
/// head when the body is nullable.
#[tracing::instrument(skip_all)]
pub fn generate(g: &Grammar) -> Result<LL1Table, GrammarError> {
    let mut rows: Map<Token, LL1Row> = g
        .nonterminals()
        .iter()
        .map(|n| (n.clone(), LL1Row::default()))
        .collect();

    for (id, head, body) in g.rules() {
        let row = &mut rows[head];
        for token in g.first_of(body)? {
            row.insert(token, id);
        }
        if g.is_nullable_seq(body)? {
            if let Some(follow) = g.follow_sets().get(head) {
                for token in follow {
                    row.insert(token.clone(), id);
                }
            }
        }
    }

    Ok(LL1Table { rows })
}

#[derive(Debug)]
pub struct LL1Parsing<'g> {
    grammar: &'g Grammar,
    table: OnceCell<LL1Table>,
}

impl<'g> LL1Parsing<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            table: OnceCell::new(),
        }
    }

    fn check(&self) -> Result<(), Error> {
        let g = self.grammar;

        let ambiguous = g.null_ambiguity().first().copied();
        if let Some((production, head, _)) = g.rules().find(|(id, ..)| Some(*id) == ambiguous) {
            return Err(ClassificationError::NullAmbiguity {
                nonterminal: head.clone(),
                production,
            }
            .into());
        }

        let mut claimed = Map::<&Token, Set<Token>>::default();
        for (_, head, body) in g.rules() {
            let seen = claimed.entry(head).or_default();
            for terminal in g.first_of(body)? {
                if seen.contains(&terminal) {
                    return Err(ClassificationError::FirstSetClash {
                        nonterminal: head.clone(),
                        terminal,
                    }
                    .into());
                }
                seen.insert(terminal);
            }
        }

        let (first_sets, follow_sets) = (g.first_sets(), g.follow_sets());
        for nonterminal in g.nullable() {
            let (Some(first), Some(follow)) =
                (first_sets.get(nonterminal), follow_sets.get(nonterminal))
            else {
                continue;
            };
            if let Some(terminal) = first.iter().find(|t| follow.contains(*t)) {
                return Err(ClassificationError::FirstFollowClash {
                    nonterminal: nonterminal.clone(),
                    terminal: terminal.clone(),
                }
                .into());
            }
        }

        Ok(())
    }
}

impl Parsing for LL1Parsing<'_> {
    type Table = LL1Table;

    fn grammar(&self) -> &Grammar {
        self.grammar
    }

    fn discipline(&self) -> Discipline {
        Discipline::LL1
    }

    fn table(&self) -> Result<&LL1Table, GrammarError> {
        self.table.get_or_try_init(|| {
            self.grammar.check_acyclic()?;
            generate(self.grammar)
        })
    }

    /// Checks, in order: null ambiguity, alternatives with overlapping FIRST
    /// sets, and nullable nonterminals whose FIRST and FOLLOW sets overlap.
    #[tracing::instrument(skip_all)]
    fn classify(&self) -> Result<(), Error> {
        self.table()?;
        self.check().map_err(|err| {
            tracing::debug!("LL(1) classification failed: {}", err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_recursion_clashes() {
        let g = Grammar::from_str("E -> E + a | a").unwrap();
        let parsing = LL1Parsing::new(&g);
        let table = parsing.table().unwrap();
        assert_eq!(table.get(&Token::from("E"), &Token::from("a")).len(), 2);
        assert!(matches!(
            parsing.classify(),
            Err(Error::Classification(
                ClassificationError::FirstSetClash { .. }
            ))
        ));
    }

    #[test]
    fn nullable_first_follow_clash() {
        let g = Grammar::from_str("S -> A a\nA -> a | ε").unwrap();
        let err = LL1Parsing::new(&g).classify().unwrap_err();
        match err {
            Error::Classification(ClassificationError::FirstFollowClash {
                nonterminal,
                terminal,
            }) => {
                assert_eq!(nonterminal, Token::from("A"));
                assert_eq!(terminal, Token::from("a"));
            }
            err => panic!("unexpected error: {:?}", err),
        }
    }

    #[test]
    fn null_ambiguity_comes_first() {
        let g = Grammar::from_str("S -> A | B\nA -> ε\nB -> ε").unwrap();
        assert!(matches!(
            LL1Parsing::new(&g).classify(),
            Err(Error::Classification(
                ClassificationError::NullAmbiguity { .. }
            ))
        ));
    }

    #[test]
    fn nullable_entries_use_follow() {
        let g = Grammar::from_str("S -> A b\nA -> a | ε").unwrap();
        let parsing = LL1Parsing::new(&g);
        parsing.classify().unwrap();
        let table = parsing.table().unwrap();
        let a = Token::from("A");
        assert_eq!(
            table.get(&a, &Token::from("a")),
            &[ProductionID::from_index(1).unwrap()]
        );
        assert_eq!(
            table.get(&a, &Token::from("b")),
            &[ProductionID::from_index(2).unwrap()]
        );
        assert!(table.get(&a, &Token::Eof).is_empty());
        eprintln!("{}", table.display(&g));
    }
}
