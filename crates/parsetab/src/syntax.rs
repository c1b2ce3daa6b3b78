//! Grammar text input.
//!
//! One production group per line: `Head -> body | body ...`. `=>` may be used
//! instead of `->`, and `ε` marks an empty alternative.

pub mod lexer;

use self::lexer::{Lexer, Spanned, Token};
use crate::grammar::Production;

pub fn parse(source: &str) -> anyhow::Result<Vec<Production>> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let mut productions = vec![];
    let mut pending = Pending::default();
    for spanned in Lexer::new(source) {
        let (start, token, _end): Spanned = spanned.map_err(|err| {
            anyhow::anyhow!(
                "line {}, column {}: invalid token ({:?})",
                err.location.line + 1,
                err.location.col + 1,
                err.kind
            )
        })?;
        tracing::trace!("token {:?}", token);
        let line = start.line as usize + 1;
        match token {
            Token::Symbol(symbol) if pending.in_body => pending.body.push(symbol),
            Token::Symbol(symbol) => pending.head.push(symbol),
            Token::Empty => {}
            Token::Arrow => {
                if pending.in_body {
                    anyhow::bail!("line {}: unexpected arrow in production body", line);
                }
                pending.in_body = true;
            }
            Token::Choice => {
                productions.push(pending.emit(productions.len(), line)?);
            }
            Token::Eol => {
                if !pending.is_blank() {
                    productions.push(pending.emit(productions.len(), line)?);
                }
                pending = Pending::default();
            }
        }
    }
    if !pending.is_blank() {
        let line = source.lines().count().max(1);
        productions.push(pending.emit(productions.len(), line)?);
    }

    Ok(productions)
}

#[derive(Default)]
struct Pending<'input> {
    head: Vec<&'input str>,
    body: Vec<&'input str>,
    in_body: bool,
}

impl<'input> Pending<'input> {
    fn is_blank(&self) -> bool {
        self.head.is_empty() && !self.in_body
    }

    /// Finish the current production. The head is kept for the next alternative.
    fn emit(&mut self, index: usize, line: usize) -> anyhow::Result<Production> {
        if !self.in_body {
            anyhow::bail!("line {}: missing arrow", line);
        }
        let head = match self.head[..] {
            [head] => head,
            [] => anyhow::bail!("line {}: missing production head", line),
            _ => anyhow::bail!(
                "line {}: expected a single head symbol, found `{}`",
                line,
                self.head.join(" ")
            ),
        };
        Ok(Production::rule(head, self.body.drain(..), index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternatives_share_the_head() {
        let productions = parse("A -> B | x C | y A\nB -> C B\n\nC -> r").unwrap();
        let expected = [
            Production::rule("A", ["B"], 0),
            Production::rule("A", ["x", "C"], 1),
            Production::rule("A", ["y", "A"], 2),
            Production::rule("B", ["C", "B"], 3),
            Production::rule("C", ["r"], 4),
        ];
        assert_eq!(productions, expected);
        for (i, p) in productions.iter().enumerate() {
            assert_eq!(p.index(), Some(i));
        }
    }

    #[test]
    fn empty_alternatives() {
        let productions = parse("E -> ε | e\n").unwrap();
        assert!(productions[0].body().is_empty());
        assert_eq!(productions[1].body().len(), 1);
    }

    #[test]
    fn syntax_errors() {
        assert!(parse("A -> b -> c").is_err());
        assert!(parse("A B -> c").is_err());
        assert!(parse("-> c").is_err());
        assert!(parse("A b").is_err());
        assert!(parse("A | b").is_err());
    }

    #[test]
    fn errors_carry_the_line() {
        let err = parse("A -> b\nB c").unwrap_err();
        assert_eq!(err.to_string(), "line 2: missing arrow");

        let err = crate::grammar::Grammar::from_str("A -> b\n\nC -> d -> e").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);
    }
}
