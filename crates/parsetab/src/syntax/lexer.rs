//! Lexer implementation.

use lexgen_util::Loc;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'input> {
    Arrow,
    Choice,
    Empty,
    Eol,
    Symbol(&'input str),
}

pub type Spanned<'input> = (Loc, Token<'input>, Loc);

lexgen::lexer! {
    pub Lexer -> Token<'input>;

    let blank = [' ' '\t' '\r'];
    let symbol_char = _ # [' ' '\t' '\r' '\n' '|'];

    rule Init {
        $blank+,
        '\n' = Token::Eol,
        '|' = Token::Choice,
        "->" = Token::Arrow,
        "=>" = Token::Arrow,
        'ε' = Token::Empty,
        $symbol_char+ => |lexer| {
            let token = Token::Symbol(lexer.match_());
            lexer.return_(token)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Token::*;

    #[test]
    fn smoketest() {
        let input = "\
S -> a B | ε
B => b\t$ (x)
";
        let lexer = Lexer::new(input);
        let tokens = lexer
            .map(|res| res.map(|(_, t, _)| t))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(matches!(
            dbg!(&tokens[..]),
            [
                Symbol("S"),
                Arrow,
                Symbol("a"),
                Symbol("B"),
                Choice,
                Empty,
                Eol,
                Symbol("B"),
                Arrow,
                Symbol("b"),
                Symbol("$"),
                Symbol("(x)"),
                Eol,
            ]
        ));
    }

    #[test]
    fn arrows_inside_symbols() {
        let tokens = Lexer::new("->x a|b εε")
            .map(|res| res.map(|(_, t, _)| t))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            tokens,
            vec![Symbol("->x"), Symbol("a"), Choice, Symbol("b"), Symbol("εε")]
        );
    }
}
