//! Grammar properties: nullability, reachability, FIRST and FOLLOW sets.

use crate::{
    grammar::{Grammar, GrammarError, ProductionID, Token},
    relation::Relation,
    types::{Map, Set},
};

impl Grammar {
    /// Nonterminals that derive the empty string.
    pub fn nullable(&self) -> &Set<Token> {
        self.nullable.get_or_init(|| {
            let mut nullable = Set::default();
            loop {
                let mut changed = false;
                for (_, head, body) in self.rules() {
                    if nullable.contains(head) {
                        continue;
                    }
                    if body.iter().all(|t| nullable.contains(t)) {
                        nullable.insert(head.clone());
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }
            nullable
        })
    }

    /// Nonterminals that derive no terminal string at all.
    pub fn unrealizable(&self) -> &Set<Token> {
        self.unrealizable.get_or_init(|| {
            let mut realizable = Set::default();
            loop {
                let mut changed = false;
                for (_, head, body) in self.rules() {
                    if realizable.contains(head) {
                        continue;
                    }
                    if body
                        .iter()
                        .all(|t| self.is_terminal(t) || realizable.contains(t))
                    {
                        realizable.insert(head.clone());
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }
            self.nonterminals()
                .iter()
                .filter(|n| !realizable.contains(*n))
                .cloned()
                .collect()
        })
    }

    /// Nonterminals that no sentential form derived from the start symbol contains.
    pub fn unreachable(&self) -> &Set<Token> {
        self.unreachable.get_or_init(|| {
            let derives: Relation<Token> = self
                .rules()
                .flat_map(|(_, head, body)| body.iter().map(move |t| (head.clone(), t.clone())))
                .collect();
            let closed = derives.closure();
            let reachable = closed.get(self.start());
            self.nonterminals()
                .iter()
                .filter(|n| *n != self.start())
                .filter(|n| reachable.map_or(true, |r| !r.contains(*n)))
                .cloned()
                .collect()
        })
    }

    /// A witness of `A =>+ A`, where each step picks one body symbol whose
    /// siblings all derive ε. Empty if there is no such cycle.
    pub fn first_cycle(&self) -> &[Token] {
        self.first_cycle.get_or_init(|| {
            let nullable = self.nullable();
            let mut relation = Relation::new();
            for (_, head, body) in self.rules() {
                for (j, symbol) in body.iter().enumerate() {
                    if !self.is_nonterminal(symbol) {
                        continue;
                    }
                    let rest_nullable = body
                        .iter()
                        .enumerate()
                        .all(|(k, t)| k == j || nullable.contains(t));
                    if rest_nullable {
                        relation.add(head.clone(), symbol.clone());
                    }
                }
            }
            relation.cycle()
        })
    }

    /// Rejects a grammar with a FIRST cycle, carrying its witness.
    pub fn check_acyclic(&self) -> Result<(), GrammarError> {
        match self.first_cycle() {
            [] => Ok(()),
            cycle => Err(GrammarError::Cyclic(cycle.to_vec())),
        }
    }

    /// FIRST set of every nonterminal.
    pub fn first_sets(&self) -> &Map<Token, Set<Token>> {
        self.first_sets.get_or_init(|| {
            let nullable = self.nullable();
            let mut immediate = Relation::new();
            let mut propagation = Relation::new();
            for (_, head, body) in self.rules() {
                for symbol in body {
                    if self.is_nonterminal(symbol) {
                        propagation.add(head.clone(), symbol.clone());
                        if !nullable.contains(symbol) {
                            break;
                        }
                    } else {
                        immediate.add(head.clone(), symbol.clone());
                        break;
                    }
                }
            }
            self.per_nonterminal(immediate.propagate(&propagation))
        })
    }

    /// FOLLOW set of every nonterminal. The start symbol is followed by `$`.
    pub fn follow_sets(&self) -> &Map<Token, Set<Token>> {
        self.follow_sets.get_or_init(|| {
            let nullable = self.nullable();
            let first_sets = self.first_sets();

            let mut immediate = Relation::new();
            immediate.add(self.start().clone(), Token::Eof);
            for (_, _, body) in self.rules() {
                for (j, symbol) in body.iter().enumerate() {
                    if !self.is_nonterminal(symbol) {
                        continue;
                    }
                    for next in &body[j + 1..] {
                        if !self.is_nonterminal(next) {
                            immediate.add(symbol.clone(), next.clone());
                            break;
                        }
                        for t in &first_sets[next] {
                            immediate.add(symbol.clone(), t.clone());
                        }
                        if !nullable.contains(next) {
                            break;
                        }
                    }
                }
            }

            let mut propagation = Relation::new();
            for (_, head, body) in self.rules() {
                for symbol in body.iter().rev() {
                    if !self.is_nonterminal(symbol) {
                        break;
                    }
                    propagation.add(symbol.clone(), head.clone());
                    if !nullable.contains(symbol) {
                        break;
                    }
                }
            }

            self.per_nonterminal(immediate.propagate(&propagation))
        })
    }

    fn per_nonterminal(&self, relation: Relation<Token>) -> Map<Token, Set<Token>> {
        let mut sets = relation.into_map();
        self.nonterminals()
            .iter()
            .map(|n| (n.clone(), sets.swap_remove(n).unwrap_or_default()))
            .collect()
    }

    /// The terminals that can begin a string derived from `symbols`.
    ///
    /// `$` stands for itself, so `first_of([A, $])` contains `$` when `A` is nullable.
    pub fn first_of<'a, I>(&self, symbols: I) -> Result<Set<Token>, GrammarError>
    where
        I: IntoIterator<Item = &'a Token>,
    {
        let mut first = Set::default();
        for symbol in symbols {
            if *symbol == Token::Eof || self.is_terminal(symbol) {
                first.insert(symbol.clone());
                break;
            }
            match self.first_sets().get(symbol) {
                Some(set) => first.extend(set.iter().cloned()),
                None => return Err(GrammarError::UnexpectedSymbol(symbol.clone())),
            }
            if !self.nullable().contains(symbol) {
                break;
            }
        }
        Ok(first)
    }

    /// Whether `symbols` derives the empty string.
    pub fn is_nullable_seq<'a, I>(&self, symbols: I) -> Result<bool, GrammarError>
    where
        I: IntoIterator<Item = &'a Token>,
    {
        for symbol in symbols {
            if *symbol == Token::Eof || self.is_terminal(symbol) {
                return Ok(false);
            }
            if !self.is_nonterminal(symbol) {
                return Err(GrammarError::UnexpectedSymbol(symbol.clone()));
            }
            if !self.nullable().contains(symbol) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Productions that give their head a second way to derive ε.
    ///
    /// For every nonterminal, the first production with a nullable body is
    /// fine; each later one is reported.
    pub fn null_ambiguity(&self) -> Vec<ProductionID> {
        let nullable = self.nullable();
        let mut seen = Set::default();
        let mut ambiguous = vec![];
        for (id, head, body) in self.rules() {
            if body.iter().all(|t| nullable.contains(t)) && !seen.insert(head) {
                ambiguous.push(id);
            }
        }
        ambiguous
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        grammar::{Grammar, GrammarError, ProductionID, Token},
        types::Set,
    };

    fn t(name: &str) -> Token {
        Token::from(name)
    }

    fn set(names: &[&str]) -> Set<Token> {
        names.iter().map(|n| t(n)).collect()
    }

    const EXPR: &str = "\
E -> E + T | T
T -> T * F | F
F -> ( E ) | id
";

    #[test]
    fn symbol_partition() {
        let g = Grammar::from_str(EXPR).unwrap();
        assert_eq!(*g.nonterminals(), set(&["E", "T", "F"]));
        assert_eq!(*g.terminals(), set(&["+", "*", "(", ")", "id"]));
        assert!(g.nonterminals().iter().all(|n| !g.is_terminal(n)));
        assert!(g.nullable().is_empty());
    }

    #[test]
    fn first_and_follow() {
        let g = Grammar::from_str(EXPR).unwrap();
        let first = g.first_sets();
        assert_eq!(first[&t("E")], set(&["(", "id"]));
        assert_eq!(first[&t("T")], set(&["(", "id"]));
        assert_eq!(first[&t("F")], set(&["(", "id"]));

        let follow = g.follow_sets();
        assert_eq!(follow[&t("E")], set(&["$", "+", ")"]));
        assert_eq!(follow[&t("T")], set(&["$", "+", ")", "*"]));
        assert_eq!(follow[&t("F")], set(&["$", "+", ")", "*"]));
    }

    #[test]
    fn nullable_prefixes() {
        let g = Grammar::from_str(
            "\
S -> A B c
A -> a | ε
B -> b | ε
",
        )
        .unwrap();
        assert_eq!(*g.nullable(), set(&["A", "B"]));
        assert_eq!(g.first_sets()[&t("S")], set(&["a", "b", "c"]));
        assert_eq!(g.follow_sets()[&t("A")], set(&["b", "c"]));
        assert_eq!(g.follow_sets()[&t("B")], set(&["c"]));
        assert_eq!(g.follow_sets()[&t("S")], set(&["$"]));

        assert_eq!(g.first_of(&[t("A"), t("B")]).unwrap(), set(&["a", "b"]));
        assert_eq!(
            g.first_of(&[t("A"), t("B"), Token::Eof]).unwrap(),
            set(&["a", "b", "$"])
        );
        assert!(g.is_nullable_seq(&[t("A"), t("B")]).unwrap());
        assert!(!g.is_nullable_seq(&[t("A"), t("c")]).unwrap());
        assert!(g.is_nullable_seq(std::iter::empty()).unwrap());
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        let g = Grammar::from_str(EXPR).unwrap();
        assert!(matches!(
            g.first_of(&[t("nope")]),
            Err(GrammarError::UnexpectedSymbol(..))
        ));
        assert!(matches!(
            g.is_nullable_seq(&[Token::Empty]),
            Err(GrammarError::UnexpectedSymbol(Token::Empty))
        ));
    }

    #[test]
    fn unreachable_and_unrealizable() {
        let g = Grammar::from_str(
            "\
S -> a | B
B -> b B
X -> x
",
        )
        .unwrap();
        assert_eq!(*g.unreachable(), set(&["X"]));
        assert_eq!(*g.unrealizable(), set(&["B"]));
    }

    #[test]
    fn first_cycle_witness() {
        let g = Grammar::from_str(
            "\
A -> B | a
B -> C A
C -> c | ε
",
        )
        .unwrap();
        let cycle = g.first_cycle();
        assert!(!cycle.is_empty());
        assert_eq!(cycle.first(), cycle.last());
        match g.check_acyclic() {
            Err(GrammarError::Cyclic(witness)) => assert_eq!(witness, cycle),
            res => panic!("unexpected result: {:?}", res),
        }

        let g = Grammar::from_str(EXPR).unwrap();
        assert!(g.first_cycle().is_empty());
        g.check_acyclic().unwrap();
    }

    #[test]
    fn null_ambiguity() {
        let g = Grammar::from_str(
            "\
A -> B | C | a
B -> ε
C -> ε
",
        )
        .unwrap();
        assert_eq!(g.null_ambiguity(), vec![ProductionID::from_index(1).unwrap()]);

        let g = Grammar::from_str("A -> ε | ε | a").unwrap();
        assert_eq!(g.null_ambiguity(), vec![ProductionID::from_index(1).unwrap()]);
    }

    #[test]
    fn cached_results_are_stable() {
        let g = Grammar::from_str(EXPR).unwrap();
        assert!(std::ptr::eq(g.first_sets(), g.first_sets()));
        assert!(std::ptr::eq(g.follow_sets(), g.follow_sets()));
        assert_eq!(g.first_cycle(), g.first_cycle());
    }
}
