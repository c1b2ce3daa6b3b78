//! LALR(1) automaton, obtained by merging LR(1) states with identical cores.

use super::{
    automaton::{Automaton, State, StateID},
    item::{Item, LALR1Item, LR0Item, LR1Item},
};
use crate::{grammar::Token, types::Map};

/// LALR(1) items addressed by their core, so that merging lookaheads into an
/// existing item is an in-place update.
#[derive(Debug, Default)]
struct ItemArena {
    items: Vec<LALR1Item>,
    slots: Map<LR0Item, usize>,
}

impl ItemArena {
    fn add<'a>(&mut self, core: LR0Item, lookaheads: impl IntoIterator<Item = &'a Token>) {
        let slot = *self.slots.entry(core).or_insert_with(|| {
            self.items.push(LALR1Item::new(core));
            self.items.len() - 1
        });
        for lookahead in lookaheads {
            self.items[slot].add_lookahead(lookahead.clone());
        }
    }

    fn into_items(self) -> Vec<LALR1Item> {
        self.items
    }
}

/// Fold LR(1) items sharing a core into one LALR(1) item.
pub fn collapse(items: &[LR1Item]) -> Vec<LALR1Item> {
    let mut arena = ItemArena::default();
    for item in items {
        arena.add(item.core, Some(&item.lookahead));
    }
    arena.into_items()
}

/// Union item lists by core, merging the lookaheads of equal items.
pub fn merge_items<'a>(lists: impl IntoIterator<Item = &'a [LALR1Item]>) -> Vec<LALR1Item> {
    let mut arena = ItemArena::default();
    for item in lists.into_iter().flatten() {
        arena.add(item.core, item.lookaheads());
    }
    arena.into_items()
}

/// Build the LALR(1) automaton from a canonical LR(1) automaton.
///
/// Each LR(1) state is first collapsed into LALR(1) items. States whose kernels
/// have the same LR(0) core then become one state, numbered in the order the
/// cores first occur. A merged state takes its transitions from its first
/// member; all members agree on them since they share a core.
#[tracing::instrument(skip_all)]
pub fn lalr1(lr1: &Automaton<LR1Item>) -> Automaton<LALR1Item> {
    let collapsed: Map<StateID, State<LALR1Item>> = lr1
        .states
        .iter()
        .map(|(&id, state)| {
            let collapsed = State {
                id,
                kernel: collapse(&state.kernel),
                items: collapse(&state.items),
                transitions: state.transitions.clone(),
            };
            (id, collapsed)
        })
        .collect();

    let mut classes = Map::<Vec<LR0Item>, Vec<StateID>>::default();
    let mut merged_ids = Map::<StateID, StateID>::default();
    for (&id, state) in &collapsed {
        let mut core: Vec<LR0Item> = state.kernel.iter().map(|item| item.core).collect();
        core.sort();
        let entry = classes.entry(core);
        // bounded by the number of LR(1) states, which fits in a state ID.
        let merged = StateID::from_raw(entry.index() as u16);
        entry.or_default().push(id);
        merged_ids.insert(id, merged);
    }

    let mut states = Map::default();
    for (index, members) in classes.values().enumerate() {
        let id = StateID::from_raw(index as u16);
        let members: Vec<&State<LALR1Item>> = members.iter().map(|m| &collapsed[m]).collect();
        let Some(first) = members.first() else {
            continue;
        };
        if members.len() > 1 {
            tracing::debug!(
                "merge {:?} into {:?}",
                members.iter().map(|m| m.id).collect::<Vec<_>>(),
                id
            );
        }

        let kernel = merge_items(members.iter().map(|m| &m.kernel[..]));
        let items = merge_items(members.iter().map(|m| &m.items[..]));
        let transitions = first
            .transitions
            .iter()
            .map(|(symbol, next)| (symbol.clone(), merged_ids[next]))
            .collect();
        states.insert(
            id,
            State {
                id,
                kernel,
                items,
                transitions,
            },
        );
    }

    tracing::debug!("{} LR(1) states merged into {}", lr1.len(), states.len());
    Automaton { states }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grammar::{Grammar, ProductionID},
        lr::item::KernelItem,
    };

    #[test]
    fn collapse_unions_lookaheads() {
        let core = LR0Item::new(ProductionID::from_index(0).unwrap(), 0);
        let items = [
            LR1Item {
                core,
                lookahead: Token::from("b"),
            },
            LR1Item {
                core: LR0Item::initial(),
                lookahead: Token::Eof,
            },
            LR1Item {
                core,
                lookahead: Token::from("a"),
            },
        ];
        let collapsed = collapse(&items);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].core, core);
        assert_eq!(
            collapsed[0].lookaheads(),
            &[Token::from("a"), Token::from("b")]
        );
    }

    #[test]
    fn merge_states_with_equal_cores() {
        let g = Grammar::from_str(
            "\
S -> a a A | a b B
A -> C a | D b
B -> C b | D a
C -> E
D -> E
E -> ε
",
        )
        .unwrap();
        let lr1 = Automaton::<LR1Item>::generate(&g).unwrap();
        let lalr = lalr1(&lr1);
        eprintln!("{}", lalr.display(&g));
        assert_eq!(lr1.len(), 17);
        assert_eq!(lalr.len(), 16);

        // C -> E . and D -> E . are reached after both `a a` and `a b`.
        let core = {
            let c = ProductionID::from_index(6).unwrap();
            let d = ProductionID::from_index(7).unwrap();
            vec![LR0Item::new(c, 1), LR0Item::new(d, 1)]
        };
        let lr1_states = lr1
            .states
            .values()
            .filter(|state| state.kernel.iter().map(|item| item.core).eq(core.iter().copied()))
            .count();
        assert_eq!(lr1_states, 2);

        let merged: Vec<_> = lalr
            .states
            .values()
            .filter(|state| state.kernel.iter().map(|item| item.core).eq(core.iter().copied()))
            .collect();
        assert_eq!(merged.len(), 1);
        for item in &merged[0].kernel {
            assert_eq!(item.lookaheads(), &[Token::from("a"), Token::from("b")]);
        }
    }
}
