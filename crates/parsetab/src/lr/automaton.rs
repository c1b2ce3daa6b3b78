//! The canonical collection of LR states.

use super::item::{self, Item, KernelItem};
use crate::{
    grammar::{Grammar, GrammarError, Token},
    types::{Map, Set},
    util::display_fn,
};
use std::{collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl StateID {
    pub const INITIAL: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct State<I> {
    pub id: StateID,
    pub kernel: Vec<I>,
    /// The closure of the kernel, kernel items first.
    pub items: Vec<I>,
    pub transitions: Map<Token, StateID>,
}

impl<I: Item> State<I> {
    /// Items whose dot has reached the end of the body.
    pub fn completed<'a>(&'a self, g: &'a Grammar) -> impl Iterator<Item = &'a I> + 'a {
        self.items.iter().filter(move |item| item.core().is_complete(g))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## kernels:")?;
            for kernel in &self.kernel {
                writeln!(f, "- {}", item::display(kernel, g))?;
            }
            if self.items.len() > self.kernel.len() {
                writeln!(f, "## closure:")?;
                for item in &self.items[self.kernel.len()..] {
                    writeln!(f, "- {}", item::display(item, g))?;
                }
            }
            if !self.transitions.is_empty() {
                writeln!(f, "## transitions:")?;
                for (symbol, to) in &self.transitions {
                    writeln!(f, "- {} => {:?}", symbol, to)?;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone)]
pub struct Automaton<I> {
    pub states: Map<StateID, State<I>>,
}

impl<I: Item> Automaton<I> {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, state)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

impl<I: KernelItem> Automaton<I> {
    /// Build the automaton breadth-first from the augmented start item.
    ///
    /// States are numbered in discovery order, and two kernels denote the same
    /// state when they contain the same items in any order.
    #[tracing::instrument(skip_all)]
    pub fn generate(g: &Grammar) -> Result<Self, GrammarError> {
        let mut states = Map::<StateID, State<I>>::default();
        let mut isocores = Map::<Vec<I>, StateID>::default();
        let mut pending_states = VecDeque::<(StateID, Vec<I>)>::new();

        let initial = vec![I::initial()];
        isocores.insert(initial.clone(), StateID::INITIAL);
        pending_states.push_back((StateID::INITIAL, initial));

        while let Some((current, kernel)) = pending_states.pop_front() {
            let items = closure(g, &kernel)?;

            let mut transitions = Map::default();
            for (symbol, new_kernel) in goto_kernels(g, &items) {
                let next = match isocores.get(&new_kernel) {
                    Some(id) => *id,
                    None => {
                        let raw = u16::try_from(isocores.len())
                            .map_err(|_| GrammarError::from("too many automaton states"))?;
                        let id = StateID(raw);
                        isocores.insert(new_kernel.clone(), id);
                        pending_states.push_back((id, new_kernel));
                        id
                    }
                };
                transitions.insert(symbol, next);
            }

            tracing::trace!(
                "state {:?}: {} kernel items, {} items, {} transitions",
                current,
                kernel.len(),
                items.len(),
                transitions.len()
            );
            states.insert(
                current,
                State {
                    id: current,
                    kernel,
                    items,
                    transitions,
                },
            );
        }

        tracing::debug!("generated {} states", states.len());
        Ok(Self { states })
    }
}

/// Extend a kernel with the items predicted from it until nothing new appears.
pub fn closure<I: KernelItem>(g: &Grammar, kernel: &[I]) -> Result<Vec<I>, GrammarError> {
    let mut items: Set<I> = kernel.iter().cloned().collect();
    let mut predicted = vec![];
    let mut i = 0;
    while i < items.len() {
        items[i].predict(g, &mut predicted)?;
        items.extend(predicted.drain(..));
        i += 1;
    }
    Ok(items.into_iter().collect())
}

/// Group the items by the symbol after the dot and advance the dot.
///
/// The groups keep the order in which their symbols first appear, and each
/// resulting kernel is sorted.
pub fn goto_kernels<I: KernelItem>(g: &Grammar, items: &[I]) -> Map<Token, Vec<I>> {
    let mut kernels: Map<Token, Vec<I>> = Map::default();
    for item in items {
        if let Some(symbol) = item.core().next_symbol(g) {
            kernels
                .entry(symbol.clone())
                .or_default()
                .push(item.shifted());
        }
    }
    for kernel in kernels.values_mut() {
        kernel.sort();
        kernel.dedup();
    }
    kernels
}
