//! LR automata over the three item flavors.

pub mod automaton;
pub mod item;
pub mod lalr;

pub use self::{
    automaton::{Automaton, State, StateID},
    item::{Item, KernelItem, LALR1Item, LR0Item, LR1Item},
};
