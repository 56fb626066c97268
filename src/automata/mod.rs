//! LR automaton infrastructure.
//!
//! Provides the item types and the automaton construction pipeline:
//! `Grammar -> kernel closure -> lookahead propagation -> state expansion`
//!
//! Two construction strategies share the machinery: canonical LR(1)
//! (distinct states per distinct lookahead set) and LALR(1) (states merged
//! by kernel core, with lookahead union and cascading re-expansion).
//! States reference each other by id through an owning state vector, never
//! by back-pointer.

pub mod build;
pub mod closure;
pub mod item;

pub use build::{Automaton, AutomatonStats, State};
pub use closure::FirstCache;
pub use item::{Lr0Item, Lr1Item};

/// Identifier for an automaton state: the index into the owning
/// [`Automaton`]'s state vector, assigned at registration in creation
/// order.
pub type StateId = usize;
