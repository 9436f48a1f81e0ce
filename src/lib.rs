//! # psystem
//!
//! A membrane-computing (P-system) simulator: a tree of nested
//! membranes, each holding a multiset of symbolic objects, rewritten
//! step by step by a set of probabilistic rules under either
//! minimally- or maximally-parallel derivation semantics.
//!
//! ## Pipeline
//!
//! ```text
//! System { alphabet, MembraneArena, RuleTable, OutputSpec, Semantics }
//!     ↓
//! [Applicability Engine]   → which rules are ready, per membrane
//!     ↓
//! [Derivation Engine]      → which of those fire, at what multiplicity
//!     ↓
//! [Simulation Driver]      → apply queued firings, observe, repeat until
//!                             a fixed point or `max_steps`
//!     ↓
//! TraceSink / OutputSink
//! ```
//!
//! ## Module organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `symbol` | Interned object symbols and the declared alphabet |
//! | `multiset` | Multiset algebra (the core value type) |
//! | `rule` | Rule descriptors, move codes, DMEM targets |
//! | `membrane` | The generational-arena membrane tree and its `apply_*` operations |
//! | `rules_table` | `(membrane-id, rule-kind) -> Vec<Rule>` storage |
//! | `applicability` | Which rules are ready in a given membrane |
//! | `derivation` | Minimally-/maximally-parallel rule selection |
//! | `driver` | The top-level step loop |
//! | `observers` | Trace and output-CSV sinks |
//! | `system` | Ties the above into one runnable value |
//! | `rng` | The injectable PRNG surface |
//! | `config` | `psystem.toml` / environment configuration |
//! | `error` | The crate's error taxonomy |

pub mod applicability;
pub mod config;
pub mod derivation;
pub mod driver;
pub mod error;
pub mod membrane;
pub mod multiset;
pub mod observers;
pub mod rng;
pub mod rule;
pub mod rules_table;
pub mod symbol;
pub mod system;

pub use crate::derivation::Semantics;
pub use crate::error::{DomainError, PSystemError, ResourceError, StructuralError};
pub use crate::membrane::{ApplyOutcome, MembraneArena, MembraneId, MembraneNode};
pub use crate::multiset::Multiset;
pub use crate::rule::{MoveCode, Rule, RuleKind, RuleRight};
pub use crate::rules_table::RuleTable;
pub use crate::symbol::{Alphabet, Symbol};
pub use crate::system::System;
