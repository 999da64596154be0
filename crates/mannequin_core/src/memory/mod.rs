//! # Memory Management
//!
//! Pre-allocated arenas for stage-scoped allocations.
//!
//! ## Design Philosophy
//!
//! All slots are reserved when the arena is created. While a stage runs:
//! - No reallocation
//! - No per-object free
//! - One wholesale reset when the next stage loads

mod arena;

pub use arena::{Arena, ArenaHandle};
