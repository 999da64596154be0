//! # MANNEQUIN Core
//!
//! Fixed-budget building blocks for stage-scoped model allocation:
//! - Arenas whose capacity is decided once and never grows
//! - Handles that become detectably stale when their arena is reset
//! - A seeded random stream so every roster load can be replayed
//!
//! ## Architecture Rules
//!
//! 1. **No growth after creation** - capacity is reserved up front
//! 2. **No individual frees** - a stage's models die together on reset
//! 3. **No hidden randomness** - callers own and pass the stream
//!
//! ## Example
//!
//! ```rust,ignore
//! use mannequin_core::{Arena, RandomStream};
//!
//! let mut arena: Arena<u32> = Arena::new(32);
//! let handle = arena.alloc(7).expect("fresh arena has room");
//! arena.reset();
//! assert!(arena.get(handle).is_none());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::perf)]

pub mod memory;
pub mod random;

pub use memory::{Arena, ArenaHandle};
pub use random::RandomStream;
