//! Callout Engine: floating combat callouts for simulation games.
//!
//! Listens for combat and social events reported by a host game, decides
//! whether an actor speaks up, resolves a short phrase from a rule pack and
//! shows it as floating text. Simultaneous text in the same map cell is
//! staggered through per-cell queues so it never overlaps.

pub mod core;
pub mod schema;
