//! Engine components: cooldowns, frequency scaling, mote queues and the
//! callout pipeline that wires them to a host.

pub mod cooldown;
pub mod engine;
pub mod events;
pub mod frequency;
pub mod grammar;
pub mod host;
pub mod mote_queue;
pub mod registry;
pub mod sandbox;
pub mod settings;
pub mod tracker;
