//! Plain data shared between the engine and the host.

pub mod actor;
pub mod effect;
pub mod location;
pub mod pool;
