use serde::{Deserialize, Serialize};

/// Name of a rule pack that phrasing is drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub String);

impl PoolId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shouted when an actor is drafted.
    pub fn drafted() -> Self {
        Self::new("drafted")
    }

    pub fn melee_attack() -> Self {
        Self::new("melee_attack")
    }

    pub fn ranged_attack() -> Self {
        Self::new("ranged_attack")
    }
}

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
