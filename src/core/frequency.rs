/// Frequency scaling for rule packs of different sizes.
///
/// A pack with many alternative phrasings gets a higher trigger chance than
/// a pack with few, so that content volume alone does not make some events
/// chattier than others. The largest pool size seen so far is shared by
/// every handle cloned from the same scaler and never decreases.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::schema::pool::PoolId;

#[derive(Debug, Clone)]
pub struct FrequencyScaler {
    max_rules_seen: Arc<AtomicUsize>,
}

impl Default for FrequencyScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyScaler {
    pub fn new() -> Self {
        Self {
            max_rules_seen: Arc::new(AtomicUsize::new(1)),
        }
    }

    pub fn max_rules_seen(&self) -> usize {
        self.max_rules_seen.load(Ordering::Relaxed)
    }

    /// Records `rule_count` for `pool` and returns `rule_count / max_rules_seen`.
    ///
    /// Always in `(0, 1]`; an empty pool counts as one rule.
    pub fn scale_for(&self, pool: &PoolId, rule_count: usize) -> f32 {
        let rule_count = rule_count.max(1);
        let previous = self.max_rules_seen.fetch_max(rule_count, Ordering::Relaxed);
        let max = previous.max(rule_count);
        let scale = rule_count as f32 / max as f32;
        tracing::debug!("Scaled chance of {} = {}", pool, scale);
        scale
    }
}
