use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::types::{PortfolioInputs, PortfolioOutput};

pub const DEFAULT_TTL: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    output: PortfolioOutput,
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn key_for(inputs: &PortfolioInputs) -> String {
        let inputs = inputs.sanitized();
        let mut key = format!(
            "{}|{}|{}|{}|{}|{:?}",
            inputs.lump_sum_eur,
            inputs.monthly_contribution,
            inputs.horizon_years,
            inputs.reserve_eur,
            inputs.reserve_months,
            inputs.risk_pref,
        );
        if let Some(mix) = &inputs.base_mix {
            for pct in mix.weights() {
                key.push_str(&format!("|{pct}"));
            }
        }
        key
    }

    pub fn get(&mut self, key: &str, now: Instant) -> Option<PortfolioOutput> {
        self.purge_expired(now);
        self.entries.get(key).map(|entry| entry.output.clone())
    }

    pub fn insert(&mut self, key: String, output: PortfolioOutput, now: Instant) {
        self.purge_expired(now);
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: now,
                output,
            },
        );
    }

    pub fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
