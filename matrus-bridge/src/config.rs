//! Initialization-time configuration.

use std::env;

/// Environment variable holding the smoke-function PRNG seed.
pub const SEED_ENV: &str = "MATRUS_SEED";

/// Environment variable that switches registration to [`ReregisterPolicy::Reject`]
/// when set to `1` or `true`.
pub const STRICT_ENV: &str = "MATRUS_STRICT_REGISTRATION";

/// What happens when a converter is registered for a type that already has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReregisterPolicy {
    /// Keep the first registration; the second is a no-op.
    #[default]
    Ignore,
    /// Fail initialization with `Error::DuplicateRegistration`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Name the module reports to the host runtime.
    pub module_name: String,
    pub reregister: ReregisterPolicy,
    /// Seed for `random_matrix` / `random_vector`; time-seeded when `None`.
    pub seed: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module_name: "_matrus".to_string(),
            reregister: ReregisterPolicy::Ignore,
            seed: None,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by `MATRUS_SEED` and `MATRUS_STRICT_REGISTRATION`.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(seed) = env::var(SEED_ENV).ok().and_then(|v| v.trim().parse().ok()) {
            config.seed = Some(seed);
        }
        if let Ok(v) = env::var(STRICT_ENV) {
            if matches!(v.trim(), "1" | "true") {
                config.reregister = ReregisterPolicy::Reject;
            }
        }
        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_reregister(mut self, policy: ReregisterPolicy) -> Self {
        self.reregister = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.module_name, "_matrus");
        assert_eq!(config.reregister, ReregisterPolicy::Ignore);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_builders() {
        let config = BridgeConfig::default()
            .with_seed(7)
            .with_reregister(ReregisterPolicy::Reject);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.reregister, ReregisterPolicy::Reject);
    }
}
