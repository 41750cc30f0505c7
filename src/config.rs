use std::env;

use chrono::Duration;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const TRIAL_DAYS_VAR: &str = "STUDYPASS_TRIAL_DAYS";
pub const PASS_DAYS_VAR: &str = "STUDYPASS_PASS_DAYS";
pub const FEE_PER_CHILD_VAR: &str = "STUDYPASS_FEE_PER_CHILD";
pub const CURRENCY_VAR: &str = "STUDYPASS_CURRENCY";

pub static DEFAULT_PLAN: Lazy<PlanConfig> = Lazy::new(PlanConfig::default);

/// Trial length, Learning Pass length and pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanConfig {
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,
    #[serde(default = "default_pass_days")]
    pub pass_days: u32,
    /// Flat fee per child in major currency units.
    #[serde(default = "default_fee_per_child")]
    pub fee_per_child: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_trial_days() -> u32 {
    7
}
fn default_pass_days() -> u32 {
    90
}
fn default_fee_per_child() -> u64 {
    2000
}
fn default_currency() -> String {
    "NGN".to_string()
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
            pass_days: default_pass_days(),
            fee_per_child: default_fee_per_child(),
            currency: default_currency(),
        }
    }
}

impl PlanConfig {
    /// Defaults overridden by any `STUDYPASS_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(TRIAL_DAYS_VAR) {
            config.trial_days = parse_var(TRIAL_DAYS_VAR, &value)?;
        }
        if let Some(value) = lookup(PASS_DAYS_VAR) {
            config.pass_days = parse_var(PASS_DAYS_VAR, &value)?;
        }
        if let Some(value) = lookup(FEE_PER_CHILD_VAR) {
            config.fee_per_child = parse_var(FEE_PER_CHILD_VAR, &value)?;
        }
        if let Some(value) = lookup(CURRENCY_VAR) {
            let currency = value.trim();
            if currency.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: CURRENCY_VAR,
                    value,
                });
            }
            config.currency = currency.to_uppercase();
        }

        Ok(config)
    }

    pub fn trial_length(&self) -> Duration {
        Duration::days(i64::from(self.trial_days))
    }

    pub fn pass_length(&self) -> Duration {
        Duration::days(i64::from(self.pass_days))
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
