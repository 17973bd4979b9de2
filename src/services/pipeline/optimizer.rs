// Optimization Loop Policy
// When to re-run the stage sequence and with which derived settings

use crate::models::HumanizeConfig;
use crate::services::detection::{is_accepted, MAX_OPTIMIZATION_ATTEMPTS};

/// Whether another attempt should run after scoring `score` with `attempts_done`
/// re-runs already spent.
pub fn should_retry(config: &HumanizeConfig, score: f64, attempts_done: usize) -> bool {
    config.enable_auto_optimize
        && !is_accepted(score)
        && attempts_done < MAX_OPTIMIZATION_ATTEMPTS
}

/// Settings for `attempt` (1-based). Always a fresh value; `config` is never touched.
pub fn attempt_config(config: &HumanizeConfig, attempt: usize) -> HumanizeConfig {
    config.escalated(attempt)
}

pub fn attempt_label(attempt: usize) -> String {
    format!("Optimization attempt #{}", attempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intensity;
    use crate::services::detection::ACCEPTANCE_THRESHOLD;

    #[test]
    fn test_retry_only_below_threshold_and_within_budget() {
        let config = HumanizeConfig::default();
        assert!(should_retry(&config, ACCEPTANCE_THRESHOLD - 1.0, 0));
        assert!(!should_retry(&config, ACCEPTANCE_THRESHOLD, 0));
        assert!(!should_retry(&config, 10.0, MAX_OPTIMIZATION_ATTEMPTS));

        let off = HumanizeConfig {
            enable_auto_optimize: false,
            ..HumanizeConfig::default()
        };
        assert!(!should_retry(&off, 10.0, 0));
    }

    #[test]
    fn test_attempt_config_escalates() {
        let config = HumanizeConfig::all_disabled(Intensity::Light);
        assert_eq!(attempt_config(&config, 1).intensity, Intensity::Medium);
        assert_eq!(attempt_config(&config, 2).intensity, Intensity::Aggressive);
        assert!(attempt_config(&config, 3).enable_colloquialisms);
        assert_eq!(config.intensity, Intensity::Light);
        assert_eq!(attempt_label(2), "Optimization attempt #2");
    }
}
