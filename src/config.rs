use crate::constants::*;
use crate::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How `PlayerFlashed` notifications are matched to a detonation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashCorrelation {
    /// Same round, same detonation tick, same thrower.
    #[default]
    Exact,
    /// Same round and thrower, nearest detonation no more than `ticks` away.
    NearestWithin { ticks: Tick },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub base_player_value: f64,
    pub man_count_weight: f64,
    pub equipment_weight: f64,
    pub max_player_equipment_value: f64,
    pub strength_diff_multiplier: f64,
    pub base_kill_impact: f64,
    pub first_kill_multiplier: f64,
    pub won_clutch_multiplier: f64,
    pub failed_clutch_multiplier: f64,
    pub standard_multiplier: f64,
    pub assist_fraction: f64,
    pub flash_assist_fraction: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            base_player_value: BASE_PLAYER_VALUE,
            man_count_weight: MAN_COUNT_WEIGHT,
            equipment_weight: EQUIPMENT_WEIGHT,
            max_player_equipment_value: MAX_PLAYER_EQUIPMENT_VALUE,
            strength_diff_multiplier: STRENGTH_DIFF_MULTIPLIER,
            base_kill_impact: BASE_KILL_IMPACT,
            first_kill_multiplier: FIRST_KILL_MULTIPLIER,
            won_clutch_multiplier: WON_CLUTCH_MULTIPLIER,
            failed_clutch_multiplier: FAILED_CLUTCH_MULTIPLIER,
            standard_multiplier: STANDARD_MULTIPLIER,
            assist_fraction: ASSIST_IMPACT_FRACTION,
            flash_assist_fraction: FLASH_ASSIST_IMPACT_FRACTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, new)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay_millis: u64,
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_DELIVERY_ATTEMPTS,
            delay_millis: DEFAULT_DELIVERY_DELAY_MILLIS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Used when the demo header does not carry a tick rate.
    pub tick_rate: f64,
    pub flash_window_seconds: f64,
    pub flash_correlation: FlashCorrelation,
    pub damage_assist_threshold: i32,
    pub trade_distance: f32,
    pub trade_window_seconds: f64,
    pub eco_threshold: i32,
    pub full_buy_threshold: i32,
    pub he_damage_window_seconds: f64,
    pub fire_damage_window_seconds: f64,
    pub impact: ImpactConfig,
    pub batch_size: usize,
    pub retry: RetryPolicy,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            flash_window_seconds: FLASH_ATTRIBUTION_WINDOW_SECONDS,
            flash_correlation: FlashCorrelation::default(),
            damage_assist_threshold: DAMAGE_ASSIST_THRESHOLD,
            trade_distance: TRADE_DISTANCE,
            trade_window_seconds: TRADE_WINDOW_SECONDS,
            eco_threshold: ECO_THRESHOLD,
            full_buy_threshold: FULL_BUY_THRESHOLD,
            he_damage_window_seconds: HE_DAMAGE_WINDOW_SECONDS,
            fire_damage_window_seconds: FIRE_DAMAGE_WINDOW_SECONDS,
            impact: ImpactConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

impl ProcessorConfig {
    pub fn from_json(json: &str) -> FragActorResult<Self> {
        let config: ProcessorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FragActorResult<()> {
        let invalid = |reason: &str| {
            FragActorError::new_result(FragActorErrorVariant::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if self.tick_rate <= 0.0 {
            return invalid("tick_rate must be positive");
        }
        if self.flash_window_seconds <= 0.0 || self.trade_window_seconds <= 0.0 {
            return invalid("correlation windows must be positive");
        }
        if self.he_damage_window_seconds <= 0.0 || self.fire_damage_window_seconds <= 0.0 {
            return invalid("grenade damage windows must be positive");
        }
        if self.trade_distance <= 0.0 {
            return invalid("trade_distance must be positive");
        }
        if self.eco_threshold > self.full_buy_threshold {
            return invalid("eco_threshold must not exceed full_buy_threshold");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be positive");
        }
        if self.retry.attempts == 0 {
            return invalid("retry.attempts must be positive");
        }
        if let FlashCorrelation::NearestWithin { ticks } = self.flash_correlation {
            if ticks < 0 {
                return invalid("flash correlation window must not be negative");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ProcessorConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config =
            ProcessorConfig::from_json(r#"{"trade_distance": 600.0, "batch_size": 10}"#).unwrap();
        assert_eq!(config.trade_distance, 600.0);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.damage_assist_threshold, DAMAGE_ASSIST_THRESHOLD);
        assert_eq!(config.flash_correlation, FlashCorrelation::Exact);
    }

    #[test]
    fn zero_batch_size_is_critical() {
        let error = ProcessorConfig::from_json(r#"{"batch_size": 0}"#).unwrap_err();
        assert_eq!(error.severity(), ErrorSeverity::Critical);
    }
}
