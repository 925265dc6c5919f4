//! Rebirth targets configured by a profile.

use serde::Serialize;

use idlepilot_types::ChallengeTarget;

/// Smallest muffin buffer in minutes.
const MUFFIN_MIN_BUFFER: f64 = 1.0;
/// Largest muffin buffer in minutes in fixed mode.
const MUFFIN_MAX_BUFFER: f64 = 60.0;
/// Largest muffin buffer in minutes in time-balanced mode.
const MUFFIN_MAX_BALANCED_BUFFER: f64 = 15.0;

/// When a rebirth becomes eligible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RebirthTarget {
    /// Never rebirth.
    NoRebirth,
    /// Rebirth once elapsed time reaches `target_seconds`. A target of zero
    /// or less disables the rebirth.
    Time {
        /// Elapsed seconds to rebirth at.
        target_seconds: f64,
    },
    /// Rebirth once the number bonus reaches `multiplier_target` times the
    /// previous rebirth's number bonus.
    Number {
        /// Required ratio of current to previous number bonus.
        multiplier_target: f64,
    },
    /// Rebirth once the number would reach `boss_delta` more bosses.
    BossNum {
        /// Required number of additional reachable bosses.
        boss_delta: f64,
    },
    /// Rebirth when the host's optimality estimator says the best moment is
    /// within `minute_buffer` minutes.
    Muffin {
        /// Accepted distance from the optimum, in minutes.
        minute_buffer: f64,
        /// Use the time-balanced estimator.
        balanced: bool,
    },
}

/// A rebirth target plus the challenge runs to pursue on commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebirthPlan {
    /// Eligibility rule.
    pub target: RebirthTarget,
    /// Challenge completions to pursue, in priority order.
    pub challenges: Vec<ChallengeTarget>,
}

impl Default for RebirthPlan {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RebirthPlan {
    /// A plan that never rebirths.
    pub const fn disabled() -> Self {
        Self {
            target: RebirthTarget::NoRebirth,
            challenges: Vec::new(),
        }
    }

    /// Build a plan from a profile `Type` string and numeric target.
    ///
    /// `TIME`, `NUMBER` and `BOSSES` map directly. Any type containing
    /// `MUFFIN` selects the muffin rule; a `TIMEBALANCED` prefix selects the
    /// balanced estimator. Anything else disables rebirth.
    pub fn from_type(kind: &str, target: f64, challenges: Vec<ChallengeTarget>) -> Self {
        let kind = kind.trim().to_uppercase();
        let target = if kind == "TIME" {
            RebirthTarget::Time {
                target_seconds: target,
            }
        } else if kind.contains("MUFFIN") {
            let balanced = kind.starts_with("TIMEBALANCED");
            let max = if balanced {
                MUFFIN_MAX_BALANCED_BUFFER
            } else {
                MUFFIN_MAX_BUFFER
            };
            RebirthTarget::Muffin {
                minute_buffer: target.clamp(MUFFIN_MIN_BUFFER, max),
                balanced,
            }
        } else if kind == "NUMBER" {
            RebirthTarget::Number {
                multiplier_target: target,
            }
        } else if kind == "BOSSES" {
            RebirthTarget::BossNum { boss_delta: target }
        } else {
            return Self::disabled();
        };
        Self { target, challenges }
    }

    /// The configured rebirth time when a positive time rebirth is set.
    pub fn armed_time(&self) -> Option<f64> {
        match self.target {
            RebirthTarget::Time { target_seconds } if target_seconds > 0.0 => Some(target_seconds),
            _ => None,
        }
    }

    /// Whether this plan can never become eligible.
    pub fn is_disabled(&self) -> bool {
        match self.target {
            RebirthTarget::NoRebirth => true,
            RebirthTarget::Time { target_seconds } => target_seconds <= 0.0,
            RebirthTarget::Number { .. }
            | RebirthTarget::BossNum { .. }
            | RebirthTarget::Muffin { .. } => false,
        }
    }

    /// One-line description for load logs.
    pub fn describe(&self) -> String {
        match self.target {
            _ if self.is_disabled() => "rebirth disabled".to_owned(),
            RebirthTarget::Time { target_seconds } => {
                format!("rebirthing at {target_seconds} seconds")
            }
            RebirthTarget::Number { multiplier_target } => {
                format!("rebirthing when number bonus is {multiplier_target}x previous number")
            }
            RebirthTarget::BossNum { boss_delta } => {
                format!("rebirthing when number allows +{boss_delta} bosses")
            }
            RebirthTarget::Muffin {
                minute_buffer,
                balanced,
            } => format!(
                "rebirthing within {minute_buffer} minutes of the {} optimum",
                if balanced { "time-balanced" } else { "fixed" }
            ),
            RebirthTarget::NoRebirth => "rebirth disabled".to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use idlepilot_types::ChallengeKind;

    use super::*;

    #[test]
    fn time_plan_arms_only_when_positive() {
        let plan = RebirthPlan::from_type("time", 3600.0, Vec::new());
        assert_eq!(plan.armed_time(), Some(3600.0));
        assert!(!plan.is_disabled());

        let plan = RebirthPlan::from_type("TIME", -1.0, Vec::new());
        assert_eq!(plan.armed_time(), None);
        assert!(plan.is_disabled());
    }

    #[test]
    fn muffin_buffer_is_clamped_per_mode() {
        let fixed = RebirthPlan::from_type("MUFFIN", 120.0, Vec::new());
        assert_eq!(
            fixed.target,
            RebirthTarget::Muffin {
                minute_buffer: 60.0,
                balanced: false
            }
        );
        let balanced = RebirthPlan::from_type("TIMEBALANCEDMUFFIN", 40.0, Vec::new());
        assert_eq!(
            balanced.target,
            RebirthTarget::Muffin {
                minute_buffer: 15.0,
                balanced: true
            }
        );
        let tiny = RebirthPlan::from_type("muffin", 0.0, Vec::new());
        assert_eq!(
            tiny.target,
            RebirthTarget::Muffin {
                minute_buffer: 1.0,
                balanced: false
            }
        );
    }

    #[test]
    fn unknown_type_disables_rebirth_and_drops_challenges() {
        let plan = RebirthPlan::from_type(
            "sometimes",
            10.0,
            vec![ChallengeTarget {
                kind: ChallengeKind::Basic,
                ordinal: 1,
            }],
        );
        assert_eq!(plan, RebirthPlan::disabled());
    }

    #[test]
    fn number_and_boss_targets() {
        assert_eq!(
            RebirthPlan::from_type("NUMBER", 2.5, Vec::new()).target,
            RebirthTarget::Number {
                multiplier_target: 2.5
            }
        );
        assert_eq!(
            RebirthPlan::from_type("Bosses", 3.0, Vec::new()).target,
            RebirthTarget::BossNum { boss_delta: 3.0 }
        );
    }
}
