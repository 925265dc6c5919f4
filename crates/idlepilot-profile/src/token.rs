//! Parsers for the string tokens inside a profile: priority tokens,
//! challenge targets, time values, and consumable items.
//!
//! All tokens are case-insensitive. Unparseable tokens yield `None`; the
//! profile loader drops them with a warning.

use std::collections::BTreeMap;

use serde::Deserialize;

use idlepilot_types::{
    AllocationTarget, ChallengeKind, ChallengeTarget, ConsumableOrder, TargetKind,
};

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// A profile `Time` value: either whole seconds or an object summing hours,
/// minutes and seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeSpec {
    /// Seconds as a bare number.
    Seconds(f64),
    /// `{"h": .., "m": .., "s": ..}`. Keys other than `h` and `m` count as
    /// seconds; non-numeric values are ignored.
    Parts(BTreeMap<String, serde_json::Value>),
}

impl Default for TimeSpec {
    fn default() -> Self {
        Self::Seconds(0.0)
    }
}

impl TimeSpec {
    /// Total seconds, each component truncated to a whole number.
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Seconds(secs) => secs.trunc(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|(key, value)| {
                    let amount = value.as_f64()?.trunc();
                    let unit = match key.to_lowercase().as_str() {
                        "h" => SECONDS_PER_HOUR,
                        "m" => SECONDS_PER_MINUTE,
                        _ => 1.0,
                    };
                    Some(amount * unit)
                })
                .sum(),
        }
    }
}

/// Parse a priority token such as `NGU-3`, `CAPAUG-1`, `WAN` or `BR-600`.
///
/// A `CAP` prefix marks the target cap-priority. Blood rituals are always
/// cap-priority.
pub fn parse_priority(raw: &str) -> Option<AllocationTarget> {
    let token = raw.trim().to_uppercase();
    let (cap_priority, body) = token
        .strip_prefix("CAP")
        .map_or((false, token.as_str()), |rest| (true, rest));
    let (name, param) = match body.split_once('-') {
        Some((name, param)) => (name, Some(param)),
        None => (body, None),
    };
    let index = || param.and_then(|p| p.parse::<u8>().ok());

    let kind = match name {
        "NGU" => TargetKind::Ngu { index: index()? },
        "ALLNGU" if param.is_none() => TargetKind::AllNgu,
        "AUG" => TargetKind::Augment { index: index()? },
        "BT" => TargetKind::BasicTraining { index: index()? },
        "ALLBT" if param.is_none() => TargetKind::AllBasicTraining,
        "AT" => TargetKind::AdvancedTraining { index: index()? },
        "TM" if matches!(param, None | Some("E" | "M")) => TargetKind::TimeMachine,
        "WAN" if param.is_none() => TargetKind::Wandoos,
        "WISH" => TargetKind::Wish { index: index()? },
        "HACK" => TargetKind::Hack { index: index()? },
        "BR" => {
            let run_seconds = match param {
                None => None,
                Some(p) => Some(p.parse::<u32>().ok()?),
            };
            return Some(AllocationTarget::capped(TargetKind::BloodRituals {
                run_seconds: run_seconds.filter(|secs| *secs > 0),
            }));
        }
        _ => return None,
    };

    Some(AllocationTarget { kind, cap_priority })
}

/// Parse a challenge target token such as `TC-4` (the fourth troll
/// challenge completion).
pub fn parse_challenge(raw: &str) -> Option<ChallengeTarget> {
    let token = raw.trim().to_uppercase();
    let (kind, ordinal) = token.split_once('-')?;
    Some(ChallengeTarget {
        kind: ChallengeKind::from_token(kind)?,
        ordinal: ordinal.parse().ok()?,
    })
}

/// Parse a consumable token, `ITEM` or `ITEM:QUANTITY`. A malformed quantity
/// falls back to 1.
pub fn parse_consumable(raw: &str) -> ConsumableOrder {
    let token = raw.trim().to_uppercase();
    match token.split_once(':') {
        Some((item, quantity)) => ConsumableOrder {
            item: item.to_owned(),
            quantity: quantity.parse().unwrap_or(1),
        },
        None => ConsumableOrder {
            item: token,
            quantity: 1,
        },
    }
}
