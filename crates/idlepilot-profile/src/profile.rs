//! The profile file and its in-memory form.
//!
//! A profile is a JSON document with a top-level `Breakpoints` object. Each
//! channel array (`Energy`, `Magic`, `R3`, `Gear`, `Diggers`, `Wandoos`,
//! `NGUDiff`, `Consumables`) holds `{Time, ...}` entries; `Rebirth` (or the
//! older bare `RebirthTime`) configures rebirth. Missing arrays are empty.
//!
//! [`ProfileStore::load`] never fails. A missing file is created from
//! [`EMPTY_TEMPLATE`]; a file that cannot be parsed yields
//! [`Profile::empty`], which allocates nothing and never rebirths.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use idlepilot_types::{AllocationTarget, Channel, ConsumableOrder, Difficulty, OsVariant};

use crate::error::ProfileError;
use crate::rebirth::RebirthPlan;
use crate::timeline::{Breakpoint, Timeline};
use crate::token::{TimeSpec, parse_challenge, parse_consumable, parse_priority};

/// Written to the profile path on first run.
pub const EMPTY_TEMPLATE: &str = r#"{
  "Breakpoints": {
    "Magic": [
      { "Time": 0, "Priorities": [] }
    ],
    "Energy": [
      { "Time": 0, "Priorities": [] }
    ],
    "R3": [
      { "Time": 0, "Priorities": [] }
    ],
    "Gear": [
      { "Time": 0, "ID": [] }
    ],
    "Wandoos": [
      { "Time": 0, "OS": 0 }
    ],
    "Diggers": [
      { "Time": 0, "List": [] }
    ],
    "NGUDiff": [
      { "Time": 0, "Diff": 0 }
    ],
    "Consumables": [],
    "RebirthTime": -1
  }
}
"#;

// ---------------------------------------------------------------------------
// Raw file layout
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(rename = "Breakpoints")]
    breakpoints: RawBreakpoints,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBreakpoints {
    #[serde(rename = "Energy")]
    energy: Vec<RawAllocation>,
    #[serde(rename = "Magic")]
    magic: Vec<RawAllocation>,
    #[serde(rename = "R3")]
    r3: Vec<RawAllocation>,
    #[serde(rename = "Gear")]
    gear: Vec<RawGear>,
    #[serde(rename = "Diggers")]
    diggers: Vec<RawDiggers>,
    #[serde(rename = "Wandoos")]
    wandoos: Vec<RawWandoos>,
    #[serde(rename = "NGUDiff")]
    ngu_diff: Vec<RawNguDiff>,
    #[serde(rename = "Consumables")]
    consumables: Vec<RawConsumables>,
    #[serde(rename = "Rebirth")]
    rebirth: Option<RawRebirth>,
    #[serde(rename = "RebirthTime")]
    rebirth_time: Option<TimeSpec>,
}

#[derive(Debug, Deserialize)]
struct RawAllocation {
    #[serde(rename = "Time", default)]
    time: TimeSpec,
    #[serde(rename = "Priorities", default)]
    priorities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawGear {
    #[serde(rename = "Time", default)]
    time: TimeSpec,
    #[serde(rename = "ID", default)]
    ids: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct RawDiggers {
    #[serde(rename = "Time", default)]
    time: TimeSpec,
    #[serde(rename = "List", default)]
    list: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct RawWandoos {
    #[serde(rename = "Time", default)]
    time: TimeSpec,
    #[serde(rename = "OS", default)]
    os: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawNguDiff {
    #[serde(rename = "Time", default)]
    time: TimeSpec,
    #[serde(rename = "Diff", default)]
    diff: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawConsumables {
    #[serde(rename = "Time", default)]
    time: TimeSpec,
    #[serde(rename = "Items", default)]
    items: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawRebirth {
    #[serde(rename = "Type")]
    kind: Option<String>,
    #[serde(rename = "Target")]
    target: Option<serde_json::Value>,
    #[serde(rename = "Challenges", default)]
    challenges: Vec<String>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Per-channel breakpoint timelines and the rebirth plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    /// Energy priorities.
    pub energy: Timeline<Vec<AllocationTarget>>,
    /// Magic priorities.
    pub magic: Timeline<Vec<AllocationTarget>>,
    /// R3 priorities.
    pub r3: Timeline<Vec<AllocationTarget>>,
    /// Gear loadouts (item ids).
    pub gear: Timeline<Vec<u32>>,
    /// Digger loadouts (digger ids).
    pub diggers: Timeline<Vec<u32>>,
    /// Wandoos OS variant.
    pub wandoos: Timeline<OsVariant>,
    /// NGU difficulty track.
    pub ngu_diff: Timeline<Difficulty>,
    /// Consumables to use once per breakpoint.
    pub consumables: Timeline<Vec<ConsumableOrder>>,
    /// When and how to rebirth.
    pub rebirth: RebirthPlan,
}

impl Profile {
    /// A profile with no breakpoints and rebirth disabled.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a profile document.
    ///
    /// Unknown priority or challenge tokens and out-of-range `OS`/`Diff`
    /// values are dropped with a warning rather than failing the parse.
    pub fn parse(text: &str) -> Result<Self, ProfileError> {
        let raw: RawFile = serde_json::from_str(text)?;
        Ok(Self::from_raw(raw.breakpoints))
    }

    /// The priority timeline for an allocation channel.
    pub const fn allocation(&self, channel: Channel) -> &Timeline<Vec<AllocationTarget>> {
        match channel {
            Channel::Energy => &self.energy,
            Channel::Magic => &self.magic,
            Channel::R3 => &self.r3,
        }
    }

    /// Multi-line load summary: breakpoint counts, rebirth rule and
    /// challenge list.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("{} Energy Breakpoints", self.energy.len()),
            format!("{} Magic Breakpoints", self.magic.len()),
            format!("{} R3 Breakpoints", self.r3.len()),
            format!("{} Gear Breakpoints", self.gear.len()),
            format!("{} Digger Breakpoints", self.diggers.len()),
            format!("{} Wandoos Breakpoints", self.wandoos.len()),
            format!("{} NGU Difficulty Breakpoints", self.ngu_diff.len()),
            format!("{} Consumable Breakpoints", self.consumables.len()),
            self.rebirth.describe(),
        ];
        if !self.rebirth.challenges.is_empty() {
            let targets: Vec<String> = self
                .rebirth
                .challenges
                .iter()
                .map(ToString::to_string)
                .collect();
            lines.push(format!("challenge targets: {}", targets.join(",")));
        }
        lines.join("\n")
    }

    fn from_raw(raw: RawBreakpoints) -> Self {
        Self {
            energy: allocation_timeline(Channel::Energy, raw.energy),
            magic: allocation_timeline(Channel::Magic, raw.magic),
            r3: allocation_timeline(Channel::R3, raw.r3),
            gear: Timeline::new(
                raw.gear
                    .into_iter()
                    .map(|bp| Breakpoint::new(bp.time.seconds(), bp.ids))
                    .collect(),
            ),
            diggers: Timeline::new(
                raw.diggers
                    .into_iter()
                    .map(|bp| Breakpoint::new(bp.time.seconds(), bp.list))
                    .collect(),
            ),
            wandoos: Timeline::new(
                raw.wandoos
                    .into_iter()
                    .filter_map(|bp| {
                        let os = index_of(bp.os.as_ref()).and_then(OsVariant::from_index);
                        if os.is_none() {
                            warn!(os = ?bp.os, "Dropping wandoos breakpoint with unknown OS");
                        }
                        Some(Breakpoint::new(bp.time.seconds(), os?))
                    })
                    .collect(),
            ),
            ngu_diff: Timeline::new(
                raw.ngu_diff
                    .into_iter()
                    .filter_map(|bp| {
                        let diff = index_of(bp.diff.as_ref()).and_then(Difficulty::from_index);
                        if diff.is_none() {
                            warn!(
                                diff = ?bp.diff,
                                "Dropping NGU difficulty breakpoint outside 0..=2"
                            );
                        }
                        Some(Breakpoint::new(bp.time.seconds(), diff?))
                    })
                    .collect(),
            ),
            consumables: Timeline::new(
                raw.consumables
                    .into_iter()
                    .map(|bp| {
                        let orders = bp.items.iter().map(|item| parse_consumable(item)).collect();
                        Breakpoint::new(bp.time.seconds(), orders)
                    })
                    .collect(),
            ),
            rebirth: rebirth_plan(raw.rebirth, raw.rebirth_time),
        }
    }
}

fn allocation_timeline(
    channel: Channel,
    raw: Vec<RawAllocation>,
) -> Timeline<Vec<AllocationTarget>> {
    Timeline::new(
        raw.into_iter()
            .map(|bp| {
                let targets = bp
                    .priorities
                    .iter()
                    .filter_map(|token| {
                        let parsed = parse_priority(token);
                        if parsed.is_none() {
                            warn!(
                                %channel,
                                token = token.as_str(),
                                "Dropping unknown priority token"
                            );
                        }
                        parsed
                    })
                    .collect();
                Breakpoint::new(bp.time.seconds(), targets)
            })
            .collect(),
    )
}

/// A latch index read as an integer, if it fits in `u8`.
fn index_of(value: Option<&serde_json::Value>) -> Option<u8> {
    value
        .and_then(serde_json::Value::as_i64)
        .and_then(|index| u8::try_from(index).ok())
}

fn rebirth_plan(rebirth: Option<RawRebirth>, rebirth_time: Option<TimeSpec>) -> RebirthPlan {
    let Some(rebirth) = rebirth else {
        return rebirth_time.map_or_else(RebirthPlan::disabled, |time| {
            RebirthPlan::from_type("TIME", time.seconds(), Vec::new())
        });
    };
    let (Some(kind), Some(target)) = (rebirth.kind, rebirth.target) else {
        return RebirthPlan::disabled();
    };

    let target = if kind.trim().eq_ignore_ascii_case("TIME") {
        serde_json::from_value::<TimeSpec>(target).map_or(0.0, |time| time.seconds())
    } else {
        target.as_f64().unwrap_or(0.0)
    };
    let challenges = rebirth
        .challenges
        .iter()
        .filter_map(|token| {
            let parsed = parse_challenge(token);
            if parsed.is_none() {
                warn!(token = token.as_str(), "Dropping unknown challenge target");
            }
            parsed
        })
        .collect();
    RebirthPlan::from_type(&kind, target, challenges)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The loaded profile plus where and when it came from.
///
/// Rebuilt wholesale on every reload.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    /// The parsed profile.
    pub profile: Profile,
    /// Path the profile was read from.
    pub source: PathBuf,
    /// When the load finished.
    pub loaded_at: DateTime<Utc>,
}

impl ProfileStore {
    /// Load the profile at `path`, recovering from every failure.
    ///
    /// Creates the file from [`EMPTY_TEMPLATE`] if it does not exist. Any
    /// read or parse error is logged and replaced with [`Profile::empty`].
    pub fn load(path: &Path) -> Self {
        let profile = match Self::read(path) {
            Ok(profile) => {
                info!(
                    path = %path.display(),
                    energy = profile.energy.len(),
                    magic = profile.magic.len(),
                    r3 = profile.r3.len(),
                    rebirth = %profile.rebirth.describe(),
                    "Loaded profile"
                );
                info!("{}", profile.summary());
                profile
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load profile, falling back to empty profile"
                );
                Profile::empty()
            }
        };
        Self {
            profile,
            source: path.to_path_buf(),
            loaded_at: Utc::now(),
        }
    }

    /// Read and parse the profile at `path`, writing the empty template
    /// first if the file does not exist.
    pub fn read(path: &Path) -> Result<Profile, ProfileError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Profile::parse(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                write_template(path)?;
                info!(
                    path = %path.display(),
                    "Created empty profile. Please update it"
                );
                Profile::parse(EMPTY_TEMPLATE)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A store holding `profile` directly, without touching the filesystem.
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            profile,
            source: PathBuf::new(),
            loaded_at: Utc::now(),
        }
    }
}

fn write_template(path: &Path) -> Result<(), ProfileError> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(EMPTY_TEMPLATE.as_bytes())?;
    Ok(())
}
