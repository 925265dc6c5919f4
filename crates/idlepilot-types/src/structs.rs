//! Core data structs: allocation targets, challenge targets, consumable
//! orders, and per-slot ritual speed data.

use serde::{Deserialize, Serialize};

use crate::enums::{ChallengeKind, Channel};

// ---------------------------------------------------------------------------
// Allocation targets
// ---------------------------------------------------------------------------

/// The kind of consumer a priority token names.
///
/// Indexed variants address one host slot; the `All*` variants address every
/// slot of that family at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// A single NGU slot.
    Ngu {
        /// Slot index.
        index: u8,
    },
    /// Every NGU slot.
    AllNgu,
    /// A single augment.
    Augment {
        /// Slot index.
        index: u8,
    },
    /// A single basic training skill.
    BasicTraining {
        /// Slot index.
        index: u8,
    },
    /// Every basic training skill.
    AllBasicTraining,
    /// A single advanced training skill.
    AdvancedTraining {
        /// Slot index.
        index: u8,
    },
    /// The time machine.
    TimeMachine,
    /// Wandoos.
    Wandoos,
    /// A single wish slot.
    Wish {
        /// Slot index.
        index: u8,
    },
    /// A single hack.
    Hack {
        /// Slot index.
        index: u8,
    },
    /// The blood ritual scheduler, fanning out over every ritual slot.
    BloodRituals {
        /// Explicit run-length ceiling in seconds. Rituals with a longer ETA
        /// are not started.
        run_seconds: Option<u32>,
    },
}

impl TargetKind {
    /// Whether this kind can draw from `channel`.
    pub const fn valid_for(self, channel: Channel) -> bool {
        match self {
            Self::Ngu { .. } | Self::AllNgu | Self::TimeMachine | Self::Wandoos => {
                matches!(channel, Channel::Energy | Channel::Magic)
            }
            Self::Augment { .. }
            | Self::BasicTraining { .. }
            | Self::AllBasicTraining
            | Self::AdvancedTraining { .. } => matches!(channel, Channel::Energy),
            Self::Wish { .. } => true,
            Self::Hack { .. } => matches!(channel, Channel::R3),
            Self::BloodRituals { .. } => matches!(channel, Channel::Magic),
        }
    }

    /// Whether this kind is part of the basic training family.
    pub const fn is_basic_training(self) -> bool {
        matches!(self, Self::BasicTraining { .. } | Self::AllBasicTraining)
    }
}

impl core::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ngu { index } => write!(f, "NGU-{index}"),
            Self::AllNgu => f.write_str("ALLNGU"),
            Self::Augment { index } => write!(f, "AUG-{index}"),
            Self::BasicTraining { index } => write!(f, "BT-{index}"),
            Self::AllBasicTraining => f.write_str("ALLBT"),
            Self::AdvancedTraining { index } => write!(f, "AT-{index}"),
            Self::TimeMachine => f.write_str("TM"),
            Self::Wandoos => f.write_str("WAN"),
            Self::Wish { index } => write!(f, "WISH-{index}"),
            Self::Hack { index } => write!(f, "HACK-{index}"),
            Self::BloodRituals { run_seconds: None } => f.write_str("BR"),
            Self::BloodRituals {
                run_seconds: Some(secs),
            } => write!(f, "BR-{secs}"),
        }
    }
}

/// One entry of a breakpoint's priority list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocationTarget {
    /// What the target allocates into.
    pub kind: TargetKind,
    /// Cap-priority targets bound their own acceptance and are excluded from
    /// the fair-share divisor.
    pub cap_priority: bool,
}

impl AllocationTarget {
    /// A non-cap target.
    pub const fn shared(kind: TargetKind) -> Self {
        Self {
            kind,
            cap_priority: false,
        }
    }

    /// A cap-priority target.
    pub const fn capped(kind: TargetKind) -> Self {
        Self {
            kind,
            cap_priority: true,
        }
    }

    /// Whether the target can draw from `channel`.
    pub const fn valid_for(&self, channel: Channel) -> bool {
        self.kind.valid_for(channel)
    }

    /// Whether the target is excluded from the fair-share divisor.
    pub const fn is_cap_priority(&self) -> bool {
        self.cap_priority
    }
}

impl core::fmt::Display for AllocationTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.cap_priority && !matches!(self.kind, TargetKind::BloodRituals { .. }) {
            f.write_str("CAP")?;
        }
        write!(f, "{}", self.kind)
    }
}

// ---------------------------------------------------------------------------
// Rebirth challenge targets
// ---------------------------------------------------------------------------

/// The `ordinal`-th completion of a challenge kind to pursue on rebirth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeTarget {
    /// The challenge to enter.
    pub kind: ChallengeKind,
    /// Which completion this target pursues (1-based).
    pub ordinal: u32,
}

impl core::fmt::Display for ChallengeTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.kind.token(), self.ordinal)
    }
}

// ---------------------------------------------------------------------------
// Consumables
// ---------------------------------------------------------------------------

/// A consumable item to use when a consumables breakpoint activates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumableOrder {
    /// Uppercased item token, e.g. `EPOT-A`.
    pub item: String,
    /// How many to consume. Defaults to 1.
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// Ritual speed data
// ---------------------------------------------------------------------------

/// Speed inputs for one ritual slot, read from the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RitualSpeed {
    /// Speed divider per difficulty tier, indexed by [`Difficulty::index`].
    ///
    /// [`Difficulty::index`]: crate::Difficulty::index
    pub dividers: [f64; 3],
    /// Extra divider applied at sadistic difficulty and harder.
    pub sadistic_divider: f64,
    /// Multiplicative speed bonus for this slot.
    pub speed_bonus: f64,
}

impl Default for RitualSpeed {
    fn default() -> Self {
        Self {
            dividers: [1.0, 1.0, 1.0],
            sadistic_divider: 1.0,
            speed_bonus: 1.0,
        }
    }
}
