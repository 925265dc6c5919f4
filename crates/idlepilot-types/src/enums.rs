//! Enumeration types shared across the idlepilot workspace.
//!
//! Resource channels, difficulty tiers, challenge kinds, loadout lock owners,
//! and the blood spells the rebirth gate can cast.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resource channels
// ---------------------------------------------------------------------------

/// A host resource pool that breakpoint timelines allocate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// The energy pool.
    Energy,
    /// The magic pool. Blood rituals draw from here.
    Magic,
    /// The third resource pool (hacks and wishes).
    R3,
}

impl Channel {
    /// All allocation channels in evaluation order.
    pub const ALL: [Self; 3] = [Self::Energy, Self::Magic, Self::R3];

    /// Short lowercase name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Magic => "magic",
            Self::R3 => "r3",
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of a channel's allocated pool the host takes back before a
/// fair-share pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReclaimMode {
    /// Reclaim everything, including slots the host treats as sticky.
    Full,
    /// Reclaim everything except sticky slots (basic training on energy).
    Partial,
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Rebirth difficulty tier. Ordering follows hardness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// The base tier.
    Normal,
    /// The second tier.
    Evil,
    /// The hardest tier.
    Sadistic,
}

impl Difficulty {
    /// Map a profile difficulty index (`0..=2`) to a tier.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Normal),
            1 => Some(Self::Evil),
            2 => Some(Self::Sadistic),
            _ => None,
        }
    }

    /// Position of this tier in per-tier tables.
    pub const fn index(self) -> usize {
        match self {
            Self::Normal => 0,
            Self::Evil => 1,
            Self::Sadistic => 2,
        }
    }
}

/// Operating system variant selectable for the wandoos target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsVariant {
    /// Wandoos 98.
    Wandoos98,
    /// Wandoos MEH.
    WandoosMeh,
    /// Wandoos XL.
    WandoosXl,
}

impl OsVariant {
    /// Map a profile OS index (`0..=2`) to a variant.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Wandoos98),
            1 => Some(Self::WandoosMeh),
            2 => Some(Self::WandoosXl),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Challenges
// ---------------------------------------------------------------------------

/// A challenge run that a rebirth can be committed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChallengeKind {
    /// Basic challenge.
    Basic,
    /// No augments.
    NoAugments,
    /// 24 hour challenge.
    TwentyFourHour,
    /// 100 level challenge.
    OneHundredLevel,
    /// No equipment.
    NoEquipment,
    /// Troll challenge.
    Troll,
    /// No rebirth challenge. Rebirths are blocked while it runs.
    NoRebirth,
    /// Laser sword challenge.
    LaserSword,
    /// Blind challenge.
    Blind,
    /// No NGU challenge.
    NoNgu,
    /// No time machine challenge.
    NoTimeMachine,
}

impl ChallengeKind {
    /// Parse the profile token for a challenge kind (already uppercased).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "BASIC" => Some(Self::Basic),
            "NOAUG" => Some(Self::NoAugments),
            "24HR" => Some(Self::TwentyFourHour),
            "100LC" => Some(Self::OneHundredLevel),
            "NOEC" => Some(Self::NoEquipment),
            "TC" => Some(Self::Troll),
            "NORB" => Some(Self::NoRebirth),
            "LSC" => Some(Self::LaserSword),
            "BLIND" => Some(Self::Blind),
            "NONGU" => Some(Self::NoNgu),
            "NOTM" => Some(Self::NoTimeMachine),
            _ => None,
        }
    }

    /// The profile token for this challenge kind.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::NoAugments => "NOAUG",
            Self::TwentyFourHour => "24HR",
            Self::OneHundredLevel => "100LC",
            Self::NoEquipment => "NOEC",
            Self::Troll => "TC",
            Self::NoRebirth => "NORB",
            Self::LaserSword => "LSC",
            Self::Blind => "BLIND",
            Self::NoNgu => "NONGU",
            Self::NoTimeMachine => "NOTM",
        }
    }
}

// ---------------------------------------------------------------------------
// Loadout locks and spells
// ---------------------------------------------------------------------------

/// Owner of the gear-loadout or digger-loadout lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockOwner {
    /// Nobody holds the lock.
    None,
    /// Held for a titan fight swap.
    Titan,
    /// Held for a yggdrasil harvest swap.
    Yggdrasil,
}

impl LockOwner {
    /// Whether `claimant` may take or already holds this lock.
    pub fn available_to(self, claimant: Self) -> bool {
        self == Self::None || self == claimant
    }
}

/// Blood spells the engine may cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodSpell {
    /// Guff B.
    GuffB,
    /// Guff A.
    GuffA,
    /// Iron pill consumable effect.
    IronPill,
    /// Rebirth number boost. Takes all remaining blood.
    RebirthNumber,
}
