//! Cross-cycle engine state.
//!
//! Everything the engine remembers between cycles lives in one
//! [`EngineState`] value owned by the [`Autopilot`](crate::engine::Autopilot):
//! the activation time of each allocation channel's current breakpoint, one
//! [`Latch`] per one-shot setting, and the table of consumables already used.
//!
//! Breakpoints are identified by their activation time. A profile reload
//! clears pointers and latches; a committed rebirth clears the consumables
//! table as well.

use std::collections::HashSet;

use serde::Serialize;

use idlepilot_types::Channel;

/// Apply-once tracking for a one-shot breakpoint channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Latch {
    /// Activation time of the breakpoint last observed.
    pub current: Option<f64>,
    /// Whether that breakpoint's payload has been applied.
    pub applied: bool,
}

impl Latch {
    /// A latch that has seen nothing.
    pub const fn new() -> Self {
        Self {
            current: None,
            applied: false,
        }
    }

    /// Track the breakpoint active at `activation_time`.
    ///
    /// A different activation time than the one last seen re-arms the
    /// latch. Returns whether the payload still needs applying.
    pub fn observe(&mut self, activation_time: f64) -> bool {
        let changed = self
            .current
            .is_none_or(|current| current.total_cmp(&activation_time).is_ne());
        if changed {
            self.current = Some(activation_time);
            self.applied = false;
        }
        !self.applied
    }

    /// Record that the current payload was applied.
    pub const fn mark_applied(&mut self) {
        self.applied = true;
    }

    /// Forget everything.
    pub const fn reset(&mut self) {
        self.current = None;
        self.applied = false;
    }
}

/// The one-shot latch channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LatchChannel {
    /// Gear loadout.
    Gear,
    /// Active diggers.
    Diggers,
    /// Wandoos OS.
    Wandoos,
    /// NGU difficulty track.
    NguDiff,
    /// Consumables.
    Consumables,
}

impl LatchChannel {
    /// Every latch channel in evaluation order.
    pub const ALL: [Self; 5] = [
        Self::Gear,
        Self::Diggers,
        Self::Wandoos,
        Self::NguDiff,
        Self::Consumables,
    ];

    /// Short lowercase name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gear => "gear",
            Self::Diggers => "diggers",
            Self::Wandoos => "wandoos",
            Self::NguDiff => "ngu_diff",
            Self::Consumables => "consumables",
        }
    }
}

impl core::fmt::Display for LatchChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State threaded through every cycle.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    energy: Option<f64>,
    magic: Option<f64>,
    r3: Option<f64>,
    gear: Latch,
    diggers: Latch,
    wandoos: Latch,
    ngu_diff: Latch,
    consumables: Latch,
    /// (item, breakpoint activation time bits) pairs already consumed.
    consumed: HashSet<(String, u64)>,
}

impl EngineState {
    /// Fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activation time of `channel`'s current breakpoint.
    pub const fn pointer(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Energy => self.energy,
            Channel::Magic => self.magic,
            Channel::R3 => self.r3,
        }
    }

    /// Point `channel` at the breakpoint active at `activation_time`.
    /// Returns whether this is a switch.
    pub fn set_pointer(&mut self, channel: Channel, activation_time: f64) -> bool {
        let slot = match channel {
            Channel::Energy => &mut self.energy,
            Channel::Magic => &mut self.magic,
            Channel::R3 => &mut self.r3,
        };
        let switched = slot.is_none_or(|current| current.total_cmp(&activation_time).is_ne());
        *slot = Some(activation_time);
        switched
    }

    /// The latch for `channel`.
    pub const fn latch(&self, channel: LatchChannel) -> &Latch {
        match channel {
            LatchChannel::Gear => &self.gear,
            LatchChannel::Diggers => &self.diggers,
            LatchChannel::Wandoos => &self.wandoos,
            LatchChannel::NguDiff => &self.ngu_diff,
            LatchChannel::Consumables => &self.consumables,
        }
    }

    /// Mutable access to the latch for `channel`.
    pub const fn latch_mut(&mut self, channel: LatchChannel) -> &mut Latch {
        match channel {
            LatchChannel::Gear => &mut self.gear,
            LatchChannel::Diggers => &mut self.diggers,
            LatchChannel::Wandoos => &mut self.wandoos,
            LatchChannel::NguDiff => &mut self.ngu_diff,
            LatchChannel::Consumables => &mut self.consumables,
        }
    }

    /// Whether `item` was already consumed for the breakpoint at
    /// `activation_time`.
    pub fn already_consumed(&self, item: &str, activation_time: f64) -> bool {
        self.consumed
            .contains(&(item.to_owned(), activation_time.to_bits()))
    }

    /// Record that `item` was consumed for the breakpoint at
    /// `activation_time`.
    pub fn record_consumed(&mut self, item: &str, activation_time: f64) {
        self.consumed
            .insert((item.to_owned(), activation_time.to_bits()));
    }

    /// Number of entries in the consumables table.
    pub fn consumed_len(&self) -> usize {
        self.consumed.len()
    }

    /// Clear pointers and latches. Called after a profile reload; the
    /// consumables table survives so a reload never re-consumes.
    pub fn reset_pointers(&mut self) {
        self.energy = None;
        self.magic = None;
        self.r3 = None;
        for channel in LatchChannel::ALL {
            self.latch_mut(channel).reset();
        }
    }

    /// Clear everything. Called after a committed rebirth.
    pub fn reset_after_rebirth(&mut self) {
        self.reset_pointers();
        self.consumed.clear();
    }
}
