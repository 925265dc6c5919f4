//! Allocation target dispatch and per-channel allocation.
//!
//! [`AllocationTarget`] is a sum type over the target kinds. Every kind
//! except blood rituals delegates to the host's generic slot commit; blood
//! rituals fan out through the ritual scheduler.

use tracing::debug;

use idlepilot_types::{
    AllocationTarget, Channel, GameStatus, ReclaimMode, ResourcePools, RitualBoard, TargetKind,
};

use crate::fair_share::{AllocContext, FairShareReport, ShareTarget, fair_share};
use crate::ritual::schedule_rituals;

impl<H> ShareTarget<H> for AllocationTarget
where
    H: ResourcePools + RitualBoard + GameStatus + ?Sized,
{
    fn is_cap_priority(&self) -> bool {
        self.cap_priority
    }

    fn allocate(&self, host: &mut H, ctx: &AllocContext, request: u64) -> bool {
        match self.kind {
            TargetKind::BloodRituals { run_seconds } => {
                schedule_rituals(host, ctx, run_seconds).total() > 0
            }
            kind => allocate_slot(host, ctx.channel, &kind, self.cap_priority, request),
        }
    }
}

/// Commit to a host-managed slot.
///
/// Non-cap targets take `min(request, idle)`. Cap-priority targets take
/// `min(cap_headroom, idle)`. Nothing to give, or nothing accepted, is a
/// failure.
pub fn allocate_slot<H>(
    host: &mut H,
    channel: Channel,
    kind: &TargetKind,
    cap_priority: bool,
    request: u64,
) -> bool
where
    H: ResourcePools + ?Sized,
{
    let idle = host.idle(channel);
    let amount = if cap_priority {
        host.cap_headroom(channel, kind).min(idle)
    } else {
        request.min(idle)
    };
    if amount == 0 {
        return false;
    }
    host.commit(channel, kind, amount) > 0
}

/// Reclaim mode for a channel given its active targets.
///
/// Energy is fully reclaimed only when basic training is being managed;
/// otherwise basic training keeps what it has. Magic never fully reclaims,
/// R3 always does.
pub fn reclaim_mode(channel: Channel, active: &[&AllocationTarget]) -> ReclaimMode {
    match channel {
        Channel::Energy if active.iter().any(|t| t.kind.is_basic_training()) => ReclaimMode::Full,
        Channel::Energy | Channel::Magic => ReclaimMode::Partial,
        Channel::R3 => ReclaimMode::Full,
    }
}

/// Allocate one channel's pool across `targets` in priority order.
///
/// Targets that are invalid for the channel or locked on the host are
/// filtered out first. The host is refreshed exactly once afterwards, even
/// when nothing was active.
pub fn allocate_channel<H>(
    host: &mut H,
    ctx: &AllocContext,
    targets: &[AllocationTarget],
) -> FairShareReport
where
    H: ResourcePools + RitualBoard + GameStatus + ?Sized,
{
    let channel = ctx.channel;
    let active: Vec<&AllocationTarget> = targets
        .iter()
        .filter(|t| t.valid_for(channel) && host.is_unlocked(&t.kind))
        .collect();

    let report = if active.is_empty() {
        debug!(%channel, "No active targets");
        FairShareReport::default()
    } else {
        let mode = reclaim_mode(channel, &active);
        fair_share(host, ctx, mode, active)
    };

    host.refresh(channel);
    report
}
