//! The iterative fair-share loop.
//!
//! Targets are offered resource in priority order. Each non-cap target is
//! offered an equal share of what is still idle, counting itself and every
//! non-cap target after it; cap-priority targets are offered the whole idle
//! pool and bound their own acceptance. A target that declines is dropped
//! and the pass is repeated with the survivors from a freshly reclaimed
//! pool, until a pass completes without failures or nobody is left.

use serde::Serialize;
use tracing::debug;

use idlepilot_types::{Channel, ReclaimMode, ResourcePools};

/// Per-call inputs shared by every target of a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocContext {
    /// The channel being allocated.
    pub channel: Channel,
    /// Activation time of the channel's next breakpoint, if any.
    pub next_breakpoint: Option<f64>,
    /// Elapsed time of an armed time rebirth, if any.
    pub rebirth_at: Option<f64>,
}

impl AllocContext {
    /// A context with no deadlines.
    pub const fn new(channel: Channel) -> Self {
        Self {
            channel,
            next_breakpoint: None,
            rebirth_at: None,
        }
    }
}

/// A consumer the fair-share loop can offer resource to.
pub trait ShareTarget<H: ?Sized> {
    /// Whether this target is excluded from the fair-share divisor.
    fn is_cap_priority(&self) -> bool;

    /// Try to take up to `request` (or, for cap-priority targets, up to
    /// their own cap) from the channel's idle pool. Returns `false` when the
    /// target declined or nothing was accepted.
    fn allocate(&self, host: &mut H, ctx: &AllocContext, request: u64) -> bool;
}

/// Outcome of one channel's fair-share allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FairShareReport {
    /// Number of passes run.
    pub passes: u32,
    /// Targets that succeeded in the final pass, in order.
    pub allocated: Vec<String>,
    /// Targets dropped after declining, in the order they failed.
    pub dropped: Vec<String>,
}

/// Run the fair-share loop over `active` targets.
///
/// The caller is responsible for filtering `active` down to targets that
/// are valid for the channel and unlocked, and for refreshing the host once
/// afterwards.
pub fn fair_share<H, T>(
    host: &mut H,
    ctx: &AllocContext,
    mode: ReclaimMode,
    mut active: Vec<&T>,
) -> FairShareReport
where
    H: ResourcePools + ?Sized,
    T: ShareTarget<H> + core::fmt::Display + ?Sized,
{
    let mut report = FairShareReport::default();
    let channel = ctx.channel;

    loop {
        report.passes = report.passes.saturating_add(1);
        let mut divisor = active.iter().filter(|t| !t.is_cap_priority()).count();
        let mut had_failure = false;
        let mut success = Vec::with_capacity(active.len());

        host.reclaim(channel, mode);

        for target in active {
            let idle = host.idle(channel);
            let request = share_of(idle, divisor);
            host.set_request(channel, request);
            if !target.is_cap_priority() {
                divisor = divisor.saturating_sub(1);
            }

            if target.allocate(host, ctx, request) {
                debug!(%channel, target = %target, request, "Allocated");
                success.push(target);
            } else {
                debug!(%channel, target = %target, request, "Target declined, dropping");
                report.dropped.push(target.to_string());
                had_failure = true;
            }
        }

        active = success;
        if !had_failure || active.is_empty() {
            break;
        }
    }

    report.allocated = active.iter().map(ToString::to_string).collect();
    report
}

/// `ceil(idle / max(divisor, 1))`.
pub fn share_of(idle: u64, divisor: usize) -> u64 {
    let divisor = u64::try_from(divisor.max(1)).unwrap_or(u64::MAX);
    idle.div_ceil(divisor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use idlepilot_types::TargetKind;

    use super::*;

    /// A single-channel pool where targets are identified by name.
    #[derive(Default)]
    struct Pool {
        total: u64,
        given: BTreeMap<&'static str, u64>,
        requests: Vec<u64>,
        reclaims: u32,
    }

    impl Pool {
        fn free(&self) -> u64 {
            self.total - self.given.values().sum::<u64>()
        }
    }

    impl ResourcePools for Pool {
        fn idle(&self, _: Channel) -> u64 {
            self.free()
        }
        fn reclaim(&mut self, _: Channel, _: ReclaimMode) {
            self.given.clear();
            self.reclaims += 1;
        }
        fn set_request(&mut self, _: Channel, amount: u64) {
            self.requests.push(amount);
        }
        fn is_unlocked(&self, _: &TargetKind) -> bool {
            true
        }
        fn cap_headroom(&self, _: Channel, _: &TargetKind) -> u64 {
            u64::MAX
        }
        fn commit(&mut self, _: Channel, _: &TargetKind, _: u64) -> u64 {
            0
        }
        fn refresh(&mut self, _: Channel) {}
    }

    /// A named target with an optional cap that can be told to refuse.
    struct Named {
        name: &'static str,
        cap: Option<u64>,
        refuse: bool,
        seen: RefCell<Vec<u64>>,
    }

    impl Named {
        fn new(name: &'static str, cap: Option<u64>) -> Self {
            Self {
                name,
                cap,
                refuse: false,
                seen: RefCell::new(Vec::new()),
            }
        }
        fn refusing(name: &'static str) -> Self {
            Self {
                refuse: true,
                ..Self::new(name, None)
            }
        }
    }

    impl core::fmt::Display for Named {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str(self.name)
        }
    }

    impl ShareTarget<Pool> for Named {
        fn is_cap_priority(&self) -> bool {
            self.cap.is_some()
        }
        fn allocate(&self, host: &mut Pool, _: &AllocContext, request: u64) -> bool {
            self.seen.borrow_mut().push(request);
            if self.refuse {
                return false;
            }
            let idle = host.free();
            let amount = self.cap.unwrap_or(request).min(idle);
            if amount == 0 {
                return false;
            }
            *host.given.entry(self.name).or_default() += amount;
            true
        }
    }

    fn run(pool: &mut Pool, targets: &[Named]) -> FairShareReport {
        let ctx = AllocContext::new(Channel::Energy);
        fair_share(pool, &ctx, ReclaimMode::Partial, targets.iter().collect())
    }

    #[test]
    fn cap_target_takes_its_cap_and_shared_target_takes_the_rest() {
        let mut pool = Pool {
            total: 100,
            ..Pool::default()
        };
        let targets = [Named::new("A", Some(30)), Named::new("B", None)];
        let report = run(&mut pool, &targets);

        assert_eq!(pool.given.get("A"), Some(&30));
        assert_eq!(pool.given.get("B"), Some(&70));
        assert_eq!(report.passes, 1);
        assert!(report.dropped.is_empty());
        // A is offered the whole pool, B the remainder.
        assert_eq!(pool.requests, vec![100, 70]);
    }

    #[test]
    fn shared_targets_split_evenly_with_ceiling() {
        let mut pool = Pool {
            total: 10,
            ..Pool::default()
        };
        let targets = [
            Named::new("A", None),
            Named::new("B", None),
            Named::new("C", None),
        ];
        run(&mut pool, &targets);
        // ceil(10/3) = 4, ceil(6/2) = 3, ceil(3/1) = 3
        assert_eq!(pool.requests, vec![4, 3, 3]);
        assert_eq!(pool.free(), 0);
    }

    #[test]
    fn requests_never_exceed_share_of_pass_start_pool() {
        let mut pool = Pool {
            total: 997,
            ..Pool::default()
        };
        let targets = [
            Named::new("A", None),
            Named::new("cap", Some(5)),
            Named::new("B", None),
            Named::new("C", None),
            Named::new("D", None),
        ];
        run(&mut pool, &targets);

        let mut divisor = 4_u64;
        for (target, request) in targets
            .iter()
            .map(|t| (t, t.seen.borrow()[0]))
            .filter(|(t, _)| t.cap.is_none())
        {
            assert!(
                request <= 997_u64.div_ceil(divisor),
                "{target} requested {request} with divisor {divisor}"
            );
            divisor -= 1;
        }
    }

    #[test]
    fn failed_target_is_dropped_and_pass_repeats() {
        let mut pool = Pool {
            total: 90,
            ..Pool::default()
        };
        let targets = [
            Named::new("A", None),
            Named::refusing("X"),
            Named::new("B", None),
        ];
        let report = run(&mut pool, &targets);

        assert_eq!(report.passes, 2);
        assert_eq!(report.dropped, vec!["X".to_owned()]);
        assert_eq!(report.allocated, vec!["A".to_owned(), "B".to_owned()]);
        assert_eq!(pool.reclaims, 2);
        // Second pass splits between two: 45 each.
        assert_eq!(pool.given.get("A"), Some(&45));
        assert_eq!(pool.given.get("B"), Some(&45));
        // The refusing target is only offered once.
        assert_eq!(targets[1].seen.borrow().len(), 1);
    }

    #[test]
    fn all_failing_targets_terminate_after_one_pass() {
        let mut pool = Pool {
            total: 50,
            ..Pool::default()
        };
        let targets = [Named::refusing("X"), Named::refusing("Y")];
        let report = run(&mut pool, &targets);
        assert_eq!(report.passes, 1);
        assert!(report.allocated.is_empty());
        assert_eq!(pool.free(), 50);
    }

    #[test]
    fn share_of_handles_zero_divisor() {
        assert_eq!(share_of(7, 0), 7);
        assert_eq!(share_of(7, 2), 4);
        assert_eq!(share_of(0, 3), 0);
    }
}
