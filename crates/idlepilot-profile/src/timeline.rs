//! Breakpoint timelines and active/next resolution.
//!
//! A [`Timeline`] holds the breakpoints of one channel sorted descending by
//! activation time. The breakpoint active at an elapsed-time cursor `t` is
//! the one with the greatest activation time `<= t`; the next one is the one
//! with the smallest activation time `> t`.
//!
//! # Ties
//!
//! Entries sharing an activation time keep their configured order (the sort
//! is stable) and both lookups return the first of them in configured order.
//! This tie-break is implementation-defined; profiles should not rely on it.

use serde::Serialize;

/// A payload that becomes active at `activation_time` seconds of elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakpoint<T> {
    /// Elapsed seconds at which this breakpoint takes over.
    pub activation_time: f64,
    /// What the breakpoint configures.
    pub payload: T,
}

impl<T> Breakpoint<T> {
    /// Create a breakpoint.
    pub const fn new(activation_time: f64, payload: T) -> Self {
        Self {
            activation_time,
            payload,
        }
    }

    /// Whether this breakpoint activates at `activation_time`. Activation time is the
    /// breakpoint's identity for pointer and latch tracking.
    pub fn same_time(&self, activation_time: f64) -> bool {
        self.activation_time.total_cmp(&activation_time).is_eq()
    }
}

/// Ordered breakpoints for one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline<T> {
    /// Sorted descending by activation time; ties in configured order.
    entries: Vec<Breakpoint<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Timeline<T> {
    /// Build a timeline from breakpoints in configured order.
    pub fn new(mut entries: Vec<Breakpoint<T>>) -> Self {
        entries.sort_by(|a, b| b.activation_time.total_cmp(&a.activation_time));
        Self { entries }
    }

    /// The breakpoint with the greatest activation time `<= t`.
    ///
    /// Returns `None` when `t` precedes every configured breakpoint (or is
    /// NaN), which callers treat as the implicit empty breakpoint at time 0.
    pub fn resolve_active(&self, t: f64) -> Option<&Breakpoint<T>> {
        self.entries.iter().find(|bp| bp.activation_time <= t)
    }

    /// The breakpoint with the smallest activation time `> t`: the nearest
    /// future deadline.
    pub fn resolve_next(&self, t: f64) -> Option<&Breakpoint<T>> {
        let nearest = self
            .entries
            .iter()
            .map(|bp| bp.activation_time)
            .filter(|time| *time > t)
            .min_by(f64::total_cmp)?;
        self.entries.iter().find(|bp| bp.same_time(nearest))
    }

    /// Number of breakpoints.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no breakpoints are configured.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate breakpoints, latest activation first.
    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint<T>> {
        self.entries.iter()
    }
}
