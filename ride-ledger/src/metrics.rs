//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the registry.
//!
//! # Metrics
//!
//! - `ride_ledger_rides_created_total` - Rides created
//! - `ride_ledger_rides_accepted_total` - Pending → accepted transitions
//! - `ride_ledger_rides_completed_total` - Accepted → completed transitions
//! - `ride_ledger_rides_cancelled_total` - Pending → cancelled transitions
//! - `ride_ledger_rejected_transitions_total` - Transitions refused by the state machine
//! - `ride_ledger_pending_rides` - Rides currently waiting for a driver
//! - `ride_ledger_operation_duration_seconds` - Operation latency histogram
//!
//! Collectors register against a per-instance registry, not the process
//! default, so independent ledgers never collide.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Rides created
    pub rides_created: IntCounter,

    /// Rides accepted
    pub rides_accepted: IntCounter,

    /// Rides completed
    pub rides_completed: IntCounter,

    /// Rides cancelled
    pub rides_cancelled: IntCounter,

    /// Transitions refused by the state machine
    pub rejected_transitions: IntCounter,

    /// Rides currently pending
    pub pending_rides: IntGauge,

    /// Operation latency histogram
    pub operation_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let rides_created =
            IntCounter::new("ride_ledger_rides_created_total", "Rides created")?;
        registry.register(Box::new(rides_created.clone()))?;

        let rides_accepted = IntCounter::new(
            "ride_ledger_rides_accepted_total",
            "Pending to accepted transitions",
        )?;
        registry.register(Box::new(rides_accepted.clone()))?;

        let rides_completed = IntCounter::new(
            "ride_ledger_rides_completed_total",
            "Accepted to completed transitions",
        )?;
        registry.register(Box::new(rides_completed.clone()))?;

        let rides_cancelled = IntCounter::new(
            "ride_ledger_rides_cancelled_total",
            "Pending to cancelled transitions",
        )?;
        registry.register(Box::new(rides_cancelled.clone()))?;

        let rejected_transitions = IntCounter::new(
            "ride_ledger_rejected_transitions_total",
            "Transitions refused by the state machine",
        )?;
        registry.register(Box::new(rejected_transitions.clone()))?;

        let pending_rides = IntGauge::new(
            "ride_ledger_pending_rides",
            "Rides currently waiting for a driver",
        )?;
        registry.register(Box::new(pending_rides.clone()))?;

        let operation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ride_ledger_operation_duration_seconds",
                "Histogram of operation latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100]),
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            rides_created,
            rides_accepted,
            rides_completed,
            rides_cancelled,
            rejected_transitions,
            pending_rides,
            operation_duration,
            registry,
        })
    }

    /// Record ride creation
    pub fn record_ride_created(&self) {
        self.rides_created.inc();
        self.pending_rides.inc();
    }

    /// Record a successful acceptance
    pub fn record_ride_accepted(&self) {
        self.rides_accepted.inc();
        self.pending_rides.dec();
    }

    /// Record a successful completion
    pub fn record_ride_completed(&self) {
        self.rides_completed.inc();
    }

    /// Record a successful cancellation
    pub fn record_ride_cancelled(&self) {
        self.rides_cancelled.inc();
        self.pending_rides.dec();
    }

    /// Record a transition the state machine refused
    pub fn record_rejected_transition(&self) {
        self.rejected_transitions.inc();
    }

    /// Record operation duration
    pub fn record_operation_duration(&self, duration_seconds: f64) {
        self.operation_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.rides_created.get(), 0);
        assert_eq!(metrics.pending_rides.get(), 0);
        assert_eq!(metrics.registry.gather().len(), 7);
    }

    #[test]
    fn test_independent_instances() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_ride_created();
        assert_eq!(a.rides_created.get(), 1);
        assert_eq!(b.rides_created.get(), 0);
    }

    #[test]
    fn test_lifecycle_counters() {
        let metrics = Metrics::new().unwrap();

        metrics.record_ride_created();
        metrics.record_ride_created();
        assert_eq!(metrics.rides_created.get(), 2);
        assert_eq!(metrics.pending_rides.get(), 2);

        metrics.record_ride_accepted();
        assert_eq!(metrics.rides_accepted.get(), 1);
        assert_eq!(metrics.pending_rides.get(), 1);

        metrics.record_ride_completed();
        assert_eq!(metrics.rides_completed.get(), 1);

        metrics.record_ride_cancelled();
        assert_eq!(metrics.rides_cancelled.get(), 1);
        assert_eq!(metrics.pending_rides.get(), 0);
    }

    #[test]
    fn test_rejected_transitions() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected_transition();
        assert_eq!(metrics.rejected_transitions.get(), 1);
    }
}
