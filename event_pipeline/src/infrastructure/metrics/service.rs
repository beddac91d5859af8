// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Owns the Prometheus registry and the processor-level collectors. There is
//! no HTTP endpoint here; embedders gather the registry however their
//! deployment exposes metrics.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};

use event_pipeline_domain::EventError;

/// Processor metrics backed by a Prometheus registry.
pub struct MetricsService {
    registry: Registry,
    events_processed_total: IntCounter,
    events_finished_total: IntCounter,
    events_inflight: IntGauge,
    event_processing_duration: Histogram,
}

impl MetricsService {
    /// Creates the service and registers its collectors
    pub fn new() -> Result<Self, EventError> {
        let registry = Registry::new();

        let events_processed_total = IntCounter::with_opts(Opts::new(
            "event_pipeline_events_processed_total",
            "Total number of events run through the main stack",
        ))
        .map_err(|e| EventError::internal_error(format!("creating events_processed_total: {}", e)))?;

        let events_finished_total = IntCounter::with_opts(Opts::new(
            "event_pipeline_events_finished_total",
            "Total number of events with a successful terminal action",
        ))
        .map_err(|e| EventError::internal_error(format!("creating events_finished_total: {}", e)))?;

        let events_inflight = IntGauge::with_opts(Opts::new(
            "event_pipeline_events_inflight",
            "Events currently being processed by workers",
        ))
        .map_err(|e| EventError::internal_error(format!("creating events_inflight: {}", e)))?;

        let event_processing_duration = Histogram::with_opts(HistogramOpts::new(
            "event_pipeline_event_processing_duration_seconds",
            "Wall-clock time spent processing one event",
        ))
        .map_err(|e| EventError::internal_error(format!("creating event_processing_duration: {}", e)))?;

        registry
            .register(Box::new(events_processed_total.clone()))
            .map_err(|e| EventError::internal_error(format!("registering events_processed_total: {}", e)))?;
        registry
            .register(Box::new(events_finished_total.clone()))
            .map_err(|e| EventError::internal_error(format!("registering events_finished_total: {}", e)))?;
        registry
            .register(Box::new(events_inflight.clone()))
            .map_err(|e| EventError::internal_error(format!("registering events_inflight: {}", e)))?;
        registry
            .register(Box::new(event_processing_duration.clone()))
            .map_err(|e| EventError::internal_error(format!("registering event_processing_duration: {}", e)))?;

        Ok(Self {
            registry,
            events_processed_total,
            events_finished_total,
            events_inflight,
            event_processing_duration,
        })
    }

    /// The underlying registry, for gathering
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus metrics in text exposition format
    pub fn get_metrics(&self) -> Result<String, EventError> {
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .map_err(|e| EventError::internal_error(format!("encoding metrics: {}", e)))
    }

    /// Records a worker picking up a request
    pub fn record_started(&self) {
        self.events_inflight.inc();
    }

    /// Records a request completing, with its processing duration
    pub fn record_processed(&self, duration_seconds: f64) {
        self.events_inflight.dec();
        self.events_processed_total.inc();
        self.event_processing_duration.observe(duration_seconds);
    }

    /// Records a successful terminal action
    pub fn record_finished(&self) {
        self.events_finished_total.inc();
    }

    /// Current processed-events count (for tests and diagnostics)
    pub fn processed_total(&self) -> u64 {
        self.events_processed_total.get()
    }

    /// Current finished-events count (for tests and diagnostics)
    pub fn finished_total(&self) -> u64 {
        self.events_finished_total.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cycle() {
        let service = MetricsService::new().unwrap();
        service.record_started();
        service.record_processed(0.004);
        service.record_finished();
        assert_eq!(service.processed_total(), 1);
        assert_eq!(service.finished_total(), 1);

        let text = service.get_metrics().unwrap();
        assert!(text.contains("event_pipeline_events_processed_total 1"));
        assert!(text.contains("event_pipeline_events_inflight 0"));
    }
}
