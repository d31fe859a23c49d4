//! Per-instance counters for the content and admin listeners.
//!
//! Each server instance owns one [`ServerMetrics`] behind an `Arc`; workers bump
//! counters with relaxed atomics and [`ServerMetrics::snapshot`] gives a
//! consistent-enough view for periodic stats logging and tests.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ServerMetrics {
    requests_served: AtomicU64,
    protocol_rejections: AtomicU64,
    transport_errors: AtomicU64,
    timeouts: AtomicU64,
    mode_toggles: AtomicU64,
    sessions_created: AtomicU64,
    cycles_completed: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_requests_served(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_protocol_rejections(&self) {
        self.protocol_rejections.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_transport_errors(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_mode_toggles(&self) {
        self.mode_toggles.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_sessions_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_cycles_completed(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            requests_served: self.requests_served.load(Ordering::Relaxed),
            protocol_rejections: self.protocol_rejections.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            mode_toggles: self.mode_toggles.load(Ordering::Relaxed),
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub requests_served: u64,
    pub protocol_rejections: u64,
    pub transport_errors: u64,
    pub timeouts: u64,
    pub mode_toggles: u64,
    pub sessions_created: u64,
    pub cycles_completed: u64,
}
