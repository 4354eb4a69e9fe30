//! Process metrics: request counts, auth outcomes, active users, pizza sales and host usage.
//!
//! Handlers and middleware record through [`MetricsSink`]; the token authority never does.
//! [`MetricsRegistry`] keeps its series in a `prometheus` registry that is read and reset on
//! every flush, and [`spawn_flusher`] emits that snapshot through `tracing` (target `metrics`).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use prometheus::{Counter, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sysinfo::System;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub trait MetricsSink: Send + Sync {
    fn record_request(&self, method: &Method, latency: Duration);

    fn record_auth_attempt(&self, succeeded: bool);

    /// Moves the active-user gauge by `delta`.
    fn adjust_active_users(&self, delta: i64);

    fn record_purchase(&self, pizzas: usize, revenue: Decimal, latency: Duration, succeeded: bool);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_by_method: BTreeMap<String, u64>,
    pub total_requests: u64,
    pub total_latency_ms: f64,
    pub auth_successes: u64,
    pub auth_failures: u64,
    pub active_users: i64,
    pub pizzas_sold: u64,
    pub revenue: f64,
    pub purchase_failures: u64,
    pub purchase_latency_ms: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

/// CPU and memory usage of the host, both as percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemUsage {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

/// Samples host usage. CPU load is measured between consecutive samples, so keep one around.
pub struct SystemSampler {
    system: System,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();
        Self { system }
    }

    pub fn sample(&mut self) -> SystemUsage {
        self.system.refresh_cpu();
        self.system.refresh_memory();

        let cpu = f64::from(self.system.global_cpu_info().cpu_usage());
        let total = self.system.total_memory();
        let memory = if total == 0 {
            0.0
        } else {
            self.system.used_memory() as f64 / total as f64 * 100.0
        };

        SystemUsage {
            cpu_percent: percentage(cpu),
            memory_percent: percentage(memory),
        }
    }
}

// the first cpu reading has no previous sample to diff against
fn percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process [`MetricsSink`]. Counters reset on every flush, the gauges do not.
#[derive(Clone)]
pub struct MetricsRegistry {
    source: String,
    registry: Registry,
    requests: IntCounterVec,
    request_latency_ms: Counter,
    auth_attempts: IntCounterVec,
    active_users: IntGauge,
    pizzas_sold: IntCounter,
    revenue: Counter,
    purchase_failures: IntCounter,
    purchase_latency_ms: Counter,
    cpu_percent: Gauge,
    memory_percent: Gauge,
}

impl MetricsRegistry {
    pub fn new(source: impl Into<String>) -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("pizza_http_requests_total", "Count of HTTP requests grouped by method"),
            &["method"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let request_latency_ms = Counter::new(
            "pizza_http_request_latency_ms_total",
            "Summed HTTP request latency in milliseconds",
        )?;
        registry.register(Box::new(request_latency_ms.clone()))?;

        let auth_attempts = IntCounterVec::new(
            Opts::new("pizza_auth_attempts_total", "Count of authentication attempts grouped by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(auth_attempts.clone()))?;

        let active_users = IntGauge::new("pizza_active_users", "Open sessions")?;
        registry.register(Box::new(active_users.clone()))?;

        let pizzas_sold = IntCounter::new("pizza_sold_total", "Pizzas in successful orders")?;
        registry.register(Box::new(pizzas_sold.clone()))?;

        let revenue = Counter::new("pizza_revenue_total", "Revenue of successful orders")?;
        registry.register(Box::new(revenue.clone()))?;

        let purchase_failures = IntCounter::new("pizza_purchase_failures_total", "Orders that failed to persist")?;
        registry.register(Box::new(purchase_failures.clone()))?;

        let purchase_latency_ms = Counter::new(
            "pizza_purchase_latency_ms_total",
            "Summed order processing latency in milliseconds",
        )?;
        registry.register(Box::new(purchase_latency_ms.clone()))?;

        let cpu_percent = Gauge::new("pizza_cpu_percent", "Host CPU usage percentage")?;
        registry.register(Box::new(cpu_percent.clone()))?;

        let memory_percent = Gauge::new("pizza_memory_percent", "Host memory usage percentage")?;
        registry.register(Box::new(memory_percent.clone()))?;

        Ok(Self {
            source: source.into(),
            registry,
            requests,
            request_latency_ms,
            auth_attempts,
            active_users,
            pizzas_sold,
            revenue,
            purchase_failures,
            purchase_latency_ms,
            cpu_percent,
            memory_percent,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_system_usage(&self, usage: SystemUsage) {
        self.cpu_percent.set(usage.cpu_percent);
        self.memory_percent.set(usage.memory_percent);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut requests_by_method = BTreeMap::new();
        for family in self.registry.gather() {
            if family.get_name() != "pizza_http_requests_total" {
                continue;
            }
            for metric in family.get_metric() {
                if let Some(label) = metric.get_label().first() {
                    requests_by_method.insert(label.get_value().to_string(), metric.get_counter().get_value() as u64);
                }
            }
        }

        MetricsSnapshot {
            total_requests: requests_by_method.values().sum(),
            requests_by_method,
            total_latency_ms: self.request_latency_ms.get(),
            auth_successes: self.auth_attempts.with_label_values(&["success"]).get(),
            auth_failures: self.auth_attempts.with_label_values(&["failure"]).get(),
            active_users: self.active_users.get(),
            pizzas_sold: self.pizzas_sold.get(),
            revenue: self.revenue.get(),
            purchase_failures: self.purchase_failures.get(),
            purchase_latency_ms: self.purchase_latency_ms.get(),
            cpu_percent: self.cpu_percent.get(),
            memory_percent: self.memory_percent.get(),
        }
    }

    /// Returns the accumulated values and starts a new window.
    pub fn flush(&self) -> MetricsSnapshot {
        let snapshot = self.snapshot();
        self.requests.reset();
        self.request_latency_ms.reset();
        self.auth_attempts.reset();
        self.pizzas_sold.reset();
        self.revenue.reset();
        self.purchase_failures.reset();
        self.purchase_latency_ms.reset();
        snapshot
    }
}

impl MetricsSink for MetricsRegistry {
    fn record_request(&self, method: &Method, latency: Duration) {
        self.requests.with_label_values(&[method.as_str()]).inc();
        self.request_latency_ms.inc_by(latency.as_secs_f64() * 1000.0);
    }

    fn record_auth_attempt(&self, succeeded: bool) {
        let outcome = if succeeded { "success" } else { "failure" };
        self.auth_attempts.with_label_values(&[outcome]).inc();
    }

    fn adjust_active_users(&self, delta: i64) {
        let next = (self.active_users.get() + delta).max(0);
        self.active_users.set(next);
    }

    fn record_purchase(&self, pizzas: usize, revenue: Decimal, latency: Duration, succeeded: bool) {
        if succeeded {
            self.pizzas_sold.inc_by(pizzas as u64);
            match revenue.to_f64() {
                Some(amount) if amount >= 0.0 => self.revenue.inc_by(amount),
                _ => warn!("Revenue {} not recorded", revenue),
            }
        } else {
            self.purchase_failures.inc();
        }
        self.purchase_latency_ms.inc_by(latency.as_secs_f64() * 1000.0);
    }
}

/// Samples host usage, then emits and resets the registry every `interval` until the
/// runtime shuts down.
pub fn spawn_flusher(registry: Arc<MetricsRegistry>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sampler = SystemSampler::new();
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            registry.record_system_usage(sampler.sample());
            let snapshot = registry.flush();
            info!(
                target: "metrics",
                source = registry.source(),
                total_requests = snapshot.total_requests,
                get = snapshot.requests_by_method.get("GET").copied().unwrap_or(0),
                post = snapshot.requests_by_method.get("POST").copied().unwrap_or(0),
                put = snapshot.requests_by_method.get("PUT").copied().unwrap_or(0),
                delete = snapshot.requests_by_method.get("DELETE").copied().unwrap_or(0),
                latency_ms = snapshot.total_latency_ms,
                auth_successes = snapshot.auth_successes,
                auth_failures = snapshot.auth_failures,
                active_users = snapshot.active_users,
                pizzas_sold = snapshot.pizzas_sold,
                revenue = snapshot.revenue,
                purchase_failures = snapshot.purchase_failures,
                purchase_latency_ms = snapshot.purchase_latency_ms,
                cpu = snapshot.cpu_percent,
                memory = snapshot.memory_percent,
                "metrics flush"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn registry() -> MetricsRegistry {
        MetricsRegistry::new("jwt-pizza-service-test").unwrap()
    }

    #[test]
    fn requests_are_counted_by_method() {
        let registry = registry();
        registry.record_request(&Method::GET, Duration::from_millis(10));
        registry.record_request(&Method::GET, Duration::from_millis(5));
        registry.record_request(&Method::POST, Duration::from_millis(5));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.requests_by_method["GET"], 2);
        assert_eq!(snapshot.requests_by_method["POST"], 1);
        assert!((snapshot.total_latency_ms - 20.0).abs() < 0.001);
    }

    #[test]
    fn series_are_registered_with_prometheus() {
        let registry = registry();
        registry.record_auth_attempt(true);

        let names: Vec<String> = registry
            .registry()
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"pizza_auth_attempts_total".to_string()));
        assert!(names.contains(&"pizza_active_users".to_string()));
    }

    #[test]
    fn flush_resets_counters_but_keeps_gauges() {
        let registry = registry();
        registry.record_auth_attempt(true);
        registry.record_auth_attempt(false);
        registry.adjust_active_users(2);
        registry.record_system_usage(SystemUsage { cpu_percent: 12.5, memory_percent: 40.0 });
        registry.record_purchase(
            3,
            Decimal::from_f64(0.012).unwrap(),
            Duration::from_millis(40),
            true,
        );
        registry.record_purchase(1, Decimal::ZERO, Duration::from_millis(5), false);

        let flushed = registry.flush();
        assert_eq!(flushed.auth_successes, 1);
        assert_eq!(flushed.auth_failures, 1);
        assert_eq!(flushed.pizzas_sold, 3);
        assert!((flushed.revenue - 0.012).abs() < 1e-9);
        assert_eq!(flushed.purchase_failures, 1);

        let after = registry.snapshot();
        assert_eq!(after.active_users, 2);
        assert_eq!(after.cpu_percent, 12.5);
        assert_eq!(after.total_requests, 0);
        assert_eq!(after.auth_successes, 0);
        assert_eq!(after.pizzas_sold, 0);
        assert_eq!(after.revenue, 0.0);
    }

    #[test]
    fn active_users_never_go_negative() {
        let registry = registry();
        registry.adjust_active_users(-1);
        assert_eq!(registry.snapshot().active_users, 0);
    }

    #[test]
    fn system_usage_is_a_percentage() {
        let mut sampler = SystemSampler::new();
        let usage = sampler.sample();
        assert!((0.0..=100.0).contains(&usage.cpu_percent));
        assert!((0.0..=100.0).contains(&usage.memory_percent));
    }

    #[tokio::test(start_paused = true)]
    async fn flusher_drains_the_registry() {
        let registry = Arc::new(registry());
        registry.record_request(&Method::DELETE, Duration::from_millis(1));

        let handle = spawn_flusher(registry.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(registry.snapshot().total_requests, 0);
        handle.abort();
    }
}
