//! Time profiling
//!
//! Wraps the execution of each probe and records wall-clock durations at
//! nanosecond resolution, rendered in milliseconds. The time between the
//! invocation epoch (process entry or request arrival) and profile creation
//! is accounted for as `preboot`.

use indexmap::IndexMap;
use std::future::Future;
use std::time::{Duration, Instant};

/// Per-probe timing capture for one invocation.
#[derive(Debug)]
pub struct Profile {
    start: Instant,
    preboot: Duration,
    items: IndexMap<String, Duration>,
    total: Option<Duration>,
}

impl Profile {
    /// Start profiling. `epoch` is the earliest instant known for this
    /// invocation and should be captured as soon as possible.
    pub fn new(epoch: Instant) -> Self {
        let start = Instant::now();
        Self {
            start,
            preboot: start.saturating_duration_since(epoch),
            items: IndexMap::new(),
            total: None,
        }
    }

    /// Run a probe future and record its elapsed duration under `name`.
    pub async fn measure<F, T>(&mut self, name: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let started = Instant::now();
        let out = fut.await;
        self.items.insert(name.to_string(), started.elapsed());
        out
    }

    /// Stop profiling; fixes the total duration measured from the epoch.
    pub fn stop(&mut self) {
        self.total = Some(self.start.elapsed() + self.preboot);
    }

    /// Recorded durations in execution order.
    pub fn items(&self) -> &IndexMap<String, Duration> {
        &self.items
    }

    /// Durations in milliseconds within `[min_ms, max_ms]`; either bound is
    /// optional/open.
    pub fn by_duration(&self, min_ms: Option<u64>, max_ms: Option<u64>) -> IndexMap<String, f64> {
        self.items
            .iter()
            .filter_map(|(name, duration)| {
                let ms = duration.as_secs_f64() * 1000.0;
                if let Some(min) = min_ms {
                    if ms < min as f64 {
                        return None;
                    }
                }
                if let Some(max) = max_ms {
                    if ms > max as f64 {
                        return None;
                    }
                }
                Some((name.clone(), ms))
            })
            .collect()
    }

    /// Render the timing table: durations sorted descending, then overhead
    /// and total rows.
    pub fn text_table(&self, separator: &str) -> String {
        let mut sorted: Vec<(&String, &Duration)> = self.items.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1));

        let mut lines: Vec<String> = sorted
            .into_iter()
            .map(|(name, duration)| format_row(duration, name))
            .collect();

        let total = self
            .total
            .unwrap_or_else(|| self.start.elapsed() + self.preboot);

        lines.push(String::new());
        lines.push(format_row(&self.preboot, "preboot"));
        lines.push(format_row(&total, "total"));
        lines.join(separator)
    }
}

fn format_row(duration: &Duration, name: &str) -> String {
    format!("{:10.3} ms - {}", duration.as_secs_f64() * 1000.0, name)
}
