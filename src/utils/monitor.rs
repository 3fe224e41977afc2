//! Resource usage of the `mcp-devstack` process itself.
//!
//! `seed --monitor` logs a sample after every service is loaded, and
//! `diagnose` reports the current memory figure. Without the `cli` feature
//! the monitor is a no-op so library users do not pull in `sysinfo`.

#[cfg(feature = "cli")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub memory_usage_percent: f32,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

#[cfg(feature = "cli")]
pub struct ProcessMonitor {
    sampler: Option<(Pid, Mutex<System>)>,
    started: Instant,
    peak_mb: AtomicU64,
}

#[cfg(feature = "cli")]
impl ProcessMonitor {
    /// A disabled monitor never touches `sysinfo`.
    pub fn new(enabled: bool) -> Self {
        let sampler = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some((pid, Mutex::new(System::new()))),
                Err(e) => {
                    tracing::warn!("Process stats disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            sampler,
            started: Instant::now(),
            peak_mb: AtomicU64::new(0),
        }
    }

    pub fn sample(&self) -> Option<ProcessStats> {
        let (pid, system) = self.sampler.as_ref()?;
        let mut system = system.lock().ok()?;
        system.refresh_memory();
        system.refresh_processes(ProcessesToUpdate::Some(&[*pid]), true);

        let process = system.process(*pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let total_mb = system.total_memory() / 1024 / 1024;
        let peak_mb = self.peak_mb.fetch_max(memory_mb, Ordering::Relaxed).max(memory_mb);

        Some(ProcessStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            memory_usage_percent: if total_mb > 0 {
                memory_mb as f32 / total_mb as f32 * 100.0
            } else {
                0.0
            },
            peak_memory_mb: peak_mb,
            elapsed_time: self.started.elapsed(),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Time: {:?}",
                phase,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.memory_usage_percent,
                stats.peak_memory_mb,
                stats.elapsed_time
            );
        }
    }

    pub fn log_summary(&self) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 Seeding took {:?}, peak memory {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }
}

#[cfg(not(feature = "cli"))]
pub struct ProcessMonitor;

#[cfg(not(feature = "cli"))]
impl ProcessMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_phase(&self, _phase: &str) {}

    pub fn log_summary(&self) {}
}
