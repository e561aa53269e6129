use crate::store::{EvictionReport, SessionStore};
use std::time::Duration;

/// Source of the process resident-set size. Injectable so pressure handling
/// can be tested without inflating real memory.
pub trait MemoryProbe: Send + Sync {
    /// Resident memory in bytes, or `None` when it cannot be determined.
    fn resident_bytes(&self) -> Option<u64>;
}

/// Reads VmRSS from /proc/self/status. On platforms without procfs the
/// probe reports `None` and pressure eviction never triggers.
pub struct ProcStatusProbe;

impl MemoryProbe for ProcStatusProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        for line in status.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                let kb: u64 = rest
                    .split_whitespace()
                    .next()
                    .and_then(|v| v.parse().ok())?;
                return Some(kb * 1024);
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub enabled: bool,
    /// Resident-memory ceiling; crossing it evicts the oldest quarter.
    pub memory_threshold_bytes: u64,
    /// Sessions idle longer than this are evicted on every check.
    pub max_idle: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        SupervisorConfig {
            enabled: true,
            memory_threshold_bytes: 512 * 1024 * 1024,
            max_idle: Duration::from_secs(30 * 60),
        }
    }
}

/// Bounds live sessions: on each check it drops idle sessions, then, if the
/// process is over its memory ceiling, the least-recently-used quarter.
pub struct ResourceSupervisor {
    config: SupervisorConfig,
    probe: Box<dyn MemoryProbe>,
}

impl ResourceSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        ResourceSupervisor {
            config,
            probe: Box::new(ProcStatusProbe),
        }
    }

    pub fn with_probe(config: SupervisorConfig, probe: Box<dyn MemoryProbe>) -> Self {
        ResourceSupervisor { config, probe }
    }

    /// One supervision pass. Returns every evicted session so the caller can
    /// log and persist what it still can.
    pub fn check<T>(&self, store: &SessionStore<T>) -> Vec<EvictionReport> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut reports = store.evict_idle(self.config.max_idle);

        if let Some(resident) = self.probe.resident_bytes() {
            if resident > self.config.memory_threshold_bytes && !store.is_empty() {
                tracing::warn!(
                    resident,
                    threshold = self.config.memory_threshold_bytes,
                    sessions = store.len(),
                    "memory pressure, evicting oldest sessions"
                );
                reports.extend(store.evict_oldest_quarter());
            }
        }

        reports
    }
}
