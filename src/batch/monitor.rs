//! Process memory monitor
//!
//! Sampled by the orchestrator thread only. Crossing the reclaim fraction of
//! the configured ceiling produces a hint; workers are never blocked.

use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::config::defaults::MEMORY_RECLAIM_FRACTION;

/// Source of the current resident memory figure
pub trait MemoryProbe: Send {
    fn used_bytes(&mut self) -> Option<u64>;
}

/// Resident memory of this process via sysinfo
pub struct ProcessMemoryProbe {
    system: System,
    pid: Pid,
}

impl ProcessMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(std::process::id()),
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn used_bytes(&mut self) -> Option<u64> {
        self.system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]));
        self.system.process(self.pid).map(|p| p.memory())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryReading {
    pub used_bytes: u64,
    pub ceiling_bytes: u64,
}

impl MemoryReading {
    pub fn fraction(&self) -> f64 {
        if self.ceiling_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.ceiling_bytes as f64
        }
    }
}

pub struct MemoryMonitor {
    probe: Box<dyn MemoryProbe>,
    ceiling_bytes: u64,
    reclaim_fraction: f64,
}

impl MemoryMonitor {
    pub fn new(max_memory_gb: f64) -> Self {
        Self::with_probe(Box::new(ProcessMemoryProbe::new()), max_memory_gb)
    }

    pub fn with_probe(probe: Box<dyn MemoryProbe>, max_memory_gb: f64) -> Self {
        Self {
            probe,
            ceiling_bytes: (max_memory_gb.max(0.0) * 1024.0 * 1024.0 * 1024.0) as u64,
            reclaim_fraction: MEMORY_RECLAIM_FRACTION,
        }
    }

    pub fn ceiling_bytes(&self) -> u64 {
        self.ceiling_bytes
    }

    pub fn sample(&mut self) -> Option<MemoryReading> {
        let used_bytes = self.probe.used_bytes()?;
        Some(MemoryReading {
            used_bytes,
            ceiling_bytes: self.ceiling_bytes,
        })
    }

    /// Reading above the reclaim fraction, if any
    pub fn check(&mut self) -> Option<MemoryReading> {
        self.sample().filter(|r| r.fraction() > self.reclaim_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(u64);

    impl MemoryProbe for FixedProbe {
        fn used_bytes(&mut self) -> Option<u64> {
            Some(self.0)
        }
    }

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_check_triggers_above_eighty_percent() {
        let mut m = MemoryMonitor::with_probe(Box::new(FixedProbe(GIB * 9 / 10)), 1.0);
        let r = m.check().unwrap();
        assert!((r.fraction() - 0.9).abs() < 1e-6);

        let mut m = MemoryMonitor::with_probe(Box::new(FixedProbe(GIB / 2)), 1.0);
        assert!(m.check().is_none());
        assert!(m.sample().is_some());
    }

    #[test]
    fn test_process_probe_reports_memory() {
        let mut probe = ProcessMemoryProbe::new();
        assert!(probe.used_bytes().is_some_and(|b| b > 0));
    }
}
