//! Build diagnostics for the node network builder
//!
//! Collects log messages, non-fatal build warnings and per-phase timings for
//! one network build. Every entry is mirrored to the `log` facade so hosts
//! that only install a logger still see the diagnostics.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use glam::Vec3;
use serde::Serialize;
use web_time::Instant;

use crate::nav_query::PolyRef;

/// Log level for build messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
}

/// Non-fatal problems found while building the network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BuildWarning {
    /// A point of interest could not be bound to any polygon
    UnlinkablePoi { name: String, location: Vec3 },
    /// A destination-only POI found no polygons inside its footprint
    EmptyDestination { name: String },
    /// A polygon was excluded because it lies inside solid geometry
    BlockedPoly { poly: PolyRef },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::UnlinkablePoi { name, location } => write!(
                f,
                "{name} at ({:.0}, {:.0}, {:.0}) is not near any navigation polygon",
                location.x, location.y, location.z
            ),
            BuildWarning::EmptyDestination { name } => {
                write!(f, "destination {name} does not overlap any navigation polygon")
            }
            BuildWarning::BlockedPoly { poly } => {
                write!(f, "polygon {} is inside solid geometry", poly.id())
            }
        }
    }
}

/// Timed sections of a network build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BuildTimer {
    Total,
    SeedPois,
    Expand,
    Distances,
    SpecialPaths,
    JumpPass1,
    JumpPass2,
}

/// A message recorded during the build
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: Instant,
    pub message: String,
}

/// Diagnostics of one network build.
#[derive(Debug)]
pub struct BuildLog {
    logs: Vec<LogEntry>,
    warnings: Vec<BuildWarning>,
    active_timers: HashMap<BuildTimer, Instant>,
    timers: HashMap<BuildTimer, Duration>,
    min_log_level: LogLevel,
    max_log_entries: usize,
}

impl Default for BuildLog {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildLog {
    pub fn new() -> Self {
        Self {
            logs: Vec::new(),
            warnings: Vec::new(),
            active_timers: HashMap::new(),
            timers: HashMap::new(),
            min_log_level: LogLevel::Info,
            max_log_entries: 1000,
        }
    }

    /// Sets the minimum log level kept in the entry list
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.min_log_level = level;
    }

    pub fn clear(&mut self) {
        self.logs.clear();
        self.warnings.clear();
        self.active_timers.clear();
        self.timers.clear();
    }

    pub fn log_debug(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{message}");
        self.log(LogLevel::Debug, message);
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        self.log(LogLevel::Info, message);
    }

    /// Records a build warning
    pub fn warn(&mut self, warning: BuildWarning) {
        let message = warning.to_string();
        log::warn!("{message}");
        self.log(LogLevel::Warning, message);
        self.warnings.push(warning);
    }

    fn log(&mut self, level: LogLevel, message: String) {
        if level < self.min_log_level {
            return;
        }
        self.logs.push(LogEntry {
            level,
            timestamp: Instant::now(),
            message,
        });
        if self.logs.len() > self.max_log_entries {
            self.logs.remove(0);
        }
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Starts a timer; restarting an active timer keeps the first start time
    pub fn start_timer(&mut self, timer: BuildTimer) {
        self.active_timers.entry(timer).or_insert_with(Instant::now);
    }

    /// Stops a timer and accumulates the elapsed time
    pub fn stop_timer(&mut self, timer: BuildTimer) {
        if let Some(start) = self.active_timers.remove(&timer) {
            *self.timers.entry(timer).or_default() += start.elapsed();
        }
    }

    pub fn timer(&self, timer: BuildTimer) -> Option<Duration> {
        self.timers.get(&timer).copied()
    }

    /// Accumulated timings sorted by section
    pub fn timings(&self) -> Vec<(BuildTimer, Duration)> {
        let mut timings: Vec<_> = self.timers.iter().map(|(k, v)| (*k, *v)).collect();
        timings.sort_by_key(|(k, _)| *k);
        timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_recorded() {
        let mut log = BuildLog::new();
        log.log_debug("filtered out");
        log.warn(BuildWarning::EmptyDestination {
            name: "flag".to_string(),
        });
        assert_eq!(log.logs().len(), 1);
        assert_eq!(log.logs()[0].level, LogLevel::Warning);
        assert_eq!(log.warnings().len(), 1);
        assert!(log.logs()[0].message.contains("flag"));
    }

    #[test]
    fn test_timers_accumulate() {
        let mut log = BuildLog::new();
        log.start_timer(BuildTimer::Expand);
        log.stop_timer(BuildTimer::Expand);
        log.start_timer(BuildTimer::Expand);
        log.stop_timer(BuildTimer::Expand);
        assert!(log.timer(BuildTimer::Expand).is_some());
        assert!(log.timer(BuildTimer::JumpPass1).is_none());
        // Stopping an inactive timer is ignored
        log.stop_timer(BuildTimer::JumpPass2);
        assert_eq!(log.timings().len(), 1);
    }
}
