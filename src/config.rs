//! Engine configuration: UCI-style options and time-control math.
//!
//! Covers the options this engine actually exposes: hash size, a
//! pawn-cache size, move overhead, and the soft/hard time percentages.
//! Thread count and `MultiPV` are left out since
//! [`crate::search::Searcher`] is single-threaded and single-line.

use std::time::Duration;

const DEFAULT_HASH_MB: usize = 16;
const DEFAULT_PAWN_CACHE_KB: usize = 1024;
const PANIC_THRESHOLD_MS: u64 = 5_000;
const MIN_MOVES_TO_GO: u64 = 10;
const CRITICAL_TIME_MARGIN_MS: u64 = 50;
const PANIC_TIME_FRACTION: f64 = 0.05;
const PANIC_MIN_FRACTION: u64 = 5;
const PANIC_HARD_FRACTION: u64 = 3;
const LONG_TIME_CONTROL_MS: u64 = 300_000;
const MEDIUM_TIME_CONTROL_MS: u64 = 60_000;
const LONG_MOVES_ESTIMATE: u64 = 40;
const MEDIUM_MOVES_ESTIMATE: u64 = 30;
const SHORT_MOVES_ESTIMATE: u64 = 25;

/// Engine-wide configuration, settable via UCI `setoption` and read by
/// [`crate::engine::Engine`] when starting a search.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub hash_mb: usize,
    pub pawn_cache_kb: usize,
    pub move_overhead_ms: u64,
    pub soft_time_percent: u64,
    pub hard_time_percent: u64,
    pub ponder: bool,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            hash_mb: DEFAULT_HASH_MB,
            pawn_cache_kb: DEFAULT_PAWN_CACHE_KB,
            move_overhead_ms: 30,
            soft_time_percent: 60,
            hard_time_percent: 90,
            ponder: false,
        }
    }
}

/// One UCI option description, used both to print `option name ...` lines
/// and to validate incoming `setoption` values.
pub enum UciOptionSpec {
    Spin { name: &'static str, min: i64, max: i64 },
    Check { name: &'static str },
}

impl EngineConfig {
    /// Visits every option this engine exposes, in the order `uci` should
    /// print them.
    pub fn for_each_option(visitor: impl FnMut(UciOptionSpec)) {
        let mut visitor = visitor;
        visitor(UciOptionSpec::Spin { name: "Hash", min: 1, max: 65536 });
        visitor(UciOptionSpec::Spin { name: "Pawn Cache", min: 64, max: 65536 });
        visitor(UciOptionSpec::Spin { name: "Move Overhead", min: 0, max: 5000 });
        visitor(UciOptionSpec::Spin { name: "Soft Time Percent", min: 1, max: 100 });
        visitor(UciOptionSpec::Spin { name: "Hard Time Percent", min: 1, max: 100 });
        visitor(UciOptionSpec::Check { name: "Ponder" });
    }

    /// Applies a `setoption name <name> value <value>` pair. Returns `true`
    /// if the hash or pawn-cache size changed, meaning the caller must
    /// rebuild those tables.
    pub fn apply_setoption(&mut self, name: &str, value: Option<&str>) -> bool {
        let mut resize = false;
        match name.trim().to_ascii_lowercase().as_str() {
            "hash" => {
                if let Some(mb) = value.and_then(|v| v.parse::<usize>().ok()) {
                    let mb = mb.clamp(1, 65536);
                    if mb != self.hash_mb {
                        self.hash_mb = mb;
                        resize = true;
                    }
                }
            }
            "pawn cache" => {
                if let Some(kb) = value.and_then(|v| v.parse::<usize>().ok()) {
                    let kb = kb.clamp(64, 65536);
                    if kb != self.pawn_cache_kb {
                        self.pawn_cache_kb = kb;
                        resize = true;
                    }
                }
            }
            "move overhead" => {
                if let Some(v) = value.and_then(|v| v.parse::<u64>().ok()) {
                    self.move_overhead_ms = v.clamp(0, 5000);
                }
            }
            "soft time percent" => {
                if let Some(v) = value.and_then(|v| v.parse::<u64>().ok()) {
                    self.soft_time_percent = v.clamp(1, 100);
                }
            }
            "hard time percent" => {
                if let Some(v) = value.and_then(|v| v.parse::<u64>().ok()) {
                    self.hard_time_percent = v.clamp(1, 100);
                }
            }
            "ponder" => {
                if let Some(v) = value {
                    self.ponder = matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1");
                }
            }
            _ => {}
        }
        resize
    }
}

/// The time control under which a search is run, mirroring the UCI `go`
/// parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimeControl {
    #[default]
    Infinite,
    MoveTime { time_ms: u64 },
    Incremental { time_left_ms: u64, inc_ms: u64, movestogo: Option<u64> },
}

impl TimeControl {
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        matches!(self, TimeControl::Infinite)
    }

    /// Computes `(soft_ms, hard_ms)`: the search should try to stop after
    /// `soft_ms` once the current iteration completes, and must stop no
    /// later than `hard_ms` regardless of iteration state.
    #[must_use]
    pub fn compute_limits(&self, config: &EngineConfig) -> (u64, u64) {
        match self {
            TimeControl::Infinite => (u64::MAX, u64::MAX),
            TimeControl::MoveTime { time_ms } => {
                let capped = (*time_ms).max(1);
                (capped, capped)
            }
            TimeControl::Incremental { time_left_ms, inc_ms, movestogo } => {
                compute_incremental_limits(*time_left_ms, *inc_ms, *movestogo, config)
            }
        }
    }

    #[must_use]
    pub fn soft_hard_durations(&self, config: &EngineConfig) -> (Duration, Duration) {
        let (soft, hard) = self.compute_limits(config);
        (
            if soft == u64::MAX { Duration::MAX } else { Duration::from_millis(soft) },
            if hard == u64::MAX { Duration::MAX } else { Duration::from_millis(hard) },
        )
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_incremental_limits(
    time_left_ms: u64,
    inc_ms: u64,
    movestogo: Option<u64>,
    config: &EngineConfig,
) -> (u64, u64) {
    let safe_ms = time_left_ms.saturating_sub(config.move_overhead_ms);

    if time_left_ms <= config.move_overhead_ms.saturating_add(CRITICAL_TIME_MARGIN_MS) {
        let fallback = (time_left_ms / 2).max(1);
        return (fallback, fallback);
    }

    if safe_ms < PANIC_THRESHOLD_MS {
        let panic_factor = safe_ms as f64 / PANIC_THRESHOLD_MS as f64;
        let target = (safe_ms as f64 * PANIC_TIME_FRACTION * panic_factor) as u64 + inc_ms;
        let target = target.min(safe_ms / PANIC_MIN_FRACTION).max(1);
        let hard = (safe_ms / PANIC_HARD_FRACTION).max(target).max(1);
        return (target, hard);
    }

    let moves_to_go = movestogo
        .unwrap_or(if safe_ms > LONG_TIME_CONTROL_MS {
            LONG_MOVES_ESTIMATE
        } else if safe_ms > MEDIUM_TIME_CONTROL_MS {
            MEDIUM_MOVES_ESTIMATE
        } else {
            SHORT_MOVES_ESTIMATE
        })
        .max(MIN_MOVES_TO_GO);

    let base_time = safe_ms / moves_to_go + inc_ms;
    let soft_cap = safe_ms * config.soft_time_percent / 100;
    let hard_cap = safe_ms * config.hard_time_percent / 100;

    let soft_ms = base_time.min(soft_cap).max(1);
    let hard_ms = hard_cap.max(soft_ms).max(1);

    (soft_ms, hard_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_time_control_is_unlimited() {
        assert!(TimeControl::Infinite.is_unlimited());
        assert!(!TimeControl::MoveTime { time_ms: 1000 }.is_unlimited());
    }

    #[test]
    fn movetime_soft_equals_hard() {
        let (soft, hard) = TimeControl::MoveTime { time_ms: 5000 }.compute_limits(&EngineConfig::default());
        assert_eq!(soft, 5000);
        assert_eq!(hard, 5000);
    }

    #[test]
    fn incremental_budget_is_within_remaining_time() {
        let tc = TimeControl::Incremental { time_left_ms: 300_000, inc_ms: 3000, movestogo: None };
        let (soft, hard) = tc.compute_limits(&EngineConfig::default());
        assert!(soft > 0);
        assert!(hard >= soft);
        assert!(hard < 300_000);
    }

    #[test]
    fn panic_mode_kicks_in_when_time_is_short() {
        let tc = TimeControl::Incremental { time_left_ms: 2000, inc_ms: 0, movestogo: None };
        let (soft, _hard) = tc.compute_limits(&EngineConfig::default());
        assert!(soft < 2000);
    }

    #[test]
    fn setoption_hash_reports_resize_needed() {
        let mut cfg = EngineConfig::default();
        assert!(cfg.apply_setoption("Hash", Some("64")));
        assert_eq!(cfg.hash_mb, 64);
        assert!(!cfg.apply_setoption("Hash", Some("64")));
    }

    #[test]
    fn setoption_ponder_parses_bool() {
        let mut cfg = EngineConfig::default();
        cfg.apply_setoption("Ponder", Some("true"));
        assert!(cfg.ponder);
    }
}
