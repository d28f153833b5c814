//! Engine controller: owns the position, transposition table and pawn
//! cache, and drives searches on a background thread.
//!
//! A `SearchJob` bundles the stop flag, search thread handle, and optional
//! hard-deadline timer for one in-flight search; [`crate::search::Searcher`]
//! itself is single-threaded, so `Engine` is what turns repeated single
//! searches into something that behaves like a stateful session.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{EngineConfig, TimeControl};
use crate::error::{EngineError, EngineResult};
use crate::movegen;
use crate::pawn_cache::PawnCache;
use crate::position::Position;
use crate::search::{SearchLimits, SearchProgress, SearchResult, Searcher};
use crate::sync::StopFlag;
use crate::timer::DeadlineTimer;
use crate::tt::TranspositionTable;

const SEARCH_STACK_SIZE: usize = 16 * 1024 * 1024;

/// An in-flight search: the stop flag that cancels it, the thread driving
/// it, and the hard-deadline timer thread (if the search is time-bounded).
struct SearchJob {
    stop: StopFlag,
    handle: JoinHandle<()>,
    timer: Option<DeadlineTimer>,
}

impl SearchJob {
    fn stop_and_wait(self) {
        self.stop.stop();
        let _ = self.handle.join();
        if let Some(timer) = self.timer {
            timer.cancel();
        }
    }
}

/// Parameters for one `go` command, independent of UCI wire syntax.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoRequest {
    pub depth: Option<i32>,
    pub max_nodes: Option<u64>,
    pub time_control: TimeControl,
    pub ponder: bool,
}

/// Owns engine-wide state across a UCI session: the current position, the
/// transposition table and pawn cache (both persist across searches), the
/// option set, and at most one active search.
pub struct Engine {
    position: Position,
    tt: Arc<Mutex<TranspositionTable>>,
    pawn_cache: Arc<PawnCache>,
    config: EngineConfig,
    current_job: Option<SearchJob>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Engine {
        let config = EngineConfig::default();
        Engine {
            position: Position::startpos(),
            tt: Arc::new(Mutex::new(TranspositionTable::new(config.hash_mb))),
            pawn_cache: Arc::new(PawnCache::new(config.pawn_cache_kb)),
            config,
            current_job: None,
        }
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.current_job.is_some()
    }

    /// Resets to the starting position and clears both persistent tables.
    pub fn new_game(&mut self) {
        self.stop_search();
        self.position = Position::startpos();
        self.tt.lock().clear();
        self.pawn_cache.clear();
        #[cfg(feature = "logging")]
        log::info!("ucinewgame: cleared transposition table and pawn cache");
    }

    /// Sets the position from a FEN string (or `"startpos"`) plus a
    /// trailing list of moves in UCI notation, mirroring `position fen ...
    /// moves ...` / `position startpos moves ...`.
    pub fn set_position(&mut self, fen_or_startpos: &str, moves: &[&str]) -> EngineResult<()> {
        self.stop_search();
        let mut pos = if fen_or_startpos == "startpos" {
            Position::startpos()
        } else {
            Position::from_fen(fen_or_startpos)?
        };
        for uci in moves {
            let mv = movegen::get_move_from_uci(&mut pos, uci)
                .ok_or_else(|| EngineError::InvalidMoveNotation((*uci).to_string()))?;
            pos.do_move(mv);
        }
        self.position = pos;
        Ok(())
    }

    /// Applies a `setoption name <name> value <value>` pair, rebuilding the
    /// transposition table or pawn cache if their size changed.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) {
        if self.config.apply_setoption(name, value) {
            self.stop_search();
            self.tt = Arc::new(Mutex::new(TranspositionTable::new(self.config.hash_mb)));
            self.pawn_cache = Arc::new(PawnCache::new(self.config.pawn_cache_kb));
            #[cfg(feature = "logging")]
            log::info!(
                "setoption {name}: resized hash to {} MB, pawn cache to {} KB",
                self.config.hash_mb,
                self.config.pawn_cache_kb
            );
        }
    }

    /// Blocks until any active search finishes.
    pub fn stop_search(&mut self) {
        if let Some(job) = self.current_job.take() {
            job.stop_and_wait();
            #[cfg(feature = "logging")]
            log::debug!("search stopped");
        }
    }

    /// Signals an active search to stop without waiting for it to exit.
    pub fn signal_stop(&mut self) {
        if let Some(job) = &self.current_job {
            job.stop.stop();
        }
    }

    /// Starts a search on the current position. `on_progress` is invoked
    /// from the search thread after every completed depth; `on_complete` is
    /// invoked once, after the search finishes, also from the search
    /// thread. Returns [`EngineError::SearchAlreadyInProgress`] if a search
    /// is already running.
    pub fn start_search<P, C>(&mut self, request: GoRequest, on_progress: P, on_complete: C) -> EngineResult<()>
    where
        P: Fn(SearchProgress) + Send + 'static,
        C: FnOnce(SearchResult) + Send + 'static,
    {
        if self.current_job.is_some() {
            return Err(EngineError::SearchAlreadyInProgress);
        }
        #[cfg(feature = "logging")]
        log::debug!("starting search: {request:?}");

        let stop = StopFlag::new();
        let (soft_ms, hard_ms) = request.time_control.compute_limits(&self.config);
        let movetime = if request.time_control.is_unlimited() {
            None
        } else {
            Some(Duration::from_millis(soft_ms))
        };

        let timer = if request.ponder || request.time_control.is_unlimited() {
            None
        } else {
            DeadlineTimer::start(Duration::from_millis(hard_ms), stop.clone())
        };

        let limits = SearchLimits {
            max_depth: request.depth,
            movetime,
            max_nodes: request.max_nodes.or(Some(u64::from(u32::MAX))),
        };

        let mut position = self.position.clone();
        let tt = Arc::clone(&self.tt);
        let pawn_cache = Arc::clone(&self.pawn_cache);
        let stop_for_thread = stop.clone();

        let handle = thread::Builder::new()
            .name("search".to_string())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || {
                let mut tt_guard = tt.lock();
                let mut searcher = Searcher::new(&mut tt_guard, &pawn_cache, stop_for_thread);
                let result = searcher.search(&mut position, limits, |progress| {
                    on_progress(progress.clone());
                });
                drop(tt_guard);
                on_complete(result);
            })
            .expect("failed to spawn search thread");

        self.current_job = Some(SearchJob { stop, handle, timer });
        Ok(())
    }

    /// Converts a ponder search into a normal timed search once the
    /// predicted move has been played by the opponent, re-arming the hard
    /// deadline from `start`.
    pub fn ponder_hit(&mut self, request: GoRequest) -> EngineResult<()> {
        if self.current_job.is_none() {
            return Err(EngineError::NoSearchInProgress);
        }
        let (_, hard_ms) = request.time_control.compute_limits(&self.config);
        if let Some(job) = &mut self.current_job {
            let deadline = Instant::now() + Duration::from_millis(hard_ms);
            job.timer = DeadlineTimer::start_at(Some(deadline), job.stop.clone());
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn new_engine_starts_at_startpos() {
        let engine = Engine::new();
        assert_eq!(engine.position().zobrist_key(), Position::startpos().zobrist_key());
    }

    #[test]
    fn set_position_applies_moves() {
        let mut engine = Engine::new();
        engine.set_position("startpos", &["e2e4", "e7e5"]).unwrap();
        assert_ne!(engine.position().zobrist_key(), Position::startpos().zobrist_key());
    }

    #[test]
    fn set_position_rejects_bad_move() {
        let mut engine = Engine::new();
        assert!(engine.set_position("startpos", &["e2e5"]).is_err());
    }

    #[test]
    fn search_completes_and_reports_a_move() {
        let mut engine = Engine::new();
        let done = Arc::new(AtomicBool::new(false));
        let done_clone = Arc::clone(&done);
        engine
            .start_search(
                GoRequest { depth: Some(3), ..GoRequest::default() },
                |_progress| {},
                move |result| {
                    assert!(result.best_move.is_some());
                    done_clone.store(true, Ordering::SeqCst);
                },
            )
            .unwrap();
        engine.stop_search();
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn starting_a_second_search_while_one_runs_is_rejected() {
        let mut engine = Engine::new();
        engine
            .start_search(
                GoRequest { time_control: TimeControl::MoveTime { time_ms: 2000 }, ..GoRequest::default() },
                |_| {},
                |_| {},
            )
            .unwrap();
        let err = engine.start_search(GoRequest::default(), |_| {}, |_| {});
        assert_eq!(err, Err(EngineError::SearchAlreadyInProgress));
        engine.stop_search();
    }
}
