//! Computer opponent with six strength levels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::board::{Board, Color};
use crate::config::EngineConfig;
use crate::movegen::{Move, MoveGenerator};
use crate::search::MinimaxEngine;
use crate::state::GameState;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 6;

/// Levels 1-2 play a random legal move, 3-4 pick among the best few moves
/// by heuristic ordering, 5-6 run the minimax search (level 6 one ply
/// deeper). Searches run on a worker thread and are abandoned after
/// `timeout`, in which case the best ordered move is played instead.
pub struct AiPlayer {
    level: u8,
    depth: u32,
    timeout: Duration,
    move_generator: MoveGenerator,
    rng: StdRng,
}

impl AiPlayer {
    pub fn new(level: u8, depth: u32, timeout: Duration) -> Self {
        Self {
            level: level.clamp(MIN_LEVEL, MAX_LEVEL),
            depth: depth.max(1),
            timeout,
            move_generator: MoveGenerator::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.ai_level, config.search_depth, config.move_timeout())
    }

    /// Replaces the entropy-seeded generator, for reproducible play.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_move_generator(mut self, move_generator: MoveGenerator) -> Self {
        self.move_generator = move_generator;
        self
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth.max(1);
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// A move for the side to move, or `None` if it has no legal move.
    pub fn choose_move(&mut self, board: &Board, state: &GameState) -> Option<Move> {
        let color = state.active_color();
        let mut moves = self
            .move_generator
            .generate_moves(color, board, state.last_move());
        if moves.is_empty() {
            return None;
        }

        if self.level <= 2 {
            return moves.choose(&mut self.rng).copied();
        }

        self.move_generator.sort_by_heuristic_value(&mut moves, board);
        match self.level {
            3 | 4 => {
                let top = if self.level == 3 { 2 } else { 3 };
                let top = top.min(moves.len());
                moves[..top].choose(&mut self.rng).copied()
            }
            _ => {
                let depth = if self.level == MAX_LEVEL {
                    self.depth + 1
                } else {
                    self.depth
                };
                let fallback = moves[0];
                Some(self.search(board, state, color, depth).unwrap_or(fallback))
            }
        }
    }

    fn search(&self, board: &Board, state: &GameState, color: Color, depth: u32) -> Option<Move> {
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let worker_cancel = Arc::clone(&cancel);
        let generator = self.move_generator.clone();
        let board = board.clone();
        let state = state.clone();
        let spawned = thread::Builder::new()
            .name("minimax".to_string())
            .spawn(move || {
                let mut engine = MinimaxEngine::new(generator);
                let best = engine.best_move_until(&board, &state, color, depth, Some(&worker_cancel));
                // The receiver is gone if the driver already timed out.
                let _ = tx.send(best);
            });
        if let Err(err) = spawned {
            warn!("could not start search worker: {}", err);
            return None;
        }

        match rx.recv_timeout(self.timeout) {
            Ok(best) => {
                debug!("search at depth {} returned {:?}", depth, best.map(|mv| mv.coordinate()));
                best
            }
            Err(RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::Relaxed);
                warn!("search timed out after {:?}, playing the best ordered move", self.timeout);
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("search worker stopped without a result, playing the best ordered move");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legal(board: &Board, state: &GameState) -> Vec<Move> {
        MoveGenerator::default().generate_moves(state.active_color(), board, state.last_move())
    }

    #[test]
    fn test_levels_are_clamped() {
        assert_eq!(AiPlayer::new(0, 3, Duration::from_secs(1)).level(), 1);
        assert_eq!(AiPlayer::new(9, 3, Duration::from_secs(1)).level(), 6);
        assert_eq!(AiPlayer::new(4, 0, Duration::from_secs(1)).depth(), 1);
    }

    #[test]
    fn test_random_level_plays_legal_moves() {
        let board = Board::new();
        let state = GameState::default();
        let moves = legal(&board, &state);
        let mut ai = AiPlayer::new(1, 3, Duration::from_secs(1)).with_seed(7);
        for _ in 0..10 {
            let mv = ai.choose_move(&board, &state).unwrap();
            assert!(moves.contains(&mv));
        }
    }

    #[test]
    fn test_level_three_picks_from_top_two() {
        let board = Board::from_fingerprint("4k3/8/8/3q4/4P3/8/8/4K3").unwrap();
        let state = GameState::default();
        let generator = MoveGenerator::default();
        let mut ordered = legal(&board, &state);
        generator.sort_by_heuristic_value(&mut ordered, &board);

        let mut ai = AiPlayer::new(3, 3, Duration::from_secs(1)).with_seed(42);
        for _ in 0..10 {
            let mv = ai.choose_move(&board, &state).unwrap();
            assert!(ordered[..2].contains(&mv));
        }
    }

    #[test]
    fn test_search_level_finds_mate() {
        let board = Board::from_fingerprint("6k1/5ppp/8/8/8/8/8/R5K1").unwrap();
        let state = GameState::default();
        let mut ai = AiPlayer::new(5, 2, Duration::from_secs(30));
        assert_eq!(ai.choose_move(&board, &state).unwrap().coordinate(), "a1a8");
    }

    #[test]
    fn test_timeout_still_returns_a_legal_move() {
        let board = Board::new();
        let state = GameState::default();
        let mut ai = AiPlayer::new(6, 2, Duration::ZERO);
        let mv = ai.choose_move(&board, &state).unwrap();
        assert!(legal(&board, &state).contains(&mv));
    }

    #[test]
    fn test_no_legal_moves() {
        let board = Board::from_fingerprint("7k/5Q2/6K1/8/8/8/8/8").unwrap();
        let mut state = GameState::default();
        state.switch_turn();
        let mut ai = AiPlayer::new(5, 2, Duration::from_secs(1));
        assert!(ai.choose_move(&board, &state).is_none());
    }
}
