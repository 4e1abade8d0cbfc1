use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::board::{Board, Color};
use crate::movegen::{Move, MoveGenerator};
use crate::rules::RulesEngine;
use crate::state::{self, GameState};

pub const MATE_SCORE: i32 = 100_000;
pub const INFINITY: i32 = 200_000;

/// Depth-limited minimax with alpha-beta pruning. Every node works on its
/// own clone of the board and state.
pub struct MinimaxEngine {
    move_generator: MoveGenerator,
    rules: RulesEngine,
    nodes_searched: u64,
}

impl Default for MinimaxEngine {
    fn default() -> Self {
        Self::new(MoveGenerator::default())
    }
}

impl MinimaxEngine {
    pub fn new(move_generator: MoveGenerator) -> Self {
        Self {
            rules: RulesEngine::new(*move_generator.validator()),
            move_generator,
            nodes_searched: 0,
        }
    }

    pub fn best_move(&mut self, board: &Board, state: &GameState, color: Color, depth: u32) -> Option<Move> {
        self.best_move_until(board, state, color, depth, None)
    }

    /// Same as `best_move`, but stops trying root moves once `cancel` is set.
    /// A cancelled search still returns a move: the best one so far, or the
    /// head of the ordered list.
    pub fn best_move_until(
        &mut self,
        board: &Board,
        state: &GameState,
        color: Color,
        depth: u32,
        cancel: Option<&AtomicBool>,
    ) -> Option<Move> {
        self.nodes_searched = 0;

        let mut moves = self
            .move_generator
            .generate_moves(color, board, state.last_move());
        if moves.is_empty() {
            return None;
        }
        if moves.len() == 1 {
            return Some(moves[0]);
        }
        self.move_generator.sort_by_heuristic_value(&mut moves, board);

        let depth = depth.max(1);
        let mut best_move = None;
        let mut best_score = -INFINITY;
        let mut alpha = -INFINITY;
        let beta = INFINITY;

        for mv in &moves {
            if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                debug!("search cancelled after {} nodes", self.nodes_searched);
                break;
            }

            let mut board_copy = board.clone();
            let mut state_copy = state.clone();
            if !state::advance(&mut board_copy, &mut state_copy, *mv) {
                continue;
            }

            let score = self.minimax(
                &board_copy,
                &state_copy,
                depth - 1,
                alpha,
                beta,
                false,
                color.opposite(),
            );
            trace!("{} scored {}", mv.coordinate(), score);

            if score > best_score {
                best_score = score;
                best_move = Some(*mv);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
        }

        debug!(
            "depth {} searched {} nodes, best score {}",
            depth, self.nodes_searched, best_score
        );
        best_move.or(Some(moves[0]))
    }

    /// Score of the position for the maximizing side. `color` is the side to
    /// move at this node; it is the maximizing side when `maximizing` holds.
    #[allow(clippy::too_many_arguments)]
    pub fn minimax(
        &mut self,
        board: &Board,
        state: &GameState,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        color: Color,
    ) -> i32 {
        self.nodes_searched += 1;

        let mut moves = self
            .move_generator
            .generate_moves(color, board, state.last_move());
        if moves.is_empty() {
            if !board.is_in_check(color) {
                return 0;
            }
            // Mates closer to the root keep more depth and score further out.
            let mate = MATE_SCORE + depth as i32;
            return if maximizing { -mate } else { mate };
        }
        if self.is_draw(board, state) {
            return 0;
        }
        if depth == 0 {
            let perspective = if maximizing { color } else { color.opposite() };
            return self.move_generator.evaluator().evaluate(board, perspective);
        }

        self.move_generator.sort_by_heuristic_value(&mut moves, board);

        if maximizing {
            let mut best = -INFINITY;
            for mv in moves {
                let mut board_copy = board.clone();
                let mut state_copy = state.clone();
                if !state::advance(&mut board_copy, &mut state_copy, mv) {
                    continue;
                }
                let score = self.minimax(&board_copy, &state_copy, depth - 1, alpha, beta, false, color.opposite());
                best = best.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = INFINITY;
            for mv in moves {
                let mut board_copy = board.clone();
                let mut state_copy = state.clone();
                if !state::advance(&mut board_copy, &mut state_copy, mv) {
                    continue;
                }
                let score = self.minimax(&board_copy, &state_copy, depth - 1, alpha, beta, true, color.opposite());
                best = best.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }

    fn is_draw(&self, board: &Board, state: &GameState) -> bool {
        self.rules.is_insufficient_material(board)
            || self.rules.is_fifty_move_draw(state)
            || self.rules.is_threefold_repetition(state, &board.to_fingerprint())
    }

    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_to_move(state: &mut GameState) {
        state.switch_turn();
    }

    #[test]
    fn test_finds_back_rank_mate() {
        let board = Board::from_fingerprint("6k1/5ppp/8/8/8/8/8/R5K1").unwrap();
        let state = GameState::default();
        let mut engine = MinimaxEngine::default();
        let best = engine.best_move(&board, &state, Color::White, 2).unwrap();
        assert_eq!(best.coordinate(), "a1a8");
        assert!(engine.nodes_searched() > 0);
    }

    #[test]
    fn test_no_moves_returns_none() {
        let board = Board::from_fingerprint("R5k1/5ppp/8/8/8/8/8/6K1").unwrap();
        let mut state = GameState::default();
        black_to_move(&mut state);
        let mut engine = MinimaxEngine::default();
        assert!(engine.best_move(&board, &state, Color::Black, 3).is_none());
    }

    #[test]
    fn test_single_reply_is_returned_directly() {
        // The white king on b6 leaves b8 as the only flight square.
        let board = Board::from_fingerprint("k7/8/1K6/8/8/8/8/8").unwrap();
        let mut state = GameState::default();
        black_to_move(&mut state);
        let mut engine = MinimaxEngine::default();
        let best = engine.best_move(&board, &state, Color::Black, 4).unwrap();
        assert_eq!(best.coordinate(), "a8b8");
        assert_eq!(engine.nodes_searched(), 0);
    }

    #[test]
    fn test_mate_scores_prefer_shorter_mates() {
        let board = Board::from_fingerprint("R5k1/5ppp/8/8/8/8/8/6K1").unwrap();
        let mut state = GameState::default();
        black_to_move(&mut state);
        let mut engine = MinimaxEngine::default();
        let shallow = engine.minimax(&board, &state, 3, -INFINITY, INFINITY, false, Color::Black);
        let deep = engine.minimax(&board, &state, 1, -INFINITY, INFINITY, false, Color::Black);
        assert_eq!(shallow, MATE_SCORE + 3);
        assert!(shallow > deep);
        let losing = engine.minimax(&board, &state, 3, -INFINITY, INFINITY, true, Color::Black);
        assert_eq!(losing, -(MATE_SCORE + 3));
    }

    #[test]
    fn test_stalemate_scores_zero() {
        let board = Board::from_fingerprint("7k/5Q2/6K1/8/8/8/8/8").unwrap();
        let mut state = GameState::default();
        black_to_move(&mut state);
        let mut engine = MinimaxEngine::default();
        assert_eq!(engine.minimax(&board, &state, 2, -INFINITY, INFINITY, true, Color::Black), 0);
    }

    #[test]
    fn test_cancelled_search_still_returns_a_move() {
        let board = Board::new();
        let state = GameState::default();
        let cancel = AtomicBool::new(true);
        let mut engine = MinimaxEngine::default();
        let mv = engine.best_move_until(&board, &state, Color::White, 3, Some(&cancel));
        assert!(mv.is_some());
    }
}
