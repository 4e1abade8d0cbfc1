use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, PieceKind, Square};
use crate::movegen::Move;
use crate::state::{EndReason, GameState};
use crate::validator::MoveValidator;

pub const FIFTY_MOVE_PLIES: u32 = 100;
pub const REPETITION_LIMIT: u32 = 3;

/// Check and checkmate variants name the side that is checked or mated;
/// resign variants name the side that resigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    CheckWhite,
    CheckBlack,
    CheckmateWhite,
    CheckmateBlack,
    Stalemate,
    Draw,
    ResignWhite,
    ResignBlack,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::CheckmateWhite
                | GameStatus::CheckmateBlack
                | GameStatus::Stalemate
                | GameStatus::Draw
                | GameStatus::ResignWhite
                | GameStatus::ResignBlack
        )
    }

    pub fn check(color: Color) -> Self {
        match color {
            Color::White => GameStatus::CheckWhite,
            Color::Black => GameStatus::CheckBlack,
        }
    }

    pub fn checkmate(color: Color) -> Self {
        match color {
            Color::White => GameStatus::CheckmateWhite,
            Color::Black => GameStatus::CheckmateBlack,
        }
    }

    pub fn resign(color: Color) -> Self {
        match color {
            Color::White => GameStatus::ResignWhite,
            Color::Black => GameStatus::ResignBlack,
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameStatus::CheckmateWhite | GameStatus::ResignWhite => Some(Color::Black),
            GameStatus::CheckmateBlack | GameStatus::ResignBlack => Some(Color::White),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RulesEngine {
    validator: MoveValidator,
}

impl RulesEngine {
    pub fn new(validator: MoveValidator) -> Self {
        Self { validator }
    }

    pub fn is_checkmate(&self, color: Color, board: &Board, last_move: Option<&Move>) -> bool {
        board.is_in_check(color) && !self.validator.has_legal_move(color, board, last_move)
    }

    pub fn is_stalemate(&self, color: Color, board: &Board, last_move: Option<&Move>) -> bool {
        !board.is_in_check(color) && !self.validator.has_legal_move(color, board, last_move)
    }

    /// K v K, K+N v K, K+B v K, and K+B v K+B with both bishops on squares
    /// of the same color.
    pub fn is_insufficient_material(&self, board: &Board) -> bool {
        let mut minors: Vec<(Color, PieceKind, Square)> = Vec::new();
        for piece in board.pieces() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => {
                    minors.push((piece.color, piece.kind, piece.square))
                }
                _ => return false,
            }
        }

        match minors.as_slice() {
            [] => true,
            [_] => true,
            [(c1, PieceKind::Bishop, s1), (c2, PieceKind::Bishop, s2)] => {
                c1 != c2 && s1.is_dark() == s2.is_dark()
            }
            _ => false,
        }
    }

    pub fn is_fifty_move_draw(&self, state: &GameState) -> bool {
        state.halfmove_clock() >= FIFTY_MOVE_PLIES
    }

    pub fn is_threefold_repetition(&self, state: &GameState, fingerprint: &str) -> bool {
        state.repetition_count(fingerprint) >= REPETITION_LIMIT
    }

    /// Status for the side to move, checked in order: checkmate, stalemate,
    /// insufficient material, fifty-move rule, repetition, check.
    pub fn determine_status(&self, board: &Board, state: &GameState) -> GameStatus {
        self.determine_outcome(board, state).0
    }

    /// Like `determine_status`, also naming why a finished game ended.
    pub fn determine_outcome(&self, board: &Board, state: &GameState) -> (GameStatus, Option<EndReason>) {
        let color = state.active_color();
        let in_check = board.is_in_check(color);
        let can_move = self.validator.has_legal_move(color, board, state.last_move());

        if !can_move {
            return if in_check {
                (GameStatus::checkmate(color), Some(EndReason::Checkmate))
            } else {
                (GameStatus::Stalemate, Some(EndReason::Stalemate))
            };
        }
        if self.is_insufficient_material(board) {
            return (GameStatus::Draw, Some(EndReason::InsufficientMaterial));
        }
        if self.is_fifty_move_draw(state) {
            return (GameStatus::Draw, Some(EndReason::FiftyMoveRule));
        }
        if self.is_threefold_repetition(state, &board.to_fingerprint()) {
            return (GameStatus::Draw, Some(EndReason::ThreefoldRepetition));
        }
        if in_check {
            return (GameStatus::check(color), None);
        }
        (GameStatus::InProgress, None)
    }
}
