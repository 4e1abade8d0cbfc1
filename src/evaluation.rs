use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::movegen::{Move, CHECK_BONUS};
use crate::validator::MoveValidator;

pub const MOBILITY_WEIGHT: i32 = 2;
pub const CENTER_WEIGHT: i32 = 3;
pub const IN_CHECK_PENALTY: i32 = 50;
pub const SAFE_KING_SQUARE_BONUS: i32 = 5;
pub const MISSING_KING_PENALTY: i32 = 1000;
pub const DEVELOPMENT_BONUS: i32 = 10;

const CENTER: [Square; 4] = [
    Square::new(3, 3),
    Square::new(3, 4),
    Square::new(4, 3),
    Square::new(4, 4),
];

/// Material values and piece-square tables. Tables are written from
/// White's side with the eighth rank in the first row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalTables {
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    pub pawn_table: [[i32; 8]; 8],
    pub knight_table: [[i32; 8]; 8],
    pub bishop_table: [[i32; 8]; 8],
    pub rook_table: [[i32; 8]; 8],
    pub queen_table: [[i32; 8]; 8],
    pub king_table: [[i32; 8]; 8],
}

impl Default for EvalTables {
    fn default() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 320,
            bishop_value: 330,
            rook_value: 500,
            queen_value: 900,
            king_value: 10000,

            // Pushes pawns towards promotion and into the center
            pawn_table: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [50, 50, 50, 50, 50, 50, 50, 50],
                [10, 10, 20, 30, 30, 20, 10, 10],
                [5, 5, 10, 25, 25, 10, 5, 5],
                [0, 0, 0, 20, 20, 0, 0, 0],
                [5, -5, -10, 0, 0, -10, -5, 5],
                [5, 10, 10, -20, -20, 10, 10, 5],
                [0, 0, 0, 0, 0, 0, 0, 0],
            ],

            knight_table: [
                [-50, -40, -30, -30, -30, -30, -40, -50],
                [-40, -20, 0, 0, 0, 0, -20, -40],
                [-30, 0, 10, 15, 15, 10, 0, -30],
                [-30, 5, 15, 20, 20, 15, 5, -30],
                [-30, 0, 15, 20, 20, 15, 0, -30],
                [-30, 5, 10, 15, 15, 10, 5, -30],
                [-40, -20, 0, 5, 5, 0, -20, -40],
                [-50, -40, -30, -30, -30, -30, -40, -50],
            ],

            bishop_table: [
                [-20, -10, -10, -10, -10, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 10, 10, 5, 0, -10],
                [-10, 5, 5, 10, 10, 5, 5, -10],
                [-10, 0, 10, 10, 10, 10, 0, -10],
                [-10, 10, 10, 10, 10, 10, 10, -10],
                [-10, 5, 0, 0, 0, 0, 5, -10],
                [-20, -10, -10, -10, -10, -10, -10, -20],
            ],

            rook_table: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [5, 10, 10, 10, 10, 10, 10, 5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [0, 0, 0, 5, 5, 0, 0, 0],
            ],

            queen_table: [
                [-20, -10, -10, -5, -5, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 5, 5, 5, 0, -10],
                [-5, 0, 5, 5, 5, 5, 0, -5],
                [0, 0, 5, 5, 5, 5, 0, -5],
                [-10, 5, 5, 5, 5, 5, 0, -10],
                [-10, 0, 5, 0, 0, 0, 0, -10],
                [-20, -10, -10, -5, -5, -10, -10, -20],
            ],

            // Middlegame: keep the king tucked behind its pawns
            king_table: [
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-20, -30, -30, -40, -40, -30, -30, -20],
                [-10, -20, -20, -20, -20, -20, -20, -10],
                [20, 20, 0, 0, 0, 0, 20, 20],
                [20, 30, 10, 0, 0, 10, 30, 20],
            ],
        }
    }
}

impl EvalTables {
    pub fn material(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Pawn => self.pawn_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Queen => self.queen_value,
            PieceKind::King => self.king_value,
        }
    }

    /// Table bonus for `piece` on its square, mirrored for Black.
    pub fn placement(&self, piece: &Piece) -> i32 {
        let table = match piece.kind {
            PieceKind::Pawn => &self.pawn_table,
            PieceKind::Knight => &self.knight_table,
            PieceKind::Bishop => &self.bishop_table,
            PieceKind::Rook => &self.rook_table,
            PieceKind::Queen => &self.queen_table,
            PieceKind::King => &self.king_table,
        };
        let row = match piece.color {
            Color::White => 7 - piece.square.rank,
            Color::Black => piece.square.rank,
        };
        table[row as usize][piece.square.file as usize]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    tables: EvalTables,
    validator: MoveValidator,
}

impl Evaluator {
    pub fn new(tables: EvalTables) -> Self {
        Self {
            tables,
            validator: MoveValidator,
        }
    }

    pub fn tables(&self) -> &EvalTables {
        &self.tables
    }

    /// Static score of `board` from `color`'s point of view.
    pub fn evaluate(&self, board: &Board, color: Color) -> i32 {
        let mut score = 0;
        for piece in board.pieces() {
            let value = self.tables.material(piece.kind) + self.tables.placement(piece);
            score += if piece.color == color { value } else { -value };
        }

        score += self.evaluate_mobility(board, color) * MOBILITY_WEIGHT;
        score += self.evaluate_king_safety(board, color);
        score += self.evaluate_center_control(board, color) * CENTER_WEIGHT;
        score
    }

    fn evaluate_mobility(&self, board: &Board, color: Color) -> i32 {
        let own = self.validator.all_legal_moves(color, board, None).len() as i32;
        let theirs = self
            .validator
            .all_legal_moves(color.opposite(), board, None)
            .len() as i32;
        own - theirs
    }

    fn evaluate_king_safety(&self, board: &Board, color: Color) -> i32 {
        let king = match board.king_square(color) {
            Some(square) => square,
            None => return -MISSING_KING_PENALTY,
        };

        let mut score = 0;
        if board.is_in_check(color) {
            score -= IN_CHECK_PENALTY;
        }
        for dr in -1..=1 {
            for df in -1..=1 {
                if dr == 0 && df == 0 {
                    continue;
                }
                let square = king.offset(dr, df);
                if square.is_valid() && !board.is_square_attacked(square, color) {
                    score += SAFE_KING_SQUARE_BONUS;
                }
            }
        }
        score
    }

    fn evaluate_center_control(&self, board: &Board, color: Color) -> i32 {
        let opponent = color.opposite();
        CENTER
            .iter()
            .map(|&square| {
                let ours = board.is_square_attacked(square, opponent) as i32;
                let theirs = board.is_square_attacked(square, color) as i32;
                ours - theirs
            })
            .sum()
    }

    /// Cheap per-move score used for move ordering.
    pub fn evaluate_move(&self, mv: &Move, board: &Board) -> i32 {
        let mut score = mv.captured.map_or(0, |kind| self.tables.material(kind));

        let mut copy = board.clone();
        if !copy.execute_move(mv) {
            return score;
        }
        if copy.is_in_check(mv.color.opposite()) {
            score += CHECK_BONUS;
        }
        if mv.first_move && matches!(mv.piece, PieceKind::Knight | PieceKind::Bishop) {
            score += DEVELOPMENT_BONUS;
        }
        if copy.is_square_attacked(mv.to, mv.color) {
            score -= mv.piece.value() / 10;
        }
        score
    }
}
