use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::movegen::Move;

/// Turns pseudo-legal moves into legal ones by playing each on a cloned
/// board and rejecting those that leave the mover in check.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveValidator;

impl MoveValidator {
    pub fn is_legal(&self, mv: &Move, board: &Board, last_move: Option<&Move>) -> bool {
        match self.resolve(mv, board, last_move) {
            Some(canonical) => {
                canonical.is_kingside_castle == mv.is_kingside_castle
                    && canonical.is_queenside_castle == mv.is_queenside_castle
                    && canonical.is_en_passant == mv.is_en_passant
                    && canonical.captured == mv.captured
            }
            None => false,
        }
    }

    /// Looks up the legal move matching `mv`'s squares and promotion, with
    /// its flags filled in from the board.
    pub fn resolve(&self, mv: &Move, board: &Board, last_move: Option<&Move>) -> Option<Move> {
        let piece = board.piece_at(mv.from)?;
        if piece.kind != mv.piece || piece.color != mv.color {
            return None;
        }
        self.legal_moves_for(piece, board, last_move)
            .into_iter()
            .find(|candidate| candidate == mv)
    }

    pub fn validate_castle(&self, mv: &Move, board: &Board) -> bool {
        if !mv.is_castle() {
            return false;
        }
        let color = mv.color;
        let rank = color.home_rank();
        let king = match board.piece_at(mv.from) {
            Some(p) if p.kind == PieceKind::King && p.color == color => p,
            _ => return false,
        };
        if king.has_moved || mv.from != Square::new(rank, 4) {
            return false;
        }

        let (rook_file, between, transit): (i8, &[i8], &[i8]) = if mv.is_kingside_castle {
            (7, &[5, 6][..], &[5, 6][..])
        } else {
            (0, &[1, 2, 3][..], &[3, 2][..])
        };
        let rook_ready = board
            .piece_at(Square::new(rank, rook_file))
            .map_or(false, |r| r.kind == PieceKind::Rook && r.color == color && !r.has_moved);
        if !rook_ready {
            return false;
        }
        if board.is_in_check(color) {
            return false;
        }
        if !between.iter().all(|&file| board.is_empty(Square::new(rank, file))) {
            return false;
        }
        transit
            .iter()
            .all(|&file| !board.is_square_attacked(Square::new(rank, file), color))
    }

    pub fn validate_en_passant(&self, mv: &Move, board: &Board, last_move: Option<&Move>) -> bool {
        if !mv.is_en_passant {
            return false;
        }
        match board.piece_at(mv.from) {
            Some(pawn) if pawn.kind == PieceKind::Pawn && pawn.color == mv.color => {
                pawn.en_passant_target(board, last_move) == Some(mv.to)
            }
            _ => false,
        }
    }

    /// Plays `mv` on a copy and reports whether the mover's king is safe.
    pub fn leaves_king_safe(&self, mv: &Move, board: &Board) -> bool {
        let mut copy = board.clone();
        copy.execute_move(mv) && !copy.is_in_check(mv.color)
    }

    pub fn legal_moves_for(&self, piece: &Piece, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        piece
            .pseudo_legal_moves(board, last_move)
            .into_iter()
            .filter(|mv| !mv.is_castle() || self.validate_castle(mv, board))
            .filter(|mv| !mv.is_en_passant || self.validate_en_passant(mv, board, last_move))
            .filter(|mv| self.leaves_king_safe(mv, board))
            .collect()
    }

    pub fn all_legal_moves(&self, color: Color, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        board
            .pieces_of(color)
            .into_iter()
            .flat_map(|piece| self.legal_moves_for(piece, board, last_move))
            .collect()
    }

    /// Stops at the first legal move found.
    pub fn has_legal_move(&self, color: Color, board: &Board, last_move: Option<&Move>) -> bool {
        board
            .pieces_of(color)
            .into_iter()
            .any(|piece| !self.legal_moves_for(piece, board, last_move).is_empty())
    }
}
