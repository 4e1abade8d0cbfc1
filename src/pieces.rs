//! Per-kind movement geometry.
//!
//! Everything here ignores whether the mover's own king ends up in check;
//! that filtering happens in the validator.

use crate::board::{Board, Piece, PieceKind, Square};
use crate::movegen::Move;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl PieceKind {
    fn ray_directions(self) -> &'static [(i8, i8)] {
        match self {
            PieceKind::Bishop => &DIAGONALS,
            PieceKind::Rook => &ORTHOGONALS,
            PieceKind::Queen => &KING_OFFSETS,
            _ => &[],
        }
    }
}

impl Piece {
    /// Geometry-only moves. En passant needs the previous ply.
    pub fn pseudo_legal_moves(&self, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        match self.kind {
            PieceKind::Pawn => self.pawn_moves(board, last_move),
            PieceKind::Knight => self.step_moves(board, &KNIGHT_OFFSETS),
            PieceKind::King => {
                let mut moves = self.step_moves(board, &KING_OFFSETS);
                self.add_castling_candidates(board, &mut moves);
                moves
            }
            PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => self.slider_moves(board),
        }
    }

    pub fn is_pseudo_legal(&self, destination: Square, board: &Board, last_move: Option<&Move>) -> bool {
        destination.is_valid()
            && self
                .pseudo_legal_moves(board, last_move)
                .iter()
                .any(|mv| mv.to == destination)
    }

    /// True if this piece attacks `target`. Pawns attack diagonally only and
    /// castling is never an attack.
    pub fn attacks(&self, target: Square, board: &Board) -> bool {
        if !target.is_valid() || target == self.square {
            return false;
        }
        let dr = target.rank - self.square.rank;
        let df = target.file - self.square.file;
        match self.kind {
            PieceKind::Pawn => dr == self.color.pawn_direction() && df.abs() == 1,
            PieceKind::Knight => KNIGHT_OFFSETS.contains(&(dr, df)),
            PieceKind::King => dr.abs() <= 1 && df.abs() <= 1,
            kind => {
                let step = (dr.signum(), df.signum());
                let aligned = dr == 0 || df == 0 || dr.abs() == df.abs();
                if !aligned || !kind.ray_directions().contains(&step) {
                    return false;
                }
                let mut current = self.square.offset(step.0, step.1);
                while current != target {
                    if !board.is_empty(current) {
                        return false;
                    }
                    current = current.offset(step.0, step.1);
                }
                true
            }
        }
    }

    fn capture_at(&self, board: &Board, square: Square) -> Option<PieceKind> {
        board
            .piece_at(square)
            .filter(|p| p.color != self.color)
            .map(|p| p.kind)
    }

    fn step_moves(&self, board: &Board, offsets: &[(i8, i8)]) -> Vec<Move> {
        let mut moves = Vec::new();
        for &(dr, df) in offsets {
            let target = self.square.offset(dr, df);
            if !target.is_valid() {
                continue;
            }
            match board.piece_at(target) {
                None => moves.push(Move::new(self, target, None)),
                Some(p) if p.color != self.color => moves.push(Move::new(self, target, Some(p.kind))),
                Some(_) => {}
            }
        }
        moves
    }

    fn slider_moves(&self, board: &Board) -> Vec<Move> {
        let mut moves = Vec::new();
        for &(dr, df) in self.kind.ray_directions() {
            let mut target = self.square.offset(dr, df);
            while target.is_valid() {
                match board.piece_at(target) {
                    None => moves.push(Move::new(self, target, None)),
                    Some(p) => {
                        if p.color != self.color {
                            moves.push(Move::new(self, target, Some(p.kind)));
                        }
                        break;
                    }
                }
                target = target.offset(dr, df);
            }
        }
        moves
    }

    fn pawn_moves(&self, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        let mut moves = Vec::new();
        let dir = self.color.pawn_direction();

        let one = self.square.offset(dir, 0);
        if board.is_empty(one) {
            self.push_pawn_move(&mut moves, one, None);
            let two = self.square.offset(2 * dir, 0);
            if !self.has_moved && self.square.rank == self.color.pawn_rank() && board.is_empty(two) {
                moves.push(Move::new(self, two, None));
            }
        }

        for df in [-1, 1] {
            let target = self.square.offset(dir, df);
            if let Some(captured) = self.capture_at(board, target) {
                self.push_pawn_move(&mut moves, target, Some(captured));
            }
        }

        if let Some(target) = self.en_passant_target(board, last_move) {
            moves.push(Move::new_en_passant(self, target));
        }
        moves
    }

    fn push_pawn_move(&self, moves: &mut Vec<Move>, target: Square, captured: Option<PieceKind>) {
        if target.rank == self.color.promotion_rank() {
            for kind in PieceKind::PROMOTIONS {
                moves.push(Move::new_promotion(self, target, captured, kind));
            }
        } else {
            moves.push(Move::new(self, target, captured));
        }
    }

    /// Landing square of an en passant capture, if the previous ply was an
    /// adjacent enemy pawn's double step.
    pub(crate) fn en_passant_target(&self, board: &Board, last_move: Option<&Move>) -> Option<Square> {
        if self.kind != PieceKind::Pawn || self.square.rank != self.color.en_passant_rank() {
            return None;
        }
        let last = last_move?;
        let double_step = last.piece == PieceKind::Pawn
            && last.color != self.color
            && (last.to.rank - last.from.rank).abs() == 2;
        if !double_step
            || last.to.rank != self.square.rank
            || (last.to.file - self.square.file).abs() != 1
        {
            return None;
        }
        let victim = board.piece_at(last.to)?;
        if victim.kind != PieceKind::Pawn || victim.color == self.color {
            return None;
        }
        let target = last.to.offset(self.color.pawn_direction(), 0);
        board.is_empty(target).then_some(target)
    }

    fn add_castling_candidates(&self, board: &Board, moves: &mut Vec<Move>) {
        let home = Square::new(self.color.home_rank(), 4);
        if self.has_moved || self.square != home {
            return;
        }
        for (kingside, rook_file) in [(true, 7), (false, 0)] {
            let rook_square = Square::new(home.rank, rook_file);
            let rook_ready = board.piece_at(rook_square).map_or(false, |r| {
                r.kind == PieceKind::Rook && r.color == self.color && !r.has_moved
            });
            let (low, high) = if kingside { (5, 6) } else { (1, 3) };
            let path_clear = (low..=high).all(|file| board.is_empty(Square::new(home.rank, file)));
            if rook_ready && path_clear {
                moves.push(Move::new_castling(self, kingside));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;

    fn destinations(board: &Board, square: &str, last_move: Option<&Move>) -> Vec<String> {
        let piece = board.piece_at(Square::parse(square).unwrap()).unwrap();
        let mut squares: Vec<String> = piece
            .pseudo_legal_moves(board, last_move)
            .iter()
            .map(|mv| mv.to.to_string())
            .collect();
        squares.sort();
        squares
    }

    #[test]
    fn test_knight_in_corner() {
        let board = Board::from_fingerprint("4k3/8/8/8/8/8/8/N3K3").unwrap();
        assert_eq!(destinations(&board, "a1", None), vec!["b3", "c2"]);
    }

    #[test]
    fn test_rook_stops_at_first_piece() {
        let board = Board::from_fingerprint("4k3/8/8/8/8/p7/8/RN2K3").unwrap();
        assert_eq!(destinations(&board, "a1", None), vec!["a2", "a3"]);
    }

    #[test]
    fn test_pawn_pushes() {
        let board = Board::new();
        assert_eq!(destinations(&board, "e2", None), vec!["e3", "e4"]);
        let blocked = Board::from_fingerprint("4k3/8/8/8/8/4n3/4P3/4K3").unwrap();
        assert!(destinations(&blocked, "e2", None).is_empty());
        let half_blocked = Board::from_fingerprint("4k3/8/8/8/4n3/8/4P3/4K3").unwrap();
        assert_eq!(destinations(&half_blocked, "e2", None), vec!["e3"]);
    }

    #[test]
    fn test_en_passant_requires_last_double_step() {
        let board = Board::from_fingerprint("4k3/8/8/3pP3/8/8/8/4K3").unwrap();
        let black_pawn = board.piece_at(Square::parse("d5").unwrap()).unwrap().clone();
        let mut from_d7 = black_pawn.clone();
        from_d7.square = Square::parse("d7").unwrap();
        let double_step = Move::new(&from_d7, Square::parse("d5").unwrap(), None);
        assert!(destinations(&board, "e5", Some(&double_step)).contains(&"d6".to_string()));
        assert!(!destinations(&board, "e5", None).contains(&"d6".to_string()));

        let mut from_d6 = black_pawn;
        from_d6.square = Square::parse("d6").unwrap();
        let single_step = Move::new(&from_d6, Square::parse("d5").unwrap(), None);
        assert!(!destinations(&board, "e5", Some(&single_step)).contains(&"d6".to_string()));
    }

    #[test]
    fn test_queen_attack_is_blocked() {
        let board = Board::from_fingerprint("4k3/8/8/8/8/2P5/8/Q3K3").unwrap();
        let queen = board.piece_at(Square::parse("a1").unwrap()).unwrap();
        assert!(queen.attacks(Square::parse("b2").unwrap(), &board));
        assert!(queen.attacks(Square::parse("c3").unwrap(), &board));
        assert!(!queen.attacks(Square::parse("d4").unwrap(), &board));
        assert!(queen.attacks(Square::parse("a8").unwrap(), &board));
        assert!(!queen.attacks(Square::parse("b3").unwrap(), &board));
    }

    #[test]
    fn test_castling_candidates_need_clear_path() {
        let board = Board::from_fingerprint("4k3/8/8/8/8/8/8/RN2K2R").unwrap();
        let king = board.piece_at(Square::parse("e1").unwrap()).unwrap();
        let castles: Vec<Move> = king
            .pseudo_legal_moves(&board, None)
            .into_iter()
            .filter(|mv| mv.is_castle())
            .collect();
        assert_eq!(castles.len(), 1);
        assert!(castles[0].is_kingside_castle);
        assert_eq!(castles[0].color, Color::White);
    }

    #[test]
    fn test_is_pseudo_legal() {
        let board = Board::new();
        let knight = board.piece_at(Square::parse("g1").unwrap()).unwrap();
        assert!(knight.is_pseudo_legal(Square::parse("f3").unwrap(), &board, None));
        assert!(!knight.is_pseudo_legal(Square::parse("e2").unwrap(), &board, None));
        assert!(!knight.is_pseudo_legal(Square::new(9, 9), &board, None));
    }
}
