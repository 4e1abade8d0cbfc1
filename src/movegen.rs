use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::evaluation::Evaluator;
use crate::validator::MoveValidator;

/// Flat ordering bonus for moves flagged as giving check.
pub const CHECK_BONUS: i32 = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Move {
    pub piece: PieceKind,
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub captured: Option<PieceKind>,
    pub is_kingside_castle: bool,
    pub is_queenside_castle: bool,
    pub is_en_passant: bool,
    pub promotion: Option<PieceKind>,
    pub gives_check: bool,
    pub gives_checkmate: bool,
    /// The moving piece had not moved before this move.
    pub first_move: bool,
}

impl Move {
    pub fn new(piece: &Piece, to: Square, captured: Option<PieceKind>) -> Self {
        Self {
            piece: piece.kind,
            color: piece.color,
            from: piece.square,
            to,
            captured,
            is_kingside_castle: false,
            is_queenside_castle: false,
            is_en_passant: false,
            promotion: None,
            gives_check: false,
            gives_checkmate: false,
            first_move: !piece.has_moved,
        }
    }

    pub fn new_en_passant(pawn: &Piece, to: Square) -> Self {
        Self {
            is_en_passant: true,
            ..Move::new(pawn, to, Some(PieceKind::Pawn))
        }
    }

    pub fn new_castling(king: &Piece, kingside: bool) -> Self {
        let file = if kingside { 6 } else { 2 };
        Self {
            is_kingside_castle: kingside,
            is_queenside_castle: !kingside,
            ..Move::new(king, Square::new(king.square.rank, file), None)
        }
    }

    pub fn new_promotion(
        pawn: &Piece,
        to: Square,
        captured: Option<PieceKind>,
        promotion: PieceKind,
    ) -> Self {
        Self {
            promotion: Some(promotion),
            ..Move::new(pawn, to, captured)
        }
    }

    pub fn is_castle(&self) -> bool {
        self.is_kingside_castle || self.is_queenside_castle
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// Standard algebraic notation. Origin squares are never disambiguated,
    /// so two knights reaching the same square print identically.
    pub fn algebraic(&self) -> String {
        let mut notation = String::new();
        if self.is_kingside_castle {
            notation.push_str("O-O");
        } else if self.is_queenside_castle {
            notation.push_str("O-O-O");
        } else {
            if self.piece != PieceKind::Pawn {
                notation.push(self.piece.letter());
            }
            if self.is_capture() {
                if self.piece == PieceKind::Pawn {
                    notation.push((b'a' + self.from.file as u8) as char);
                }
                notation.push('x');
            }
            notation.push_str(&self.to.to_string());
            if let Some(kind) = self.promotion {
                notation.push('=');
                notation.push(kind.letter());
            }
        }
        if self.gives_checkmate {
            notation.push('#');
        } else if self.gives_check {
            notation.push('+');
        }
        notation
    }

    /// "e2-e4"
    pub fn long_notation(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }

    /// "e2e4", or "e7e8q" for promotions.
    pub fn coordinate(&self) -> String {
        let mut text = format!("{}{}", self.from, self.to);
        if let Some(kind) = self.promotion {
            text.push(kind.letter().to_ascii_lowercase());
        }
        text
    }
}

// Moves are identified by their squares and promotion choice. The
// detection flags do not take part.
impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }
}

impl Eq for Move {}

/// Parses coordinate notation such as "e2e4" or "e7e8q".
pub fn parse_coordinate(text: &str) -> Option<(Square, Square, Option<PieceKind>)> {
    let text = text.trim();
    if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
        return None;
    }
    let from = Square::parse(&text[0..2])?;
    let to = Square::parse(&text[2..4])?;
    let promotion = match text[4..].chars().next() {
        Some(c) => match PieceKind::from_letter(c)? {
            PieceKind::Pawn | PieceKind::King => return None,
            kind => Some(kind),
        },
        None => None,
    };
    Some((from, to, promotion))
}

/// Legal move lists grouped and ordered for consumers such as the search
/// and the AI player.
#[derive(Debug, Clone, Default)]
pub struct MoveGenerator {
    validator: MoveValidator,
    evaluator: Evaluator,
}

impl MoveGenerator {
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            validator: MoveValidator,
            evaluator,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn validator(&self) -> &MoveValidator {
        &self.validator
    }

    pub fn generate_moves(&self, color: Color, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        self.validator.all_legal_moves(color, board, last_move)
    }

    pub fn captures(&self, color: Color, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        self.generate_moves(color, board, last_move)
            .into_iter()
            .filter(|mv| mv.is_capture())
            .map(|mv| self.annotate(mv, board))
            .collect()
    }

    pub fn checking_moves(&self, color: Color, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        self.generate_moves(color, board, last_move)
            .into_iter()
            .map(|mv| self.annotate(mv, board))
            .filter(|mv| mv.gives_check)
            .collect()
    }

    pub fn castling_moves(&self, color: Color, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        self.generate_moves(color, board, last_move)
            .into_iter()
            .filter(|mv| mv.is_castle())
            .map(|mv| self.annotate(mv, board))
            .collect()
    }

    pub fn promotions(&self, color: Color, board: &Board, last_move: Option<&Move>) -> Vec<Move> {
        self.generate_moves(color, board, last_move)
            .into_iter()
            .filter(|mv| mv.is_promotion())
            .map(|mv| self.annotate(mv, board))
            .collect()
    }

    /// Simulates `mv` and sets its check and checkmate flags.
    pub fn annotate(&self, mut mv: Move, board: &Board) -> Move {
        let mut copy = board.clone();
        if !copy.execute_move(&mv) {
            return mv;
        }
        let opponent = mv.color.opposite();
        mv.gives_check = copy.is_in_check(opponent);
        mv.gives_checkmate =
            mv.gives_check && !self.validator.has_legal_move(opponent, &copy, Some(&mv));
        mv
    }

    /// Most valuable victim, least valuable attacker.
    pub fn mvv_lva(mv: &Move) -> i32 {
        match mv.captured {
            Some(victim) => victim.value() * 10 - mv.piece.value(),
            None => 0,
        }
    }

    pub fn heuristic_value(&self, mv: &Move, board: &Board) -> i32 {
        let mut score = Self::mvv_lva(mv);
        if mv.gives_check {
            score += CHECK_BONUS;
        }
        score + self.evaluator.evaluate_move(mv, board)
    }

    /// Best first. The sort is stable so equal scores keep their input order.
    pub fn sort_by_heuristic_value(&self, moves: &mut [Move], board: &Board) {
        moves.sort_by_cached_key(|mv| std::cmp::Reverse(self.heuristic_value(mv, board)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pawn_at(color: Color, square: Square) -> Piece {
        let mut piece = Piece::new(PieceKind::Pawn, color);
        piece.square = square;
        piece
    }

    #[test]
    fn test_move_equality_ignores_flags() {
        let pawn = pawn_at(Color::White, Square::new(1, 4));
        let a = Move::new(&pawn, Square::new(3, 4), None);
        let mut b = a;
        b.gives_check = true;
        assert_eq!(a, b);
        let promo = Move::new_promotion(&pawn, Square::new(3, 4), None, PieceKind::Queen);
        assert_ne!(a, promo);
    }

    #[test]
    fn test_notation() {
        let pawn = pawn_at(Color::White, Square::new(1, 4));
        let push = Move::new(&pawn, Square::new(3, 4), None);
        assert_eq!(push.algebraic(), "e4");
        assert_eq!(push.long_notation(), "e2-e4");
        assert_eq!(push.coordinate(), "e2e4");

        let mut knight = Piece::new(PieceKind::Knight, Color::White);
        knight.square = Square::new(0, 6);
        let mut capture = Move::new(&knight, Square::new(2, 5), Some(PieceKind::Bishop));
        capture.gives_check = true;
        assert_eq!(capture.algebraic(), "Nxf3+");

        let pawn = pawn_at(Color::White, Square::new(6, 3));
        let mut promo = Move::new_promotion(&pawn, Square::new(7, 4), Some(PieceKind::Rook), PieceKind::Queen);
        promo.gives_check = true;
        promo.gives_checkmate = true;
        assert_eq!(promo.algebraic(), "dxe8=Q#");
        assert_eq!(promo.coordinate(), "d7e8q");

        let mut king = Piece::new(PieceKind::King, Color::Black);
        king.square = Square::new(7, 4);
        assert_eq!(Move::new_castling(&king, true).algebraic(), "O-O");
        assert_eq!(Move::new_castling(&king, false).algebraic(), "O-O-O");
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate("e2e4"),
            Some((Square::new(1, 4), Square::new(3, 4), None))
        );
        assert_eq!(
            parse_coordinate("a7a8n"),
            Some((Square::new(6, 0), Square::new(7, 0), Some(PieceKind::Knight)))
        );
        assert_eq!(parse_coordinate("e7e8k"), None);
        assert_eq!(parse_coordinate("e2e9"), None);
        assert_eq!(parse_coordinate("e2"), None);
    }

    #[test]
    fn test_mvv_lva_prefers_cheap_attackers() {
        let pawn = pawn_at(Color::White, Square::new(3, 3));
        let mut queen = Piece::new(PieceKind::Queen, Color::White);
        queen.square = Square::new(3, 0);
        let pawn_takes_queen = Move::new(&pawn, Square::new(4, 4), Some(PieceKind::Queen));
        let queen_takes_pawn = Move::new(&queen, Square::new(4, 0), Some(PieceKind::Pawn));
        assert_eq!(MoveGenerator::mvv_lva(&pawn_takes_queen), 89);
        assert_eq!(MoveGenerator::mvv_lva(&queen_takes_pawn), 1);
    }

    #[test]
    fn test_sort_puts_captures_first_and_is_stable() {
        let board = Board::from_fingerprint("4k3/8/8/3q4/4P3/8/8/4K3").unwrap();
        let generator = MoveGenerator::default();
        let mut moves = generator.generate_moves(Color::White, &board, None);
        generator.sort_by_heuristic_value(&mut moves, &board);
        assert_eq!(moves[0].coordinate(), "e4d5");

        let mut again = generator.generate_moves(Color::White, &board, None);
        generator.sort_by_heuristic_value(&mut again, &board);
        let first: Vec<String> = moves.iter().map(Move::coordinate).collect();
        let second: Vec<String> = again.iter().map(Move::coordinate).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_promotion_sublist_has_four_variants() {
        let board = Board::from_fingerprint("4k3/P7/8/8/8/8/8/4K3").unwrap();
        let generator = MoveGenerator::default();
        let promotions = generator.promotions(Color::White, &board, None);
        assert_eq!(promotions.len(), 4);
        let kinds: Vec<PieceKind> = promotions.iter().filter_map(|mv| mv.promotion).collect();
        for kind in PieceKind::PROMOTIONS {
            assert!(kinds.contains(&kind));
        }
    }

    #[test]
    fn test_checking_moves_are_flagged() {
        let board = Board::from_fingerprint("4k3/8/8/8/8/8/8/R3K3").unwrap();
        let generator = MoveGenerator::default();
        let checks = generator.checking_moves(Color::White, &board, None);
        assert!(!checks.is_empty());
        assert!(checks.iter().all(|mv| mv.gives_check));
        assert!(checks.iter().any(|mv| mv.coordinate() == "a1a8"));
    }

    #[test]
    fn test_castling_sublist() {
        let board = Board::from_fingerprint("4k3/8/8/8/8/8/8/R3K2R").unwrap();
        let generator = MoveGenerator::default();
        let castles = generator.castling_moves(Color::White, &board, None);
        assert_eq!(castles.len(), 2);
    }
}
