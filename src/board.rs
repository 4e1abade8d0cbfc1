use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChessError, ChessResult};
use crate::movegen::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Static value used for capture ordering and move scoring.
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight => 3,
            PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 1000,
        }
    }

    /// Uppercase letter, as used in algebraic notation and white fingerprints.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Rank delta of a single pawn push.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn home_rank(self) -> i8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    pub fn pawn_rank(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    pub fn promotion_rank(self) -> i8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Rank a pawn must stand on to capture en passant.
    pub fn en_passant_rank(self) -> i8 {
        match self {
            Color::White => 4,
            Color::Black => 3,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Board coordinate. Off-board values are representable so lookups can
/// answer `None` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub rank: i8,
    pub file: i8,
}

impl Square {
    pub const fn new(rank: i8, file: i8) -> Self {
        Self { rank, file }
    }

    pub fn is_valid(&self) -> bool {
        (0..8).contains(&self.rank) && (0..8).contains(&self.file)
    }

    pub fn offset(&self, dr: i8, df: i8) -> Square {
        Square::new(self.rank + dr, self.file + df)
    }

    /// True for dark squares (a1 is dark).
    pub fn is_dark(&self) -> bool {
        (self.rank + self.file) % 2 == 0
    }

    /// Parses "e4" style coordinates.
    pub fn parse(text: &str) -> Option<Square> {
        let bytes = text.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a') as i8;
        let rank = bytes[1].wrapping_sub(b'1') as i8;
        let square = Square::new(rank, file);
        square.is_valid().then_some(square)
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> ChessResult<Self> {
        Square::parse(s).ok_or_else(|| ChessError::InvalidSquare(s.to_string()))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "??");
        }
        write!(f, "{}{}", (b'a' + self.file as u8) as char, self.rank + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
    pub has_moved: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self {
            kind,
            color,
            square: Square::new(0, 0),
            has_moved: false,
        }
    }

    pub fn value(&self) -> i32 {
        self.kind.value()
    }

    /// Letter as it appears in a fingerprint: uppercase for white.
    pub fn symbol(&self) -> char {
        match self.color {
            Color::White => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

pub const START_FINGERPRINT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: [[Option<Piece>; 8]; 8],
    kings: [Option<Square>; 2],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Standard starting position.
    pub fn new() -> Self {
        let mut board = Board::empty();
        for color in [Color::White, Color::Black] {
            for (file, kind) in BACK_RANK.iter().enumerate() {
                board.place(
                    Piece::new(*kind, color),
                    Square::new(color.home_rank(), file as i8),
                );
                board.place(
                    Piece::new(PieceKind::Pawn, color),
                    Square::new(color.pawn_rank(), file as i8),
                );
            }
        }
        board
    }

    pub fn empty() -> Self {
        Self {
            grid: std::array::from_fn(|_| std::array::from_fn(|_| None)),
            kings: [None, None],
        }
    }

    /// Puts `piece` on `square`, replacing whatever stood there. The piece
    /// counts as unmoved afterwards.
    pub fn place(&mut self, mut piece: Piece, square: Square) -> bool {
        if !square.is_valid() {
            return false;
        }
        self.remove(square);
        piece.square = square;
        piece.has_moved = false;
        self.put(piece);
        true
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        if !square.is_valid() {
            return None;
        }
        let piece = self.grid[square.rank as usize][square.file as usize].take();
        if let Some(p) = &piece {
            if p.kind == PieceKind::King && self.kings[p.color.index()] == Some(square) {
                self.kings[p.color.index()] = None;
            }
        }
        piece
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        if !square.is_valid() {
            return None;
        }
        self.grid[square.rank as usize][square.file as usize].as_ref()
    }

    pub fn is_empty(&self, square: Square) -> bool {
        square.is_valid() && self.piece_at(square).is_none()
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.grid.iter().flatten().flatten()
    }

    pub fn pieces_of(&self, color: Color) -> Vec<&Piece> {
        self.pieces().filter(|p| p.color == color).collect()
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.kings[color.index()]
    }

    /// True if any piece of the opponent of `defender` attacks `square`.
    /// Castling never counts as an attack.
    pub fn is_square_attacked(&self, square: Square, defender: Color) -> bool {
        if !square.is_valid() {
            return false;
        }
        let attacker = defender.opposite();
        self.pieces()
            .filter(|p| p.color == attacker)
            .any(|p| p.attacks(square, self))
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(square) => self.is_square_attacked(square, color),
            None => false,
        }
    }

    /// Applies `mv` to the board. Returns false, leaving the board untouched,
    /// if the origin is empty. History bookkeeping belongs to the game state.
    pub fn execute_move(&mut self, mv: &Move) -> bool {
        if self.piece_at(mv.from).is_none() {
            return false;
        }
        if mv.is_castle() {
            self.execute_castle(mv)
        } else if mv.is_en_passant {
            self.execute_en_passant(mv)
        } else {
            self.execute_normal(mv)
        }
    }

    fn execute_castle(&mut self, mv: &Move) -> bool {
        let rank = mv.from.rank;
        let (rook_from, rook_to) = if mv.is_kingside_castle {
            (Square::new(rank, 7), Square::new(rank, 5))
        } else {
            (Square::new(rank, 0), Square::new(rank, 3))
        };
        if self.piece_at(rook_from).is_none() {
            return false;
        }
        self.relocate(mv.from, mv.to);
        self.relocate(rook_from, rook_to);
        true
    }

    fn execute_en_passant(&mut self, mv: &Move) -> bool {
        self.remove(Square::new(mv.from.rank, mv.to.file));
        self.relocate(mv.from, mv.to);
        true
    }

    fn execute_normal(&mut self, mv: &Move) -> bool {
        self.relocate(mv.from, mv.to);
        if let Some(kind) = mv.promotion {
            self.promote(mv.to, kind);
        }
        true
    }

    fn promote(&mut self, square: Square, kind: PieceKind) {
        if let Some(mut pawn) = self.remove(square) {
            pawn.kind = kind;
            self.put(pawn);
        }
    }

    fn relocate(&mut self, from: Square, to: Square) {
        if let Some(mut piece) = self.remove(from) {
            self.remove(to);
            piece.square = to;
            piece.has_moved = true;
            self.put(piece);
        }
    }

    fn put(&mut self, piece: Piece) {
        let square = piece.square;
        if piece.kind == PieceKind::King {
            self.kings[piece.color.index()] = Some(square);
        }
        self.grid[square.rank as usize][square.file as usize] = Some(piece);
    }

    /// Piece placement only, rank 8 first: the position fingerprint used for
    /// repetition counting and interchange.
    pub fn to_fingerprint(&self) -> String {
        let mut result = String::with_capacity(64);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::new(rank, file)) {
                    Some(piece) => {
                        if empty > 0 {
                            result.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        result.push(piece.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                result.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                result.push('/');
            }
        }
        result
    }

    /// Parses a placement fingerprint. Pieces standing on their standard
    /// starting squares count as unmoved, everything else as moved.
    pub fn from_fingerprint(text: &str) -> ChessResult<Board> {
        let rows: Vec<&str> = text.trim().split('/').collect();
        if rows.len() != 8 {
            return Err(ChessError::fingerprint(format!(
                "expected 8 ranks, found {}",
                rows.len()
            )));
        }

        let mut board = Board::empty();
        let mut king_count = [0; 2];
        for (row, line) in rows.iter().enumerate() {
            let rank = 7 - row as i8;
            let mut file: i8 = 0;
            let mut after_run = false;
            for c in line.chars() {
                if let Some(run) = c.to_digit(10) {
                    if !(1..=8).contains(&run) {
                        return Err(ChessError::fingerprint(format!("bad empty run '{c}'")));
                    }
                    if after_run {
                        return Err(ChessError::fingerprint(format!(
                            "split empty run on rank {}",
                            rank + 1
                        )));
                    }
                    after_run = true;
                    file += run as i8;
                } else {
                    after_run = false;
                    let kind = PieceKind::from_letter(c)
                        .ok_or_else(|| ChessError::fingerprint(format!("unknown piece '{c}'")))?;
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if file > 7 {
                        return Err(ChessError::fingerprint(format!(
                            "rank {} is longer than 8 squares",
                            rank + 1
                        )));
                    }
                    let square = Square::new(rank, file);
                    if kind == PieceKind::King {
                        king_count[color.index()] += 1;
                    }
                    board.place(Piece::new(kind, color), square);
                    if let Some(piece) = board.grid[rank as usize][file as usize].as_mut() {
                        piece.has_moved = !on_starting_square(kind, color, square);
                    }
                    file += 1;
                }
                if file > 8 {
                    return Err(ChessError::fingerprint(format!(
                        "rank {} is longer than 8 squares",
                        rank + 1
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::fingerprint(format!(
                    "rank {} covers {} squares",
                    rank + 1,
                    file
                )));
            }
        }

        if king_count != [1, 1] {
            return Err(ChessError::fingerprint("each side needs exactly one king"));
        }
        Ok(board)
    }
}

fn on_starting_square(kind: PieceKind, color: Color, square: Square) -> bool {
    if square.rank == color.pawn_rank() {
        kind == PieceKind::Pawn
    } else if square.rank == color.home_rank() {
        BACK_RANK[square.file as usize] == kind
    } else {
        false
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for rank in (0..8).rev() {
            result.push_str(&format!("{} ", rank + 1));
            for file in 0..8 {
                match self.piece_at(Square::new(rank, file)) {
                    Some(piece) => result.push(piece.symbol()),
                    None => result.push('.'),
                }
                if file < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str("  a b c d e f g h\n");
        write!(f, "{}", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_fingerprint() {
        assert_eq!(Board::new().to_fingerprint(), START_FINGERPRINT);
    }

    #[test]
    fn test_fingerprint_round_trip_keeps_placement() {
        let text = "r3k2r/pp3ppp/2n5/3Pp3/8/5N2/PPP2PPP/R3K2R";
        let board = Board::from_fingerprint(text).unwrap();
        assert_eq!(board.to_fingerprint(), text);
        assert_eq!(board.king_square(Color::White), Some(Square::new(0, 4)));
        assert_eq!(board.king_square(Color::Black), Some(Square::new(7, 4)));
    }

    #[test]
    fn test_fingerprint_infers_moved_flags() {
        let board = Board::from_fingerprint("4k3/8/8/8/4P3/8/3P4/R3K2R").unwrap();
        assert!(!board.piece_at(Square::new(1, 3)).unwrap().has_moved);
        assert!(board.piece_at(Square::new(3, 4)).unwrap().has_moved);
        assert!(!board.piece_at(Square::new(0, 0)).unwrap().has_moved);
        assert!(!board.piece_at(Square::new(0, 4)).unwrap().has_moved);
    }

    #[test]
    fn test_malformed_fingerprints_are_rejected() {
        assert!(Board::from_fingerprint("").is_err());
        assert!(Board::from_fingerprint("8/8/8/8/8/8/8").is_err());
        assert!(Board::from_fingerprint("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR").is_err());
        assert!(Board::from_fingerprint("rnbqkbnr/pppppppp/7/8/8/8/PPPPPPPP/RNBQKBNR").is_err());
        assert!(Board::from_fingerprint("rnbqkbnr/ppppxppp/8/8/8/8/PPPPPPPP/RNBQKBNR").is_err());
        assert!(Board::from_fingerprint("8/8/8/8/8/8/8/4K3").is_err());
        assert!(Board::from_fingerprint("4k3/8/44/8/8/8/8/4K3").is_err());
        assert!(Board::from_fingerprint("4k3/8/8/8/8/8/8/4K111").is_err());
    }

    #[test]
    fn test_out_of_range_lookups() {
        let board = Board::new();
        assert!(board.piece_at(Square::new(8, 0)).is_none());
        assert!(board.piece_at(Square::new(0, -1)).is_none());
        assert!(!board.is_square_attacked(Square::new(-1, 3), Color::White));
        assert!(Square::parse("i1").is_none());
        assert!(Square::parse("a9").is_none());
        assert_eq!(Square::parse("e4"), Some(Square::new(3, 4)));
        assert_eq!(Square::new(3, 4).to_string(), "e4");
        assert_eq!("h8".parse::<Square>().unwrap(), Square::new(7, 7));
        assert!(matches!("z0".parse::<Square>(), Err(ChessError::InvalidSquare(_))));
    }

    #[test]
    fn test_place_clears_moved_flag_and_tracks_king() {
        let mut board = Board::empty();
        let mut king = Piece::new(PieceKind::King, Color::White);
        king.has_moved = true;
        assert!(board.place(king, Square::new(2, 2)));
        let placed = board.piece_at(Square::new(2, 2)).unwrap();
        assert!(!placed.has_moved);
        assert_eq!(placed.square, Square::new(2, 2));
        assert_eq!(board.king_square(Color::White), Some(Square::new(2, 2)));
        assert!(!board.place(Piece::new(PieceKind::Rook, Color::White), Square::new(9, 9)));
    }

    #[test]
    fn test_slider_attacks_stop_at_blockers() {
        let board = Board::from_fingerprint("4k3/8/8/8/R2p3K/8/8/8").unwrap();
        // Rook on a4, black pawn on d4.
        assert!(board.is_square_attacked(Square::new(3, 3), Color::Black));
        assert!(!board.is_square_attacked(Square::new(3, 4), Color::Black));
        assert!(board.is_square_attacked(Square::new(7, 0), Color::Black));
    }

    #[test]
    fn test_pawns_attack_diagonally_only() {
        let board = Board::from_fingerprint("4k3/8/8/8/8/8/4P3/4K3").unwrap();
        assert!(board.is_square_attacked(Square::new(2, 3), Color::Black));
        assert!(board.is_square_attacked(Square::new(2, 5), Color::Black));
        assert!(!board.is_square_attacked(Square::new(2, 4), Color::Black));
    }

    #[test]
    fn test_execute_move_fails_on_empty_origin() {
        let mut board = Board::new();
        let mut pawn = Piece::new(PieceKind::Pawn, Color::White);
        pawn.square = Square::new(2, 4);
        let mv = Move::new(&pawn, Square::new(3, 4), None);
        let before = board.clone();
        assert!(!board.execute_move(&mv));
        assert_eq!(board, before);
    }

    #[test]
    fn test_clone_is_independent() {
        let board = Board::new();
        let mut copy = board.clone();
        copy.remove(Square::new(1, 4));
        assert!(board.piece_at(Square::new(1, 4)).is_some());
        assert!(copy.piece_at(Square::new(1, 4)).is_none());
    }
}
