use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, PieceKind};
use crate::movegen::Move;
use crate::rules::GameStatus;

pub const DEFAULT_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Checkmate,
    Stalemate,
    Resignation,
    Agreement,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub color: Color,
    pub remaining_time: Duration,
    pub is_turn: bool,
    pub move_count: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, color: Color, time: Duration) -> Self {
        Self {
            name: name.into(),
            color,
            remaining_time: time,
            is_turn: color == Color::White,
            move_count: 0,
        }
    }

    pub fn start_turn(&mut self) {
        self.is_turn = true;
    }

    pub fn end_turn(&mut self) {
        self.is_turn = false;
    }

    pub fn add_time(&mut self, amount: Duration) {
        self.remaining_time += amount;
    }

    pub fn remove_time(&mut self, amount: Duration) {
        self.remaining_time = self.remaining_time.saturating_sub(amount);
    }

    pub fn is_out_of_time(&self) -> bool {
        self.remaining_time.is_zero()
    }
}

/// Turn owner, history and the counters the draw rules read. Mutated in
/// lockstep with the board by every executed move.
#[derive(Debug, Clone)]
pub struct GameState {
    white: Player,
    black: Player,
    active: Color,
    status: GameStatus,
    history: Vec<Move>,
    halfmove_clock: u32,
    repetitions: HashMap<String, u32>,
    winner: Option<Color>,
    end_reason: Option<EndReason>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new("White", "Black", DEFAULT_TIME)
    }
}

impl GameState {
    pub fn new(white: impl Into<String>, black: impl Into<String>, time: Duration) -> Self {
        Self {
            white: Player::new(white, Color::White, time),
            black: Player::new(black, Color::Black, time),
            active: Color::White,
            status: GameStatus::InProgress,
            history: Vec::new(),
            halfmove_clock: 0,
            repetitions: HashMap::new(),
            winner: None,
            end_reason: None,
        }
    }

    pub fn active_color(&self) -> Color {
        self.active
    }

    pub fn active_player(&self) -> &Player {
        self.player(self.active)
    }

    pub fn player(&self, color: Color) -> &Player {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn player_mut(&mut self, color: Color) -> &mut Player {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Hands the move to `color` without recording anything.
    pub fn set_active(&mut self, color: Color) {
        self.player_mut(self.active).end_turn();
        self.active = color;
        self.player_mut(color).start_turn();
    }

    pub fn switch_turn(&mut self) {
        self.set_active(self.active.opposite());
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.history.last()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Full move number of the next move, starting at 1.
    pub fn move_number(&self) -> usize {
        self.history.len() / 2 + 1
    }

    /// Appends `mv` and updates the halfmove clock: pawn moves and captures
    /// reset it, everything else counts up.
    pub fn record_move(&mut self, mv: Move) {
        if mv.piece == PieceKind::Pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        self.player_mut(mv.color).move_count += 1;
        self.history.push(mv);
    }

    /// Counts one more occurrence of `fingerprint` and returns the total.
    pub fn record_position(&mut self, fingerprint: &str) -> u32 {
        let count = self.repetitions.entry(fingerprint.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn repetition_count(&self, fingerprint: &str) -> u32 {
        self.repetitions.get(fingerprint).copied().unwrap_or(0)
    }

    /// Moves the status forward. A finished game keeps its final status.
    pub fn set_status(&mut self, status: GameStatus) -> bool {
        if self.status.is_terminal() || self.status == status {
            return false;
        }
        self.status = status;
        if status.is_terminal() {
            self.winner = status.winner();
        }
        true
    }

    pub fn finish(&mut self, status: GameStatus, reason: EndReason) -> bool {
        debug_assert!(status.is_terminal());
        if !self.set_status(status) {
            return false;
        }
        self.end_reason = Some(reason);
        true
    }

    /// Sets the check flags of the most recent move once they are known.
    pub fn flag_last_move(&mut self, gives_check: bool, gives_checkmate: bool) {
        if let Some(last) = self.history.last_mut() {
            last.gives_check = gives_check;
            last.gives_checkmate = gives_checkmate;
        }
    }
}

/// Summary counts over a move history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total: usize,
    pub white_moves: usize,
    pub black_moves: usize,
    pub captures: usize,
    pub checks: usize,
    pub castles: usize,
    pub promotions: usize,
    pub en_passant: usize,
    /// Move covering the most squares (rank plus file distance)
    pub longest: Option<Move>,
    pub most_active: Option<PieceKind>,
}

impl GameState {
    pub fn notation_history(&self) -> Vec<String> {
        self.history.iter().map(Move::algebraic).collect()
    }

    /// "1. e4 e5  2. Nf3 Nc6", with a line break after every third full move.
    pub fn formatted_history(&self) -> String {
        let mut text = String::new();
        for (i, mv) in self.history.iter().enumerate() {
            if i % 2 == 0 {
                text.push_str(&format!("{}. ", i / 2 + 1));
            }
            text.push_str(&mv.algebraic());
            if i + 1 < self.history.len() {
                if i % 2 == 1 {
                    text.push_str(if (i + 1) % 6 == 0 { "\n" } else { "  " });
                } else {
                    text.push(' ');
                }
            }
        }
        text
    }

    pub fn history_stats(&self) -> HistoryStats {
        let moves = &self.history;
        let count = |pred: fn(&Move) -> bool| moves.iter().filter(|mv| pred(mv)).count();

        let distance = |mv: &Move| (mv.to.rank - mv.from.rank).abs() + (mv.to.file - mv.from.file).abs();
        let longest = moves
            .iter()
            .fold(None::<Move>, |best, mv| match best {
                Some(b) if distance(&b) >= distance(mv) => Some(b),
                _ => Some(*mv),
            });

        let mut per_kind: HashMap<PieceKind, usize> = HashMap::new();
        for mv in moves {
            *per_kind.entry(mv.piece).or_insert(0) += 1;
        }
        let most_active = per_kind
            .into_iter()
            .max_by_key(|(kind, n)| (*n, std::cmp::Reverse(*kind as u8)))
            .map(|(kind, _)| kind);

        HistoryStats {
            total: moves.len(),
            white_moves: moves.iter().filter(|mv| mv.color == Color::White).count(),
            black_moves: moves.iter().filter(|mv| mv.color == Color::Black).count(),
            captures: count(Move::is_capture),
            checks: count(|mv| mv.gives_check),
            castles: count(Move::is_castle),
            promotions: count(Move::is_promotion),
            en_passant: count(|mv| mv.is_en_passant),
            longest,
            most_active,
        }
    }
}

/// Plays `mv` on the board and records it in the state: history, clock,
/// turn and position count. Returns false with both untouched if the board
/// rejects the move.
pub fn advance(board: &mut Board, state: &mut GameState, mv: Move) -> bool {
    if !board.execute_move(&mv) {
        return false;
    }
    state.record_move(mv);
    state.switch_turn();
    state.record_position(&board.to_fingerprint());
    true
}
