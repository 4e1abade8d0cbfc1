//! The live game: a board and game state mutated together, plus the
//! operations a UI or protocol driver needs.

use std::sync::mpsc::Receiver;
use std::time::Duration;

use tracing::{debug, info};

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::config::EngineConfig;
use crate::error::ChessResult;
use crate::events::{EventBus, GameEvent};
use crate::movegen::{parse_coordinate, Move};
use crate::rules::{GameStatus, RulesEngine};
use crate::state::{self, EndReason, GameState, HistoryStats, DEFAULT_TIME};
use crate::validator::MoveValidator;

pub struct Game {
    board: Board,
    state: GameState,
    // Starting point that undo replays from.
    start_board: Board,
    start_state: GameState,
    validator: MoveValidator,
    rules: RulesEngine,
    redo_stack: Vec<Move>,
    draw_offer: Option<Color>,
    events: EventBus,
}

impl Default for Game {
    fn default() -> Self {
        Self::new("White", "Black", DEFAULT_TIME)
    }
}

impl Game {
    pub fn new(white: &str, black: &str, time: Duration) -> Self {
        Self::from_position(Board::new(), GameState::new(white, black, time))
    }

    pub fn standard() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.white_name, &config.black_name, config.initial_time())
    }

    /// Resumes from a reconstructed board and state. Undo can go back to this
    /// point but not further.
    pub fn from_position(board: Board, mut state: GameState) -> Self {
        if state.history().is_empty() && state.repetition_count(&board.to_fingerprint()) == 0 {
            state.record_position(&board.to_fingerprint());
        }
        let validator = MoveValidator;
        let mut game = Self {
            start_board: board.clone(),
            start_state: state.clone(),
            board,
            state,
            validator,
            rules: RulesEngine::new(validator),
            redo_stack: Vec::new(),
            draw_offer: None,
            events: EventBus::default(),
        };
        if !game.state.is_terminal() {
            let (status, reason) = game.rules.determine_outcome(&game.board, &game.state);
            game.apply_status(status, reason);
            game.start_state = game.state.clone();
        }
        game
    }

    /// Starts from a placement fingerprint with `active` to move.
    pub fn from_fingerprint(fingerprint: &str, active: Color) -> ChessResult<Self> {
        let board = Board::from_fingerprint(fingerprint)?;
        let mut state = GameState::default();
        state.set_active(active);
        Ok(Self::from_position(board, state))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.board.piece_at(square)
    }

    pub fn current_status(&self) -> GameStatus {
        self.state.status()
    }

    pub fn active_color(&self) -> Color {
        self.state.active_color()
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        self.board.is_in_check(color)
    }

    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    /// Legal moves of the piece on `square`; empty unless it belongs to the
    /// side to move.
    pub fn legal_moves_at(&self, square: Square) -> Vec<Move> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        match self.board.piece_at(square) {
            Some(piece) if piece.color == self.state.active_color() => {
                self.validator
                    .legal_moves_for(piece, &self.board, self.state.last_move())
            }
            _ => Vec::new(),
        }
    }

    /// Legal moves of the side to move; empty once the game is over.
    pub fn all_legal_moves(&self) -> Vec<Move> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        self.validator
            .all_legal_moves(self.state.active_color(), &self.board, self.state.last_move())
    }

    /// Plays the move from `from` to `to` if it is legal for the side to
    /// move. Castling, en passant and promotion are recognised from the
    /// squares; an unspecified promotion becomes a queen.
    pub fn attempt_move(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> bool {
        if self.state.is_terminal() || !to.is_valid() {
            return false;
        }
        let piece = match self.board.piece_at(from) {
            Some(p) if p.color == self.state.active_color() => p,
            _ => return false,
        };

        let captured = self
            .board
            .piece_at(to)
            .filter(|p| p.color != piece.color)
            .map(|p| p.kind);
        let candidate = match piece.kind {
            PieceKind::King if from.rank == to.rank && (to.file - from.file).abs() == 2 => {
                Move::new_castling(piece, to.file > from.file)
            }
            PieceKind::Pawn if from.file != to.file && self.board.is_empty(to) => {
                Move::new_en_passant(piece, to)
            }
            PieceKind::Pawn if to.rank == piece.color.promotion_rank() => {
                Move::new_promotion(piece, to, captured, promotion.unwrap_or(PieceKind::Queen))
            }
            _ => Move::new(piece, to, captured),
        };

        if !self
            .validator
            .is_legal(&candidate, &self.board, self.state.last_move())
        {
            debug!("rejected {}", candidate.long_notation());
            return false;
        }
        self.commit(candidate);
        self.redo_stack.clear();
        true
    }

    /// Coordinate notation such as "e2e4" or "e7e8n".
    pub fn play_notation(&mut self, text: &str) -> bool {
        match parse_coordinate(text) {
            Some((from, to, promotion)) => self.attempt_move(from, to, promotion),
            None => false,
        }
    }

    /// Plays a move produced elsewhere, for example by the AI.
    pub fn play_move(&mut self, mv: &Move) -> bool {
        if self.play_resolved(mv) {
            self.redo_stack.clear();
            return true;
        }
        false
    }

    fn play_resolved(&mut self, mv: &Move) -> bool {
        if self.state.is_terminal() || mv.color != self.state.active_color() {
            return false;
        }
        match self
            .validator
            .resolve(mv, &self.board, self.state.last_move())
        {
            Some(canonical) => {
                self.commit(canonical);
                true
            }
            None => false,
        }
    }

    fn commit(&mut self, mv: Move) {
        if !state::advance(&mut self.board, &mut self.state, mv) {
            return;
        }
        let opponent = self.state.active_color();
        let gives_check = self.board.is_in_check(opponent);
        let gives_checkmate =
            gives_check && self.rules.is_checkmate(opponent, &self.board, self.state.last_move());
        self.state.flag_last_move(gives_check, gives_checkmate);
        self.draw_offer = None;

        let played = self.state.last_move().copied().unwrap_or(mv);
        debug!("{} played {}", played.color, played.algebraic());
        self.events.emit(GameEvent::MovePlayed(played));
        if gives_check {
            self.events.emit(GameEvent::CheckDetected(opponent));
        }

        let (status, reason) = self.rules.determine_outcome(&self.board, &self.state);
        self.apply_status(status, reason);
    }

    fn apply_status(&mut self, status: GameStatus, reason: Option<EndReason>) {
        let changed = match reason {
            Some(reason) if status.is_terminal() => self.state.finish(status, reason),
            _ => self.state.set_status(status),
        };
        if !changed {
            return;
        }
        debug!("status now {:?}", status);
        self.events.emit(GameEvent::StatusChanged(status));
        if status.is_terminal() {
            info!(
                "game over: {:?}, winner {:?}, reason {:?}",
                status,
                self.state.winner(),
                self.state.end_reason()
            );
            self.events.emit(GameEvent::GameOver {
                status,
                winner: self.state.winner(),
                reason: self.state.end_reason(),
            });
        }
    }

    /// Ends the game with `status` for `reason`, as for resignations or
    /// agreed draws.
    pub(crate) fn conclude(&mut self, status: GameStatus, reason: EndReason) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.apply_status(status, Some(reason));
        self.draw_offer = None;
        true
    }

    /// Takes back the last move by replaying the rest of the history from
    /// the starting point. Games decided over the board can be taken back;
    /// resignations, agreed draws and lost clocks cannot.
    pub fn undo_last_move(&mut self) -> bool {
        if matches!(
            self.state.end_reason(),
            Some(EndReason::Resignation | EndReason::Agreement | EndReason::Timeout)
        ) {
            return false;
        }
        let start = self.start_state.history().len();
        let history = self.state.history();
        if history.len() <= start {
            return false;
        }
        let undone = history[history.len() - 1];
        let remaining: Vec<Move> = history[start..history.len() - 1].to_vec();
        let (previous, status) = self.replay(&remaining);
        self.redo_stack.push(undone);
        self.draw_offer = None;
        debug!("undid {}", undone.algebraic());
        self.events.emit(GameEvent::MoveUndone(undone));
        if status != previous {
            self.events.emit(GameEvent::StatusChanged(status));
        }
        true
    }

    pub fn redo_move(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(mv) => {
                if self.play_resolved(&mv) {
                    true
                } else {
                    self.redo_stack.clear();
                    false
                }
            }
            None => false,
        }
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Rebuilds board and state from the starting point. Returns the status
    /// before and after.
    fn replay(&mut self, moves: &[Move]) -> (GameStatus, GameStatus) {
        let clocks = [
            self.state.player(Color::White).remaining_time,
            self.state.player(Color::Black).remaining_time,
        ];
        let previous = self.state.status();

        self.board = self.start_board.clone();
        self.state = self.start_state.clone();
        for mv in moves {
            state::advance(&mut self.board, &mut self.state, *mv);
        }
        self.state.player_mut(Color::White).remaining_time = clocks[0];
        self.state.player_mut(Color::Black).remaining_time = clocks[1];

        let (status, reason) = self.rules.determine_outcome(&self.board, &self.state);
        if status.is_terminal() {
            if let Some(reason) = reason {
                self.state.finish(status, reason);
            }
        } else {
            self.state.set_status(status);
        }
        (previous, self.state.status())
    }

    pub fn resign(&mut self, color: Color) -> bool {
        if self.conclude(GameStatus::resign(color), EndReason::Resignation) {
            info!("{} resigned", color);
            return true;
        }
        false
    }

    pub fn offer_draw(&mut self, color: Color) -> bool {
        if self.state.is_terminal() || self.draw_offer.is_some() {
            return false;
        }
        self.draw_offer = Some(color);
        debug!("{} offers a draw", color);
        true
    }

    /// Only the side that did not make the offer can accept it.
    pub fn accept_draw(&mut self, color: Color) -> bool {
        if self.draw_offer != Some(color.opposite()) {
            return false;
        }
        if self.conclude(GameStatus::Draw, EndReason::Agreement) {
            info!("draw agreed");
            return true;
        }
        false
    }

    pub fn decline_draw(&mut self, color: Color) -> bool {
        if self.draw_offer != Some(color.opposite()) {
            return false;
        }
        self.draw_offer = None;
        true
    }

    pub fn pending_draw_offer(&self) -> Option<Color> {
        self.draw_offer
    }

    /// Debits `elapsed` from the side to move. Returns true if that side ran
    /// out of time, which loses the game.
    pub fn charge_clock(&mut self, elapsed: Duration) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        let color = self.state.active_color();
        let player = self.state.player_mut(color);
        player.remove_time(elapsed);
        if !player.is_out_of_time() {
            return false;
        }
        info!("{} ran out of time", color);
        self.conclude(GameStatus::resign(color), EndReason::Timeout)
    }

    pub(crate) fn set_clock(&mut self, color: Color, remaining: Duration) {
        self.state.player_mut(color).remaining_time = remaining;
    }

    /// Static material of `color` minus that of its opponent.
    pub fn material_balance(&self, color: Color) -> i32 {
        self.board
            .pieces()
            .map(|p| if p.color == color { p.value() } else { -p.value() })
            .sum()
    }

    /// Moves played since the starting point.
    pub fn moves_since_start(&self) -> &[Move] {
        &self.state.history()[self.start_state.history().len()..]
    }

    pub fn start_board(&self) -> &Board {
        &self.start_board
    }

    pub fn start_color(&self) -> Color {
        self.start_state.active_color()
    }

    pub fn history_notation(&self) -> Vec<String> {
        self.state.notation_history()
    }

    pub fn formatted_history(&self) -> String {
        self.state.formatted_history()
    }

    pub fn history_stats(&self) -> HistoryStats {
        self.state.history_stats()
    }
}
