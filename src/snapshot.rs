//! Serializable record of a game, enough to rebuild it move by move.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::{Board, Color};
use crate::error::{ChessError, ChessResult};
use crate::game::Game;
use crate::movegen::Move;
use crate::rules::GameStatus;
use crate::state::{EndReason, GameState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub remaining_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub start_fingerprint: String,
    pub start_active: Color,
    /// Every move since the start, with detection flags
    pub moves: Vec<Move>,
    pub white: PlayerRecord,
    pub black: PlayerRecord,
    pub status: GameStatus,
    pub winner: Option<Color>,
    pub end_reason: Option<EndReason>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> ChessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> ChessResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn player(&self, color: Color) -> &PlayerRecord {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

fn record(game: &Game, color: Color) -> PlayerRecord {
    let player = game.state().player(color);
    PlayerRecord {
        name: player.name.clone(),
        remaining_time_ms: player.remaining_time.as_millis() as u64,
    }
}

impl Game {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            start_fingerprint: self.start_board().to_fingerprint(),
            start_active: self.start_color(),
            moves: self.moves_since_start().to_vec(),
            white: record(self, Color::White),
            black: record(self, Color::Black),
            status: self.current_status(),
            winner: self.state().winner(),
            end_reason: self.state().end_reason(),
        }
    }

    /// Rebuilds a game by replaying the recorded moves from the recorded
    /// start. Fails on the first move that is not legal at its turn.
    pub fn restore(snapshot: &GameSnapshot) -> ChessResult<Game> {
        let board = Board::from_fingerprint(&snapshot.start_fingerprint)?;
        let mut state = GameState::new(
            snapshot.white.name.as_str(),
            snapshot.black.name.as_str(),
            Duration::ZERO,
        );
        state.set_active(snapshot.start_active);

        let mut game = Game::from_position(board, state);
        for mv in &snapshot.moves {
            if !game.play_move(mv) {
                return Err(ChessError::IllegalMove(mv.coordinate()));
            }
        }
        for color in [Color::White, Color::Black] {
            let millis = snapshot.player(color).remaining_time_ms;
            game.set_clock(color, Duration::from_millis(millis));
        }

        // Outcomes that do not follow from the position itself.
        if let Some(reason @ (EndReason::Resignation | EndReason::Agreement | EndReason::Timeout)) =
            snapshot.end_reason
        {
            game.conclude(snapshot.status, reason);
        }

        info!(
            "restored game after {} moves, status {:?}",
            snapshot.moves.len(),
            game.current_status()
        );
        Ok(game)
    }
}
