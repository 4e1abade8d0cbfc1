//! Chess rules engine with a minimax alpha-beta opponent.
//!
//! The board and game state are plain values mutated together by
//! [`state::advance`]; [`game::Game`] wraps them with the operations a UI or
//! protocol driver needs, and [`ai::AiPlayer`] picks moves for either side.

pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod events;
pub mod game;
pub mod movegen;
pub mod pieces;
pub mod rules;
pub mod search;
pub mod snapshot;
pub mod state;
pub mod uci;
pub mod validator;

pub use ai::AiPlayer;
pub use board::{Board, Color, Piece, PieceKind, Square};
pub use config::EngineConfig;
pub use error::{ChessError, ChessResult};
pub use evaluation::{EvalTables, Evaluator};
pub use events::GameEvent;
pub use game::Game;
pub use movegen::{Move, MoveGenerator};
pub use rules::{GameStatus, RulesEngine};
pub use search::MinimaxEngine;
pub use snapshot::GameSnapshot;
pub use state::{EndReason, GameState};
pub use validator::MoveValidator;
