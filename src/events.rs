use std::sync::mpsc::{self, Receiver, Sender};

use crate::board::Color;
use crate::movegen::Move;
use crate::rules::GameStatus;
use crate::state::EndReason;

/// Notifications about a game. For a single move they arrive in the order
/// `MovePlayed`, `CheckDetected`, `StatusChanged`, `GameOver`.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    MovePlayed(Move),
    MoveUndone(Move),
    CheckDetected(Color),
    StatusChanged(GameStatus),
    GameOver {
        status: GameStatus,
        winner: Option<Color>,
        reason: Option<EndReason>,
    },
}

/// Fan-out of game events to channel subscribers. Sending never blocks and
/// never calls back into the game.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<GameEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Delivers `event` to every subscriber, dropping those whose receiver
    /// has gone away.
    pub fn emit(&mut self, event: GameEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
