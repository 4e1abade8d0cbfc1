use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use tracing::{debug, warn};

use crate::ai::AiPlayer;
use crate::board::Color;
use crate::config::EngineConfig;
use crate::error::ChessError;
use crate::evaluation::Evaluator;
use crate::game::Game;

/// Line-oriented UCI front end over a `Game` and an `AiPlayer`.
pub struct UciHandler {
    config: EngineConfig,
    game: Game,
    ai: AiPlayer,
    evaluator: Evaluator,
}

impl UciHandler {
    pub fn new(config: EngineConfig) -> Self {
        UciHandler {
            game: Game::from_config(&config),
            ai: AiPlayer::from_config(&config),
            evaluator: Evaluator::default(),
            config,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => write!(stdout, "{}", response)?,
                Err(err) => {
                    warn!("{}: {:#}", command, err);
                    writeln!(stdout, "info string {}", err)?;
                }
            }
            stdout.flush()?;
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }
        debug!("uci < {}", command);

        match parts[0] {
            "uci" => Ok(self.handle_uci()),
            "isready" => Ok("readyok\n".to_string()),
            "ucinewgame" => Ok(self.handle_ucinewgame()),
            "position" => self.handle_position(&parts[1..]),
            "go" => Ok(self.handle_go(&parts[1..])),
            "d" => Ok(self.handle_display()),
            "eval" => Ok(self.handle_eval()),
            "quit" => Ok(String::new()),
            _ => Ok(String::new()),
        }
    }

    fn handle_uci(&self) -> String {
        format!("id name Salmon Rules {}\nuciok\n", env!("CARGO_PKG_VERSION"))
    }

    fn handle_ucinewgame(&mut self) -> String {
        self.game = Game::from_config(&self.config);
        String::new()
    }

    /// `position startpos [moves ...]` or `position fen <placement> [w|b ...] [moves ...]`.
    /// Only the placement and side-to-move fields of a FEN are read.
    fn handle_position(&mut self, parts: &[&str]) -> Result<String> {
        let (mut game, rest) = match parts.first() {
            Some(&"startpos") => (Game::from_config(&self.config), &parts[1..]),
            Some(&"fen") => {
                let end = parts.iter().position(|p| *p == "moves").unwrap_or(parts.len());
                let fields = &parts[1..end];
                let placement = fields
                    .first()
                    .ok_or_else(|| anyhow!("position fen needs a placement"))?;
                let active = match fields.get(1) {
                    Some(&"b") => Color::Black,
                    _ => Color::White,
                };
                (Game::from_fingerprint(placement, active)?, &parts[end..])
            }
            _ => bail!("expected startpos or fen"),
        };

        if rest.first() == Some(&"moves") {
            for text in &rest[1..] {
                if !game.play_notation(text) {
                    return Err(ChessError::InvalidMoveNotation(text.to_string()).into());
                }
            }
        }
        self.game = game;
        Ok(String::new())
    }

    fn handle_go(&mut self, parts: &[&str]) -> String {
        let mut depth = self.config.search_depth;
        let mut timeout = self.config.move_timeout();
        let active = self.game.active_color();

        let mut tokens = parts.iter();
        while let Some(token) = tokens.next() {
            let value = tokens.clone().next().and_then(|s| s.parse::<u64>().ok());
            match (*token, value) {
                ("depth", Some(n)) => depth = n as u32,
                ("movetime", Some(ms)) => timeout = Duration::from_millis(ms),
                // A twentieth of the remaining clock.
                ("wtime", Some(ms)) if active == Color::White => timeout = Duration::from_millis(ms / 20),
                ("btime", Some(ms)) if active == Color::Black => timeout = Duration::from_millis(ms / 20),
                _ => continue,
            }
            tokens.next();
        }

        self.ai.set_depth(depth);
        self.ai.set_timeout(timeout);
        match self.ai.choose_move(self.game.board(), self.game.state()) {
            Some(best) => format!("bestmove {}\n", best.coordinate()),
            None => "bestmove (none)\n".to_string(),
        }
    }

    fn handle_display(&self) -> String {
        format!(
            "{}\nFingerprint: {}\nSide to move: {}\nStatus: {:?}\n",
            self.game.board(),
            self.game.board().to_fingerprint(),
            self.game.active_color(),
            self.game.current_status()
        )
    }

    fn handle_eval(&self) -> String {
        let color = self.game.active_color();
        let score = self.evaluator.evaluate(self.game.board(), color);
        format!("info string eval {} for {}\n", score, color)
    }
}
