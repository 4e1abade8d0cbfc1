use salmon_rules::search::{INFINITY, MATE_SCORE};
use salmon_rules::state::{self, GameState};
use salmon_rules::{Board, Color, Evaluator, Game, MinimaxEngine, MoveValidator, RulesEngine};

/// Plain minimax without pruning or ordering, scored like the engine.
struct Exhaustive {
    evaluator: Evaluator,
    rules: RulesEngine,
    nodes: u64,
}

impl Exhaustive {
    fn new() -> Self {
        Self {
            evaluator: Evaluator::default(),
            rules: RulesEngine::default(),
            nodes: 0,
        }
    }

    fn minimax(&mut self, board: &Board, state: &GameState, depth: u32, maximizing: bool, color: Color) -> i32 {
        self.nodes += 1;
        let moves = MoveValidator.all_legal_moves(color, board, state.last_move());
        if moves.is_empty() {
            if !board.is_in_check(color) {
                return 0;
            }
            let mate = MATE_SCORE + depth as i32;
            return if maximizing { -mate } else { mate };
        }
        if self.rules.is_insufficient_material(board)
            || self.rules.is_fifty_move_draw(state)
            || self.rules.is_threefold_repetition(state, &board.to_fingerprint())
        {
            return 0;
        }
        if depth == 0 {
            let perspective = if maximizing { color } else { color.opposite() };
            return self.evaluator.evaluate(board, perspective);
        }

        let scores: Vec<i32> = moves
            .into_iter()
            .map(|mv| {
                let mut board = board.clone();
                let mut state = state.clone();
                assert!(state::advance(&mut board, &mut state, mv));
                self.minimax(&board, &state, depth - 1, !maximizing, color.opposite())
            })
            .collect();
        if maximizing {
            scores.into_iter().max().unwrap_or(-INFINITY)
        } else {
            scores.into_iter().min().unwrap_or(INFINITY)
        }
    }
}

fn position(moves: &[&str]) -> Game {
    let mut game = Game::standard();
    for text in moves {
        assert!(game.play_notation(text), "{}", text);
    }
    game
}

fn black_to_move() -> GameState {
    let mut state = GameState::default();
    state.switch_turn();
    state
}

#[test]
fn alpha_beta_matches_exhaustive_minimax() {
    let games = [
        position(&[]),
        position(&["e2e4", "d7d5"]),
        position(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]),
    ];
    for game in &games {
        let color = game.active_color();
        let mut engine = MinimaxEngine::default();
        let pruned = engine.minimax(game.board(), game.state(), 2, -INFINITY, INFINITY, true, color);
        let mut exhaustive = Exhaustive::new();
        let full = exhaustive.minimax(game.board(), game.state(), 2, true, color);
        assert_eq!(pruned, full);
        assert!(engine.nodes_searched() <= exhaustive.nodes);
    }
}

#[test]
fn alpha_beta_matches_exhaustive_minimax_in_endgames() {
    let cases = [
        ("8/8/8/4k3/8/8/3PK3/8", GameState::default()),
        ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8", GameState::default()),
        ("6k1/5ppp/8/8/8/8/5PPP/R5K1", black_to_move()),
    ];
    for (fingerprint, state) in cases {
        let board = Board::from_fingerprint(fingerprint).unwrap();
        let color = state.active_color();
        for maximizing in [true, false] {
            let mut engine = MinimaxEngine::default();
            let pruned = engine.minimax(&board, &state, 3, -INFINITY, INFINITY, maximizing, color);
            let full = Exhaustive::new().minimax(&board, &state, 3, maximizing, color);
            assert_eq!(pruned, full, "{} maximizing={}", fingerprint, maximizing);
        }
    }
}

#[test]
fn best_move_has_the_best_exhaustive_score() {
    let game = position(&["e2e4", "d7d5"]);
    let color = game.active_color();
    let best = MinimaxEngine::default()
        .best_move(game.board(), game.state(), color, 2)
        .unwrap();

    let mut exhaustive = Exhaustive::new();
    let mut top = -INFINITY;
    let mut chosen = None;
    for mv in MoveValidator.all_legal_moves(color, game.board(), game.state().last_move()) {
        let mut board = game.board().clone();
        let mut state = game.state().clone();
        assert!(state::advance(&mut board, &mut state, mv));
        let score = exhaustive.minimax(&board, &state, 1, false, color.opposite());
        top = top.max(score);
        if mv == best {
            chosen = Some(score);
        }
    }
    assert_eq!(chosen, Some(top));
}

#[test]
fn mate_in_one_for_either_side() {
    let mut engine = MinimaxEngine::default();

    let board = Board::from_fingerprint("6k1/5ppp/8/8/8/8/8/R5K1").unwrap();
    let mv = engine.best_move(&board, &GameState::default(), Color::White, 2).unwrap();
    assert_eq!(mv.coordinate(), "a1a8");

    let board = Board::from_fingerprint("r5k1/8/8/8/8/8/5PPP/6K1").unwrap();
    let mv = engine.best_move(&board, &black_to_move(), Color::Black, 2).unwrap();
    assert_eq!(mv.coordinate(), "a8a1");
}

#[test]
fn finds_scholars_mate() {
    let mut game = position(&["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6"]);
    let mv = MinimaxEngine::default()
        .best_move(game.board(), game.state(), Color::White, 2)
        .unwrap();
    assert_eq!(mv.coordinate(), "h5f7");
    assert!(game.play_move(&mv));
    assert!(game.is_over());
}

#[test]
fn takes_a_hanging_queen() {
    let board = Board::from_fingerprint("4k3/8/8/3q4/4P3/8/8/4K3").unwrap();
    let mv = MinimaxEngine::default()
        .best_move(&board, &GameState::default(), Color::White, 2)
        .unwrap();
    assert_eq!(mv.coordinate(), "e4d5");
}
