//! Depth-limited negamax with alpha-beta pruning.
//!
//! The search operates entirely on non-committing simulation
//! ([`crate::turn::simulate_move`]), so tree exploration can never corrupt
//! canonical history. Terminal states are judged by the same [`Ruleset`]
//! the turn manager uses.
//!
//! Root children are searched with a full window so every move gets an
//! exact score; all moves sharing the maximum are collected and the winner
//! is drawn uniformly at random from the searcher's own RNG. The RNG is an
//! explicit seeded instance threaded through the constructor - no
//! process-global random state.
//!
//! Cancellation is cooperative: an optional node budget is checked inside
//! the recursion and the search falls back to static evaluation once it is
//! spent. There is no preemption.

use std::fmt;

use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::color::PlayerColor;
use crate::event_processor::DispatchConfig;
use crate::game_state::GameState;
use crate::movement::Move;
use crate::ruleset::{legal_moves_for_player, Ruleset, Verdict};
use crate::turn::{simulate_move, TurnError};

/// Score for a decided game, decayed by ply so quicker wins rank higher.
const WIN_SCORE: i32 = 1_000_000;

/// Red zone and growth size for the recursion's stack guard.
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW: usize = 1024 * 1024;

/// Search tuning.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum recursion depth in plies.
    pub max_depth: u8,
    /// Cooperative node budget; `None` searches the full tree.
    pub node_budget: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            node_budget: None,
        }
    }
}

/// The outcome of one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// The chosen move; `None` exactly when no legal move exists.
    pub best_move: Option<Move>,
    /// Score of the chosen move from the side to move's perspective.
    pub best_score: i32,
    /// Nodes visited.
    pub nodes: u64,
}

/// Search failures.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A simulated move failed to resolve.
    Simulation(TurnError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Simulation(err) => write!(f, "simulation failed: {err}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Simulation(err) => Some(err),
        }
    }
}

impl From<TurnError> for SearchError {
    fn from(err: TurnError) -> Self {
        SearchError::Simulation(err)
    }
}

/// Signed material sum from the side to move's perspective, including
/// ability value bonuses.
pub fn static_eval(state: &GameState) -> i32 {
    let perspective = state.current_player();
    state
        .board()
        .pieces()
        .map(|piece| {
            if piece.owner() == perspective {
                piece.value()
            } else {
                -piece.value()
            }
        })
        .sum()
}

fn verdict_score(verdict: Verdict, side_to_move: PlayerColor, ply: u32) -> i32 {
    match verdict {
        Verdict::Draw => 0,
        Verdict::Winner(winner) if winner == side_to_move => WIN_SCORE - ply as i32,
        Verdict::Winner(_) => -(WIN_SCORE - ply as i32),
    }
}

/// A reusable searcher with its own RNG.
pub struct Searcher {
    config: SearchConfig,
    rng: StdRng,
}

impl Searcher {
    /// Create a searcher. Equal seeds give equal tie-breaking.
    pub fn new(config: SearchConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a move for the side to move in `state`.
    ///
    /// Returns `best_move: None` exactly when the legal move set is empty.
    /// All moves achieving the maximum score are collected and one is drawn
    /// uniformly at random.
    pub fn choose_move(
        &mut self,
        state: &GameState,
        ruleset: &dyn Ruleset,
        dispatch: &DispatchConfig,
    ) -> Result<SearchResult, SearchError> {
        let moves = legal_moves_for_player(state, ruleset);
        let mut nodes: u64 = 1;

        if moves.is_empty() {
            let score = match ruleset.game_over(state) {
                Some(verdict) => verdict_score(verdict, state.current_player(), 0),
                None => static_eval(state),
            };
            return Ok(SearchResult {
                best_move: None,
                best_score: score,
                nodes,
            });
        }

        let depth = self.config.max_depth;
        let mut best_score = -WIN_SCORE;
        let mut best_moves: Vec<Move> = Vec::new();

        for mv in &moves {
            let outcome = simulate_move(state, ruleset, mv, dispatch)?;
            // Full window per child: ties must be exact scores, not bounds,
            // or the random tie-break would mix in provably worse moves.
            let score = -self.negamax(
                &outcome.state,
                ruleset,
                dispatch,
                depth.saturating_sub(1),
                -WIN_SCORE,
                WIN_SCORE,
                1,
                &mut nodes,
            )?;

            if score > best_score {
                best_score = score;
                best_moves.clear();
                best_moves.push(*mv);
            } else if score == best_score {
                best_moves.push(*mv);
            }
        }

        let best_move = best_moves.choose(&mut self.rng).copied();
        debug!(
            nodes,
            best_score,
            candidates = best_moves.len(),
            "search finished"
        );
        Ok(SearchResult {
            best_move,
            best_score,
            nodes,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn negamax(
        &mut self,
        state: &GameState,
        ruleset: &dyn Ruleset,
        dispatch: &DispatchConfig,
        depth: u8,
        mut alpha: i32,
        beta: i32,
        ply: u32,
        nodes: &mut u64,
    ) -> Result<i32, SearchError> {
        *nodes += 1;
        if let Some(budget) = self.config.node_budget {
            if *nodes >= budget {
                // Budget spent: cooperative cut-off, settle for statics.
                return Ok(static_eval(state));
            }
        }

        if let Some(verdict) = ruleset.game_over(state) {
            return Ok(verdict_score(verdict, state.current_player(), ply));
        }
        if depth == 0 {
            return Ok(static_eval(state));
        }

        let moves = legal_moves_for_player(state, ruleset);
        if moves.is_empty() {
            return Ok(static_eval(state));
        }

        let mut best = -WIN_SCORE;
        for mv in &moves {
            let outcome = simulate_move(state, ruleset, mv, dispatch)?;
            let score = -stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW, || {
                self.negamax(
                    &outcome.state,
                    ruleset,
                    dispatch,
                    depth - 1,
                    -beta,
                    -alpha,
                    ply + 1,
                    nodes,
                )
            })?;

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        Ok(best)
    }
}
