//! The event dispatch engine.
//!
//! Resolution is a worklist algorithm. Seed events go into a queue; for
//! each pending event the engine gathers every interested hook on the
//! board, runs before-hooks in priority order, and either commits the
//! event or lets a hook cancel or replace it. Committed events are applied
//! to the state (copy-on-write) and appended to the canonical log, then
//! after-hooks may append trailing events to the queue.
//!
//! Hooks are gathered from the whole board in a deterministic scan (pieces
//! row by row, chain layers outermost first, then tiles row by row); each
//! hook decides for itself whether an event concerns it. Ordering is by
//! ascending priority, with gathering order as the tiebreak, so
//! simultaneous reactions always resolve in the same sequence.
//!
//! The worklist is capped. The cycle-prevention rule (ignore events you
//! yourself sourced) is a contract on hook authors, not something the
//! engine can prove, so a misbehaving pair of hooks is contained by
//! [`DispatchConfig::max_iterations`] instead of looping forever.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use tracing::{debug, error, trace};

use crate::abilities::AbilityKind;
use crate::board::BoardError;
use crate::coord::Square;
use crate::events::{GameEvent, Intercept};
use crate::game_state::GameState;
use crate::ids::{EventId, PieceId};

/// Dispatch tuning.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Hard cap on processed events per dispatch. Exceeding it aborts the
    /// whole resolution with [`DispatchError::CascadeOverflow`].
    pub max_iterations: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 256,
        }
    }
}

/// Fatal dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The cascade exceeded the configured iteration cap.
    CascadeOverflow { limit: u32 },
    /// Applying a committed event violated a board invariant.
    Invariant(BoardError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::CascadeOverflow { limit } => {
                write!(f, "event cascade exceeded {limit} iterations")
            }
            DispatchError::Invariant(err) => write!(f, "board invariant violated: {err}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Invariant(err) => Some(err),
            DispatchError::CascadeOverflow { .. } => None,
        }
    }
}

impl From<BoardError> for DispatchError {
    fn from(err: BoardError) -> Self {
        DispatchError::Invariant(err)
    }
}

/// One committed event and the snapshot it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedEvent {
    pub event: GameEvent,
    pub state: GameState,
}

/// The result of resolving a seed batch to quiescence.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// The canonical ordered event log, one snapshot per commit.
    pub committed: Vec<CommittedEvent>,
    /// The final state. Equal to the initial state if nothing committed.
    pub state: GameState,
}

/// Where a gathered hook lives.
#[derive(Debug, Clone, Copy)]
enum HookOwner {
    Ability {
        square: Square,
        layer_id: PieceId,
        kind: AbilityKind,
    },
    Tile {
        square: Square,
    },
}

#[derive(Debug, Clone, Copy)]
struct Hook {
    priority: i32,
    owner: HookOwner,
}

/// Gather every registered hook in deterministic scan order.
fn collect_hooks(state: &GameState) -> Vec<Hook> {
    let board = state.board();
    let mut hooks = Vec::new();

    for square in board.occupied_squares() {
        let Some(piece) = board.piece_at(square) else {
            continue;
        };
        for (layer_id, kind) in piece.ability_layers() {
            if kind.intercepts() {
                hooks.push(Hook {
                    priority: kind.priority(),
                    owner: HookOwner::Ability {
                        square,
                        layer_id,
                        kind: *kind,
                    },
                });
            }
        }
    }

    for y in 0..board.height() {
        for x in 0..board.width() {
            let square = Square::new(x, y);
            if let Some(tile) = board.tile_at(square) {
                if tile.kind.intercepts() {
                    hooks.push(Hook {
                        priority: tile.kind.priority(),
                        owner: HookOwner::Tile { square },
                    });
                }
            }
        }
    }

    // Stable sort: gathering order is the tiebreak for equal priorities.
    hooks.sort_by_key(|h| h.priority);
    hooks
}

/// Drop every pending event that causally depends, directly or
/// transitively, on a cancelled event.
fn purge_dependents(worklist: &mut VecDeque<GameEvent>, root: EventId) {
    let mut cancelled: HashSet<EventId> = HashSet::new();
    cancelled.insert(root);
    loop {
        let before = worklist.len();
        worklist.retain(|event| match event.depends_on {
            Some(cause) if cancelled.contains(&cause) => {
                cancelled.insert(event.id);
                false
            }
            _ => true,
        });
        if worklist.len() == before {
            break;
        }
    }
}

/// Resolve seed events to quiescence against `initial`.
///
/// The initial state is not touched; the outcome carries the final state
/// and the canonical log. Callers that commit the outcome to history and
/// callers that merely simulate use the same entry point.
pub fn dispatch_events(
    initial: &GameState,
    seeds: Vec<GameEvent>,
    config: &DispatchConfig,
) -> Result<DispatchOutcome, DispatchError> {
    let mut state = initial.clone();
    let mut committed = Vec::new();
    let mut worklist: VecDeque<GameEvent> = seeds.into();
    let mut iterations: u32 = 0;

    'events: while let Some(event) = worklist.pop_front() {
        iterations += 1;
        if iterations > config.max_iterations {
            error!(
                limit = config.max_iterations,
                pending = worklist.len() + 1,
                "event cascade exceeded iteration cap, aborting dispatch"
            );
            return Err(DispatchError::CascadeOverflow {
                limit: config.max_iterations,
            });
        }

        // Before-hooks, in priority order, against the pre-commit state.
        for hook in collect_hooks(&state) {
            let intercept = match hook.owner {
                HookOwner::Ability {
                    square,
                    layer_id,
                    kind,
                } => {
                    let Some(host) = state.board().piece_at(square) else {
                        continue;
                    };
                    if !host.chain_contains(layer_id) {
                        continue;
                    }
                    kind.before_event(layer_id, host, &event, &state)
                }
                HookOwner::Tile { square } => {
                    let Some(tile) = state.board().tile_at(square) else {
                        continue;
                    };
                    tile.before_event(&event, &state)
                }
            };

            match intercept {
                Intercept::Continue => {}
                Intercept::Cancel => {
                    debug!(event = %event.describe(), "event cancelled");
                    purge_dependents(&mut worklist, event.id);
                    continue 'events;
                }
                Intercept::Replace(replacements) => {
                    debug!(
                        event = %event.describe(),
                        count = replacements.len(),
                        "event replaced"
                    );
                    purge_dependents(&mut worklist, event.id);
                    // Replacements resolve ahead of everything pending,
                    // in the order the hook supplied them. Events without
                    // an explicit cause inherit the original's.
                    for replacement in replacements.into_iter().rev() {
                        let mut replacement = replacement;
                        if replacement.depends_on.is_none() {
                            replacement.depends_on = event.depends_on;
                        }
                        worklist.push_front(replacement);
                    }
                    continue 'events;
                }
            }
        }

        // Commit.
        match state.apply(&event)? {
            None => {
                // The entity the event expected is gone or elsewhere.
                trace!(event = %event.describe(), "event no longer applies, dropped");
                purge_dependents(&mut worklist, event.id);
                continue 'events;
            }
            Some(next) => {
                state = next;
                debug!(event = %event.describe(), "event committed");
                committed.push(CommittedEvent {
                    event: event.clone(),
                    state: state.clone(),
                });
            }
        }

        // After-hooks against the post-commit state may only append.
        let mut appended = Vec::new();
        for hook in collect_hooks(&state) {
            match hook.owner {
                HookOwner::Ability {
                    square,
                    layer_id,
                    kind,
                } => {
                    let Some(host) = state.board().piece_at(square) else {
                        continue;
                    };
                    if !host.chain_contains(layer_id) {
                        continue;
                    }
                    appended.extend(kind.after_event(layer_id, host, &event, &state));
                }
                HookOwner::Tile { square } => {
                    let Some(tile) = state.board().tile_at(square) else {
                        continue;
                    };
                    appended.extend(tile.after_event(&event, &state));
                }
            }
        }
        worklist.extend(appended);
    }

    Ok(DispatchOutcome { committed, state })
}
