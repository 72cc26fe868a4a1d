pub mod atw;
pub mod classic;
pub mod config;
pub mod error;
pub mod history;
pub mod killer;
pub mod manager;
pub mod records;
pub mod rules;
pub mod session;
pub mod state;

use std::{collections::HashMap, time::Duration};

use database::{retry_with_backoff, GameStore};
use types::{Player, Thrower};
use uuid::Uuid;

pub use crate::config::{MatchConfig, PlayerConfig, ThrowerKind};
pub use crate::error::{EngineError, Result};
pub use crate::history::{replay, TurnHistory};
pub use crate::killer::KillerPhase;
pub use crate::manager::GameManager;
pub use crate::rules::{engine_for, Preview, Resolution, VariantEngine};
pub use crate::session::{GameSession, RevertOutcome};
pub use crate::state::GameState;

/// Times a thrower may hand back an illegal visit before it is scored as
/// three misses.
pub const MAX_THROW_ATTEMPTS: usize = 3;
pub const MAX_SUBMIT_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Checkout suggestions in wire notation, e.g. `[["T20", "T20", "Bull"]]`
/// for 170. Empty when `remaining` cannot be finished in one visit.
pub fn suggest_checkout(remaining: u32) -> Vec<Vec<String>> {
    checkout::suggest_notation(remaining)
}

fn is_thrower_mistake(error: &EngineError) -> bool {
    matches!(
        error,
        EngineError::InvalidDart(_)
            | EngineError::TooManyDarts { .. }
            | EngineError::NumberAlreadyClaimed { .. }
    )
}

/// Plays `game_id` through the manager until it is won, paused, or
/// `max_rounds` rounds have been thrown. Returns the winner, if any.
pub async fn run_game<S: GameStore>(
    manager: &GameManager<S>,
    game_id: Uuid,
    throwers: &mut HashMap<Uuid, Box<dyn Thrower>>,
    delay_ms: Option<u64>,
    max_rounds: u32,
) -> Result<Option<Player>> {
    while let Some(context) = manager.turn_context(game_id).await? {
        if context.turn_number > max_rounds {
            log::warn!("Stopping game {game_id} after {max_rounds} rounds without a winner");
            break;
        }
        log::debug!("{}", manager.state(game_id).await?);
        if let Some(ms) = delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        let player_id = context.player.id;
        let turn_number = context.turn_number;
        let thrower = throwers
            .get_mut(&player_id)
            .ok_or(EngineError::UnknownPlayer(player_id))?;

        let mut attempts = 0;
        loop {
            let darts = if attempts < MAX_THROW_ATTEMPTS {
                thrower.throw_turn(&context)
            } else {
                log::warn!("{} could not throw a legal visit, scoring it as misses", context.player);
                Vec::new()
            };
            let submitted = retry_with_backoff(
                move || {
                    let darts = darts.clone();
                    Box::pin(manager.submit_turn(game_id, player_id, turn_number, darts))
                },
                MAX_SUBMIT_RETRIES,
                RETRY_DELAY,
            )
            .await;
            match submitted {
                Ok(_) => break,
                Err(e) if is_thrower_mistake(&e) && attempts < MAX_THROW_ATTEMPTS => {
                    log::warn!("Rejected visit from {}: {e}", context.player);
                    attempts += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
    manager.check_winner(game_id).await
}
