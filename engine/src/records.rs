//! Conversions between engine types and the rows a [`GameStore`] keeps.
//!
//! [`GameStore`]: database::GameStore

use chrono::Utc;
use database::{DatabaseError, GameRecord, PlayerRecord, ProgressRecord, TurnRecord};
use types::{Game, GameStatus, Player, PlayerKind, Progress, Turn};
use uuid::Uuid;

use crate::{EngineError, GameState, Result};

pub fn game_record(game: &Game) -> GameRecord {
    GameRecord {
        id: game.id,
        variant: game.variant.to_string(),
        status: game.status.to_string(),
        winner_id: game.winner,
        created_at: game.created_at,
        updated_at: game.updated_at,
    }
}

pub fn game_from_record(record: GameRecord) -> Result<Game> {
    let status: GameStatus = record
        .status
        .parse()
        .map_err(EngineError::CorruptHistory)?;
    Ok(Game {
        id: record.id,
        variant: record.variant.parse()?,
        status,
        winner: record.winner_id,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

pub fn player_record(game_id: Uuid, player: &Player) -> PlayerRecord {
    PlayerRecord {
        id: player.id,
        game_id,
        name: player.name.clone(),
        kind: player.kind.to_string(),
        turn_order: player.turn_order,
    }
}

pub fn player_from_record(record: PlayerRecord) -> Result<Player> {
    let kind: PlayerKind = record
        .kind
        .parse()
        .map_err(EngineError::CorruptHistory)?;
    Ok(Player::new_with_id(
        record.id,
        &record.name,
        kind,
        record.turn_order,
    ))
}

pub fn turn_record(turn: &Turn, turn_id: usize) -> Result<TurnRecord> {
    let json = |value: serde_json::Result<serde_json::Value>| value.map_err(DatabaseError::from);
    Ok(TurnRecord {
        game_id: turn.game_id,
        player_id: turn.player_id,
        sequence: turn_id as u32,
        turn_number: turn.turn_number,
        darts: json(serde_json::to_value(&turn.darts))?,
        scores: json(serde_json::to_value(&turn.scores))?,
        outcome: json(serde_json::to_value(&turn.outcome))?,
        bust: turn.bust,
        checkout: turn.checkout,
        edited: turn.edited,
        created_at: turn.created_at,
    })
}

pub fn turn_from_record(record: TurnRecord) -> Result<Turn> {
    Ok(Turn {
        game_id: record.game_id,
        player_id: record.player_id,
        turn_number: record.turn_number,
        darts: serde_json::from_value(record.darts).map_err(DatabaseError::from)?,
        scores: serde_json::from_value(record.scores).map_err(DatabaseError::from)?,
        outcome: serde_json::from_value(record.outcome).map_err(DatabaseError::from)?,
        bust: record.bust,
        checkout: record.checkout,
        edited: record.edited,
        created_at: record.created_at,
    })
}

/// Snapshot rows for every player in `state`.
pub fn progress_records(game_id: Uuid, state: &GameState) -> Result<Vec<ProgressRecord>> {
    let updated_at = Utc::now();
    state
        .players
        .iter()
        .zip(&state.progress)
        .map(|(player, progress)| {
            Ok(ProgressRecord {
                game_id,
                player_id: player.id,
                state: serde_json::to_value(progress).map_err(DatabaseError::from)?,
                updated_at,
            })
        })
        .collect()
}

pub fn progress_from_record(record: ProgressRecord) -> Result<(Uuid, Progress)> {
    let progress = serde_json::from_value(record.state).map_err(DatabaseError::from)?;
    Ok((record.player_id, progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Dart, KillerHit, TurnOutcome, Variant};

    #[test]
    fn test_turn_darts_are_stored_as_notation() {
        let turn = Turn {
            game_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            turn_number: 4,
            darts: vec![Dart::Triple(19), Dart::OuterBull, Dart::Bull],
            scores: vec![57, 25, 50],
            outcome: TurnOutcome::Killer {
                lives_before: 3,
                lives_after: 3,
                claimed: None,
                became_killer: false,
                hits: vec![KillerHit {
                    target_id: Uuid::new_v4(),
                    number: 19,
                    lives_lost: 3,
                    eliminated: true,
                }],
            },
            bust: false,
            checkout: true,
            edited: true,
            created_at: Utc::now(),
        };
        let record = turn_record(&turn, 9).unwrap();
        assert_eq!(record.sequence, 9);
        assert_eq!(record.darts, serde_json::json!(["T19", "25", "Bull"]));
        assert_eq!(record.outcome["variant"], "killer");
        assert_eq!(turn_from_record(record).unwrap(), turn);
    }

    #[test]
    fn test_game_record_uses_tags() {
        let game = Game::new(Variant::Classic {
            starting_score: 701,
        });
        let record = game_record(&game);
        assert_eq!(record.variant, "classic-701");
        assert_eq!(record.status, "active");
        assert_eq!(game_from_record(record).unwrap(), game);
    }

    #[test]
    fn test_bad_rows_are_rejected() {
        let mut record = game_record(&Game::new(Variant::Classic {
            starting_score: 501,
        }));
        record.status = "abandoned".to_string();
        assert!(matches!(
            game_from_record(record),
            Err(EngineError::CorruptHistory(_))
        ));

        let player = PlayerRecord {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            name: "Alice".to_string(),
            kind: "admin".to_string(),
            turn_order: 1,
        };
        assert!(player_from_record(player).is_err());
    }
}
