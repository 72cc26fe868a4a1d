//! Both stores must agree on the contract the engine relies on: ordered
//! rosters and logs, duplicate detection and prefix truncation.

use chrono::Utc;
use database::{
    config::MEMORY_URL, DatabaseConfig, DatabaseError, GameRecord, GameStore, InMemoryStore,
    PlayerRecord, SqliteStore, TurnRecord,
};
use uuid::Uuid;

async fn sqlite_store() -> SqliteStore {
    let config = DatabaseConfig {
        url: MEMORY_URL.to_string(),
        pool_size: 1,
    };
    let pool = config.create_pool().await.expect("Failed to connect");
    let store = SqliteStore::new(pool);
    store.run_migrations().await.expect("Failed to migrate");
    store
}

fn roster(game_id: Uuid, names: &[&str]) -> Vec<PlayerRecord> {
    names
        .iter()
        .enumerate()
        .map(|(idx, name)| PlayerRecord {
            id: Uuid::new_v4(),
            game_id,
            name: name.to_string(),
            kind: if idx == 0 { "primary" } else { "secondary" }.to_string(),
            turn_order: idx as u32 + 1,
        })
        .collect()
}

fn turn(player: &PlayerRecord, sequence: u32, turn_number: u32) -> TurnRecord {
    TurnRecord {
        game_id: player.game_id,
        player_id: player.id,
        sequence,
        turn_number,
        darts: serde_json::json!(["T20", "T20", "T20"]),
        scores: serde_json::json!([60, 60, 60]),
        outcome: serde_json::json!({
            "variant": "classic",
            "remaining_before": 501,
            "remaining_after": 321
        }),
        bust: false,
        checkout: false,
        edited: false,
        created_at: Utc::now(),
    }
}

async fn exercise_store<S: GameStore>(store: S) {
    let game = GameRecord {
        id: Uuid::new_v4(),
        variant: "classic-501".to_string(),
        status: "active".to_string(),
        winner_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let players = roster(game.id, &["Alice", "Bob"]);
    store
        .create_game(&game, &players)
        .await
        .expect("Failed to create game");

    let loaded = store.load_players(game.id).await.unwrap();
    assert_eq!(
        loaded.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["Alice", "Bob"]
    );

    // Alice 1, Bob 1, Alice 2, Bob 2
    let mut sequence = 0;
    for round in 1..=2 {
        for player in &players {
            sequence += 1;
            store.save_turn(&turn(player, sequence, round)).await.unwrap();
        }
    }

    let err = store
        .save_turn(&turn(&players[0], 5, 2))
        .await
        .expect_err("duplicate turn accepted");
    assert!(matches!(
        err,
        DatabaseError::DuplicateTurn { player_id, turn_number: 2 } if player_id == players[0].id
    ));

    assert_eq!(store.truncate_turns(game.id, 2).await.unwrap(), 2);
    let turns = store.load_turns(game.id).await.unwrap();
    assert_eq!(
        turns
            .iter()
            .map(|t| (t.sequence, t.turn_number))
            .collect::<Vec<_>>(),
        vec![(1, 1), (2, 1)]
    );

    // the discarded turn can be written again after truncation
    let mut replacement = turn(&players[0], 3, 2);
    replacement.edited = true;
    store.save_turn(&replacement).await.unwrap();
    let turns = store.load_turns(game.id).await.unwrap();
    assert_eq!(turns.len(), 3);
    assert!(turns[2].edited);
}

#[tokio::test]
async fn test_in_memory_store_contract() {
    exercise_store(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_sqlite_store_contract() {
    exercise_store(sqlite_store().await).await;
}

#[tokio::test]
async fn test_shared_store_through_arc() {
    let store = std::sync::Arc::new(InMemoryStore::new());
    exercise_store(store.clone()).await;
}
