use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::GameStore;
use crate::{DatabaseError, GameRecord, PlayerRecord, ProgressRecord, TurnRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    id TEXT PRIMARY KEY,
    variant TEXT NOT NULL,
    status TEXT NOT NULL,
    winner_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS players (
    id TEXT NOT NULL,
    game_id TEXT NOT NULL REFERENCES games (id),
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    turn_order INTEGER NOT NULL,
    PRIMARY KEY (game_id, id)
);

CREATE TABLE IF NOT EXISTS turns (
    game_id TEXT NOT NULL REFERENCES games (id),
    player_id TEXT NOT NULL,
    sequence INTEGER NOT NULL,
    turn_number INTEGER NOT NULL,
    darts TEXT NOT NULL,
    scores TEXT NOT NULL,
    outcome TEXT NOT NULL,
    bust INTEGER NOT NULL,
    checkout INTEGER NOT NULL,
    edited INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (game_id, sequence),
    UNIQUE (game_id, player_id, turn_number)
);

CREATE TABLE IF NOT EXISTS progress (
    game_id TEXT NOT NULL REFERENCES games (id),
    player_id TEXT NOT NULL,
    state TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (game_id, player_id)
);
"#;

fn query_error(e: sqlx::Error) -> DatabaseError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DatabaseError::Connection(e.to_string())
        }
        e => DatabaseError::Query(e.to_string()),
    }
}

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid, DatabaseError> {
    let raw: String = row.get(column);
    Ok(Uuid::parse_str(&raw)?)
}

fn parse_json(row: &SqliteRow, column: &str) -> Result<serde_json::Value, DatabaseError> {
    let raw: String = row.get(column);
    Ok(serde_json::from_str(&raw)?)
}

/// Writes every change straight through to SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        tracing::info!("Schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn require_game(&self, game_id: Uuid) -> Result<(), DatabaseError> {
        self.load_game(game_id).await.map(|_| ())
    }
}

#[async_trait]
impl GameStore for SqliteStore {
    async fn create_game(
        &self,
        game: &GameRecord,
        players: &[PlayerRecord],
    ) -> Result<(), DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;

        sqlx::query(
            "INSERT INTO games (id, variant, status, winner_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(game.id.to_string())
        .bind(&game.variant)
        .bind(&game.status)
        .bind(game.winner_id.map(|id| id.to_string()))
        .bind(game.created_at)
        .bind(game.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        for player in players {
            sqlx::query(
                "INSERT INTO players (id, game_id, name, kind, turn_order) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(player.id.to_string())
            .bind(player.game_id.to_string())
            .bind(&player.name)
            .bind(&player.kind)
            .bind(player.turn_order as i64)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
        tracing::info!("Created game {} with {} players", game.id, players.len());
        Ok(())
    }

    async fn load_game(&self, game_id: Uuid) -> Result<GameRecord, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, variant, status, winner_id, created_at, updated_at FROM games WHERE id = ?",
        )
        .bind(game_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or(DatabaseError::GameNotFound(game_id))?;

        let winner_id: Option<String> = row.get("winner_id");
        Ok(GameRecord {
            id: parse_uuid(&row, "id")?,
            variant: row.get("variant"),
            status: row.get("status"),
            winner_id: winner_id.as_deref().map(Uuid::parse_str).transpose()?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn update_game(&self, game: &GameRecord) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE games SET variant = ?, status = ?, winner_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&game.variant)
        .bind(&game.status)
        .bind(game.winner_id.map(|id| id.to_string()))
        .bind(game.updated_at)
        .bind(game.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::GameNotFound(game.id));
        }
        Ok(())
    }

    async fn load_players(&self, game_id: Uuid) -> Result<Vec<PlayerRecord>, DatabaseError> {
        self.require_game(game_id).await?;
        let rows = sqlx::query(
            "SELECT id, game_id, name, kind, turn_order FROM players WHERE game_id = ? ORDER BY turn_order",
        )
        .bind(game_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let turn_order: i64 = row.get("turn_order");
                Ok(PlayerRecord {
                    id: parse_uuid(row, "id")?,
                    game_id: parse_uuid(row, "game_id")?,
                    name: row.get("name"),
                    kind: row.get("kind"),
                    turn_order: turn_order as u32,
                })
            })
            .collect()
    }

    async fn load_turns(&self, game_id: Uuid) -> Result<Vec<TurnRecord>, DatabaseError> {
        self.require_game(game_id).await?;
        let rows = sqlx::query(
            "SELECT game_id, player_id, sequence, turn_number, darts, scores, outcome, bust, checkout, edited, created_at \
             FROM turns WHERE game_id = ? ORDER BY sequence",
        )
        .bind(game_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let sequence: i64 = row.get("sequence");
                let turn_number: i64 = row.get("turn_number");
                Ok(TurnRecord {
                    game_id: parse_uuid(row, "game_id")?,
                    player_id: parse_uuid(row, "player_id")?,
                    sequence: sequence as u32,
                    turn_number: turn_number as u32,
                    darts: parse_json(row, "darts")?,
                    scores: parse_json(row, "scores")?,
                    outcome: parse_json(row, "outcome")?,
                    bust: row.get("bust"),
                    checkout: row.get("checkout"),
                    edited: row.get("edited"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    async fn save_turn(&self, turn: &TurnRecord) -> Result<(), DatabaseError> {
        self.require_game(turn.game_id).await?;
        let duplicate = || DatabaseError::DuplicateTurn {
            player_id: turn.player_id,
            turn_number: turn.turn_number,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;

        let existing = sqlx::query(
            "SELECT sequence FROM turns WHERE game_id = ? AND player_id = ? AND turn_number = ?",
        )
        .bind(turn.game_id.to_string())
        .bind(turn.player_id.to_string())
        .bind(turn.turn_number as i64)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_error)?;
        if existing.is_some() {
            return Err(duplicate());
        }

        sqlx::query(
            "INSERT INTO turns (game_id, player_id, sequence, turn_number, darts, scores, outcome, bust, checkout, edited, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(turn.game_id.to_string())
        .bind(turn.player_id.to_string())
        .bind(turn.sequence as i64)
        .bind(turn.turn_number as i64)
        .bind(serde_json::to_string(&turn.darts)?)
        .bind(serde_json::to_string(&turn.scores)?)
        .bind(serde_json::to_string(&turn.outcome)?)
        .bind(turn.bust)
        .bind(turn.checkout)
        .bind(turn.edited)
        .bind(turn.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                duplicate()
            } else {
                query_error(e)
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
        Ok(())
    }

    async fn truncate_turns(&self, game_id: Uuid, keep: u32) -> Result<u64, DatabaseError> {
        self.require_game(game_id).await?;
        let result = sqlx::query("DELETE FROM turns WHERE game_id = ? AND sequence > ?")
            .bind(game_id.to_string())
            .bind(keep as i64)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        tracing::info!(
            "Truncated game {} to {} turns ({} removed)",
            game_id,
            keep,
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }

    async fn save_progress(&self, progress: &[ProgressRecord]) -> Result<(), DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;

        for record in progress {
            sqlx::query(
                "INSERT INTO progress (game_id, player_id, state, updated_at) VALUES (?, ?, ?, ?) \
                 ON CONFLICT (game_id, player_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            )
            .bind(record.game_id.to_string())
            .bind(record.player_id.to_string())
            .bind(serde_json::to_string(&record.state)?)
            .bind(record.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
        Ok(())
    }

    async fn load_progress(&self, game_id: Uuid) -> Result<Vec<ProgressRecord>, DatabaseError> {
        self.require_game(game_id).await?;
        let rows = sqlx::query(
            "SELECT game_id, player_id, state, updated_at FROM progress WHERE game_id = ?",
        )
        .bind(game_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(ProgressRecord {
                    game_id: parse_uuid(row, "game_id")?,
                    player_id: parse_uuid(row, "player_id")?,
                    state: parse_json(row, "state")?,
                    updated_at: row.get("updated_at"),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, MEMORY_URL};
    use chrono::Utc;

    async fn memory_store() -> SqliteStore {
        let config = DatabaseConfig {
            url: MEMORY_URL.to_string(),
            pool_size: 1,
        };
        let store = SqliteStore::new(config.create_pool().await.unwrap());
        store.run_migrations().await.unwrap();
        store
    }

    fn game() -> GameRecord {
        GameRecord {
            id: Uuid::new_v4(),
            variant: "killer".to_string(),
            status: "active".to_string(),
            winner_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn turn(game_id: Uuid, player_id: Uuid, sequence: u32, turn_number: u32) -> TurnRecord {
        TurnRecord {
            game_id,
            player_id,
            sequence,
            turn_number,
            darts: serde_json::json!(["D20", "S20"]),
            scores: serde_json::json!([40, 20]),
            outcome: serde_json::json!({ "variant": "killer" }),
            bust: false,
            checkout: false,
            edited: sequence == 2,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_game_and_roster_round_trip() {
        let store = memory_store().await;
        let mut game = game();
        let players: Vec<PlayerRecord> = ["Bob", "Alice"]
            .iter()
            .enumerate()
            .map(|(idx, name)| PlayerRecord {
                id: Uuid::new_v4(),
                game_id: game.id,
                name: name.to_string(),
                kind: "secondary".to_string(),
                turn_order: 2 - idx as u32,
            })
            .collect();
        store.create_game(&game, &players).await.unwrap();

        let loaded = store.load_players(game.id).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Alice");
        assert_eq!(loaded[1].turn_order, 2);

        game.status = "completed".to_string();
        game.winner_id = Some(players[0].id);
        store.update_game(&game).await.unwrap();
        let stored = store.load_game(game.id).await.unwrap();
        assert_eq!(stored.status, "completed");
        assert_eq!(stored.winner_id, Some(players[0].id));
    }

    #[tokio::test]
    async fn test_turn_log_round_trip_and_truncate() {
        let store = memory_store().await;
        let game = game();
        store.create_game(&game, &[]).await.unwrap();
        let player_id = Uuid::new_v4();

        for sequence in 1..=3 {
            store
                .save_turn(&turn(game.id, player_id, sequence, sequence))
                .await
                .unwrap();
        }
        let turns = store.load_turns(game.id).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].darts, serde_json::json!(["D20", "S20"]));
        assert!(turns[1].edited);

        assert_eq!(store.truncate_turns(game.id, 1).await.unwrap(), 2);
        assert_eq!(store.load_turns(game.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_turn_is_reported() {
        let store = memory_store().await;
        let game = game();
        store.create_game(&game, &[]).await.unwrap();
        let player_id = Uuid::new_v4();

        store
            .save_turn(&turn(game.id, player_id, 1, 1))
            .await
            .unwrap();
        let err = store
            .save_turn(&turn(game.id, player_id, 2, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateTurn { .. }));
    }

    #[tokio::test]
    async fn test_progress_upserts() {
        let store = memory_store().await;
        let game = game();
        store.create_game(&game, &[]).await.unwrap();
        let player_id = Uuid::new_v4();
        let record = |lives: u8| ProgressRecord {
            game_id: game.id,
            player_id,
            state: serde_json::json!({ "variant": "killer", "lives": lives }),
            updated_at: Utc::now(),
        };

        store.save_progress(&[record(1)]).await.unwrap();
        store.save_progress(&[record(3)]).await.unwrap();
        let stored = store.load_progress(game.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].state["lives"], 3);
    }

    #[tokio::test]
    async fn test_missing_game() {
        let store = memory_store().await;
        assert!(matches!(
            store.load_game(Uuid::new_v4()).await,
            Err(DatabaseError::GameNotFound(_))
        ));
    }
}
