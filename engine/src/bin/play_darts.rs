use std::path::PathBuf;

use clap::Parser;
use database::{DatabaseConfig, GameStore, InMemoryStore, SqliteStore};
use engine::{run_game, EngineError, GameManager, MatchConfig, ThrowerKind};
use types::Variant;

#[derive(Parser, Debug)]
struct Params {
    /// Yaml match description; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Variant tag such as classic-501, atw-bulls or killer-5.
    #[arg(short, long)]
    variant: Option<Variant>,
    #[arg(short, long)]
    player: Vec<String>,
    #[arg(short, long, value_enum, default_value_t = ThrowerKind::Aimed)]
    thrower: ThrowerKind,
    #[arg(long)]
    max_rounds: Option<u32>,
    #[arg(long)]
    delay_ms: Option<u64>,
    #[arg(long)]
    database_url: Option<String>,
}

fn match_config(args: &Params) -> Result<MatchConfig, EngineError> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::from_path(path)?,
        None => MatchConfig::new(
            args.variant.unwrap_or(Variant::Classic {
                starting_score: 501,
            }),
            &args.player,
            args.thrower,
        ),
    };
    if args.config.is_some() {
        if let Some(variant) = args.variant {
            config.variant = variant;
        }
        if !args.player.is_empty() {
            config.players = MatchConfig::new(config.variant, &args.player, args.thrower).players;
        }
    }
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
    if args.delay_ms.is_some() {
        config.delay_ms = args.delay_ms;
    }
    Ok(config)
}

async fn play<S: GameStore>(store: S, config: &MatchConfig) -> Result<(), EngineError> {
    let manager = GameManager::new(store);
    let (roster, mut throwers) = config.seat_players()?;
    let game = manager.create_game(config.variant, roster).await?;
    log::info!("Starting {} game {}", game.variant, game.id);

    let winner = run_game(
        &manager,
        game.id,
        &mut throwers,
        config.delay_ms,
        config.max_rounds,
    )
    .await?;

    let state = manager.state(game.id).await?;
    println!("{state}");
    match winner {
        Some(player) => println!("{player} wins after {} turns", manager.turns(game.id).await?.len()),
        None => println!("No winner after {} rounds", config.max_rounds),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    env_logger::init();
    let args = Params::parse();
    log::info!("args: {args:?}");

    let config = match_config(&args)?;
    let db_config = DatabaseConfig::from_cli_or_env_or_yaml(
        args.database_url.clone(),
        config.database_url.clone(),
    );

    if db_config.is_memory() {
        play(InMemoryStore::new(), &config).await
    } else {
        let pool = db_config
            .create_pool()
            .await
            .map_err(|e| database::DatabaseError::Connection(e.to_string()))?;
        let store = SqliteStore::new(pool);
        store.run_migrations().await?;
        log::info!("Persisting to {}", db_config.url);
        play(store, &config).await
    }
}
