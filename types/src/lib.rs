pub mod context;
pub mod dart;
pub mod game;
pub mod player;
pub mod progress;
pub mod turn;
pub mod variant;

pub use context::TurnContext;
pub use dart::{total_points, Dart, DartError};
pub use game::{Game, GameStatus};
pub use player::{Player, PlayerKind, Thrower};
pub use progress::{AtwProgress, ClassicProgress, KillerProgress, Progress};
pub use turn::{KillerHit, Turn, TurnOutcome};
pub use variant::{AtwOptions, KillerOptions, Variant, VariantError, KILLER_THRESHOLD};
