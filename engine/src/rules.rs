use std::fmt::Debug;

use types::{Dart, DartError, Progress, TurnOutcome, Variant};
use uuid::Uuid;

use crate::{
    atw::AroundTheWorldEngine, classic::ClassicEngine, killer::KillerEngine, EngineError,
    GameState, Result,
};

pub const MAX_DARTS: usize = 3;

/// What one visit does to a game, before anything is committed.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// New progress for every player the visit touched, by seat.
    pub progress: Vec<(usize, Progress)>,
    pub outcome: TurnOutcome,
    pub scores: Vec<u32>,
    pub bust: bool,
    pub winner: Option<Uuid>,
    /// Finishing suggestions for the thrower's next visit.
    pub checkout: Vec<Vec<Dart>>,
}

impl Resolution {
    pub fn progress_for(&self, seat: usize) -> Option<&Progress> {
        self.progress
            .iter()
            .find(|(idx, _)| *idx == seat)
            .map(|(_, progress)| progress)
    }
}

/// Temporary state for a visit that is still in progress.
#[derive(Clone, Debug, PartialEq)]
pub struct Preview {
    pub progress: Progress,
    pub bust: bool,
    pub winning: bool,
    /// Finishes that fit in the darts left this visit.
    pub checkout: Vec<Vec<Dart>>,
}

/// Turn resolution for one rule variant.
pub trait VariantEngine: Debug + Send + Sync {
    fn variant(&self) -> Variant;

    fn initial_progress(&self) -> Progress;

    /// Resolves a full visit for the current player of `state`.
    fn resolve(&self, state: &GameState, darts: &[Dart]) -> Result<Resolution>;

    fn winner(&self, state: &GameState) -> Option<Uuid>;

    /// Resolves a partial visit without committing anything.
    fn preview(&self, state: &GameState, darts: &[Dart]) -> Result<Preview> {
        let resolution = self.resolve(state, darts)?;
        let progress = resolution
            .progress_for(state.current)
            .unwrap_or_else(|| state.current_progress())
            .clone();
        Ok(Preview {
            progress,
            bust: resolution.bust,
            winning: resolution.winner.is_some(),
            checkout: Vec::new(),
        })
    }
}

pub fn engine_for(variant: Variant) -> Result<Box<dyn VariantEngine>> {
    variant.validate()?;
    Ok(match variant {
        Variant::Classic { starting_score } => Box::new(ClassicEngine::new(starting_score)),
        Variant::AroundTheWorld(options) => Box::new(AroundTheWorldEngine::new(options)),
        Variant::Killer(options) => Box::new(KillerEngine::new(options)),
    })
}

/// Rejects visits with too many darts or darts that cannot exist.
pub fn validate_darts(darts: &[Dart]) -> Result<()> {
    if darts.len() > MAX_DARTS {
        return Err(EngineError::TooManyDarts {
            got: darts.len(),
            max: MAX_DARTS,
        });
    }
    if let Some(dart) = darts.iter().find(|d| !d.is_legal()) {
        return Err(DartError::Illegal {
            value: dart.value(),
            multiplier: dart.multiplier(),
        }
        .into());
    }
    Ok(())
}

/// Progress of the wrong shape for the engine resolving it.
pub(crate) fn mismatched(variant: Variant, progress: &Progress) -> EngineError {
    EngineError::CorruptHistory(format!("{variant} game holds progress {progress:?}"))
}
