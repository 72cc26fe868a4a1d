use types::{AtwOptions, AtwProgress, Dart, Progress, TurnOutcome, Variant};
use uuid::Uuid;

use crate::{
    rules::{mismatched, Resolution, VariantEngine},
    GameState, Result,
};

#[derive(Debug)]
pub struct AroundTheWorldEngine {
    options: AtwOptions,
    sequence: Vec<u8>,
}

impl AroundTheWorldEngine {
    pub fn new(options: AtwOptions) -> Self {
        Self {
            options,
            sequence: options.sequence(),
        }
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Walks the visit dart by dart. Only a dart on the current target
    /// moves the player on; the target is recomputed after every hit.
    pub fn advance(&self, progress: &AtwProgress, darts: &[Dart]) -> (AtwProgress, Vec<u8>) {
        let finish = self.sequence.len() + 1;
        let mut next = progress.clone();
        let mut hits = Vec::new();

        for dart in darts {
            let Some(target) = next.current_target else {
                break;
            };
            if dart.value() != target {
                continue;
            }
            let step = if self.options.multiplier_advances {
                dart.multiplier() as usize
            } else {
                1
            };
            let end = (next.sequence_position + step).min(finish);
            for position in next.sequence_position..end {
                if let Some(&passed) = position.checked_sub(1).and_then(|i| self.sequence.get(i)) {
                    next.completed_targets.insert(passed);
                }
            }
            next.sequence_position = end;
            next.current_target = end.checked_sub(1).and_then(|i| self.sequence.get(i)).copied();
            hits.push(target);
            log::debug!("Hit {target}, now at position {end}");
        }
        (next, hits)
    }
}

impl VariantEngine for AroundTheWorldEngine {
    fn variant(&self) -> Variant {
        Variant::AroundTheWorld(self.options)
    }

    fn initial_progress(&self) -> Progress {
        Progress::AroundTheWorld(AtwProgress::start(&self.sequence))
    }

    fn resolve(&self, state: &GameState, darts: &[Dart]) -> Result<Resolution> {
        let before = state
            .current_progress()
            .as_atw()
            .ok_or_else(|| mismatched(self.variant(), state.current_progress()))?;
        let (after, hits) = self.advance(before, darts);
        let player = state.current_player();

        let winner = if after.is_finished(&self.sequence) {
            log::info!("{player} completed the board");
            Some(player.id)
        } else {
            None
        };

        Ok(Resolution {
            outcome: TurnOutcome::AroundTheWorld {
                position_before: before.sequence_position,
                position_after: after.sequence_position,
                advanced: after.sequence_position - before.sequence_position,
                hits,
            },
            progress: vec![(state.current, Progress::AroundTheWorld(after))],
            scores: darts.iter().map(Dart::points).collect(),
            bust: false,
            winner,
            checkout: Vec::new(),
        })
    }

    fn winner(&self, state: &GameState) -> Option<Uuid> {
        state
            .players
            .iter()
            .zip(&state.progress)
            .find(|(_, progress)| {
                progress
                    .as_atw()
                    .is_some_and(|p| p.is_finished(&self.sequence))
            })
            .map(|(player, _)| player.id)
    }
}
