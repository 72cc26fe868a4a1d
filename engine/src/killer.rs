//! Killer: claim a number, build lives on it, then knock everyone else out.
//!
//! The phase of the game is never stored. It is read off the players'
//! progress by [`current_phase`]. Within a visit the thrower's own state is
//! folded dart by dart, so a player who reaches the killer threshold on
//! their second dart attacks with their third.

use std::{collections::BTreeSet, fmt::Display};

use serde::{Deserialize, Serialize};
use types::{
    Dart, KillerHit, KillerOptions, KillerProgress, Player, Progress, TurnOutcome, Variant,
    KILLER_THRESHOLD,
};
use uuid::Uuid;

use crate::{
    rules::{mismatched, Resolution, VariantEngine},
    EngineError, GameState, Result,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillerPhase {
    Claiming,
    Building,
    Killer,
}

impl Display for KillerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KillerPhase::Claiming => write!(f, "claiming"),
            KillerPhase::Building => write!(f, "building"),
            KillerPhase::Killer => write!(f, "killer"),
        }
    }
}

/// Claiming while anyone still in the game lacks a number, killer once
/// everyone still in is a killer, building otherwise.
pub fn current_phase(progress: &[Progress]) -> KillerPhase {
    let active: Vec<&KillerProgress> = progress
        .iter()
        .filter_map(Progress::as_killer)
        .filter(|p| !p.is_eliminated)
        .collect();

    if active.iter().any(|p| p.claimed_number.is_none()) {
        KillerPhase::Claiming
    } else if !active.is_empty() && active.iter().all(|p| p.is_killer) {
        KillerPhase::Killer
    } else {
        KillerPhase::Building
    }
}

/// The last player standing, once killer play has started.
fn sole_survivor(players: &[Player], table: &[KillerProgress]) -> Option<Uuid> {
    let mut active = players
        .iter()
        .zip(table)
        .filter(|(_, progress)| !progress.is_eliminated);
    let (survivor, _) = active.next()?;
    if active.next().is_some() {
        return None;
    }
    let entered_killer_play = table.iter().any(|p| p.is_killer || p.is_eliminated);
    entered_killer_play.then_some(survivor.id)
}

/// The thrower's running state through one visit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Fold {
    claimed: Option<u8>,
    lives: u8,
    is_killer: bool,
}

#[derive(Debug)]
pub struct KillerEngine {
    options: KillerOptions,
}

impl KillerEngine {
    pub fn new(options: KillerOptions) -> Self {
        Self { options }
    }

    fn table(&self, state: &GameState) -> Result<Vec<KillerProgress>> {
        state
            .progress
            .iter()
            .map(|progress| {
                progress
                    .as_killer()
                    .cloned()
                    .ok_or_else(|| mismatched(self.variant(), progress))
            })
            .collect()
    }
}

impl VariantEngine for KillerEngine {
    fn variant(&self) -> Variant {
        Variant::Killer(self.options)
    }

    fn initial_progress(&self) -> Progress {
        Progress::Killer(KillerProgress::default())
    }

    fn resolve(&self, state: &GameState, darts: &[Dart]) -> Result<Resolution> {
        let max_lives = self.options.max_lives;
        let seat = state.current;
        let player = state.current_player();
        let mut table = self.table(state)?;
        let before = table[seat].clone();

        let mut fold = Fold {
            claimed: before.claimed_number,
            lives: before.lives,
            is_killer: before.lives >= KILLER_THRESHOLD,
        };
        let mut claimed_now = None;
        let mut hits = Vec::new();
        let mut touched = BTreeSet::from([seat]);
        let mut winner = None;

        for dart in darts {
            let multiplier = dart.multiplier();
            match (fold.claimed, dart.board_number()) {
                (None, Some(number)) => {
                    if let Some(owner) = table
                        .iter()
                        .enumerate()
                        .position(|(idx, p)| idx != seat && p.claimed_number == Some(number))
                    {
                        return Err(EngineError::NumberAlreadyClaimed {
                            number,
                            owner: state.players[owner].id,
                        });
                    }
                    fold.claimed = Some(number);
                    fold.lives = multiplier.min(max_lives);
                    claimed_now = Some(number);
                    log::debug!("{player} claims {number} with {} lives", fold.lives);
                }
                (Some(own), Some(number)) if number == own => {
                    fold.lives = fold.lives.saturating_add(multiplier).min(max_lives);
                    log::debug!("{player} builds to {} lives", fold.lives);
                }
                (Some(_), Some(number)) if fold.is_killer => {
                    let target = table.iter().enumerate().position(|(idx, p)| {
                        idx != seat && !p.is_eliminated && p.claimed_number == Some(number)
                    });
                    if let Some(target) = target {
                        let victim = &mut table[target];
                        let lives_lost = victim.lives.min(multiplier);
                        victim.lives -= lives_lost;
                        victim.is_killer = victim.lives >= KILLER_THRESHOLD;
                        victim.is_eliminated = victim.lives == 0;
                        let target_player = &state.players[target];
                        log::debug!(
                            "{player} takes {lives_lost} from {target_player}, {} left",
                            victim.lives
                        );
                        if victim.is_eliminated {
                            log::info!("{player} eliminates {target_player}");
                        }
                        hits.push(KillerHit {
                            target_id: target_player.id,
                            number,
                            lives_lost,
                            eliminated: victim.is_eliminated,
                        });
                        touched.insert(target);
                    }
                }
                // bulls, misses, and other numbers before becoming a killer
                _ => {}
            }

            fold.is_killer = fold.lives >= KILLER_THRESHOLD;
            table[seat] = KillerProgress {
                claimed_number: fold.claimed,
                lives: fold.lives,
                is_killer: fold.is_killer,
                is_eliminated: false,
            };

            winner = sole_survivor(&state.players, &table);
            if winner.is_some() {
                log::info!("{player} is the last one standing");
                break;
            }
        }

        Ok(Resolution {
            progress: touched
                .into_iter()
                .map(|idx| (idx, Progress::Killer(table[idx].clone())))
                .collect(),
            outcome: TurnOutcome::Killer {
                lives_before: before.lives,
                lives_after: fold.lives,
                claimed: claimed_now,
                became_killer: !before.is_killer && fold.is_killer,
                hits,
            },
            scores: darts.iter().map(Dart::points).collect(),
            bust: false,
            winner,
            checkout: Vec::new(),
        })
    }

    fn winner(&self, state: &GameState) -> Option<Uuid> {
        let table = self.table(state).ok()?;
        sole_survivor(&state.players, &table)
    }
}
