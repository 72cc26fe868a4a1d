pub mod input_thrower;

use checkout::MAX_DARTS;
use itertools::Itertools;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use types::{Dart, KillerProgress, Progress, Thrower, TurnContext, Variant, KILLER_THRESHOLD};

pub use crate::input_thrower::InputThrower;

/// Throws three darts picked uniformly from the whole board.
#[derive(Debug)]
pub struct RandomThrower {
    rng: StdRng,
    board: Vec<Dart>,
}

impl Default for RandomThrower {
    fn default() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }
}

impl RandomThrower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            board: Dart::all(),
        }
    }
}

impl Thrower for RandomThrower {
    fn throw_turn(&mut self, _context: &TurnContext) -> Vec<Dart> {
        (0..MAX_DARTS)
            .filter_map(|_| self.board.choose(&mut self.rng).copied())
            .collect()
    }
}

/// Never misses what it aims at. Useful for driving games to completion.
#[derive(Debug, Default)]
pub struct AimedThrower {}

impl Thrower for AimedThrower {
    fn throw_turn(&mut self, context: &TurnContext) -> Vec<Dart> {
        let darts = match (&context.variant, &context.progress) {
            (Variant::Classic { .. }, Progress::Classic(progress)) => {
                classic_visit(progress.remaining, &context.checkout)
            }
            (Variant::AroundTheWorld(options), Progress::AroundTheWorld(progress)) => atw_visit(
                &options.sequence(),
                options.multiplier_advances,
                progress.sequence_position,
            ),
            (Variant::Killer(options), Progress::Killer(progress)) => {
                killer_visit(context, progress, options.max_lives)
            }
            (variant, progress) => {
                log::error!("Progress {progress:?} does not belong to a {variant} game");
                Vec::new()
            }
        };
        log::debug!("{} aims at [{}]", context.player, darts.iter().join(", "));
        darts
    }
}

fn classic_visit(remaining: u32, suggestions: &[Vec<Dart>]) -> Vec<Dart> {
    if let Some(finish) = suggestions
        .iter()
        .find(|darts| checkout::is_checkout(darts, remaining))
    {
        return finish.clone();
    }

    let mut darts = Vec::with_capacity(MAX_DARTS);
    let mut left = remaining;
    while darts.len() < MAX_DARTS {
        let darts_left = MAX_DARTS - darts.len();
        if let Some(finish) = checkout::suggest_within(left, darts_left)
            .into_iter()
            .find(|finish| checkout::is_checkout(finish, left))
        {
            darts.extend(finish);
            break;
        }
        let dart = scoring_dart(left);
        left -= dart.points();
        darts.push(dart);
    }
    darts
}

/// The heaviest dart that cannot bust from `left`.
fn scoring_dart(left: u32) -> Dart {
    Dart::all()
        .into_iter()
        .filter(|dart| dart.points() + 2 <= left)
        .max_by_key(|dart| (dart.points(), dart.multiplier()))
        .unwrap_or(Dart::Miss)
}

fn atw_visit(sequence: &[u8], multiplier_advances: bool, position: usize) -> Vec<Dart> {
    let mut position = position;
    let mut darts = Vec::with_capacity(MAX_DARTS);
    while darts.len() < MAX_DARTS {
        let Some(&target) = position
            .checked_sub(1)
            .and_then(|idx| sequence.get(idx))
        else {
            break;
        };
        let dart = match target {
            25 => Dart::OuterBull,
            50 => Dart::Bull,
            n if multiplier_advances => Dart::Triple(n),
            n => Dart::Single(n),
        };
        let advance = if multiplier_advances {
            dart.multiplier() as usize
        } else {
            1
        };
        position = (position + advance).min(sequence.len() + 1);
        darts.push(dart);
    }
    darts
}

fn killer_visit(context: &TurnContext, progress: &KillerProgress, max_lives: u8) -> Vec<Dart> {
    let taken = context.claimed_numbers();
    let mut claimed = progress.claimed_number;
    let mut lives = progress.lives;
    let mut targets: Vec<(u8, u8)> = context
        .live_claims()
        .iter()
        .filter_map(|(number, _, p)| p.as_killer().map(|k| (*number, k.lives)))
        .collect();

    let mut darts = Vec::with_capacity(MAX_DARTS);
    for _ in 0..MAX_DARTS {
        let dart = match claimed {
            None => {
                // highest number nobody holds yet
                let Some(number) = (1..=20u8).rev().find(|n| !taken.contains(n)) else {
                    break;
                };
                claimed = Some(number);
                lives = 2.min(max_lives);
                Dart::Double(number)
            }
            Some(own) if lives < KILLER_THRESHOLD => {
                lives = (lives + 2).min(max_lives);
                Dart::Double(own)
            }
            Some(own) => match targets
                .iter_mut()
                .filter(|(_, target_lives)| *target_lives > 0)
                .min_by_key(|(_, target_lives)| *target_lives)
            {
                Some((number, target_lives)) => {
                    *target_lives = target_lives.saturating_sub(3);
                    Dart::Triple(*number)
                }
                None if lives < max_lives => {
                    lives = (lives + 2).min(max_lives);
                    Dart::Double(own)
                }
                None => Dart::Miss,
            },
        };
        darts.push(dart);
    }
    darts
}
