use itertools::Itertools;

use crate::{Dart, Player, Progress, Variant};

/// What a thrower gets to see when it is their turn.
#[derive(Clone, Debug)]
pub struct TurnContext {
    pub variant: Variant,
    pub turn_number: u32,
    pub player: Player,
    pub progress: Progress,
    pub opponents: Vec<(Player, Progress)>,
    /// Finishing suggestions for classic games, empty otherwise.
    pub checkout: Vec<Vec<Dart>>,
}

impl TurnContext {
    /// Numbers claimed by other players in a Killer game, with their owners'
    /// state. Eliminated players are left out.
    pub fn live_claims(&self) -> Vec<(u8, &Player, &Progress)> {
        self.opponents
            .iter()
            .filter(|(_, progress)| !progress.is_eliminated())
            .filter_map(|(player, progress)| {
                progress
                    .as_killer()
                    .and_then(|k| k.claimed_number)
                    .map(|n| (n, player, progress))
            })
            .collect()
    }

    pub fn claimed_numbers(&self) -> Vec<u8> {
        self.opponents
            .iter()
            .filter_map(|(_, progress)| progress.as_killer().and_then(|k| k.claimed_number))
            .sorted()
            .collect()
    }
}
