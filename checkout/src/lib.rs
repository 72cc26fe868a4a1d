//! Finishing suggestions for countdown games.
//!
//! Suggestions come from a fixed priority list of heuristics rather than a
//! full dart-theory solver: the first rule that matches supplies the
//! primary suggestion and, for the search-based rules, a second distinct
//! one may follow. Every suggestion uses at most three legal darts, sums to
//! the remaining score and ends on a double or the bull. The seven totals
//! that have no three-dart finish get a setup visit instead.

mod search;

use itertools::Itertools;
use types::{total_points, Dart};

pub use search::setup_visit;

pub const MAX_CHECKOUT: u32 = 170;
pub const MAX_SUGGESTIONS: usize = 2;
pub const MAX_DARTS: usize = 3;

/// Totals up to 170 that cannot be finished with three darts.
pub const BOGEY_NUMBERS: [u32; 7] = [159, 162, 163, 165, 166, 168, 169];

/// Hand-verified finishes for totals the search tends to handle poorly.
const AWKWARD_TOTALS: [(u32, [Dart; 3]); 2] = [
    (113, [Dart::Triple(19), Dart::Single(16), Dart::Double(20)]),
    (115, [Dart::Triple(20), Dart::Single(15), Dart::Double(20)]),
];

/// Odd singles tried, smallest first, to leave an even double finish.
const ODD_SETUP_SINGLES: [u8; 11] = [1, 3, 5, 7, 9, 11, 13, 15, 17, 19, 25];

pub fn suggest(remaining: u32) -> Vec<Vec<Dart>> {
    suggest_within(remaining, MAX_DARTS)
}

/// Suggestions that fit in the darts still left in the current visit.
pub fn suggest_within(remaining: u32, darts_left: usize) -> Vec<Vec<Dart>> {
    let darts_left = darts_left.min(MAX_DARTS);
    if remaining <= 1 || remaining > MAX_CHECKOUT || darts_left == 0 {
        return Vec::new();
    }

    let mut suggestions = Suggestions::new(remaining, darts_left);
    if remaining == 50 {
        suggestions.offer(vec![Dart::Bull]);
        suggestions.offer(vec![Dart::Double(20), Dart::Double(5)]);
    } else if remaining <= 40 && remaining % 2 == 0 {
        if let Some(finish) = one_dart_finish(remaining) {
            suggestions.offer(vec![finish]);
        }
    } else if let Some(candidate) = odd_setup_finish(remaining) {
        suggestions.offer(candidate);
    }

    if suggestions.is_empty() {
        if remaining > 100 {
            for candidate in triple_lead_finishes(remaining) {
                if suggestions.offer(candidate) {
                    break;
                }
            }
        }
        if let Some(candidate) = awkward_total(remaining) {
            suggestions.offer(candidate);
        }
        search::exhaustive(remaining, &mut suggestions);
    }

    if suggestions.is_empty() && darts_left == MAX_DARTS {
        log::debug!("No three-dart finish for {remaining}, suggesting a setup visit");
        if let Some(setup) = setup_visit(remaining) {
            suggestions.offer_setup(setup);
        }
    }

    if suggestions.is_empty() && darts_left == MAX_DARTS {
        log::error!("Checkout solver produced nothing for {remaining}");
    }
    suggestions.into_vec()
}

/// Suggestions in wire notation, e.g. `[["T20", "T20", "Bull"]]`.
pub fn suggest_notation(remaining: u32) -> Vec<Vec<String>> {
    suggest(remaining)
        .iter()
        .map(|darts| darts.iter().map(|d| d.to_string()).collect())
        .collect()
}

/// Whether `darts` legally finish exactly `remaining`.
pub fn is_checkout(darts: &[Dart], remaining: u32) -> bool {
    !darts.is_empty()
        && darts.len() <= MAX_DARTS
        && darts.iter().all(Dart::is_legal)
        && total_points(darts) == remaining
        && darts.last().is_some_and(Dart::is_finishing)
}

/// The single dart that finishes `points`, if there is one.
pub fn one_dart_finish(points: u32) -> Option<Dart> {
    match points {
        50 => Some(Dart::Bull),
        2..=40 if points % 2 == 0 => Dart::double((points / 2) as u8).ok(),
        _ => None,
    }
}

fn odd_setup_finish(remaining: u32) -> Option<Vec<Dart>> {
    if remaining % 2 == 0 {
        return None;
    }
    ODD_SETUP_SINGLES
        .iter()
        .filter(|&&single| u32::from(single) < remaining)
        .find_map(|&single| {
            let lead = Dart::new(single, 1).ok()?;
            let finish = one_dart_finish(remaining - u32::from(single))?;
            Some(vec![lead, finish])
        })
}

fn triple_lead_finishes(remaining: u32) -> Vec<Vec<Dart>> {
    (1..=20u8)
        .rev()
        .filter_map(|number| {
            let lead = Dart::triple(number).ok()?;
            let rest = remaining.checked_sub(lead.points())?;
            let finish = one_dart_finish(rest)?;
            Some(vec![lead, finish])
        })
        .collect()
}

fn awkward_total(remaining: u32) -> Option<Vec<Dart>> {
    AWKWARD_TOTALS
        .iter()
        .find(|(total, _)| *total == remaining)
        .map(|(_, darts)| darts.to_vec())
}

/// Collects up to two distinct, validated suggestions.
pub(crate) struct Suggestions {
    remaining: u32,
    darts_left: usize,
    found: Vec<Vec<Dart>>,
}

impl Suggestions {
    fn new(remaining: u32, darts_left: usize) -> Self {
        Self {
            remaining,
            darts_left,
            found: Vec::with_capacity(MAX_SUGGESTIONS),
        }
    }

    pub(crate) fn max_darts(&self) -> usize {
        self.darts_left
    }

    pub(crate) fn is_full(&self) -> bool {
        self.found.len() >= MAX_SUGGESTIONS
    }

    fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    /// Adds a finishing candidate; returns true once no more are wanted.
    pub(crate) fn offer(&mut self, candidate: Vec<Dart>) -> bool {
        if self.is_full() {
            return true;
        }
        if candidate.len() > self.darts_left || !is_checkout(&candidate, self.remaining) {
            log::debug!(
                "Discarding candidate [{}] for {}",
                candidate.iter().join(", "),
                self.remaining
            );
            return false;
        }
        if !self.found.contains(&candidate) {
            self.found.push(candidate);
        }
        self.is_full()
    }

    fn offer_setup(&mut self, candidate: Vec<Dart>) {
        let legal = !candidate.is_empty()
            && candidate.len() <= self.darts_left
            && candidate.iter().all(Dart::is_legal)
            && total_points(&candidate) < self.remaining;
        if legal && !self.is_full() && !self.found.contains(&candidate) {
            self.found.push(candidate);
        }
    }

    fn into_vec(self) -> Vec<Vec<Dart>> {
        self.found
    }
}
