use types::Dart;

use crate::{one_dart_finish, Suggestions, MAX_DARTS};

/// Scoring darts in search order: 20 down to 1 as treble, single, double,
/// then the outer bull and the bull.
fn leads() -> Vec<Dart> {
    let mut leads = Vec::with_capacity(62);
    for number in (1..=20u8).rev() {
        leads.extend(
            [Dart::triple(number), Dart::single(number), Dart::double(number)]
                .into_iter()
                .flatten(),
        );
    }
    leads.push(Dart::OuterBull);
    leads.push(Dart::Bull);
    leads
}

/// Two-dart finishes first, then three-dart ones, until the suggestion list
/// is full.
pub(crate) fn exhaustive(remaining: u32, suggestions: &mut Suggestions) {
    let leads = leads();
    let max_darts = suggestions.max_darts();

    if max_darts >= 1 {
        if let Some(finish) = one_dart_finish(remaining) {
            if suggestions.offer(vec![finish]) {
                return;
            }
        }
    }

    if max_darts >= 2 {
        for lead in &leads {
            let Some(rest) = remaining.checked_sub(lead.points()) else {
                continue;
            };
            if let Some(finish) = one_dart_finish(rest) {
                if suggestions.offer(vec![*lead, finish]) {
                    return;
                }
            }
        }
    }

    if max_darts >= MAX_DARTS {
        for first in &leads {
            let Some(after_first) = remaining.checked_sub(first.points()) else {
                continue;
            };
            for second in &leads {
                let Some(rest) = after_first.checked_sub(second.points()) else {
                    continue;
                };
                if let Some(finish) = one_dart_finish(rest) {
                    if suggestions.offer(vec![*first, *second, finish]) {
                        return;
                    }
                }
            }
        }
    }
}

/// Up to three darts that leave the biggest one-dart finish available,
/// for totals that cannot be checked out this visit.
pub fn setup_visit(remaining: u32) -> Option<Vec<Dart>> {
    let leads = leads();
    let leaves = (2..=40u32).rev().step_by(2).chain(std::iter::once(50));

    for leave in leaves {
        let Some(target) = remaining.checked_sub(leave) else {
            continue;
        };
        if target == 0 {
            continue;
        }
        if let Some(darts) = darts_totalling(target, &leads) {
            return Some(darts);
        }
    }
    None
}

fn darts_totalling(target: u32, leads: &[Dart]) -> Option<Vec<Dart>> {
    let exact = |points: u32| leads.iter().find(|d| d.points() == points).copied();

    if let Some(dart) = exact(target) {
        return Some(vec![dart]);
    }
    for first in leads {
        let Some(rest) = target.checked_sub(first.points()) else {
            continue;
        };
        if let Some(second) = exact(rest) {
            return Some(vec![*first, second]);
        }
    }
    for first in leads {
        let Some(after_first) = target.checked_sub(first.points()) else {
            continue;
        };
        for second in leads {
            let Some(rest) = after_first.checked_sub(second.points()) else {
                continue;
            };
            if let Some(third) = exact(rest) {
                return Some(vec![*first, *second, third]);
            }
        }
    }
    None
}
