//! Forest encounter spawning.

use rand::Rng;
use rand::rngs::StdRng;

use mv_core::opponent::{OpponentCatalog, OpponentTemplate};
use mv_core::{Element, Opponent};

/// Most opponents in one encounter.
pub const MAX_OPPONENTS: usize = 3;

/// Draws attempted before giving up on filling the encounter.
pub const MAX_ATTEMPTS: usize = 10;

/// Spawn 1-3 opponents whose summed level stays within `player_level`.
///
/// Candidates are the catalog's variants for `element`, falling back to
/// the base element when that yields nothing. If no candidate fits, the
/// first candidate is spawned alone. An empty catalog spawns nothing.
pub fn spawn_encounter(
    catalog: &OpponentCatalog,
    player_level: u32,
    element: Element,
    rng: &mut StdRng,
) -> Vec<Opponent> {
    let mut candidates = catalog.variants_for(element);
    if candidates.is_empty() {
        candidates = catalog.variants_for(Element::Base);
    }
    let Some(fallback) = candidates.first() else {
        return Vec::new();
    };

    let mut spawned = Vec::new();
    let mut total = 0u32;
    for _ in 0..MAX_ATTEMPTS {
        if spawned.len() >= MAX_OPPONENTS {
            break;
        }
        let remaining = player_level.saturating_sub(total).max(1);
        let choices: Vec<&OpponentTemplate> =
            candidates.iter().filter(|t| t.level <= remaining).collect();
        if choices.is_empty() {
            break;
        }
        let pick = choices[rng.random_range(0..choices.len())];
        spawned.push(Opponent::from_template(pick));
        total += pick.level;
        if total >= player_level {
            break;
        }
    }
    if spawned.is_empty() {
        spawned.push(Opponent::from_template(fallback));
    }
    tracing::debug!(count = spawned.len(), total_level = total, %element, "spawned encounter");
    spawned
}

/// The line announcing a fresh encounter.
pub fn arrival_message(opponents: &[Opponent]) -> String {
    match opponents {
        [one] => format!("A {} {}.", one.name, one.arrival),
        _ => "Opponents emerge from the forest.".to_string(),
    }
}
