//! Random card selection.

use rand::Rng;

use crate::card::{Card, DrawnCard, Orientation};

/// Draw up to `count` distinct cards, each with an independent fair orientation.
///
/// Cards are removed from a working pool as they are drawn, so no card appears
/// twice. Asking for more cards than exist returns every card once.
pub fn select_random_cards<R: Rng>(
    cards: &[Card],
    count: usize,
    rng: &mut R,
) -> Vec<DrawnCard> {
    let mut pool: Vec<&Card> = cards.iter().collect();
    let take = count.min(pool.len());
    let mut drawn = Vec::with_capacity(take);

    for _ in 0..take {
        let idx = rng.random_range(0..pool.len());
        let card = pool.swap_remove(idx);
        let orientation = if rng.random_bool(0.5) {
            Orientation::Reversed
        } else {
            Orientation::Upright
        };
        drawn.push(DrawnCard {
            card: card.clone(),
            orientation,
        });
    }

    drawn
}
