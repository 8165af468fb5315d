//! Reel construction
//!
//! A reel is the synthetic list scrolled past during a draw. It looks
//! random but always ends on the chosen winner:
//!
//! ```text
//! [ filler x filler_len ][ winner ][ filler x trailing_fillers ]
//!                          ^ winner_index == filler_len
//! ```
//!
//! Fillers come from `shuffle_cycles` Fisher-Yates shuffles of the unused
//! pool laid end to end, then normalized to exactly `filler_len` entries:
//! trimmed when over, padded with uniform resamples when under (small
//! pools).

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::Participant;

/// Reel construction constants and on-screen geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelLayout {
    /// Entries scrolled past before the winner
    pub filler_len: usize,
    /// Entries shown after the winner so it lands mid-window
    pub trailing_fillers: usize,
    /// Number of pool shuffles concatenated into the filler
    pub shuffle_cycles: usize,
    /// Height of one entry in pixels
    pub item_height: f32,
    /// Height of the visible window in pixels
    pub viewport_height: f32,
}

impl Default for ReelLayout {
    fn default() -> Self {
        Self {
            filler_len: 100,
            trailing_fillers: 2,
            shuffle_cycles: 30,
            item_height: 120.0,
            viewport_height: 600.0,
        }
    }
}

impl ReelLayout {
    /// Offset of an entry's top edge when it sits centered in the window
    pub fn center_offset(&self) -> f32 {
        self.viewport_height / 2.0 - self.item_height / 2.0
    }

    /// Scroll offset that centers entry `index` in the window
    pub fn offset_for(&self, index: usize) -> f32 {
        index as f32 * self.item_height - self.center_offset()
    }
}

/// One row of the reel
#[derive(Debug, Clone, PartialEq)]
pub struct ReelEntry {
    pub participant: Participant,
    /// Set only on the entry the reel stops on
    pub is_winner: bool,
}

impl ReelEntry {
    fn filler(participant: &Participant) -> Self {
        Self {
            participant: participant.clone(),
            is_winner: false,
        }
    }
}

/// A reel ending on a designated winner
#[derive(Debug, Clone, PartialEq)]
pub struct Reel {
    pub entries: Vec<ReelEntry>,
    pub winner_index: usize,
}

impl Reel {
    /// The participant the reel stops on
    pub fn winner(&self) -> &Participant {
        &self.entries[self.winner_index].participant
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the filler part of a reel from the unused pool
///
/// Returns an empty strip for an empty pool.
pub fn filler_strip<R: Rng + ?Sized>(
    pool: &[Participant],
    layout: &ReelLayout,
    rng: &mut R,
) -> Vec<ReelEntry> {
    if pool.is_empty() {
        return Vec::new();
    }

    let mut strip = Vec::with_capacity(pool.len() * layout.shuffle_cycles);
    let mut shuffled = pool.to_vec();
    for _ in 0..layout.shuffle_cycles {
        shuffled.shuffle(rng);
        strip.extend(shuffled.iter().map(ReelEntry::filler));
    }

    strip.truncate(layout.filler_len);
    while strip.len() < layout.filler_len {
        if let Some(pick) = pool.choose(rng) {
            strip.push(ReelEntry::filler(pick));
        }
    }
    strip
}

/// Append the winner and trailing fillers to an existing strip
pub fn finish_reel<R: Rng + ?Sized>(
    mut strip: Vec<ReelEntry>,
    target: &Participant,
    pool: &[Participant],
    layout: &ReelLayout,
    rng: &mut R,
) -> Reel {
    let winner_index = strip.len();
    strip.push(ReelEntry {
        participant: target.clone(),
        is_winner: true,
    });
    for _ in 0..layout.trailing_fillers {
        if let Some(pick) = pool.choose(rng) {
            strip.push(ReelEntry::filler(pick));
        }
    }

    Reel {
        entries: strip,
        winner_index,
    }
}

/// Build a complete reel that stops on `target`
pub fn build_reel<R: Rng + ?Sized>(
    target: &Participant,
    pool: &[Participant],
    layout: &ReelLayout,
    rng: &mut R,
) -> Reel {
    let strip = filler_strip(pool, layout, rng);
    finish_reel(strip, target, pool, layout, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| Participant::new(format!("P{}", i), format!("{:03}", i)))
            .collect()
    }

    #[test]
    fn test_winner_sits_at_reported_index() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = pool(12);
        let layout = ReelLayout::default();

        for seed_round in 0..20 {
            let target = &pool[seed_round % pool.len()];
            let reel = build_reel(target, &pool, &layout, &mut rng);

            assert_eq!(reel.winner_index, 100);
            assert_eq!(reel.len(), 103);
            assert_eq!(reel.winner(), target);
            assert!(reel.entries[reel.winner_index].is_winner);
            assert_eq!(reel.entries.iter().filter(|e| e.is_winner).count(), 1);
        }
    }

    #[test]
    fn test_small_pool_is_padded_to_filler_len() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool = pool(3); // 30 cycles x 3 = 90 entries before padding
        let strip = filler_strip(&pool, &ReelLayout::default(), &mut rng);

        assert_eq!(strip.len(), 100);
        assert!(strip.iter().all(|e| pool.contains(&e.participant)));
    }

    #[test]
    fn test_large_pool_is_trimmed_to_filler_len() {
        let mut rng = StdRng::seed_from_u64(2);
        let strip = filler_strip(&pool(50), &ReelLayout::default(), &mut rng);
        assert_eq!(strip.len(), 100);
    }

    #[test]
    fn test_each_cycle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = pool(5);
        let layout = ReelLayout {
            filler_len: 10,
            shuffle_cycles: 2,
            ..ReelLayout::default()
        };
        let strip = filler_strip(&pool, &layout, &mut rng);

        for cycle in strip.chunks(5) {
            let mut ids: Vec<_> = cycle.iter().map(|e| e.participant.id.clone()).collect();
            ids.sort();
            assert_eq!(ids, vec!["000", "001", "002", "003", "004"]);
        }
    }

    #[test]
    fn test_empty_pool_yields_winner_only() {
        let mut rng = StdRng::seed_from_u64(4);
        let target = Participant::new("Solo", "999");
        let reel = build_reel(&target, &[], &ReelLayout::default(), &mut rng);

        assert_eq!(reel.winner_index, 0);
        assert_eq!(reel.len(), 1);
    }

    #[test]
    fn test_offset_centers_entry() {
        let layout = ReelLayout::default();
        assert_eq!(layout.center_offset(), 240.0);
        assert_eq!(layout.offset_for(100), 11_760.0);
    }
}
