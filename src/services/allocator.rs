// src/services/allocator.rs

//! Turns a percentage distribution into per-difficulty question counts.

use serde::Serialize;

use crate::models::{generation::DifficultyDistribution, question::Difficulty};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyCounts {
    pub low: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyCounts {
    pub fn get(&self, difficulty: Difficulty) -> usize {
        match difficulty {
            Difficulty::Low => self.low,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.hard
    }

    /// Buckets with a non-zero count, in low → medium → hard order.
    pub fn required(&self) -> impl Iterator<Item = (Difficulty, usize)> + '_ {
        Difficulty::ALL
            .into_iter()
            .map(|d| (d, self.get(d)))
            .filter(|(_, count)| *count > 0)
    }
}

/// How a section's questions are to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// One pool, no difficulty split.
    Flat(usize),
    ByDifficulty(DifficultyCounts),
}

impl Allocation {
    pub fn total(&self) -> usize {
        match self {
            Allocation::Flat(required) => *required,
            Allocation::ByDifficulty(counts) => counts.total(),
        }
    }
}

/// Each bucket is `round(percentage / 100 × total)`.
///
/// Percentages are not renormalized, so the bucket sum may drift from `total`
/// when they do not add up to 100 or when rounding pushes them over.
pub fn allocate(total: usize, distribution: Option<&DifficultyDistribution>) -> Allocation {
    match distribution {
        None => Allocation::Flat(total),
        Some(dist) => Allocation::ByDifficulty(DifficultyCounts {
            low: bucket(dist.low, total),
            medium: bucket(dist.medium, total),
            hard: bucket(dist.hard, total),
        }),
    }
}

fn bucket(percentage: f64, total: usize) -> usize {
    ((percentage / 100.0) * total as f64).round().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(low: f64, medium: f64, hard: f64) -> DifficultyDistribution {
        DifficultyDistribution { low, medium, hard }
    }

    #[test]
    fn no_distribution_is_a_flat_pool() {
        assert_eq!(allocate(7, None), Allocation::Flat(7));
    }

    #[test]
    fn splits_thirty_forty_thirty() {
        let allocation = allocate(10, Some(&dist(30.0, 40.0, 30.0)));
        assert_eq!(
            allocation,
            Allocation::ByDifficulty(DifficultyCounts { low: 3, medium: 4, hard: 3 })
        );
    }

    #[test]
    fn zero_buckets_are_skipped() {
        let Allocation::ByDifficulty(counts) = allocate(4, Some(&dist(0.0, 50.0, 50.0))) else {
            panic!("expected a difficulty split");
        };
        let required: Vec<_> = counts.required().collect();
        assert_eq!(required, vec![(Difficulty::Medium, 2), (Difficulty::Hard, 2)]);
    }

    #[test]
    fn rounding_may_drift_from_total() {
        // 3 × round(1.665) = 6 for a total of 5
        let Allocation::ByDifficulty(counts) = allocate(5, Some(&dist(33.3, 33.3, 33.3))) else {
            panic!("expected a difficulty split");
        };
        assert_eq!(counts.total(), 6);

        let Allocation::ByDifficulty(under) = allocate(10, Some(&dist(10.0, 10.0, 10.0))) else {
            panic!("expected a difficulty split");
        };
        assert_eq!(under.total(), 3);
    }
}
