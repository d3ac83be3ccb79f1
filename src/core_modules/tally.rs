// THEORY:
// A `Tally` is the running count for one band of pixels, or for a whole image once
// the bands are summed. Classification has no cross-pixel state, so tallies can be
// built in any order and merged in any order; merging is plain addition.

use crate::core_modules::policy::{ExclusionReason, Verdict};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Excluded pixels broken down by the rule that removed them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionBreakdown {
    pub translucent: u64,
    pub background: u64,
    pub border: u64,
}

impl ExclusionBreakdown {
    pub fn total(&self) -> u64 {
        self.translucent + self.background + self.border
    }
}

/// Per-category pixel counters plus exclusion counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    counts: Vec<u64>,
    exclusions: ExclusionBreakdown,
}

impl Tally {
    pub fn new(category_count: usize) -> Self {
        Self {
            counts: vec![0; category_count],
            exclusions: ExclusionBreakdown::default(),
        }
    }

    #[inline]
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Category(index) => self.counts[index] += 1,
            Verdict::Excluded(ExclusionReason::Translucent) => self.exclusions.translucent += 1,
            Verdict::Excluded(ExclusionReason::Background) => self.exclusions.background += 1,
            Verdict::Excluded(ExclusionReason::Border) => self.exclusions.border += 1,
        }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn exclusions(&self) -> ExclusionBreakdown {
        self.exclusions
    }

    pub fn excluded(&self) -> u64 {
        self.exclusions.total()
    }

    pub fn classified(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl AddAssign<&Tally> for Tally {
    fn add_assign(&mut self, other: &Tally) {
        debug_assert_eq!(self.counts.len(), other.counts.len());
        for (count, other_count) in self.counts.iter_mut().zip(&other.counts) {
            *count += other_count;
        }
        self.exclusions.translucent += other.exclusions.translucent;
        self.exclusions.background += other.exclusions.background;
        self.exclusions.border += other.exclusions.border;
    }
}
