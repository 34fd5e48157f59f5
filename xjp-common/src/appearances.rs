//! Cumulative A-side appearance counts
//!
//! Singles are walked oldest first. Each single adds one appearance to every
//! distinct member seated in its lineup, and the running totals are
//! snapshotted per single, so `count(s, m)` is "appearances of `m` up to and
//! including `s`".

use std::collections::HashMap;

use crate::model::Single;

/// Singles in release order.
///
/// Dated singles come first, oldest to newest; singles without a parsable
/// release date follow. Ties keep the original list order.
pub fn chronological_order(singles: &[Single]) -> Vec<&Single> {
    let mut ordered: Vec<&Single> = singles.iter().collect();
    // Stable sort: `None` sorts after every date via the tuple's first field.
    ordered.sort_by_key(|single| match single.release_date() {
        Some(date) => (0u8, Some(date)),
        None => (1u8, None),
    });
    ordered
}

/// Display label for a running appearance count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppearanceLabel {
    /// First A-side appearance (shown as a "debut" marker)
    First,
    /// Second or later appearance
    Nth(u32),
}

impl AppearanceLabel {
    pub fn for_count(count: u32) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(AppearanceLabel::First),
            n => Some(AppearanceLabel::Nth(n)),
        }
    }
}

/// Per-single snapshots of running appearance counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CumulativeCounts {
    by_single: HashMap<String, HashMap<String, u32>>,
}

impl CumulativeCounts {
    /// Fold over `singles` in [`chronological_order`].
    pub fn compute(singles: &[Single]) -> Self {
        let mut running: HashMap<String, u32> = HashMap::new();
        let mut by_single = HashMap::new();

        for single in chronological_order(singles) {
            for member_id in single.aside_lineup.seated_members() {
                *running.entry(member_id.to_string()).or_insert(0) += 1;
            }
            by_single.insert(single.id.clone(), running.clone());
        }

        CumulativeCounts { by_single }
    }

    /// Counts of every member through `single_id`
    pub fn through(&self, single_id: &str) -> Option<&HashMap<String, u32>> {
        self.by_single.get(single_id)
    }

    /// Appearances of `member_id` through `single_id`; 0 when unknown
    pub fn count(&self, single_id: &str, member_id: &str) -> u32 {
        self.through(single_id)
            .and_then(|counts| counts.get(member_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn label(&self, single_id: &str, member_id: &str) -> Option<AppearanceLabel> {
        AppearanceLabel::for_count(self.count(single_id, member_id))
    }
}
