//! Selection derivation engine
//!
//! Every member's `selectionHistory` is recomputed from scratch from the
//! singles' A-side lineups:
//!
//! 1. A graduated member gets a cutoff: the release date of the latest single
//!    released on or before the graduation date. Singles released after the
//!    cutoff get no entry at all.
//! 2. A prior [`SelectionStatus::JoinedBefore`] override is kept as is.
//! 3. Otherwise the member is looked up in the lineup slots: absent means
//!    [`SelectionStatus::NotSelected`], present means
//!    [`SelectionStatus::Aside`] with the row counted from the front and the
//!    slot's role.
//!
//! Missing lineups, rows or roles are treated as empty and unparsable dates
//! as absent; derivation never fails.

use chrono::NaiveDate;
use tracing::debug;

use crate::appearances::chronological_order;
use crate::model::{Document, HistoryEntry, Member, SelectionHistory, SelectionStatus, Single};

/// Release date of the last single a graduated member took part in.
///
/// `None` for active members, members without a parsable graduation date,
/// or when no dated single was released on or before graduation.
pub fn graduation_cutoff(member: &Member, singles: &[Single]) -> Option<NaiveDate> {
    if member.is_active {
        return None;
    }
    let graduated_on = crate::time::iso_date_opt(member.graduation_date.as_deref())?;
    singles
        .iter()
        .filter_map(Single::release_date)
        .filter(|release| *release <= graduated_on)
        .max()
}

/// Status of `member_id` in one single's A-side lineup
pub fn lineup_status(member_id: &str, single: &Single) -> SelectionStatus {
    let lineup = &single.aside_lineup;
    match lineup.position_of(member_id) {
        None => SelectionStatus::NotSelected,
        Some(slot_index) => SelectionStatus::Aside {
            row: lineup.row_position(slot_index).from_front as u32,
            role: lineup.role_at(slot_index),
        },
    }
}

/// Build a fresh history for one member.
///
/// Only `member.selection_history` entries that are joined-before overrides
/// are read; everything else is replaced.
pub fn derive_member_history(member: &Member, singles: &[Single]) -> SelectionHistory {
    let cutoff = graduation_cutoff(member, singles);
    let mut next = SelectionHistory::new();

    for single in singles {
        if single.id.is_empty() {
            continue;
        }

        if let (Some(cutoff), Some(release)) = (cutoff, single.release_date()) {
            if release > cutoff {
                continue;
            }
        }

        let overridden = member
            .selection_history
            .get(&single.id)
            .is_some_and(HistoryEntry::is_joined_before);
        let status = if overridden {
            SelectionStatus::JoinedBefore
        } else {
            lineup_status(&member.id, single)
        };
        next.insert(single.id.clone(), status.into());
    }

    next
}

/// Recompute `selectionHistory` for every member of the document.
pub fn derive_selections(document: &mut Document) {
    let singles = &document.singles;
    for member in document.members.iter_mut() {
        member.selection_history = derive_member_history(member, singles);
    }
    debug!(
        members = document.members.len(),
        singles = document.singles.len(),
        "Recomputed selection history"
    );
}

/// Owned variant of [`derive_selections`]
pub fn with_recomputed_selections(mut document: Document) -> Document {
    derive_selections(&mut document);
    document
}

/// One row of a member's per-single history view
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub single_id: String,
    pub single_title: String,
    pub release: Option<NaiveDate>,
    pub entry: HistoryEntry,
}

/// A member's history entries in release order (oldest first, undated last).
///
/// Entries whose key is not a known single are left out.
pub fn member_timeline(member: &Member, singles: &[Single]) -> Vec<TimelineEntry> {
    chronological_order(singles)
        .into_iter()
        .filter_map(|single| {
            let entry = member.selection_history.get(&single.id)?;
            Some(TimelineEntry {
                single_id: single.id.clone(),
                single_title: single.title.clone(),
                release: single.release_date(),
                entry: entry.clone(),
            })
        })
        .collect()
}

/// Whether `member` may be offered in the lineup picker of `single`.
///
/// A graduated member is hidden from singles released after the graduation
/// date. Undated singles and members without a graduation date are always
/// eligible.
pub fn eligible_for_lineup(member: &Member, single: &Single) -> bool {
    if member.is_active {
        return true;
    }
    match (
        crate::time::iso_date_opt(member.graduation_date.as_deref()),
        single.release_date(),
    ) {
        (Some(graduated_on), Some(release)) => release <= graduated_on,
        _ => true,
    }
}
