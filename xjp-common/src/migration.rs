//! Legacy `selectionHistory` key migration
//!
//! Older documents keyed history entries by single title (`"1st Single ·
//! Neon Bloom"`, sometimes just the name) instead of single id. On load each
//! member's map is rebuilt:
//!
//! 1. Entries already keyed by a known single id are kept first.
//! 2. Every other entry is resolved to a single id by an embedded `singleId`,
//!    then an exact title match, then title containment.
//! 3. A resolved entry only fills an id that has no entry yet; unresolved
//!    entries stay under their original key.
//!
//! Keys are visited in map order, so the result does not depend on the order
//! the entries were written in.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{split_title, HistoryEntry, Member, SelectionHistory, Single};

/// Outcome of migrating one or more members
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Legacy entries moved under a single id
    pub moved: usize,
    /// Legacy entries whose id already had an entry
    pub discarded: usize,
    /// `(member id, key)` of entries no single matched
    pub unresolved: Vec<(String, String)>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.moved == 0 && self.discarded == 0
    }

    fn absorb(&mut self, other: MigrationReport) {
        self.moved += other.moved;
        self.discarded += other.discarded;
        self.unresolved.extend(other.unresolved);
    }
}

/// Collapse runs of whitespace and trim
fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a leading `"<series label> ·"` segment from a legacy key
fn strip_series_label(key: &str) -> String {
    let parts = split_title(key);
    normalize_ws(&parts.name)
}

/// Match candidates for one single: full title and its name part
fn title_candidates(single: &Single) -> (String, String) {
    (
        normalize_ws(&single.title),
        normalize_ws(&single.title_parts().name),
    )
}

/// Resolve a legacy key/value to a single id
fn resolve_legacy(key: &str, entry: &HistoryEntry, singles: &[Single]) -> Option<String> {
    if let Some(id) = entry.embedded_single_id() {
        if singles.iter().any(|s| s.id == id) {
            return Some(id.to_string());
        }
    }

    let cleaned = strip_series_label(key);
    let full_key = normalize_ws(key);
    if cleaned.is_empty() {
        return None;
    }

    let exact = singles.iter().find(|single| {
        let (title, name) = title_candidates(single);
        (!title.is_empty() && (title == full_key || title == cleaned))
            || (!name.is_empty() && name == cleaned)
    });
    if let Some(single) = exact {
        return Some(single.id.clone());
    }

    singles
        .iter()
        .find(|single| {
            let (_, name) = title_candidates(single);
            !name.is_empty() && (cleaned.contains(&name) || name.contains(&cleaned))
        })
        .map(|single| single.id.clone())
}

/// Rebuild one member's history keyed by single id.
pub fn migrate_member(member: &mut Member, singles: &[Single]) -> MigrationReport {
    let known: HashSet<&str> = singles
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| !id.is_empty())
        .collect();

    let mut report = MigrationReport::default();
    let previous = std::mem::take(&mut member.selection_history);
    let mut next = SelectionHistory::new();
    let mut legacy = Vec::new();

    for (key, entry) in previous {
        if known.contains(key.as_str()) {
            next.insert(key, entry);
        } else {
            legacy.push((key, entry));
        }
    }

    for (key, entry) in legacy {
        match resolve_legacy(&key, &entry, singles) {
            Some(id) => {
                if next.contains_key(&id) {
                    report.discarded += 1;
                } else {
                    debug!(member = %member.id, from = %key, to = %id, "Migrated history key");
                    next.insert(id, entry);
                    report.moved += 1;
                }
            }
            None => {
                report.unresolved.push((member.id.clone(), key.clone()));
                next.insert(key, entry);
            }
        }
    }

    member.selection_history = next;
    report
}

/// [`migrate_member`] for every member
pub fn migrate_history_keys(members: &mut [Member], singles: &[Single]) -> MigrationReport {
    let mut report = MigrationReport::default();
    for member in members.iter_mut() {
        report.absorb(migrate_member(member, singles));
    }
    report
}
