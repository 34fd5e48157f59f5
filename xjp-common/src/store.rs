//! Owned document store
//!
//! `Store` holds the working copy of the site document for an admin or
//! viewer session. Every mutation is applied to the document, followed by a
//! full selection derivation, and bumps [`Store::revision`] so a caller (the
//! debounced saver) can tell when a new snapshot needs persisting.

use tracing::{debug, warn};

use crate::appearances::CumulativeCounts;
use crate::lineup::SlotRole;
use crate::migration::{migrate_history_keys, MigrationReport};
use crate::model::{Document, HistoryEntry, Member, Post, SelectionStatus, Single};
use crate::selection::{derive_selections, member_timeline, TimelineEntry};
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Store {
    document: Document,
    revision: u64,
}

impl Store {
    /// Adopt a freshly fetched document: migrate legacy history keys, then
    /// derive selections.
    pub fn load(mut document: Document) -> (Self, MigrationReport) {
        let report = migrate_history_keys(&mut document.members, &document.singles);
        if !report.unresolved.is_empty() {
            warn!(
                count = report.unresolved.len(),
                "Legacy history keys matched no single"
            );
        }
        derive_selections(&mut document);
        (
            Store {
                document,
                revision: 0,
            },
            report,
        )
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Clone of the current document for saving
    pub fn snapshot(&self) -> Document {
        self.document.clone()
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Mutation counter; 0 right after [`load`](Self::load)
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn commit(&mut self, action: &str) {
        derive_selections(&mut self.document);
        self.revision += 1;
        debug!(action, revision = self.revision, "Store updated");
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Insert or replace a member by id after validation.
    pub fn upsert_member(&mut self, member: Member) -> Result<()> {
        if let Err(err) = member.validate() {
            warn!(member = %member.id, error = %err, "Rejected member save");
            return Err(err);
        }
        match self.document.member_mut(&member.id) {
            Some(existing) => *existing = member,
            None => self.document.members.push(member),
        }
        self.commit("upsert_member");
        Ok(())
    }

    /// Remove a member and empty every slot they held.
    pub fn delete_member(&mut self, member_id: &str) -> Result<()> {
        let before = self.document.members.len();
        self.document.members.retain(|m| m.id != member_id);
        if self.document.members.len() == before {
            return Err(Error::NotFound(format!("member {}", member_id)));
        }
        let cleared: usize = self
            .document
            .singles
            .iter_mut()
            .map(|s| s.aside_lineup.unseat(member_id))
            .sum();
        debug!(member = member_id, cleared, "Unseated deleted member");
        self.commit("delete_member");
        Ok(())
    }

    /// Set or clear the "joined before this release" override.
    pub fn set_joined_before(&mut self, member_id: &str, single_id: &str, on: bool) -> Result<()> {
        if self.document.single(single_id).is_none() {
            return Err(Error::NotFound(format!("single {}", single_id)));
        }
        let member = self
            .document
            .member_mut(member_id)
            .ok_or_else(|| Error::NotFound(format!("member {}", member_id)))?;
        if on {
            member.selection_history.insert(
                single_id.to_string(),
                HistoryEntry::from(SelectionStatus::JoinedBefore),
            );
        } else {
            member.selection_history.remove(single_id);
        }
        self.commit("set_joined_before");
        Ok(())
    }

    // ========================================================================
    // Singles
    // ========================================================================

    /// Insert or replace a single by id. Tracks are renumbered and the slot
    /// list is resized to the row total, keeping seats by position.
    pub fn upsert_single(&mut self, mut single: Single) -> Result<()> {
        if single.id.trim().is_empty() {
            return Err(Error::Validation("single id must not be empty".to_string()));
        }
        single.normalize_tracks();
        single.aside_lineup.resize_preserving()?;
        match self.document.single_mut(&single.id) {
            Some(existing) => *existing = single,
            None => self.document.singles.push(single),
        }
        self.commit("upsert_single");
        Ok(())
    }

    pub fn delete_single(&mut self, single_id: &str) -> Result<()> {
        let before = self.document.singles.len();
        self.document.singles.retain(|s| s.id != single_id);
        if self.document.singles.len() == before {
            return Err(Error::NotFound(format!("single {}", single_id)));
        }
        self.commit("delete_single");
        Ok(())
    }

    /// Seat a member in a slot with an optional role.
    pub fn assign_slot(
        &mut self,
        single_id: &str,
        slot_index: usize,
        member_id: &str,
        role: Option<SlotRole>,
    ) -> Result<()> {
        if self.document.member(member_id).is_none() {
            return Err(Error::NotFound(format!("member {}", member_id)));
        }
        self.lineup_edit(single_id, |single| {
            single
                .aside_lineup
                .set_slot(slot_index, Some(member_id), role)
        })?;
        self.commit("assign_slot");
        Ok(())
    }

    pub fn clear_slot(&mut self, single_id: &str, slot_index: usize) -> Result<()> {
        self.lineup_edit(single_id, |single| single.aside_lineup.clear_slot(slot_index))?;
        self.commit("clear_slot");
        Ok(())
    }

    /// Replace the row layout from text such as `"4,4,4"`. Every seat and
    /// role of the single is discarded.
    pub fn regenerate_rows(&mut self, single_id: &str, rows_text: &str) -> Result<()> {
        self.lineup_edit(single_id, |single| {
            single.aside_lineup.regenerate_from_text(rows_text)
        })?;
        self.commit("regenerate_rows");
        Ok(())
    }

    fn lineup_edit<F>(&mut self, single_id: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Single) -> Result<()>,
    {
        let single = self
            .document
            .single_mut(single_id)
            .ok_or_else(|| Error::NotFound(format!("single {}", single_id)))?;
        edit(single)
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub fn upsert_post(&mut self, post: Post) -> Result<()> {
        if post.id.trim().is_empty() {
            return Err(Error::Validation("post id must not be empty".to_string()));
        }
        match self.document.posts.iter_mut().find(|p| p.id == post.id) {
            Some(existing) => *existing = post,
            None => self.document.posts.push(post),
        }
        self.commit("upsert_post");
        Ok(())
    }

    pub fn delete_post(&mut self, post_id: &str) -> Result<()> {
        let before = self.document.posts.len();
        self.document.posts.retain(|p| p.id != post_id);
        if self.document.posts.len() == before {
            return Err(Error::NotFound(format!("post {}", post_id)));
        }
        self.commit("delete_post");
        Ok(())
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn cumulative_counts(&self) -> CumulativeCounts {
        CumulativeCounts::compute(&self.document.singles)
    }

    pub fn timeline(&self, member_id: &str) -> Result<Vec<TimelineEntry>> {
        let member = self
            .document
            .member(member_id)
            .ok_or_else(|| Error::NotFound(format!("member {}", member_id)))?;
        Ok(member_timeline(member, &self.document.singles))
    }
}
