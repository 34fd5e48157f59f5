//! A-side lineup (seating chart) model
//!
//! A lineup is a list of row capacities plus a flat list of slots. Rows are
//! stored **back to front**: `rows = [5, 7]` is a back row of 5 and a front
//! row of 7, so the last entry is the front row (row 1, nearest the camera).
//! Slot `i` belongs to the first row whose cumulative range contains `i`.
//!
//! Two resize operations exist and must not be confused:
//! - [`Lineup::regenerate`] builds fresh empty placeholder slots for a new row
//!   layout and discards every assignment.
//! - [`Lineup::resize_preserving`] pads or truncates `slots` to the row total,
//!   keeping assignments by position.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::warn;
use serde_json::{Map, Value};

use crate::model::lenient;
use crate::{Error, Result};

/// Row layout used for freshly created singles
pub const DEFAULT_ROWS: [u32; 2] = [5, 7];

/// Largest capacity accepted for a single row
pub const MAX_ROW_SEATS: u32 = 200;

/// Largest row total accepted for a whole lineup
pub const MAX_LINEUP_SEATS: usize = 1000;

/// Special role tag attached to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    Center,
    #[serde(alias = "护法")]
    Guardian,
}

impl SlotRole {
    /// Normalize a stored role tag. Accepts the canonical tags and the legacy
    /// guardian synonym `护法`; anything else is no role.
    pub fn parse(raw: &str) -> Option<Self> {
        let tag = raw.trim();
        if tag.eq_ignore_ascii_case("center") {
            Some(SlotRole::Center)
        } else if tag.eq_ignore_ascii_case("guardian") || tag == "护法" {
            Some(SlotRole::Guardian)
        } else {
            None
        }
    }

    /// Canonical tag written into `slotRoles`
    pub fn as_tag(self) -> &'static str {
        match self {
            SlotRole::Center => "center",
            SlotRole::Guardian => "guardian",
        }
    }
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// One physical row and the slot range it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpan {
    /// 1 = backmost row (first entry of `rows`)
    pub from_back: usize,
    /// 1 = front row (last entry of `rows`)
    pub from_front: usize,
    pub slots: Range<usize>,
}

/// Row numbers of a single slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPosition {
    pub from_back: usize,
    pub from_front: usize,
}

/// Lay out row spans for a capacity list.
pub fn row_spans(rows: &[u32]) -> Vec<RowSpan> {
    let row_count = rows.len();
    let mut start = 0usize;
    rows.iter()
        .enumerate()
        .map(|(i, &capacity)| {
            let end = start + capacity as usize;
            let span = RowSpan {
                from_back: i + 1,
                from_front: row_count - i,
                slots: start..end,
            };
            start = end;
            span
        })
        .collect()
}

/// Locate the row of `slot_index`.
///
/// A slot outside every row (malformed data) is reported as the front row.
pub fn row_position(rows: &[u32], slot_index: usize) -> RowPosition {
    let row_count = rows.len().max(1);
    match row_spans(rows)
        .into_iter()
        .find(|span| span.slots.contains(&slot_index))
    {
        Some(span) => RowPosition {
            from_back: span.from_back,
            from_front: row_count - span.from_back + 1,
        },
        None => RowPosition {
            from_back: row_count,
            from_front: 1,
        },
    }
}

/// Parse a row layout typed by an admin, e.g. `"5,7"` or `"4, 4, 4"`.
///
/// Non-numeric and zero entries are dropped.
pub fn parse_rows_text(text: &str) -> Vec<u32> {
    text.split([',', '，'])
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .collect()
}

/// Reject row layouts too large to seat.
pub fn check_rows(rows: &[u32]) -> Result<()> {
    if let Some(&seats) = rows.iter().find(|&&n| n > MAX_ROW_SEATS) {
        return Err(Error::InvalidInput(format!(
            "row of {} seats exceeds the limit of {}",
            seats, MAX_ROW_SEATS
        )));
    }
    let total: usize = rows.iter().map(|&n| n as usize).sum();
    if total > MAX_LINEUP_SEATS {
        return Err(Error::InvalidInput(format!(
            "lineup of {} seats exceeds the limit of {}",
            total, MAX_LINEUP_SEATS
        )));
    }
    Ok(())
}

/// A-side lineup of a single
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineup {
    /// Cached row total, kept for older front ends
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub selection_count: Option<u32>,

    #[serde(default, deserialize_with = "lenient::row_capacities")]
    pub rows: Vec<u32>,

    #[serde(default, deserialize_with = "lenient::slot_occupants")]
    pub slots: Vec<Option<String>>,

    #[serde(default, deserialize_with = "lenient::slot_roles")]
    pub slot_roles: BTreeMap<usize, String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Lineup {
    /// Empty lineup with the given row layout
    ///
    /// Layouts over the seat limits yield an empty lineup.
    pub fn with_rows(rows: Vec<u32>) -> Self {
        let mut lineup = Lineup::default();
        if let Err(e) = lineup.regenerate(rows) {
            warn!("Ignoring row layout: {}", e);
        }
        lineup
    }

    /// Sum of all row capacities
    pub fn capacity(&self) -> usize {
        self.rows.iter().map(|&n| n as usize).sum()
    }

    /// Replace the row layout and generate fresh empty placeholder slots.
    ///
    /// Every existing assignment and role tag is discarded. A layout over
    /// the seat limits is rejected and leaves the lineup unchanged.
    pub fn regenerate(&mut self, rows: Vec<u32>) -> Result<()> {
        check_rows(&rows)?;
        self.rows = rows;
        let capacity = self.capacity();
        self.slots = vec![None; capacity];
        self.slot_roles.clear();
        self.selection_count = Some(capacity as u32);
        Ok(())
    }

    /// [`regenerate`](Self::regenerate) from admin-typed text such as `"4,4,4"`.
    pub fn regenerate_from_text(&mut self, rows_text: &str) -> Result<()> {
        self.regenerate(parse_rows_text(rows_text))
    }

    /// Pad or truncate `slots` to the row total, keeping assignments by
    /// position. Role tags past the new end are dropped.
    pub fn resize_preserving(&mut self) -> Result<()> {
        check_rows(&self.rows)?;
        let capacity = self.capacity();
        self.slots.resize(capacity, None);
        self.slot_roles.retain(|&index, _| index < capacity);
        self.selection_count = Some(capacity as u32);
        Ok(())
    }

    /// Slot index holding `member_id`, if seated
    pub fn position_of(&self, member_id: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_deref() == Some(member_id))
    }

    /// Normalized role of a slot
    pub fn role_at(&self, slot_index: usize) -> Option<SlotRole> {
        self.slot_roles
            .get(&slot_index)
            .and_then(|raw| SlotRole::parse(raw))
    }

    /// Row numbers of a slot under this lineup's layout
    pub fn row_position(&self, slot_index: usize) -> RowPosition {
        row_position(&self.rows, slot_index)
    }

    /// Row spans under this lineup's layout
    pub fn row_spans(&self) -> Vec<RowSpan> {
        row_spans(&self.rows)
    }

    /// Distinct member ids seated anywhere, in slot order
    pub fn seated_members(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for id in self.slots.iter().flatten() {
            if !seen.contains(&id.as_str()) {
                seen.push(id.as_str());
            }
        }
        seen
    }

    /// Seat `member_id` (or empty the slot) and set or clear its role.
    ///
    /// Slots are resized to the row total once the edit is accepted. Fails,
    /// leaving the lineup untouched, if the index is past the row total or
    /// the member already sits in another slot within it.
    pub fn set_slot(
        &mut self,
        slot_index: usize,
        member_id: Option<&str>,
        role: Option<SlotRole>,
    ) -> Result<()> {
        check_rows(&self.rows)?;
        let capacity = self.capacity();

        if slot_index >= capacity {
            return Err(Error::InvalidInput(format!(
                "slot {} is outside a lineup of {} slots",
                slot_index, capacity
            )));
        }

        if let Some(id) = member_id {
            let seated = self
                .slots
                .iter()
                .take(capacity)
                .position(|slot| slot.as_deref() == Some(id));
            if let Some(existing) = seated {
                if existing != slot_index {
                    return Err(Error::InvalidInput(format!(
                        "member {} is already seated in slot {}",
                        id, existing
                    )));
                }
            }
        }

        self.resize_preserving()?;
        self.slots[slot_index] = member_id.map(str::to_string);
        match role {
            Some(role) => {
                self.slot_roles.insert(slot_index, role.as_tag().to_string());
            }
            None => {
                self.slot_roles.remove(&slot_index);
            }
        }
        Ok(())
    }

    /// Empty a slot and drop its role
    pub fn clear_slot(&mut self, slot_index: usize) -> Result<()> {
        self.set_slot(slot_index, None, None)
    }

    /// Empty every slot held by `member_id`. Returns how many were cleared.
    pub fn unseat(&mut self, member_id: &str) -> usize {
        let mut cleared = 0;
        for slot in self.slots.iter_mut() {
            if slot.as_deref() == Some(member_id) {
                *slot = None;
                cleared += 1;
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_position_two_rows() {
        // back row 5, front row 7
        let rows = [5, 7];
        let pos = row_position(&rows, 6);
        assert_eq!(pos.from_back, 2);
        assert_eq!(pos.from_front, 1);

        let pos = row_position(&rows, 0);
        assert_eq!(pos.from_back, 1);
        assert_eq!(pos.from_front, 2);

        let pos = row_position(&rows, 4);
        assert_eq!(pos.from_front, 2);
        let pos = row_position(&rows, 5);
        assert_eq!(pos.from_front, 1);
    }

    #[test]
    fn test_row_position_three_rows() {
        let rows = [4, 4, 4];
        assert_eq!(row_position(&rows, 0).from_front, 3);
        assert_eq!(row_position(&rows, 4).from_front, 2);
        assert_eq!(row_position(&rows, 11).from_front, 1);
    }

    #[test]
    fn test_row_position_out_of_range_is_front_row() {
        assert_eq!(row_position(&[5, 7], 12).from_front, 1);
        assert_eq!(row_position(&[], 0).from_front, 1);
        assert_eq!(row_position(&[], 0).from_back, 1);
    }

    #[test]
    fn test_row_spans() {
        let spans = row_spans(&[3, 0, 2]);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].slots, 0..3);
        assert_eq!(spans[0].from_front, 3);
        assert!(spans[1].slots.is_empty());
        assert_eq!(spans[2].slots, 3..5);
        assert_eq!(spans[2].from_front, 1);
    }

    #[test]
    fn test_parse_rows_text() {
        assert_eq!(parse_rows_text("5,7"), vec![5, 7]);
        assert_eq!(parse_rows_text(" 4, 4 ,4 "), vec![4, 4, 4]);
        assert_eq!(parse_rows_text("3，0,x,2"), vec![3, 2]);
        assert!(parse_rows_text("").is_empty());
    }

    #[test]
    fn test_slot_role_parse() {
        assert_eq!(SlotRole::parse("center"), Some(SlotRole::Center));
        assert_eq!(SlotRole::parse(" CENTER "), Some(SlotRole::Center));
        assert_eq!(SlotRole::parse("guardian"), Some(SlotRole::Guardian));
        assert_eq!(SlotRole::parse("护法"), Some(SlotRole::Guardian));
        assert_eq!(SlotRole::parse("ace"), None);
    }

    #[test]
    fn test_regenerate_discards_assignments() {
        let mut lineup = Lineup::with_rows(vec![5, 7]);
        lineup.set_slot(0, Some("m_a"), Some(SlotRole::Center)).unwrap();
        lineup.set_slot(11, Some("m_b"), None).unwrap();

        lineup.regenerate_from_text("4,4,4").unwrap();

        assert_eq!(lineup.rows, vec![4, 4, 4]);
        assert_eq!(lineup.slots.len(), 12);
        assert!(lineup.slots.iter().all(Option::is_none));
        assert!(lineup.slot_roles.is_empty());
        assert_eq!(lineup.selection_count, Some(12));
    }

    #[test]
    fn test_resize_preserving_keeps_positions() {
        let mut lineup = Lineup::with_rows(vec![2, 2]);
        lineup.set_slot(1, Some("m_a"), None).unwrap();
        lineup.set_slot(3, Some("m_b"), Some(SlotRole::Guardian)).unwrap();

        lineup.rows = vec![2, 3];
        lineup.resize_preserving().unwrap();
        assert_eq!(lineup.slots.len(), 5);
        assert_eq!(lineup.slots[1].as_deref(), Some("m_a"));
        assert_eq!(lineup.slots[3].as_deref(), Some("m_b"));
        assert_eq!(lineup.slots[4], None);

        lineup.rows = vec![3];
        lineup.resize_preserving().unwrap();
        assert_eq!(lineup.slots.len(), 3);
        assert_eq!(lineup.slots[1].as_deref(), Some("m_a"));
        assert_eq!(lineup.position_of("m_b"), None);
        assert_eq!(lineup.role_at(3), None);
        assert!(lineup.slot_roles.is_empty());
    }

    #[test]
    fn test_set_slot_rejects_double_seating() {
        let mut lineup = Lineup::with_rows(vec![5, 7]);
        lineup.set_slot(2, Some("m_a"), None).unwrap();

        let err = lineup.set_slot(3, Some("m_a"), None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(lineup.slots[3], None);

        // Re-seating in the same slot only updates the role
        lineup.set_slot(2, Some("m_a"), Some(SlotRole::Center)).unwrap();
        assert_eq!(lineup.role_at(2), Some(SlotRole::Center));
    }

    #[test]
    fn test_set_slot_rejects_out_of_range() {
        let mut lineup = Lineup::with_rows(vec![2]);
        assert!(lineup.set_slot(2, Some("m_a"), None).is_err());
    }

    #[test]
    fn test_rejected_set_slot_leaves_extra_slots() {
        let mut lineup = Lineup {
            rows: vec![2],
            slots: vec![None, Some("m_b".into()), Some("m_c".into())],
            ..Default::default()
        };
        let before = lineup.clone();

        let err = lineup.set_slot(0, Some("m_b"), None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(lineup, before);

        assert!(lineup.set_slot(2, Some("m_a"), None).is_err());
        assert_eq!(lineup, before);
    }

    #[test]
    fn test_set_slot_ignores_seat_past_row_total() {
        // m_c only sits in a slot that the resize drops
        let mut lineup = Lineup {
            rows: vec![2],
            slots: vec![None, None, Some("m_c".into())],
            ..Default::default()
        };
        lineup.set_slot(0, Some("m_c"), None).unwrap();
        assert_eq!(lineup.slots, vec![Some("m_c".to_string()), None]);
    }

    #[test]
    fn test_oversized_rows_are_rejected() {
        let mut lineup = Lineup::with_rows(vec![5, 7]);
        lineup.set_slot(0, Some("m_a"), None).unwrap();
        let before = lineup.clone();

        assert!(matches!(
            lineup.regenerate_from_text("1000000000"),
            Err(Error::InvalidInput(_))
        ));
        assert!(lineup.regenerate_from_text("200,200,200,200,200,1").is_err());
        assert_eq!(lineup, before);

        lineup.regenerate_from_text("200,200").unwrap();
        assert_eq!(lineup.slots.len(), 400);
    }

    #[test]
    fn test_oversized_persisted_rows_are_not_allocated() {
        let mut lineup = Lineup {
            rows: vec![u32::MAX],
            slots: vec![Some("m_a".into())],
            ..Default::default()
        };
        assert!(lineup.resize_preserving().is_err());
        assert!(lineup.set_slot(5, Some("m_b"), None).is_err());
        assert_eq!(lineup.slots.len(), 1);
        assert!(Lineup::with_rows(vec![u32::MAX]).slots.is_empty());
    }

    #[test]
    fn test_set_slot_pads_short_slot_list() {
        let mut lineup = Lineup {
            rows: vec![5, 7],
            slots: vec![Some("m_a".into())],
            ..Default::default()
        };
        lineup.set_slot(9, Some("m_b"), None).unwrap();
        assert_eq!(lineup.slots.len(), 12);
        assert_eq!(lineup.slots[0].as_deref(), Some("m_a"));
        assert_eq!(lineup.slots[9].as_deref(), Some("m_b"));
    }

    #[test]
    fn test_clear_slot_drops_role() {
        let mut lineup = Lineup::with_rows(vec![3]);
        lineup.set_slot(1, Some("m_a"), Some(SlotRole::Center)).unwrap();
        lineup.clear_slot(1).unwrap();
        assert_eq!(lineup.slots[1], None);
        assert_eq!(lineup.role_at(1), None);
    }

    #[test]
    fn test_unseat_and_seated_members() {
        let mut lineup = Lineup {
            rows: vec![4],
            slots: vec![
                Some("m_a".into()),
                Some("m_b".into()),
                Some("m_a".into()),
                None,
            ],
            ..Default::default()
        };
        assert_eq!(lineup.seated_members(), vec!["m_a", "m_b"]);
        assert_eq!(lineup.unseat("m_a"), 2);
        assert_eq!(lineup.seated_members(), vec!["m_b"]);
    }

    #[test]
    fn test_lineup_json_roundtrip_keeps_unknown_fields() {
        let json = r#"{"rows":[5,7],"slots":["m_a",null],"slotRoles":{"0":"center"},"theme":"red"}"#;
        let lineup: Lineup = serde_json::from_str(json).unwrap();
        assert_eq!(lineup.role_at(0), Some(SlotRole::Center));
        assert_eq!(lineup.extra["theme"], "red");

        let back = serde_json::to_value(&lineup).unwrap();
        assert_eq!(back["slotRoles"]["0"], "center");
        assert_eq!(back["theme"], "red");
        assert!(back.get("selectionCount").is_none());
    }
}
