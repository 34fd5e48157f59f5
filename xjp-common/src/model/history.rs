//! Per-single selection status of a member
//!
//! `selectionHistory` maps a single id to a [`HistoryEntry`]. Derived entries
//! are [`SelectionStatus`] values written by the selection engine; the only
//! hand-authored status is [`SelectionStatus::JoinedBefore`]. Older documents
//! stored free text (sometimes under title keys); such values are kept as
//! [`HistoryEntry::Legacy`] until key migration and derivation replace them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::lineup::SlotRole;

/// Override marker text recognized in legacy free-text entries
pub const JOINED_BEFORE_MARKER: &str = "joined before this release";

/// Marker used by the first versions of the admin UI
const JOINED_BEFORE_MARKER_LEGACY: &str = "加入前";

/// single id → entry
pub type SelectionHistory = BTreeMap<String, HistoryEntry>;

/// Canonical selection status of a member for one single
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionStatus {
    /// Member was in the group but not seated in the A-side lineup
    NotSelected,
    /// Member joined after this single's selection was decided
    JoinedBefore,
    /// Seated in the A-side lineup; `row` counts from the front (1 = front)
    Aside {
        row: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<SlotRole>,
    },
}

impl SelectionStatus {
    pub fn is_selected(&self) -> bool {
        matches!(self, SelectionStatus::Aside { .. })
    }
}

impl fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionStatus::NotSelected => f.write_str("Not selected"),
            SelectionStatus::JoinedBefore => f.write_str("Joined before this release"),
            SelectionStatus::Aside { row, role: None } => {
                write!(f, "A-side selection (row {})", row)
            }
            SelectionStatus::Aside {
                row,
                role: Some(role),
            } => write!(f, "A-side selection (row {}, {})", row, role),
        }
    }
}

/// A stored `selectionHistory` value
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Status(SelectionStatus),
    /// Free text or structured value from an older schema
    Legacy(Value),
}

impl HistoryEntry {
    /// Wrap a JSON value, recognizing tagged statuses and the joined-before
    /// override in free text.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) if is_joined_before_text(&text) => {
                HistoryEntry::Status(SelectionStatus::JoinedBefore)
            }
            Value::Object(ref map) if map.contains_key("kind") => {
                match serde_json::from_value::<SelectionStatus>(value.clone()) {
                    Ok(status) => HistoryEntry::Status(status),
                    Err(_) => HistoryEntry::Legacy(value),
                }
            }
            other => HistoryEntry::Legacy(other),
        }
    }

    pub fn status(&self) -> Option<SelectionStatus> {
        match self {
            HistoryEntry::Status(status) => Some(*status),
            HistoryEntry::Legacy(_) => None,
        }
    }

    /// Whether this entry is the manual "joined before this release" override
    pub fn is_joined_before(&self) -> bool {
        matches!(self, HistoryEntry::Status(SelectionStatus::JoinedBefore))
    }

    /// `singleId` embedded in a structured legacy value
    pub fn embedded_single_id(&self) -> Option<&str> {
        match self {
            HistoryEntry::Legacy(Value::Object(map)) => map
                .get("singleId")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty()),
            _ => None,
        }
    }
}

impl From<SelectionStatus> for HistoryEntry {
    fn from(status: SelectionStatus) -> Self {
        HistoryEntry::Status(status)
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryEntry::Status(status) => status.fmt(f),
            HistoryEntry::Legacy(Value::String(text)) => f.write_str(text),
            HistoryEntry::Legacy(other) => write!(f, "{}", other),
        }
    }
}

impl Serialize for HistoryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HistoryEntry::Status(status) => status.serialize(serializer),
            HistoryEntry::Legacy(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for HistoryEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(HistoryEntry::from_value)
    }
}

/// Free-text override detection used for legacy values
pub fn is_joined_before_text(text: &str) -> bool {
    text.contains(JOINED_BEFORE_MARKER_LEGACY)
        || text.to_lowercase().contains(JOINED_BEFORE_MARKER)
}
