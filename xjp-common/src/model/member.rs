//! Roster member record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::history::SelectionHistory;
use super::lenient;
use crate::ids;
use crate::time::iso_date_opt;
use crate::{Error, Result};

/// Graduation song titles meaning "no graduation song"
const NO_GRADUATION_SONG: [&str; 2] = ["无", "none"];

/// One general-election result line, e.g. `{edition: "第一届", rank: "十四位"}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectionRank {
    #[serde(default, deserialize_with = "lenient::text")]
    pub edition: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rank: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,

    /// Generation tag such as `1期`
    #[serde(default, deserialize_with = "lenient::text")]
    pub generation: String,

    #[serde(default = "default_active", deserialize_with = "lenient::active_flag")]
    pub is_active: bool,

    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub graduation_date: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub graduation_song_title: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar: Option<String>,

    #[serde(default, deserialize_with = "lenient::items")]
    pub election_ranks: Vec<ElectionRank>,

    /// Derived by the selection engine; see [`crate::selection`]
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub selection_history: SelectionHistory,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl Member {
    /// Draft for the admin "new member" action
    pub fn new_draft() -> Self {
        Member {
            id: ids::generate("m"),
            name: String::new(),
            generation: String::new(),
            is_active: true,
            graduation_date: None,
            graduation_song_title: None,
            avatar: None,
            election_ranks: Vec::new(),
            selection_history: SelectionHistory::new(),
            extra: Map::new(),
        }
    }

    /// Graduation song to display, hiding the "no song" placeholder
    pub fn display_graduation_song(&self) -> Option<&str> {
        self.graduation_song_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !NO_GRADUATION_SONG.contains(t))
    }

    /// Check the record before an admin save is applied.
    ///
    /// A graduated member needs a graduation date and a graduation song title
    /// (`无`/`none` for "no graduation song").
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("member id must not be empty".to_string()));
        }
        if self.is_active {
            return Ok(());
        }
        if iso_date_opt(self.graduation_date.as_deref()).is_none() {
            return Err(Error::Validation(format!(
                "graduated member {} needs a graduation date (YYYY-MM-DD)",
                self.id
            )));
        }
        let song = self
            .graduation_song_title
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if song.is_empty() {
            return Err(Error::Validation(format!(
                "graduated member {} needs a graduation song title (use \"none\" if there is none)",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_member_decodes_original_shape() {
        let member: Member = serde_json::from_value(json!({
            "id": "m_akari",
            "name": "星野 明里",
            "generation": "1期",
            "isActive": true,
            "avatar": "/uploads/1.jpg",
            "profile": {"height": "160cm"},
            "electionRanks": [{"edition": "第一届", "rank": "一位"}],
            "selectionHistory": {"1st Single": "A面选拔（center）"}
        }))
        .unwrap();

        assert_eq!(member.id, "m_akari");
        assert!(member.is_active);
        assert_eq!(member.election_ranks[0].rank, "一位");
        assert_eq!(member.selection_history.len(), 1);
        assert_eq!(member.extra["profile"]["height"], "160cm");

        let back = serde_json::to_value(&member).unwrap();
        assert_eq!(back["profile"]["height"], "160cm");
        assert_eq!(back["isActive"], true);
        assert_eq!(back["selectionHistory"]["1st Single"], "A面选拔（center）");
    }

    #[test]
    fn test_validate_active_member() {
        let member = Member::new_draft();
        assert!(member.validate().is_ok());
    }

    #[test]
    fn test_validate_graduation_requires_date_and_song() {
        let mut member = Member::new_draft();
        member.is_active = false;
        assert!(matches!(member.validate(), Err(Error::Validation(_))));

        member.graduation_date = Some("2025-12-31".to_string());
        assert!(matches!(member.validate(), Err(Error::Validation(_))));

        member.graduation_song_title = Some("无".to_string());
        assert!(member.validate().is_ok());
        assert_eq!(member.display_graduation_song(), None);

        member.graduation_song_title = Some("Farewell Lights".to_string());
        assert_eq!(member.display_graduation_song(), Some("Farewell Lights"));

        member.graduation_date = Some("someday".to_string());
        assert!(member.validate().is_err());
    }
}
