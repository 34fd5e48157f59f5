//! Released single record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use crate::ids;
use crate::lineup::{Lineup, DEFAULT_ROWS};
use crate::time::iso_date_opt;

/// Separator between the series label and the name in a single title
pub const TITLE_SEPARATOR: char = '·';

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub no: u32,

    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub is_aside: bool,

    /// Uploaded audio path, `/uploads/audio/...`
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub audio: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Single {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    /// Full title, e.g. `1st Single · Neon Bloom`
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,

    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub release: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover: Option<String>,

    #[serde(default, deserialize_with = "lenient::items")]
    pub tracks: Vec<Track>,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub aside_lineup: Lineup,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Series label and name of a single title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleParts {
    pub prefix: String,
    pub name: String,
}

/// Split `"1st Single · Neon Bloom"` into `1st Single` / `Neon Bloom`.
///
/// Titles without a separator have an empty prefix.
pub fn split_title(title: &str) -> TitleParts {
    let trimmed = title.trim();
    let parts: Vec<&str> = trimmed
        .split(TITLE_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() <= 1 {
        return TitleParts {
            prefix: String::new(),
            name: trimmed.to_string(),
        };
    }
    TitleParts {
        prefix: parts[0].to_string(),
        name: parts[1..].join(" · "),
    }
}

impl Single {
    /// Draft for the admin "new single" action: default row layout, empty
    /// slots and three tracks with track 1 as the A-side.
    pub fn new_draft() -> Self {
        let tracks = (1..=3)
            .map(|no| Track {
                no,
                title: if no == 1 { "(A-side)".to_string() } else { String::new() },
                is_aside: no == 1,
                audio: None,
                extra: Map::new(),
            })
            .collect();
        Single {
            id: ids::generate("s"),
            title: String::new(),
            release: None,
            cover: None,
            tracks,
            aside_lineup: Lineup::with_rows(DEFAULT_ROWS.to_vec()),
            extra: Map::new(),
        }
    }

    /// Parsed release date; `None` when absent or unparsable
    pub fn release_date(&self) -> Option<NaiveDate> {
        iso_date_opt(self.release.as_deref())
    }

    pub fn title_parts(&self) -> TitleParts {
        split_title(&self.title)
    }

    /// The A-side track: the flagged one, else the first
    pub fn aside_track(&self) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.is_aside)
            .or_else(|| self.tracks.first())
    }

    /// Keep at least one track, renumber 1..n and flag only the first as
    /// the A-side.
    pub fn normalize_tracks(&mut self) {
        if self.tracks.is_empty() {
            self.tracks.push(Track::default());
        }
        for (i, track) in self.tracks.iter_mut().enumerate() {
            track.no = i as u32 + 1;
            track.is_aside = i == 0;
            if track.audio.as_deref() == Some("") {
                track.audio = None;
            }
        }
    }
}
