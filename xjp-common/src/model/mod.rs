//! Site document model
//!
//! The whole site is one JSON document `{members, singles, posts}`. Every
//! field decodes leniently and unknown fields survive a round trip, so a
//! document written by an older or newer front end is never truncated.

pub mod history;
pub mod lenient;
pub mod member;
pub mod post;
pub mod single;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use history::{HistoryEntry, SelectionHistory, SelectionStatus};
pub use member::{ElectionRank, Member};
pub use post::Post;
pub use single::{split_title, Single, TitleParts, Track};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "lenient::items")]
    pub members: Vec<Member>,

    #[serde(default, deserialize_with = "lenient::items")]
    pub singles: Vec<Single>,

    #[serde(default, deserialize_with = "lenient::items")]
    pub posts: Vec<Post>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Decode a document from JSON text.
    ///
    /// Text that is not a JSON object yields an empty document.
    pub fn from_json_lenient(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value_lenient(value),
            Err(_) => Document::default(),
        }
    }

    /// Decode a document from a JSON value; non-objects yield an empty document.
    pub fn from_value_lenient(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Document::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.singles.is_empty() && self.posts.is_empty()
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn member_mut(&mut self, id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    pub fn single(&self, id: &str) -> Option<&Single> {
        self.singles.iter().find(|s| s.id == id)
    }

    pub fn single_mut(&mut self, id: &str) -> Option<&mut Single> {
        self.singles.iter_mut().find(|s| s.id == id)
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_shape() {
        let value = serde_json::to_value(Document::default()).unwrap();
        assert_eq!(value, json!({"members": [], "singles": [], "posts": []}));
    }

    #[test]
    fn test_malformed_top_level_is_empty() {
        assert!(Document::from_json_lenient("not json").is_empty());
        assert!(Document::from_json_lenient("[1,2,3]").is_empty());

        let doc = Document::from_json_lenient(r#"{"members": 5, "singles": null}"#);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let doc = Document::from_value_lenient(json!({
            "members": [{"id": "m1"}, null, 3, {"id": "m2"}],
            "singles": [{"id": "s1"}],
            "posts": [],
            "version": 2
        }));
        assert_eq!(doc.members.len(), 2);
        assert_eq!(doc.singles.len(), 1);
        assert_eq!(doc.extra["version"], 2);
        assert!(doc.member("m2").is_some());
        assert!(doc.single("s1").is_some());
        assert!(doc.post("p1").is_none());
    }
}
