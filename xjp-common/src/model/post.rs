//! Blog post record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use crate::ids;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,

    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover: Option<String>,

    /// Rich-text HTML body
    #[serde(default, deserialize_with = "lenient::text")]
    pub content: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    pub fn new_draft() -> Self {
        Post {
            id: ids::generate("p"),
            ..Default::default()
        }
    }
}
