//! JSON document file
//!
//! The whole site lives in one pretty-printed JSON file. The primary location
//! is `<root>/data/db.json`; `<root>/db.json` is accepted for older
//! deployments. Writes go to a temporary file which is then renamed over the
//! document, so a reader never sees a half-written file.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use xjp_common::{Document, Result};

const PRIMARY: &str = "data/db.json";
const FALLBACK: &str = "db.json";

/// Candidate document paths, in lookup order
pub fn candidate_paths(root: &Path) -> [PathBuf; 2] {
    [root.join(PRIMARY), root.join(FALLBACK)]
}

/// First existing candidate, else the primary path
pub fn resolve_document_path(root: &Path) -> PathBuf {
    let [primary, fallback] = candidate_paths(root);
    if primary.exists() {
        primary
    } else if fallback.exists() {
        fallback
    } else {
        primary
    }
}

fn encode(document: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

pub struct DocumentRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DocumentRepository {
    /// Locate the document under `root`, creating an empty one at the
    /// primary path when neither candidate exists.
    pub async fn open(root: &Path) -> Result<Self> {
        let path = resolve_document_path(root);
        if !path.exists() {
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            tokio::fs::write(&path, encode(&Document::default())?).await?;
            info!("Created empty document at {}", path.display());
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. Content that is not a JSON object is served as an
    /// empty document.
    pub async fn read(&self) -> Result<Document> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(value @ Value::Object(_)) => Ok(Document::from_value_lenient(value)),
            Ok(_) => {
                warn!("{} is not a JSON object; serving an empty document", self.path.display());
                Ok(Document::default())
            }
            Err(e) => {
                warn!("{} is not valid JSON ({}); serving an empty document", self.path.display(), e);
                Ok(Document::default())
            }
        }
    }

    /// Replace the document atomically
    pub async fn write(&self, document: &Document) -> Result<()> {
        let text = encode(document)?;
        let _guard = self.write_lock.lock().await;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            members = document.members.len(),
            singles = document.singles.len(),
            posts = document.posts.len(),
            "Document written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xjp_common::model::Post;

    #[tokio::test]
    async fn test_open_creates_primary() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DocumentRepository::open(dir.path()).await.unwrap();
        assert_eq!(repo.path(), dir.path().join("data/db.json"));

        let text = std::fs::read_to_string(repo.path()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"members": [], "singles": [], "posts": []}));
        assert!(text.contains('\n'), "document is pretty-printed");
    }

    #[tokio::test]
    async fn test_fallback_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db.json"), r#"{"members":[{"id":"m1"}]}"#).unwrap();

        let repo = DocumentRepository::open(dir.path()).await.unwrap();
        assert_eq!(repo.path(), dir.path().join("db.json"));
        assert_eq!(repo.read().await.unwrap().members.len(), 1);
        assert!(!dir.path().join("data/db.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/db.json"), "{ not json").unwrap();

        let repo = DocumentRepository::open(dir.path()).await.unwrap();
        assert!(repo.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DocumentRepository::open(dir.path()).await.unwrap();

        let mut doc = Document::default();
        doc.posts.push(Post {
            id: "p1".into(),
            title: "Hello".into(),
            ..Default::default()
        });
        repo.write(&doc).await.unwrap();

        assert_eq!(repo.read().await.unwrap(), doc);
        assert!(!dir.path().join("data/db.json.tmp").exists());
    }
}
