//! Uploaded media URL helpers
//!
//! Documents store uploads as site-relative paths (`/uploads/...`) so they
//! work from any host the service is reached through. Absolute URLs that
//! slipped in (an admin session behind a tunnel, a pasted link) are cut back
//! to the relative path before storing, and relative paths get the API base
//! prepended again when rendered.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Document;

/// URL path prefix of uploaded files
pub const UPLOADS_PREFIX: &str = "/uploads/";

static ABSOLUTE_UPLOADS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://[^/]+(/uploads/.*)$").expect("valid absolute uploads regex")
});

static ABSOLUTE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("valid absolute url regex"));

static HTML_UPLOADS_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(src|href)=("|')/uploads/"#).expect("valid uploads attribute regex")
});

/// `http(s)://host[:port]/uploads/x` → `/uploads/x`; anything else unchanged.
pub fn to_relative_uploads_url(value: &str) -> String {
    if value.starts_with(UPLOADS_PREFIX) {
        return value.to_string();
    }
    ABSOLUTE_UPLOADS
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| value.to_string())
}

fn relativize(slot: &mut Option<String>) {
    if let Some(value) = slot.as_mut() {
        *value = to_relative_uploads_url(value);
    }
}

/// Rewrite every media field of the document to a relative uploads path.
///
/// Touches member avatars, single covers, track audio and post covers.
pub fn relativize_document(document: &mut Document) {
    for member in document.members.iter_mut() {
        relativize(&mut member.avatar);
    }
    for single in document.singles.iter_mut() {
        relativize(&mut single.cover);
        for track in single.tracks.iter_mut() {
            relativize(&mut track.audio);
        }
    }
    for post in document.posts.iter_mut() {
        relativize(&mut post.cover);
    }
}

fn base_prefix(base: Option<&str>) -> Option<&str> {
    base.map(|b| b.trim().trim_end_matches('/'))
        .filter(|b| !b.is_empty())
}

/// URL to render for a stored media value.
///
/// Absolute URLs pass through; `/uploads/...` gets `base` prepended when one
/// is configured.
pub fn resolve_media_url(base: Option<&str>, value: &str) -> String {
    let is_absolute = ABSOLUTE_URL.is_match(value);
    match base_prefix(base) {
        Some(base) if !is_absolute && value.starts_with(UPLOADS_PREFIX) => {
            format!("{}{}", base, value)
        }
        _ => value.to_string(),
    }
}

/// Point `src`/`href` attributes of rich-text HTML at `base` for uploads.
pub fn resolve_html_media(base: Option<&str>, html: &str) -> String {
    let Some(base) = base_prefix(base) else {
        return html.to_string();
    };
    let replacement = format!("${{1}}=${{2}}{}/uploads/", base.replace('$', "$$"));
    HTML_UPLOADS_ATTR
        .replace_all(html, replacement.as_str())
        .into_owned()
}
