//! Upload storage
//!
//! Images are decoded, downscaled to the configured width (never enlarged)
//! and re-encoded as JPEG. Audio is stored byte for byte. File names are a
//! millisecond timestamp plus a random suffix, and files are created with
//! `create_new`, so an upload never replaces an existing file.

use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use xjp_common::Result;

/// Extension used when an audio upload has none
pub const DEFAULT_AUDIO_EXT: &str = ".mp3";

const AUDIO_SUBDIR: &str = "audio";
const RANDOM_SUFFIX_LEN: usize = 6;
const MAX_NAME_ATTEMPTS: usize = 5;

fn millis() -> i64 {
    xjp_common::time::now().timestamp_millis()
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// `<millis>-<6 random chars>.jpg`
pub fn image_file_name() -> String {
    format!("{}-{}.jpg", millis(), random_suffix())
}

/// `<millis>-<6 random chars><ext>`; ext from `original`, default `.mp3`
pub fn audio_file_name(original: Option<&str>) -> String {
    format!("{}-{}{}", millis(), random_suffix(), audio_extension(original))
}

/// `.ext` of the uploaded file name, lowercased. Missing or odd extensions
/// fall back to [`DEFAULT_AUDIO_EXT`].
pub fn audio_extension(original: Option<&str>) -> String {
    original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_AUDIO_EXT.to_string())
}

/// Target size for an image at most `max_width` wide, keeping aspect ratio
pub fn bounded_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (u64::from(height) * u64::from(max_width) / u64::from(width)).max(1);
    (max_width, scaled as u32)
}

/// Decode, downscale and JPEG-encode an uploaded image.
pub fn reencode_jpeg(bytes: &[u8], max_width: u32, quality: u8) -> std::result::Result<Vec<u8>, ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = bounded_size(decoded.width(), decoded.height(), max_width);
    let resized: DynamicImage = if width == decoded.width() {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Lanczos3)
    };

    let rgb = resized.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&rgb)?;
    Ok(out.into_inner())
}

/// Create a new file in `dir` named by `next_name` and write `bytes` to it.
///
/// A name that already exists is never opened; another name is drawn
/// instead. Returns the name used.
pub async fn write_new_file<F>(dir: &Path, bytes: &[u8], mut next_name: F) -> Result<String>
where
    F: FnMut() -> String,
{
    for _ in 0..MAX_NAME_ATTEMPTS {
        let name = next_name();
        let opened = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&name))
            .await;
        match opened {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                return Ok(name);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(file = %name, "Upload name taken, drawing another");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free upload name in {}", dir.display()),
    )
    .into())
}

/// Write an already encoded image under `uploads_dir`; returns its URL path.
pub async fn store_image(uploads_dir: &Path, jpeg: &[u8]) -> Result<String> {
    tokio::fs::create_dir_all(uploads_dir).await?;
    let name = write_new_file(uploads_dir, jpeg, image_file_name).await?;
    info!(file = %name, bytes = jpeg.len(), "Stored image upload");
    Ok(format!("/uploads/{}", name))
}

/// Write audio bytes verbatim under `uploads_dir/audio`; returns its URL path.
pub async fn store_audio(uploads_dir: &Path, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
    let dir: PathBuf = uploads_dir.join(AUDIO_SUBDIR);
    tokio::fs::create_dir_all(&dir).await?;
    let name = write_new_file(&dir, bytes, || audio_file_name(original_name)).await?;
    info!(file = %name, bytes = bytes.len(), "Stored audio upload");
    Ok(format!("/uploads/{}/{}", AUDIO_SUBDIR, name))
}
