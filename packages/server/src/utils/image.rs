use chrono::{DateTime, Utc};
use common::storage::ObjectKey;

use crate::error::AppError;

/// Key prefix for uploaded recipe images.
pub const IMAGE_KEY_PREFIX: &str = "recipes";

/// Maximum length of the sanitized filename part of an object key.
const MAX_FILENAME_LENGTH: usize = 100;

/// Result of validating an uploaded filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Der Dateiname darf nicht leer sein",
            Self::ContainsPathSeparator => "Ungültiger Dateiname: Pfadtrenner sind nicht erlaubt",
            Self::NullByte => "Ungültiger Dateiname: Null-Bytes sind nicht erlaubt",
            Self::Hidden => "Ungültiger Dateiname: versteckte Dateien sind nicht erlaubt",
            Self::ControlCharacter => "Ungültiger Dateiname: Steuerzeichen sind nicht erlaubt",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Rewrite a filename into the character set allowed in object keys.
///
/// German umlauts are transliterated, every other disallowed character
/// becomes `-`, and runs of `-` collapse into one.
pub fn sanitize_filename(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    for c in filename.chars() {
        let replacement = match c {
            'ä' => "ae",
            'ö' => "oe",
            'ü' => "ue",
            'Ä' => "Ae",
            'Ö' => "Oe",
            'Ü' => "Ue",
            'ß' => "ss",
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => {
                out.push(c);
                continue;
            }
            _ => "-",
        };
        if replacement == "-" && out.ends_with('-') {
            continue;
        }
        out.push_str(replacement);
    }

    let trimmed = out.trim_matches(|c| c == '-' || c == '.');
    let mut name: String = trimmed.chars().take(MAX_FILENAME_LENGTH).collect();
    if name.is_empty() {
        name.push_str("bild");
    }
    name
}

/// Image types accepted for upload, with the extension their keys end in.
const ACCEPTED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
];

/// Object key for an uploaded image, namespaced by owner and submission time:
/// `recipes/{user_id}-{unix_millis}-{stem}.{ext}`.
///
/// The extension is taken from the accepted content type, never from the
/// uploaded filename.
pub fn image_object_key(
    user_id: i32,
    submitted_at: DateTime<Utc>,
    filename: &str,
    content_type: &str,
) -> Result<ObjectKey, AppError> {
    let filename = validate_flat_filename(filename)
        .map_err(|e| AppError::Validation(e.message().into()))?;
    let ext = extension_for(content_type)
        .ok_or_else(|| AppError::Validation("Nur Bilddateien sind erlaubt".into()))?;
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };
    let key = format!(
        "{IMAGE_KEY_PREFIX}/{user_id}-{}-{}.{ext}",
        submitted_at.timestamp_millis(),
        sanitize_filename(stem)
    );
    Ok(ObjectKey::parse(&key)?)
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    ACCEPTED_IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

/// Resolve the image MIME type of an upload.
///
/// The filename must carry the extension of an accepted image type. A
/// declared content type that is not `application/octet-stream` has to
/// agree with it. Returns `None` when the upload is not an accepted image.
pub fn image_content_type(filename: &str, declared: Option<&str>) -> Option<String> {
    let guessed: Vec<String> = mime_guess::from_path(filename)
        .iter()
        .map(|m| m.essence_str().to_string())
        .filter(|m| extension_for(m).is_some())
        .collect();
    let first = guessed.first()?;

    match declared.map(|d| d.split(';').next().unwrap_or(d).trim().to_ascii_lowercase()) {
        None => Some(first.clone()),
        Some(d) if d.is_empty() || d == "application/octet-stream" => Some(first.clone()),
        Some(d) => guessed.into_iter().find(|g| *g == d),
    }
}

/// Content type under which a stored object is served, derived from the key
/// extension written at upload. Keys outside the accepted image types get
/// `None` and must be served as a download.
pub fn served_image_type(key: &str) -> Option<&'static str> {
    let (_, ext) = key.rsplit_once('.')?;
    ACCEPTED_IMAGE_TYPES
        .iter()
        .find(|(_, e)| e.eq_ignore_ascii_case(ext))
        .map(|(mime, _)| *mime)
}
