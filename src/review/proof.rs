//! Evidence rules for low ratings, shared by the submission form, the edit dialog,
//! the moderation queue and the server handlers.
//!
//! The client runs these checks for fast feedback only. Nothing stops a direct API
//! call from skipping them, so the server re-runs the same functions on every create
//! and update before touching storage.

use crate::error::ValidationError;
use crate::models::review::Rating;
use base64::{engine::general_purpose::STANDARD, Engine};

/// Highest rating that still requires proof.
pub const LOW_RATING_MAX: u8 = 3;
pub const MIN_ORDER_NUMBER_LEN: usize = 3;
pub const MAX_PROOF_PHOTOS: usize = 5;
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;
pub const COMMENT_MIN_LEN: usize = 10;
pub const COMMENT_MAX_LEN: usize = 1000;
pub const ALLOWED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];
/// Decoded size cap for an attached chat transcript.
pub const MAX_CHAT_HISTORY_BYTES: usize = 10 * 1024 * 1024;
/// Room for the `data:<mime>;base64,` prefix of an encoded file.
const DATA_URL_PREFIX_LEN: usize = 128;
/// Largest JSON body the API accepts: every photo and a transcript at their
/// caps after base64 expansion, plus the rest of the review.
pub const MAX_REQUEST_BODY_BYTES: usize = MAX_PROOF_PHOTOS * encoded_len(MAX_PHOTO_BYTES)
    + encoded_len(MAX_CHAT_HISTORY_BYTES)
    + 64 * 1024;

/// Length of a data URL carrying `bytes` of base64 payload.
const fn encoded_len(bytes: usize) -> usize {
    bytes.div_ceil(3) * 4 + DATA_URL_PREFIX_LEN
}

pub fn requires_proof(rating: Rating) -> bool {
    rating.get() <= LOW_RATING_MAX
}

pub fn has_sufficient_proof(order_number: Option<&str>, photos: &[String]) -> bool {
    order_number_is_valid(order_number) && !photos.is_empty()
}

fn order_number_is_valid(order_number: Option<&str>) -> bool {
    order_number.is_some_and(|n| n.trim().chars().count() >= MIN_ORDER_NUMBER_LEN)
}

/// Counts characters after trimming, the form in which comments are stored.
pub fn validate_comment(comment: &str) -> Result<(), ValidationError> {
    let len = comment.trim().chars().count();
    if len < COMMENT_MIN_LEN {
        return Err(ValidationError::CommentTooShort { min: COMMENT_MIN_LEN });
    }
    if len > COMMENT_MAX_LEN {
        return Err(ValidationError::CommentTooLong { max: COMMENT_MAX_LEN });
    }
    Ok(())
}

/// Checks the proof requirement for `rating`, reporting the first missing field.
/// Photo contents are only inspected when proof is required.
pub fn validate_proof(
    rating: Rating,
    order_number: Option<&str>,
    photos: &[String],
) -> Result<(), ValidationError> {
    if !requires_proof(rating) {
        return Ok(());
    }
    if !order_number_is_valid(order_number) {
        return Err(ValidationError::MissingOrderNumber);
    }
    if photos.is_empty() {
        return Err(ValidationError::MissingPhotos);
    }
    if photos.len() > MAX_PROOF_PHOTOS {
        return Err(ValidationError::TooManyPhotos { max: MAX_PROOF_PHOTOS });
    }
    for (i, photo) in photos.iter().enumerate() {
        validate_photo(photo).map_err(|reason| ValidationError::InvalidPhoto { index: i + 1, reason })?;
    }
    Ok(())
}

/// Full check of a review as it would be stored.
pub fn validate_review(
    rating: Rating,
    comment: &str,
    order_number: Option<&str>,
    photos: &[String],
) -> Result<(), ValidationError> {
    validate_comment(comment)?;
    validate_proof(rating, order_number, photos)
}

/// A chat transcript is stored as an opaque string; only its size is checked.
/// Blank input counts as no transcript.
pub fn clean_chat_history(chat_history: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(chat) = chat_history.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if chat.len() > encoded_len(MAX_CHAT_HISTORY_BYTES) {
        return Err(ValidationError::ChatHistoryTooLarge { max_mb: MAX_CHAT_HISTORY_BYTES / (1024 * 1024) });
    }
    Ok(Some(chat.to_string()))
}

/// Validates a `data:image/...;base64,` photo: allowed type, size and file signature.
pub fn validate_photo(data_url: &str) -> Result<(), String> {
    let rest = data_url
        .strip_prefix("data:")
        .filter(|r| r.starts_with("image/"))
        .ok_or_else(|| "file must be an image (JPG, PNG, WEBP)".to_string())?;
    let (header, encoded) = rest
        .split_once(',')
        .ok_or_else(|| "malformed image data".to_string())?;
    let mime = header.split(';').next().unwrap_or_default();
    if !ALLOWED_PHOTO_TYPES.contains(&mime) {
        return Err(format!("image type {mime} is not allowed, only JPG, PNG, WEBP"));
    }
    if !header.ends_with(";base64") {
        return Err("image data must be base64 encoded".to_string());
    }
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("invalid image data: {e}"))?;
    validate_photo_size(bytes.len())?;
    if !has_image_signature(&bytes) {
        return Err("file is not a valid image".to_string());
    }
    Ok(())
}

pub fn validate_photo_size(len: usize) -> Result<(), String> {
    if len > MAX_PHOTO_BYTES {
        let mb = len as f64 / (1024.0 * 1024.0);
        return Err(format!("file too large ({mb:.1} MB), maximum is 10 MB"));
    }
    Ok(())
}

pub fn is_allowed_photo_type(mime: &str) -> bool {
    ALLOWED_PHOTO_TYPES.contains(&mime)
}

fn has_image_signature(bytes: &[u8]) -> bool {
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let webp = bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP";
    bytes.starts_with(JPEG) || bytes.starts_with(PNG) || webp
}
