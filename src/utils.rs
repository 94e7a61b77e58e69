//! # Utility Functions
//!
//! Pure helpers behind the artifact key and metadata builder: content hashing,
//! suffix normalization, filename and key construction, and content-type
//! resolution. Nothing here touches the network or the filesystem.
//!
//! ## Object Layout
//!
//! ```text
//! {event}/{type}/{slug}_{version-tag}_{hash}{-lang}{-variant}.{ext}   versioned
//! {event}/{type}/{slug}_latest{-lang}{-variant}.{ext}                 alias
//! ```
//!
//! Components are joined as given. A slug or tag that itself contains `_` or
//! `-` makes the name ambiguous to parse back; downstream consumers depend on
//! the current shape, so no escaping is applied.
//!
//! ## Example Usage
//!
//! ```rust
//! use webpage_ops::utils::{build_key, normalize_suffix, AssetName};
//!
//! let name = AssetName {
//!     slug: "talk",
//!     version_tag: "v1.0.0",
//!     short_hash: "abcdef123456",
//!     lang_suffix: normalize_suffix(Some("ja")),
//!     variant_suffix: normalize_suffix(None),
//!     ext: ".pdf",
//! };
//! assert_eq!(name.versioned_filename(), "talk_v1.0.0_abcdef123456-ja.pdf");
//! assert_eq!(build_key("iccv2025", "s", &name.alias_filename()), "iccv2025/s/talk_latest-ja.pdf");
//! ```

use std::path::Path;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::{
    ALIAS_MARKER, DEFAULT_CONTENT_TYPE, PDF_CONTENT_TYPE, SHORT_HASH_LENGTH, SUFFIX_SEPARATOR,
};

/// Both hash forms of one byte buffer, computed from a single digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDigest {
    pub short_hash: String,
    pub checksum_b64: String,
}

impl ContentDigest {
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut short_hash = hex::encode(&digest);
        short_hash.truncate(SHORT_HASH_LENGTH);
        Self {
            short_hash,
            checksum_b64: B64.encode(&digest),
        }
    }
}

/// Leading `length` hex characters of the SHA-256 digest of `data`.
///
/// `length` is clamped to the 64 characters of a full digest.
pub fn short_hash(data: &[u8], length: usize) -> String {
    let mut hex = hex::encode(Sha256::digest(data));
    hex.truncate(length);
    hex
}

/// Base64-encoded SHA-256 digest, the form S3 expects for `ChecksumSHA256`.
pub fn checksum_b64(data: &[u8]) -> String {
    B64.encode(Sha256::digest(data))
}

/// Normalizes an optional suffix token into the `-token` form.
///
/// Absent or empty tokens yield an empty string; a token already starting
/// with `-` is kept as is.
pub fn normalize_suffix(token: Option<&str>) -> String {
    match token {
        None | Some("") => String::new(),
        Some(t) if t.starts_with(SUFFIX_SEPARATOR) => t.to_string(),
        Some(t) => format!("{}{}", SUFFIX_SEPARATOR, t),
    }
}

/// Components of a published filename. Suffixes are already normalized and
/// `ext` includes its leading dot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetName<'a> {
    pub slug: &'a str,
    pub version_tag: &'a str,
    pub short_hash: &'a str,
    pub lang_suffix: String,
    pub variant_suffix: String,
    pub ext: &'a str,
}

impl AssetName<'_> {
    pub fn versioned_filename(&self) -> String {
        build_filename(self, false)
    }

    pub fn alias_filename(&self) -> String {
        build_filename(self, true)
    }
}

/// Builds the versioned filename, or the alias filename when `alias` is set.
/// Only the middle segment differs between the two.
pub fn build_filename(name: &AssetName<'_>, alias: bool) -> String {
    let base = if alias {
        format!("{}_{}", name.slug, ALIAS_MARKER)
    } else {
        format!("{}_{}_{}", name.slug, name.version_tag, name.short_hash)
    };
    format!("{}{}{}{}", base, name.lang_suffix, name.variant_suffix, name.ext)
}

/// Builds the object key `{event}/{type_code}/{filename}` with no leading slash.
pub fn build_key(event: &str, type_code: &str, filename: &str) -> String {
    format!(
        "{}/{}/{}",
        trim_segment(event),
        trim_segment(type_code),
        filename
    )
}

fn trim_segment(segment: &str) -> &str {
    segment.trim_matches(|c| c == '/' || c == ' ')
}

/// Infers a content type from the filename extension.
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// Inline Content-Disposition for PDFs, `None` for every other type.
pub fn content_disposition_for(content_type: &str, filename: &str) -> Option<String> {
    if content_type != PDF_CONTENT_TYPE {
        return None;
    }
    let display_name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    Some(format!("inline; filename=\"{}\"", display_name))
}

/// Generates a unique identifier for a single tool invocation.
///
/// Format: `{timestamp_millis}-{uuid}`, sortable by creation time.
pub fn generate_unique_identifier() -> String {
    let uuid_part = Uuid::new_v4().to_string();
    let timestamp = Utc::now().timestamp_millis();
    format!("{}-{}", timestamp, uuid_part)
}
