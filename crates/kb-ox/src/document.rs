use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Bytes per megabyte as used for display (binary megabytes).
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A document stored in the knowledge base, as returned by the listing
/// endpoint.
///
/// Field types are read leniently so one odd record cannot spoil a listing:
/// `id` may be a string or a number, `uploadDate` may be `null`, and
/// `fileSize` may be a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    pub file_name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub upload_date: String,
    /// Size in bytes, when the backend reports it
    #[serde(
        default,
        deserialize_with = "lenient_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_size: Option<u64>,
}

/// Any JSON scalar a loosely typed backend might put in a text or size field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Unsigned(n) => n.to_string(),
            Self::Signed(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn into_size(self) -> Option<u64> {
        match self {
            Self::Unsigned(n) => Some(n),
            Self::Signed(n) => u64::try_from(n).ok(),
            Self::Float(n) if n.is_finite() && n >= 0.0 => Some(n.round() as u64),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Float(_) | Self::Bool(_) => None,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(Scalar::into_size))
}

impl Document {
    /// Stable key within a snapshot: the id, or the position when the id is
    /// missing or blank.
    pub fn key(&self, index: usize) -> String {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => index.to_string(),
        }
    }

    /// Size in megabytes with two decimals, e.g. `"1.50"`.
    pub fn size_mb(&self) -> Option<String> {
        self.file_size.map(format_size_mb)
    }

    /// Parsed upload timestamp. Accepts RFC 3339 and naive
    /// `YYYY-MM-DDTHH:MM:SS[.f]` (interpreted as UTC).
    pub fn uploaded_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.upload_date.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt);
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc().fixed_offset())
    }
}

/// Format a byte count as megabytes with two decimals.
pub fn format_size_mb(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mb = bytes as f64 / BYTES_PER_MB;
    format!("{mb:.2}")
}

/// The client's cached copy of the document list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub documents: Vec<Document>,
    /// `false` when the last listing attempt failed and `documents` is an
    /// empty placeholder rather than the backend's answer.
    pub available: bool,
}

impl DocumentSnapshot {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            documents: Vec::new(),
            available: false,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.documents.iter().any(|d| d.file_name == file_name)
    }
}

impl Default for DocumentSnapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
