//! Notice records and their fingerprints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between hashed fields so that "ab"+"c" and "a"+"bc" differ
const FIELD_SEPARATOR: &str = "\u{1f}";

/// One row observed on the notice board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Content fingerprint over title, date, and download URL
    pub id: String,
    /// Row number as displayed by the source; not part of the identity
    #[serde(default)]
    pub serial: String,
    pub title: String,
    pub date: String,
    /// Attachment link, empty when the row has none
    #[serde(default)]
    pub download_url: String,
    #[serde(alias = "timestamp", deserialize_with = "lenient_timestamp::deserialize")]
    pub observed_at: DateTime<Utc>,
}

impl Notice {
    /// Build a notice observed now, computing its identity
    pub fn new(
        serial: impl Into<String>,
        title: impl Into<String>,
        date: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let date = date.into();
        let download_url = download_url.into();
        Self {
            id: notice_id(&title, &date, &download_url),
            serial: serial.into(),
            title,
            date,
            download_url,
            observed_at: Utc::now(),
        }
    }

    /// Attachment link, if the row carried one
    pub fn attachment(&self) -> Option<&str> {
        Some(self.download_url.as_str()).filter(|u| !u.is_empty())
    }
}

/// Deterministic identity of a notice
pub fn notice_id(title: &str, date: &str, download_url: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(title.as_bytes());
    hasher.update(FIELD_SEPARATOR.as_bytes());
    hasher.update(date.as_bytes());
    hasher.update(FIELD_SEPARATOR.as_bytes());
    hasher.update(download_url.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Fingerprint of a whole notice set, independent of row order
pub fn content_fingerprint(notices: &[Notice]) -> String {
    let mut ids: Vec<&str> = notices.iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    blake3::hash(ids.join("\n").as_bytes()).to_hex().to_string()
}

/// Accepts RFC 3339 as well as offset-less ISO timestamps (read as UTC)
mod lenient_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(D::Error::custom)
    }
}
