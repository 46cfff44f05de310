//! Domain types for enrichment ingestion and lookup.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tagged, opaque enrichment payload produced by an updater.
///
/// The payload is never interpreted: it is hashed and stored as-is. Tags form
/// an unordered set used for filtering; their order only matters for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub tags: Vec<String>,
    #[serde(with = "payload_json")]
    pub enrichment: Vec<u8>,
}

impl EnrichmentRecord {
    pub fn new<I, S>(tags: I, enrichment: impl Into<Vec<u8>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            enrichment: enrichment.into(),
        }
    }
}

/// Opaque description of the upstream data version an ingestion was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Externally visible reference to one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunRef(Uuid);

impl RunRef {
    /// Generate a fresh random reference
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for RunRef {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for RunRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind tag on the shared run ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Vulnerability,
    Enrichment,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Vulnerability => "vulnerability",
            UpdateKind::Enrichment => "enrichment",
        }
    }
}

/// A committed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRun {
    /// Store-assigned sequence number; larger is newer
    pub id: i64,
    pub run_ref: RunRef,
    pub updater: String,
    pub fingerprint: Fingerprint,
    pub kind: UpdateKind,
    /// Creation time, milliseconds since epoch
    pub date: i64,
}

/// Payloads are arbitrary bytes. In JSON, bytes that are themselves a
/// non-string JSON value are embedded verbatim; everything else is carried as
/// a JSON string. Either way deserializing yields the original bytes.
mod payload_json {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        match embeddable(bytes) {
            Some(raw) => raw.serialize(s),
            None => s.serialize_str(&String::from_utf8_lossy(bytes)),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let raw = Box::<RawValue>::deserialize(d)?;
        if raw.get().starts_with('"') {
            let text: String =
                serde_json::from_str(raw.get()).map_err(serde::de::Error::custom)?;
            Ok(text.into_bytes())
        } else {
            Ok(raw.get().as_bytes().to_vec())
        }
    }

    // A JSON string payload must stay quoted, and surrounding whitespace
    // would not survive embedding.
    fn embeddable(bytes: &[u8]) -> Option<Box<RawValue>> {
        let text = std::str::from_utf8(bytes).ok()?;
        if text.starts_with('"') {
            return None;
        }
        let raw = RawValue::from_string(text.to_owned()).ok()?;
        (raw.get().len() == text.len()).then_some(raw)
    }
}
