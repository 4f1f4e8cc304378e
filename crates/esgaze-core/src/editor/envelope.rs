//! Versioned cache envelope shared by both persistent tiers.
//!
//! An envelope wraps an opaque payload with the schema version it was written
//! under and a write timestamp. A version mismatch or a stale timestamp is a
//! cache miss, never an error: the persisted evidence is advisory and the
//! coordinator must stay on its load path regardless of what the tiers hold.

use crate::config::EditorCacheConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope persisted in the local store and the host cache.
///
/// Serialized as camelCase JSON to match the records the frontend shell
/// reads back for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope {
    /// Editor schema version this envelope was written under.
    pub schema_version: String,
    /// Write time, milliseconds since the Unix epoch.
    pub written_at_epoch_millis: i64,
    /// Opaque payload (a serialized load record).
    pub payload: String,
}

impl CacheEnvelope {
    /// Create an envelope stamped with the current time.
    pub fn new(schema_version: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            schema_version: schema_version.into(),
            written_at_epoch_millis: Utc::now().timestamp_millis(),
            payload: payload.into(),
        }
    }

    /// Whether this envelope was written under the given schema version.
    pub fn matches_version(&self, schema_version: &str) -> bool {
        self.schema_version == schema_version
    }

    /// Envelope age in milliseconds at `now`. Clamped to zero for clock skew.
    pub fn age_millis(&self, now: DateTime<Utc>) -> i64 {
        (now.timestamp_millis() - self.written_at_epoch_millis).max(0)
    }

    /// Whether the local-store TTL (24 hours) has elapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age_millis(now) as u128 > EditorCacheConfig::LOCAL_TTL.as_millis()
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a persisted envelope and gate it on version and TTL.
    ///
    /// Returns `None` for unparseable JSON, a version mismatch, or an expired
    /// envelope; all three are ordinary cache misses.
    pub fn parse_valid(raw: &str, schema_version: &str, now: DateTime<Utc>) -> Option<Self> {
        let envelope: CacheEnvelope = serde_json::from_str(raw).ok()?;
        if !envelope.matches_version(schema_version) || envelope.is_expired(now) {
            return None;
        }
        Some(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn envelope_written_at(version: &str, written_at: DateTime<Utc>) -> CacheEnvelope {
        CacheEnvelope {
            schema_version: version.into(),
            written_at_epoch_millis: written_at.timestamp_millis(),
            payload: "{}".into(),
        }
    }

    #[test]
    fn test_json_roundtrip_is_camel_case() {
        let envelope = CacheEnvelope::new("0.52.2", "payload");
        let json = envelope.to_json().unwrap();
        assert!(json.contains("\"schemaVersion\""));
        assert!(json.contains("\"writtenAtEpochMillis\""));

        let parsed: CacheEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_version_mismatch_is_a_miss() {
        let now = Utc::now();
        let envelope = envelope_written_at("0.51.0", now);
        let raw = envelope.to_json().unwrap();
        assert!(CacheEnvelope::parse_valid(&raw, "0.52.2", now).is_none());
        assert!(CacheEnvelope::parse_valid(&raw, "0.51.0", now).is_some());
    }

    #[test]
    fn test_expired_envelope_is_a_miss_even_when_version_matches() {
        let now = Utc::now();
        let stale = envelope_written_at("0.52.2", now - Duration::hours(25));
        let raw = stale.to_json().unwrap();
        assert!(CacheEnvelope::parse_valid(&raw, "0.52.2", now).is_none());

        let fresh = envelope_written_at("0.52.2", now - Duration::hours(23));
        let raw = fresh.to_json().unwrap();
        assert!(CacheEnvelope::parse_valid(&raw, "0.52.2", now).is_some());
    }

    #[test]
    fn test_garbage_json_is_a_miss() {
        assert!(CacheEnvelope::parse_valid("not json", "0.52.2", Utc::now()).is_none());
    }

    #[test]
    fn test_age_clamps_clock_skew() {
        let now = Utc::now();
        let future = envelope_written_at("0.52.2", now + Duration::minutes(5));
        assert_eq!(future.age_millis(now), 0);
        assert!(!future.is_expired(now));
    }
}
