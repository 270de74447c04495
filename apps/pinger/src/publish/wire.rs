//! Status stream wire schema.
//!
//! A status payload is a JSON array with one entry per endpoint, in settings
//! order. Each entry is a fixed three element array:
//!
//! ```text
//! [address: string, reachable: bool, lastChange: RFC 3339 timestamp]
//! ```
//!
//! e.g. `[["10.0.0.1",true,"2024-03-07T09:05:01.123456Z"]]`

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::monitoring::types::Endpoint;

/// One endpoint as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord(
    pub String,
    pub bool,
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub DateTime<Utc>,
);

impl EndpointRecord {
    pub fn address(&self) -> &str {
        &self.0
    }

    pub fn reachable(&self) -> bool {
        self.1
    }

    pub fn last_change(&self) -> DateTime<Utc> {
        self.2
    }
}

impl From<&Endpoint> for EndpointRecord {
    fn from(endpoint: &Endpoint) -> Self {
        Self(endpoint.address().to_owned(), endpoint.reachable(), endpoint.last_change())
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

pub fn encode(endpoints: &[Endpoint]) -> serde_json::Result<Vec<u8>> {
    let records: Vec<EndpointRecord> = endpoints.iter().map(EndpointRecord::from).collect();
    serde_json::to_vec(&records)
}

pub fn decode(payload: &[u8]) -> serde_json::Result<Vec<EndpointRecord>> {
    serde_json::from_slice(payload)
}
