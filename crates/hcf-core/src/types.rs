//! Frontier data model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One slot within one frontier.
///
/// Parses from and displays as `frontier/slot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Destination {
    frontier: String,
    slot: String,
}

impl Destination {
    pub fn new(frontier: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            frontier: frontier.into(),
            slot: slot.into(),
        }
    }

    pub fn frontier(&self) -> &str {
        &self.frontier
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.frontier, self.slot)
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((frontier, slot))
                if !frontier.is_empty() && !slot.is_empty() && !slot.contains('/') =>
            {
                Ok(Self::new(frontier, slot))
            }
            _ => Err(Error::InvalidDestination(s.to_string())),
        }
    }
}

impl TryFrom<String> for Destination {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Destination> for String {
    fn from(value: Destination) -> Self {
        value.to_string()
    }
}

/// A unit of work destined for a frontier slot.
///
/// Serializes to the record shape the frontier accepts on add:
/// `{"fp": .., "qdata": .., "fdata": .., "p": ..}` with absent fields omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "fp")]
    fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    qdata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fdata: Option<Value>,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    priority: Option<i64>,
}

impl Link {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            qdata: None,
            fdata: None,
            priority: None,
        }
    }

    /// Data stored with the fingerprint in the request queue
    pub fn with_qdata(mut self, qdata: Value) -> Self {
        self.qdata = Some(qdata);
        self
    }

    /// Data stored with the fingerprint in the fingerprint set
    pub fn with_fdata(mut self, fdata: Value) -> Self {
        self.fdata = Some(fdata);
        self
    }

    /// Lower numbers are returned first
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn qdata(&self) -> Option<&Value> {
        self.qdata.as_ref()
    }

    pub fn fdata(&self) -> Option<&Value> {
        self.fdata.as_ref()
    }

    pub fn priority(&self) -> Option<i64> {
        self.priority
    }
}

/// A link as returned by a fetch: `[fingerprint, qdata]` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, Option<Value>)")]
pub struct QueuedLink {
    #[serde(rename = "fp")]
    pub fingerprint: String,
    pub qdata: Option<Value>,
}

impl From<(String, Option<Value>)> for QueuedLink {
    fn from((fingerprint, qdata): (String, Option<Value>)) -> Self {
        Self { fingerprint, qdata }
    }
}

impl From<QueuedLink> for Link {
    fn from(queued: QueuedLink) -> Self {
        let link = Link::new(queued.fingerprint);
        match queued.qdata {
            Some(qdata) if !qdata.is_null() => link.with_qdata(qdata),
            _ => link,
        }
    }
}
