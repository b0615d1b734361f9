//! Newline-delimited JSON bodies exchanged with the frontier.
//!
//! - fetch response: one `{"id": .., "requests": [[fp, qdata], ..]}` per line
//! - delete request: one JSON-quoted batch id per line
//! - add request: one link record per line
//! - add response: a single object carrying `newcount`

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{Link, QueuedLink};

/// Opaque batch id, echoed back to the frontier exactly as received.
pub type BatchId = Value;

/// One stored batch returned by a fetch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FetchedBatch {
    /// Server-assigned id used to acknowledge (delete) the batch
    pub id: BatchId,
    #[serde(default)]
    pub requests: Vec<QueuedLink>,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    newcount: u64,
}

/// Decode a fetch response body. Blank lines are skipped.
pub fn decode_fetch_response(body: &[u8]) -> Result<Vec<FetchedBatch>> {
    let text = std::str::from_utf8(body).map_err(|e| Error::malformed("fetch", e))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<FetchedBatch>(line)
                .map_err(|e| Error::malformed("fetch", format!("line {}: {}", idx + 1, e)))
        })
        .collect()
}

/// Encode the batch ids to acknowledge, one JSON value per line.
pub fn encode_delete_body(ids: &[BatchId]) -> Result<Vec<u8>> {
    let lines = ids
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lines.join("\n").into_bytes())
}

/// Encode links for an add request, one record per line.
pub fn encode_add_body(links: &[Link]) -> Result<Vec<u8>> {
    let lines = links
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lines.join("\n").into_bytes())
}

/// Number of links the frontier accepted from an add request.
pub fn decode_add_response(body: &[u8]) -> Result<u64> {
    let response: AddResponse =
        serde_json::from_slice(body).map_err(|e| Error::malformed("add", e))?;
    Ok(response.newcount)
}
