//! Decoding of booking-API list payloads.
//!
//! List endpoints answer either with a bare JSON array or with the paginated
//! envelope `{ "results": [...] }`; both decode to the same `Vec`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, SlotError};

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Envelope { results: Vec<T> },
    Bare(Vec<T>),
}

pub(crate) fn decode_listing<T: DeserializeOwned>(json: &str, what: &str) -> Result<Vec<T>> {
    let listing: Listing<T> = serde_json::from_str(json)
        .map_err(|e| SlotError::Decode(format!("{what}: {e}")))?;
    Ok(match listing {
        Listing::Envelope { results } => results,
        Listing::Bare(items) => items,
    })
}
