//! JSON column helpers for the SQLite store.
//!
//! List-valued fields (topics, asset URLs, dependencies) are stored as JSON
//! text in a single column; these helpers convert both ways.

use serde::{Deserialize, Serialize};

pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

pub fn from_json<T: for<'de> Deserialize<'de> + Default>(s: String) -> T {
    serde_json::from_str(&s).unwrap_or_default()
}
