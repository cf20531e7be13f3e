//! Content fingerprint of an interaction dataset.
//!
//! The rows are hashed with SHA-256 in their given order. Every field is
//! length-prefixed, so ids containing separators cannot shift bytes from one
//! field into the next. Changing any value, adding or removing a row, or
//! reordering rows produces a different fingerprint.

use crate::parser::HEADER;
use crate::types::Interaction;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 over the canonical serialization of `interactions`
pub fn fingerprint(interactions: &[Interaction]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(HEADER.join(",").as_bytes());
    hasher.update(b"\n");

    for row in interactions {
        update_field(&mut hasher, &row.user_id);
        update_field(&mut hasher, &row.item_id);
        update_field(&mut hasher, &format_score(row.rating));
        update_field(&mut hasher, &format_score(row.implicit_score));
        update_field(&mut hasher, row.item_name.as_deref().unwrap_or_default());
    }

    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

fn format_score(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
