use std::fmt::Write;

use compute_core::ItemAddress;
use sha2::{Digest, Sha256};

pub(crate) const ENTRY_EXTENSION: &str = "json";

/// Portable, deterministic file name for a store entry:
/// `{sanitized_store_key}--{short_hash}.json`.
///
/// The readable prefix is lossy; uniqueness comes from the hash, which covers a
/// length-prefixed encoding so `("a-", "b")` and `("a", "-b")` never collide.
pub fn entry_filename(addr: &ItemAddress) -> String {
    let prefix = sanitize(&addr.store_key());
    let hash = short_hash(addr);
    format!("{prefix}--{hash}.{ENTRY_EXTENSION}")
}

fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(48));
    let mut prev_underscore = false;
    for c in input.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        out.push(c);
        if out.len() >= 48 {
            break;
        }
    }
    out
}

fn short_hash(addr: &ItemAddress) -> String {
    let mut hasher = Sha256::new();
    hasher.update(addr.category().len().to_le_bytes());
    hasher.update(addr.category().as_bytes());
    hasher.update(addr.item_name().as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
