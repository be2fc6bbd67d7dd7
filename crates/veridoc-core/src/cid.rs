//! Content-identifier normalisation for heterogeneous document locators.
//!
//! Clients hand us raw CIDs, `ipfs://` URIs, and HTTP gateway URLs for the
//! same underlying content. On-chain task records store the bare CID only,
//! so every locator passes through [`normalize_cid`] before it reaches a
//! contract call.
//!
//! Normalisation is deliberately permissive: an input that matches none of
//! the known shapes comes back unchanged. Callers may warn on an
//! unverified shape (see [`looks_like_cid`]) but must not block submission.

/// Minimum length of a bare CID (CIDv0 base58 is 46 characters; CIDv1
/// base32 is longer).
const MIN_CID_LEN: usize = 46;

/// Normalise a client-supplied content locator into a bare CID.
///
/// - `ipfs://<id>` loses its scheme prefix
/// - `https://gateway/ipfs/<id>[/path][?query]` extracts `<id>`
/// - anything else is trimmed and returned unchanged
///
/// Total, pure, and idempotent; never touches the network.
pub fn normalize_cid(input: &str) -> String {
    let trimmed = input.trim();
    let stripped = trimmed.strip_prefix("ipfs://").unwrap_or(trimmed);

    if let Some(idx) = stripped.find("/ipfs/") {
        let rest = &stripped[idx + "/ipfs/".len()..];
        let id = rest
            .split(|c| c == '/' || c == '?' || c == '#')
            .next()
            .unwrap_or("");
        if !id.is_empty() {
            return id.to_string();
        }
    }

    stripped.to_string()
}

/// Whether a normalised locator has the shape of a bare CID.
///
/// A `false` here marks the "unverified shape" fallback path, worth a
/// warning in logs but never a hard failure.
pub fn looks_like_cid(s: &str) -> bool {
    s.len() >= MIN_CID_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric())
}
