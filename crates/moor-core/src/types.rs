//! Shared identifier types and helpers.

/// Ledger object identifier, `0x`-prefixed hex.
pub type ObjectId = String;

/// Transaction digest as returned by the ledger.
pub type Digest = String;

/// Account address, `0x`-prefixed hex.
pub type Address = String;

/// Strip redundant leading zero bytes from a package identifier.
///
/// The ledger reports package ids zero-padded to full width; entry-point
/// targets and type tags use the short form. `0x00ab` becomes `0xab`.
/// Normalizing an already-short identifier is a no-op; anything without a
/// `0x` prefix is returned unchanged.
pub fn normalize_package_id(raw: &str) -> String {
    match raw.strip_prefix("0x") {
        Some(body) => format!("0x{}", body.trim_start_matches('0')),
        None => raw.to_string(),
    }
}
