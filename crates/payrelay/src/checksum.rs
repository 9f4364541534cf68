use sha2::{Digest, Sha256};

/// Nuvei authentication checksum.
///
/// Lowercase hex SHA-256 of `merchant_id ++ site_id ++ timestamp ++ secret_key`
/// with no delimiters. Proves possession of the merchant secret; it is not an
/// integrity check over the payload.
pub fn compute_checksum(merchant_id: &str, site_id: &str, timestamp: i64, secret_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(merchant_id.as_bytes());
    hasher.update(site_id.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(secret_key.as_bytes());
    hex::encode(hasher.finalize())
}
