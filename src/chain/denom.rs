use sha3::{Digest, Sha3_256};

/// Derive the chain-local denomination for an L2 token identifier.
/// The denom is `l2/` followed by the hex SHA3-256 of the raw token bytes,
/// matching what the rollup mints for bridged assets.
pub fn l2_denom(l2_token: &[u8]) -> String {
    let digest = Sha3_256::digest(l2_token);
    format!("l2/{}", hex::encode(digest))
}
