//! SHA-256 hashing utilities for the ledger.
//!
//! Every digest in sealchain is a lower-case hex string. Merkle nodes and
//! block hashes are computed over the UTF-8 bytes of other hex strings, so
//! the hex form is the canonical one and raw digest bytes never leave this
//! module.

use sha2::{Digest, Sha256};

/// Hash arbitrary data with SHA-256 and return the lower-case hex digest.
pub fn digest(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

/// Hash multiple pieces of data by concatenating them.
///
/// No separator or length prefix is inserted between the parts, so
/// `digest_concat(&["ab", "c"]) == digest_concat(&["a", "bc"])`.
pub fn digest_concat<S: AsRef<[u8]>>(parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    hex::encode(hasher.finalize())
}
