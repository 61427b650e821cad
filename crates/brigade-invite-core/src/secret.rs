//! Generation of credential secrets.
//!
//! Both generators draw from the operating system CSPRNG. A link token alone
//! grants join capability with no secondary check, so it must be infeasible
//! to guess.

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// Characters used in human codes: uppercase letters and digits without
/// the easily confused `I`, `O`, `0` and `1`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Default human code length.
pub const DEFAULT_CODE_LEN: usize = 6;

/// Default number of random bytes in a link token.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Generate a random human code of `len` characters.
pub fn generate_code(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generate a lowercase hex link token from `bytes` random bytes.
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
