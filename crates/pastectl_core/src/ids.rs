//! Short random paste identifiers.

use rand::Rng;

/// Alphabet identifiers are drawn from (62 alphanumeric characters).
pub const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate an identifier of `length` characters.
///
/// Each character is drawn independently and uniformly from [`ID_ALPHABET`]
/// using the calling thread's RNG, so concurrent callers never share state.
///
/// # Returns
/// A random alphanumeric string of exactly `length` characters.
pub fn generate_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect()
}

/// Check that `id` could have been produced by [`generate_id`].
///
/// Used by handlers to reject obviously malformed path ids before touching
/// storage.
pub fn is_well_formed_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| ID_ALPHABET.contains(&b))
}
