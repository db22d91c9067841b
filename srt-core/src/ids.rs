//! Identifier generation for created artifacts

/// Characters used in generated ids
pub const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random part of a work-item artifact id
pub const ARTIFACT_ID_LENGTH: usize = 10;

/// Generates a random string of `len` characters from [`ID_ALPHABET`]
pub fn random_suffix(len: usize) -> String {
    (0..len)
        .map(|_| ID_ALPHABET[fastrand::usize(..ID_ALPHABET.len())] as char)
        .collect()
}

/// Generates `"{prefix}-{10 chars}"` for work-item artifacts
pub fn make_artifact_id(prefix: &str) -> String {
    format!("{}-{}", prefix, random_suffix(ARTIFACT_ID_LENGTH))
}
