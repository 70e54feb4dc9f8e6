use crate::constants::{CREDENTIAL_MASK, CREDENTIAL_PREFIX_CHARS};

/// Reduces a raw credential to the key used in `keys_usage`.
///
/// Credentials of up to six characters all collapse onto the bare mask; longer
/// ones keep their first six characters. Distinct credentials sharing a prefix
/// share a bucket.
pub fn mask_credential(credential: &str) -> String {
    let mut chars = credential.chars();
    let prefix: String = chars.by_ref().take(CREDENTIAL_PREFIX_CHARS).collect();
    if chars.next().is_none() {
        return CREDENTIAL_MASK.to_string();
    }
    format!("{prefix}{CREDENTIAL_MASK}")
}
