use crate::tokens::TokenSet;
use sha1::{Digest, Sha1};

/// Derives the request checkcode: uppercase hex SHA-1 over the token fields
/// and timestamp concatenated in fixed order with no separator.
///
/// The order (`access_token, apiuser, language, openId, operateId, timestamp,
/// userId`) is the alphabetical order of the form field names; the server-side
/// scheme is undocumented, so this is a best-effort reconstruction kept as a
/// standalone function that can be swapped out wholesale if live testing
/// disagrees. Deterministic, no hidden state.
pub fn compute_checkcode(tokens: &TokenSet, timestamp: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(tokens.access_token.as_bytes());
    hasher.update(tokens.apiuser.as_bytes());
    hasher.update(tokens.language.as_bytes());
    hasher.update(tokens.open_id.as_bytes());
    hasher.update(tokens.operate_id.as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(tokens.user_id.as_bytes());
    hex::encode(hasher.finalize()).to_uppercase()
}
