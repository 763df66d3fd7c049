use chrono::Utc;

/// Current time as whole seconds since the Unix epoch, the unit the signed
/// settings endpoint expects in its `timestamp` field.
pub fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}
