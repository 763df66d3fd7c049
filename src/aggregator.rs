use crate::utils;
use chrono::Utc;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// The persisted artifact: every fetched user plus the authenticated user's
/// settings record, with run metadata. Written once per run, then immutable.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedResult {
    pub timestamp: i64,
    pub users: Vec<Value>,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub total_users: usize,
    pub fetched_at: String,
    pub api_endpoints: Vec<String>,
}

#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> PersistError {
        PersistError::Io(err)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> PersistError {
        PersistError::Serialize(err)
    }
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "Output write error: {}", e),
            PersistError::Serialize(e) => write!(f, "Output serialization error: {}", e),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(e) => Some(e),
            PersistError::Serialize(e) => Some(e),
        }
    }
}

/// Combines the user list and the settings record into one result. The
/// settings record is appended to the user array; `total_users` counts it.
pub fn combine(users: Vec<Value>, settings: Value, api_endpoints: Vec<String>) -> CombinedResult {
    let mut users = users;
    users.push(settings);
    let total_users = users.len();

    CombinedResult {
        timestamp: utils::unix_timestamp(),
        users,
        metadata: Metadata {
            total_users,
            fetched_at: Utc::now().to_rfc3339(),
            api_endpoints,
        },
    }
}

/// Persists the combined result as pretty-printed JSON, atomically: the
/// document is written to a sibling temp file and renamed over the
/// destination, so a failure mid-write never leaves a half-written output.
pub fn write_combined(path: &Path, result: &CombinedResult) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(result)?;

    let mut tmp_path = path.as_os_str().to_os_string();
    tmp_path.push(".tmp");
    let tmp_path = Path::new(&tmp_path);

    if let Err(e) = fs::write(tmp_path, &json).and_then(|_| fs::rename(tmp_path, path)) {
        let _ = fs::remove_file(tmp_path);
        return Err(PersistError::Io(e));
    }

    info!("Wrote {} users to {}", result.metadata.total_users, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_record_is_appended() {
        let result = combine(vec![json!({"id": 1})], json!({"id": 2}), vec![]);
        assert_eq!(result.users, vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(result.metadata.total_users, 2);
        assert!(result.timestamp > 0);
    }

    #[test]
    fn empty_user_list_still_counts_settings() {
        let result = combine(vec![], json!({"id": 9}), vec![]);
        assert_eq!(result.metadata.total_users, 1);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let result = combine(
            vec![json!({"id": 1})],
            json!({"id": 2}),
            vec!["https://app.example.com/api/users".to_string()],
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["metadata"]["totalUsers"], json!(2));
        assert!(value["metadata"]["fetchedAt"].is_string());
        assert_eq!(
            value["metadata"]["apiEndpoints"],
            json!(["https://app.example.com/api/users"])
        );
    }

    #[test]
    fn write_leaves_only_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let result = combine(vec![json!({"id": 1})], json!({"id": 2}), vec![]);

        write_combined(&path, &result).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["users.json"]);

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["users"], json!([{"id": 1}, {"id": 2}]));
        assert_eq!(written["metadata"]["totalUsers"], json!(2));
    }

    #[test]
    fn write_overwrites_prior_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "stale").unwrap();

        let result = combine(vec![], json!({"id": 1}), vec![]);
        write_combined(&path, &result).unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metadata"]["totalUsers"], json!(1));
    }
}
