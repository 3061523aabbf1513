use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored code snippet. `owner` is fixed at creation from the authenticated
/// identity and is not writable through any update path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: Uuid,
    pub name: String,
    pub owner: Uuid,
    pub language: String,
    pub code: String,
    pub algo: String,
    pub input: String,
    pub output: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_timestamps() {
        let file = File {
            id: Uuid::new_v4(),
            name: "a.py".to_string(),
            owner: Uuid::new_v4(),
            language: "python".to_string(),
            code: "print(1)".to_string(),
            algo: String::new(),
            input: String::new(),
            output: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&file).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("created_at").is_none());
        assert_eq!(value["name"], "a.py");
    }
}
