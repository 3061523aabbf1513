use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::File;

const FILE_COLUMNS: &str =
    "id, name, owner, language, code, algo, input, output, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum FileServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("File not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    Manager(#[from] DatabaseError),
}

/// Create payload. Required fields arrive as options so an absent field is
/// reported as a validation failure rather than a deserialization failure.
/// Unknown keys (including `owner` and `id`) are dropped on deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct CreateFileRequest {
    pub name: Option<String>,
    pub language: Option<String>,
    pub code: Option<String>,
    pub algo: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
}

/// Partial-update payload. Only these six fields are mutable; `id`, `owner`
/// and the timestamps have no corresponding field here, so a caller cannot
/// override them no matter what the request body contains.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFileRequest {
    pub name: Option<String>,
    pub language: Option<String>,
    pub code: Option<String>,
    pub algo: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
}

impl UpdateFileRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.language.is_none()
            && self.code.is_none()
            && self.algo.is_none()
            && self.input.is_none()
            && self.output.is_none()
    }
}

fn validate_create(req: &CreateFileRequest) -> Result<(), FileServiceError> {
    let present = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());

    if present(&req.name) && present(&req.language) && present(&req.code) {
        Ok(())
    } else {
        Err(FileServiceError::Validation(
            "Required fields missing: name, language, and code are required".to_string(),
        ))
    }
}

fn validate_update(updates: &UpdateFileRequest) -> Result<(), FileServiceError> {
    if updates.is_empty() {
        return Err(FileServiceError::Validation("No updates provided".to_string()));
    }

    // Fields that are required at creation stay non-empty across updates
    for (field, value) in [
        ("name", &updates.name),
        ("language", &updates.language),
        ("code", &updates.code),
    ] {
        if matches!(value.as_deref(), Some("")) {
            return Err(FileServiceError::Validation(format!(
                "{} must not be empty",
                field
            )));
        }
    }

    Ok(())
}

/// CRUD over the files collection, enforcing the single-owner invariant on
/// every read, write and delete.
pub struct FileService {
    pool: PgPool,
}

impl FileService {
    pub async fn new() -> Result<Self, FileServiceError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        identity: Uuid,
        req: CreateFileRequest,
    ) -> Result<File, FileServiceError> {
        validate_create(&req)?;

        let sql = format!(
            r#"
            INSERT INTO files (name, owner, language, code, algo, input, output)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FILE_COLUMNS}
            "#
        );

        let file = sqlx::query_as::<_, File>(&sql)
            .bind(req.name.as_deref())
            .bind(identity)
            .bind(req.language.as_deref())
            .bind(req.code.as_deref())
            .bind(req.algo.as_deref().unwrap_or(""))
            .bind(req.input.as_deref().unwrap_or(""))
            .bind(req.output.as_deref().unwrap_or(""))
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created file {} for user {}", file.id, identity);
        Ok(file)
    }

    /// List a user's files, most recently modified first. Callers may only
    /// list their own files.
    pub async fn list_by_owner(
        &self,
        identity: Uuid,
        requested_owner: Uuid,
    ) -> Result<Vec<File>, FileServiceError> {
        if requested_owner != identity {
            return Err(FileServiceError::Forbidden(
                "Not authorized to access these files",
            ));
        }

        let sql = format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files
            WHERE owner = $1
            ORDER BY updated_at DESC
            "#
        );

        let files = sqlx::query_as::<_, File>(&sql)
            .bind(requested_owner)
            .fetch_all(&self.pool)
            .await?;

        Ok(files)
    }

    pub async fn get_by_id(&self, identity: Uuid, file_id: Uuid) -> Result<File, FileServiceError> {
        let file = self.find_by_id(file_id).await?;
        Self::ensure_owner(&file, identity, "Not authorized to access this file")?;
        Ok(file)
    }

    /// Merge the allow-listed fields over the existing document
    pub async fn update_partial(
        &self,
        identity: Uuid,
        file_id: Uuid,
        updates: UpdateFileRequest,
    ) -> Result<File, FileServiceError> {
        validate_update(&updates)?;

        let file = self.find_by_id(file_id).await?;
        Self::ensure_owner(&file, identity, "Not authorized to update this file")?;

        // Single conditional UPDATE: the owner predicate makes the write
        // atomic with the ownership check, so a concurrent delete cannot
        // slip a lost update through.
        let sql = format!(
            r#"
            UPDATE files
            SET name = COALESCE($3, name),
                language = COALESCE($4, language),
                code = COALESCE($5, code),
                algo = COALESCE($6, algo),
                input = COALESCE($7, input),
                output = COALESCE($8, output),
                updated_at = now()
            WHERE id = $1 AND owner = $2
            RETURNING {FILE_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, File>(&sql)
            .bind(file_id)
            .bind(identity)
            .bind(updates.name.as_deref())
            .bind(updates.language.as_deref())
            .bind(updates.code.as_deref())
            .bind(updates.algo.as_deref())
            .bind(updates.input.as_deref())
            .bind(updates.output.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        updated.ok_or(FileServiceError::NotFound)
    }

    pub async fn update_code(
        &self,
        identity: Uuid,
        file_id: Uuid,
        code: Option<String>,
    ) -> Result<File, FileServiceError> {
        let code = code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| FileServiceError::Validation("Code is required".to_string()))?;

        self.update_field(identity, file_id, "code", &code).await
    }

    pub async fn update_algo(
        &self,
        identity: Uuid,
        file_id: Uuid,
        algo: Option<String>,
    ) -> Result<File, FileServiceError> {
        let algo = algo
            .filter(|a| !a.is_empty())
            .ok_or_else(|| FileServiceError::Validation("Algo is required".to_string()))?;

        self.update_field(identity, file_id, "algo", &algo).await
    }

    pub async fn delete_by_id(
        &self,
        identity: Uuid,
        file_id: Uuid,
    ) -> Result<(), FileServiceError> {
        let file = self.find_by_id(file_id).await?;
        Self::ensure_owner(&file, identity, "Not authorized to delete this file")?;

        let result = sqlx::query("DELETE FROM files WHERE id = $1 AND owner = $2")
            .bind(file_id)
            .bind(identity)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FileServiceError::NotFound);
        }

        tracing::info!("Deleted file {} for user {}", file_id, identity);
        Ok(())
    }

    /// Existence check runs before the ownership check everywhere, so a
    /// missing file reports NotFound even to a non-owner.
    async fn find_by_id(&self, file_id: Uuid) -> Result<File, FileServiceError> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1");

        let file = sqlx::query_as::<_, File>(&sql)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;

        file.ok_or(FileServiceError::NotFound)
    }

    fn ensure_owner(
        file: &File,
        identity: Uuid,
        message: &'static str,
    ) -> Result<(), FileServiceError> {
        if file.owner != identity {
            return Err(FileServiceError::Forbidden(message));
        }
        Ok(())
    }

    /// Scoped single-column update sharing the conditional-write pattern of
    /// `update_partial`. `column` is compile-time constant, never user input.
    async fn update_field(
        &self,
        identity: Uuid,
        file_id: Uuid,
        column: &'static str,
        value: &str,
    ) -> Result<File, FileServiceError> {
        let file = self.find_by_id(file_id).await?;
        Self::ensure_owner(&file, identity, "Not authorized to update this file")?;

        let sql = format!(
            r#"
            UPDATE files
            SET {column} = $3, updated_at = now()
            WHERE id = $1 AND owner = $2
            RETURNING {FILE_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, File>(&sql)
            .bind(file_id)
            .bind(identity)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        updated.ok_or(FileServiceError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name_language_and_code() {
        let ok = CreateFileRequest {
            name: Some("a.py".into()),
            language: Some("python".into()),
            code: Some("print(1)".into()),
            ..Default::default()
        };
        assert!(validate_create(&ok).is_ok());

        for missing in ["name", "language", "code"] {
            let mut req = CreateFileRequest {
                name: Some("a.py".into()),
                language: Some("python".into()),
                code: Some("print(1)".into()),
                ..Default::default()
            };
            match missing {
                "name" => req.name = None,
                "language" => req.language = Some(String::new()),
                _ => req.code = None,
            }
            assert!(matches!(
                validate_create(&req),
                Err(FileServiceError::Validation(_))
            ));
        }
    }

    #[test]
    fn create_body_drops_owner_and_id_keys() {
        // A caller-supplied owner must never reach the insert; the field
        // simply does not deserialize.
        let req: CreateFileRequest = serde_json::from_value(serde_json::json!({
            "name": "a.py",
            "language": "python",
            "code": "print(1)",
            "owner": "5f1b9a7e-0000-0000-0000-000000000000",
            "id": "ignored",
        }))
        .unwrap();

        assert!(validate_create(&req).is_ok());
        assert_eq!(req.name.as_deref(), Some("a.py"));
    }

    #[test]
    fn update_rejects_empty_payload() {
        assert!(matches!(
            validate_update(&UpdateFileRequest::default()),
            Err(FileServiceError::Validation(_))
        ));
    }

    #[test]
    fn update_ignores_immutable_keys() {
        // Body containing only immutable keys deserializes to an empty
        // update and is rejected as such.
        let updates: UpdateFileRequest = serde_json::from_value(serde_json::json!({
            "owner": "5f1b9a7e-0000-0000-0000-000000000000",
            "id": "5f1b9a7e-0000-0000-0000-000000000001",
            "createdAt": "2020-01-01T00:00:00Z",
        }))
        .unwrap();

        assert!(updates.is_empty());
        assert!(matches!(
            validate_update(&updates),
            Err(FileServiceError::Validation(_))
        ));
    }

    #[test]
    fn update_revalidates_required_fields() {
        let updates: UpdateFileRequest =
            serde_json::from_value(serde_json::json!({ "name": "" })).unwrap();
        assert!(matches!(
            validate_update(&updates),
            Err(FileServiceError::Validation(_))
        ));

        // Optional metadata may be blanked out
        let updates: UpdateFileRequest =
            serde_json::from_value(serde_json::json!({ "algo": "" })).unwrap();
        assert!(validate_update(&updates).is_ok());
    }

    #[test]
    fn update_merges_only_provided_fields() {
        let updates: UpdateFileRequest =
            serde_json::from_value(serde_json::json!({ "code": "print(2)" })).unwrap();
        assert!(!updates.is_empty());
        assert_eq!(updates.code.as_deref(), Some("print(2)"));
        assert!(updates.name.is_none());
        assert!(updates.language.is_none());
    }
}
