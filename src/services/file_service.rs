//! src/services/file_service.rs
//!
//! FileService — the client side of the file-store REST API. It owns the
//! HTTP client and base URL and exposes the five remote operations the
//! collection view needs: list, get, upload, delete, download. Response
//! classification is kept in pure functions over `(status, body)` so the
//! duplicate-detection contract can be tested without a server.

use crate::{
    errors::{ApiError, ApiResult},
    filters::CanonicalFilter,
    models::file::{FileListing, FileRecord},
};
use futures::StreamExt;
use reqwest::{StatusCode, multipart};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// Result of an upload against the deduplicating store.
///
/// Duplicate content is not a failure: the server answers with a reference
/// instead of storing the bytes twice, and the client treats that as success.
#[derive(Debug)]
pub enum UploadOutcome {
    /// Fresh content; the server stored it and returned the new record.
    Created(FileRecord),
    /// The content hash already existed; the server created (or counted) a
    /// reference. The id is always usable immediately; the full record is
    /// included when the server sent one.
    ReferencedExisting {
        id: String,
        record: Option<FileRecord>,
    },
}

/// HTTP client for the remote file-store API.
#[derive(Clone)]
pub struct FileService {
    http: reqwest::Client,
    base_url: String,
}

impl FileService {
    /// Create a service rooted at `base_url` (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn files_url(&self) -> String {
        format!("{}/files/", self.base_url)
    }

    fn file_url(&self, id: &str) -> String {
        format!("{}/files/{}/", self.base_url, id)
    }

    /// `GET /files/` — fetch the collection for a canonical filter and page.
    ///
    /// Every present filter key becomes one query parameter under the
    /// server's naming convention; `page` rides along when past the first.
    pub async fn list_files(
        &self,
        filter: &CanonicalFilter,
        page: u32,
    ) -> ApiResult<Vec<FileRecord>> {
        let mut params = filter.to_query_params();
        if page > 1 {
            params.push(("page", page.to_string()));
        }
        debug!("listing files with query {:?}", params);

        let resp = self
            .http
            .get(self.files_url())
            .query(&params)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = resp.status();
        let text = resp.text().await.map_err(ApiError::Network)?;
        if !status.is_success() {
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            return Err(ApiError::from_error_body(
                &body,
                "Failed to load files. Please try again.",
            ));
        }

        let listing: FileListing = serde_json::from_str(&text)?;
        Ok(listing.into_records())
    }

    /// `GET /files/{id}/` — fetch a single record, e.g. to resolve its
    /// download URL.
    pub async fn get_file(&self, id: &str) -> ApiResult<FileRecord> {
        let resp = self
            .http
            .get(self.file_url(id))
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = resp.status();
        let text = resp.text().await.map_err(ApiError::Network)?;
        if !status.is_success() {
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            return Err(ApiError::from_error_body(
                &body,
                "Failed to load files. Please try again.",
            ));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// `POST /files/` — multipart upload.
    pub async fn upload_file(&self, path: &Path) -> ApiResult<UploadOutcome> {
        let data = fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        let mime = guess_mime(&filename);

        let part = multipart::Part::bytes(data)
            .file_name(filename.clone())
            .mime_str(mime)
            .map_err(|_| ApiError::Operation("Failed to upload file"))?;
        let form = multipart::Form::new().part("file", part);

        debug!("uploading {} as {}", filename, mime);
        let resp = self
            .http
            .post(self.files_url())
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = resp.status();
        let text = resp.text().await.map_err(ApiError::Network)?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        classify_upload(status, body)
    }

    /// `DELETE /files/{id}/` — remove a record (or release one reference;
    /// the server decides, and both answers count as success here).
    pub async fn delete_file(&self, id: &str) -> ApiResult<()> {
        let resp = self
            .http
            .delete(self.file_url(id))
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = resp.status();
        let text = resp.text().await.map_err(ApiError::Network)?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        classify_delete(status, body)
    }

    /// Fetch `url` and stream the body to `dir/filename`.
    ///
    /// Writes to a temporary file first and renames into place, so a failed
    /// transfer never leaves a half-written download under the final name.
    pub async fn download_file(
        &self,
        url: &str,
        dir: &Path,
        filename: &str,
    ) -> ApiResult<PathBuf> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ApiError::Network)?;
        if !resp.status().is_success() {
            return Err(ApiError::Operation("Failed to download file"));
        }

        fs::create_dir_all(dir).await?;
        let tmp_path = dir.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut stream = resp.bytes_stream();
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(ApiError::Network(err));
                }
            };
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(ApiError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ApiError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ApiError::Io(err));
        }

        let dest = dir.join(safe_filename(filename));
        fs::rename(&tmp_path, &dest).await?;
        debug!("saved download to {}", dest.display());
        Ok(dest)
    }
}

/// Classify an upload response into the tagged outcome.
///
/// Two duplicate-upload shapes are recognized as success:
/// - 400 whose body carries `hash[0].code == "unique"` plus an `id` (the
///   server created a reference row and echoed it);
/// - 200 with `{message, file}` (the server bumped the original's reference
///   count and returned it).
/// A 400 with the hash-unique shape but no id has nothing usable in it and
/// stays an error.
fn classify_upload(status: StatusCode, body: Value) -> ApiResult<UploadOutcome> {
    if status.is_success() {
        if body.get("message").is_some() {
            if let Some(file) = body.get("file") {
                let record: FileRecord = serde_json::from_value(file.clone())?;
                return Ok(UploadOutcome::ReferencedExisting {
                    id: record.id.clone(),
                    record: Some(record),
                });
            }
        }
        let record: FileRecord = serde_json::from_value(body)?;
        return Ok(UploadOutcome::Created(record));
    }

    if status == StatusCode::BAD_REQUEST {
        if has_unique_hash_violation(&body) {
            if let Some(id) = body.get("id").and_then(|v| v.as_str()) {
                let record = serde_json::from_value::<FileRecord>(body.clone()).ok();
                return Ok(UploadOutcome::ReferencedExisting {
                    id: id.to_string(),
                    record,
                });
            }
            return Err(ApiError::DuplicateFile);
        }
        return Err(ApiError::from_error_body(
            &body,
            "Invalid request. Please check your input.",
        ));
    }

    Err(ApiError::from_error_body(&body, "Failed to upload file"))
}

/// Classify a delete response. Any 2xx counts as success; everything else
/// surfaces the server's `error` field verbatim when present.
fn classify_delete(status: StatusCode, body: Value) -> ApiResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(ApiError::from_error_body(&body, "Failed to delete file"))
}

/// Return true if the body matches the serializer's hash-uniqueness
/// violation shape.
fn has_unique_hash_violation(body: &Value) -> bool {
    body.get("hash")
        .and_then(|hash| hash.get(0))
        .and_then(|entry| entry.get("code"))
        .and_then(|code| code.as_str())
        == Some("unique")
}

/// Map a filename to the MIME type the server files it under.
fn guess_mime(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

/// Strip any path components so a server-supplied filename cannot escape the
/// download directory.
fn safe_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != ".." && n != ".")
        .unwrap_or_else(|| "download.bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_json(id: &str) -> Value {
        json!({
            "id": id,
            "file": "http://localhost:8000/media/uploads/abc.pdf",
            "original_filename": "report.pdf",
            "file_type": "application/pdf",
            "size": 2048,
            "uploaded_at": "2024-03-01T10:30:00Z",
            "hash": "aabbcc",
            "reference_count": 1,
            "is_reference": false
        })
    }

    #[test]
    fn created_on_2xx_with_record_body() {
        let outcome = classify_upload(StatusCode::CREATED, record_json("abc")).unwrap();
        match outcome {
            UploadOutcome::Created(record) => assert_eq!(record.id, "abc"),
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_400_with_id_is_success_with_reference() {
        let body = json!({
            "hash": [{"code": "unique", "message": "file with this hash already exists."}],
            "id": "abc"
        });
        let outcome = classify_upload(StatusCode::BAD_REQUEST, body).unwrap();
        match outcome {
            UploadOutcome::ReferencedExisting { id, record } => {
                assert_eq!(id, "abc");
                // Partial body: the id is usable even without a full record.
                assert!(record.is_none());
            }
            other => panic!("expected ReferencedExisting, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_400_without_id_is_the_already_exists_error() {
        let body = json!({"hash": [{"code": "unique"}]});
        let err = classify_upload(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "This file already exists in the system. A reference will be created."
        );
    }

    #[test]
    fn decremented_200_with_message_and_file_is_reference_success() {
        let body = json!({
            "message": "File already exists. Reference count incremented.",
            "file": record_json("f1f1")
        });
        let outcome = classify_upload(StatusCode::OK, body).unwrap();
        match outcome {
            UploadOutcome::ReferencedExisting { id, record } => {
                assert_eq!(id, "f1f1");
                assert!(record.is_some());
            }
            other => panic!("expected ReferencedExisting, got {:?}", other),
        }
    }

    #[test]
    fn other_400_surfaces_server_error_field() {
        let body = json!({"error": "No file was submitted"});
        let err = classify_upload(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert_eq!(err.to_string(), "No file was submitted");
    }

    #[test]
    fn bare_400_uses_invalid_request_fallback() {
        let err = classify_upload(StatusCode::BAD_REQUEST, Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "Invalid request. Please check your input.");
    }

    #[test]
    fn server_error_without_body_uses_upload_fallback() {
        let err =
            classify_upload(StatusCode::INTERNAL_SERVER_ERROR, Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "Failed to upload file");
    }

    #[test]
    fn delete_blocked_message_is_verbatim() {
        let body = json!({"error": "Cannot delete original file while references exist"});
        let err = classify_delete(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot delete original file while references exist"
        );
    }

    #[test]
    fn delete_accepts_both_success_statuses() {
        assert!(classify_delete(StatusCode::NO_CONTENT, Value::Null).is_ok());
        let decremented = json!({"message": "Reference count decremented"});
        assert!(classify_delete(StatusCode::OK, decremented).is_ok());
    }

    #[test]
    fn delete_failure_without_error_field_uses_fallback() {
        let err = classify_delete(StatusCode::INTERNAL_SERVER_ERROR, Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete file");
    }

    #[test]
    fn mime_guess_covers_the_known_types() {
        assert_eq!(guess_mime("a.png"), "image/png");
        assert_eq!(guess_mime("a.JPEG"), "image/jpeg");
        assert_eq!(guess_mime("notes.txt"), "text/plain");
        assert_eq!(guess_mime("paper.pdf"), "application/pdf");
        assert_eq!(guess_mime("unknown.xyz"), "application/octet-stream");
        assert_eq!(guess_mime("no_extension"), "application/octet-stream");
    }

    #[test]
    fn filenames_are_stripped_of_path_components() {
        assert_eq!(safe_filename("report.pdf"), "report.pdf");
        assert_eq!(safe_filename("nested/dir/report.pdf"), "report.pdf");
        assert_eq!(safe_filename("../../etc/passwd"), "passwd");
        assert_eq!(safe_filename(""), "download.bin");
    }

    #[tokio::test]
    async fn failed_download_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let service = FileService::new("http://127.0.0.1:1/api");
        let result = service
            .download_file("http://127.0.0.1:1/media/x.bin", dir.path(), "x.bin")
            .await;
        assert!(matches!(result, Err(ApiError::Network(_))));
        assert!(!dir.path().join("x.bin").exists());
    }
}
