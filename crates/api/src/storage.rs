//! Upload handling: multipart form collection and on-disk file storage.
//!
//! Files land under `<upload_dir>/<category>/<uuid>-<sanitized name>`; the
//! path stored in [`FileRef`] is relative to the upload root.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::Multipart;
use pfehub_core::error::CoreError;
use pfehub_core::hashing::sha256_hex;
use pfehub_core::types::FileRef;
use uuid::Uuid;

use crate::error::AppError;

/// Storage categories (subdirectories of the upload root).
pub const PROPOSALS: &str = "proposals";
pub const FINAL_REPORTS: &str = "final-reports";
pub const DELIVERABLES: &str = "deliverables";

/// Categories served back by the file routes.
pub const CATEGORIES: [&str; 3] = [PROPOSALS, FINAL_REPORTS, DELIVERABLES];

const MAX_NAME_LEN: usize = 120;

/// A file part received in a multipart request.
#[derive(Debug)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// All parts of a multipart request: text fields by name plus file parts.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl UploadForm {
    /// Drain a multipart body. Parts carrying a file name are files; the rest
    /// are read as text.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        data: data.to_vec(),
                    });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// Required text field, trimmed.
    pub fn text(&self, name: &str) -> Result<String, CoreError> {
        self.optional_text(name)
            .ok_or_else(|| CoreError::field(name, format!("{name} is required")))
    }

    /// Optional text field; blank values count as absent.
    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Remove and return the file sent under `field`.
    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }
}

/// Writes uploads below a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Persist `file` under `category` and return its reference.
    pub async fn store(&self, category: &str, file: &UploadedFile) -> Result<FileRef, AppError> {
        if file.data.is_empty() {
            return Err(CoreError::field(&file.field, "Uploaded file is empty").into());
        }

        let dir = self.root.join(category);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::InternalError(format!("create {}: {e}", dir.display())))?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&file.file_name));
        let path = dir.join(&stored_name);
        tokio::fs::write(&path, &file.data)
            .await
            .map_err(|e| AppError::InternalError(format!("write {}: {e}", path.display())))?;

        tracing::debug!(
            category,
            file = %stored_name,
            size_bytes = file.data.len(),
            "Stored upload"
        );

        Ok(FileRef {
            path: format!("{category}/{stored_name}"),
            original_name: file.file_name.clone(),
            size_bytes: file.data.len() as u64,
            sha256: sha256_hex(&file.data),
        })
    }

    /// Relative path of a stored file, or `None` when `category` is unknown
    /// or `name` is not a single sanitized path component.
    pub fn stored_path(category: &str, name: &str) -> Option<String> {
        let known = CATEGORIES.contains(&category);
        (known && !name.is_empty() && sanitize_file_name(name) == name)
            .then(|| format!("{category}/{name}"))
    }

    /// Read back a stored file by its relative path.
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let full = self.root.join(path);
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %full.display(), "Stored file missing on disk");
                Err(AppError::NotFound(format!("File {path} not found")))
            }
            Err(e) => Err(AppError::InternalError(format!("read {}: {e}", full.display()))),
        }
    }

    /// Best-effort removal of a stored file whose owning transition failed.
    pub async fn discard(&self, file: &FileRef) {
        let path = self.root.join(&file.path);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to discard upload");
        }
    }
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. An empty result falls back to `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        return "upload".to_string();
    }
    let mut end = cleaned.len().min(MAX_NAME_LEN);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    cleaned[..end].to_string()
}
