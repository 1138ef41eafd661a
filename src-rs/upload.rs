//! External upload hand-off.
//!
//! The editor passes a PNG data URL and a filename to an [`UploadProvider`]
//! and only looks at success, the share link, or the failure reason.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataurl::decode_data_url;
use crate::error::EditorError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Successful upload as seen by the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub file_name: String,
    pub share_link: Option<String>,
}

impl UploadResponse {
    /// Collapses the collaborator's response into a receipt or a failure
    /// reason.
    pub fn into_result(self, filename: &str) -> Result<UploadReceipt, EditorError> {
        if self.success {
            Ok(UploadReceipt {
                file_name: self.file_name.unwrap_or_else(|| filename.to_string()),
                share_link: self.share_link,
            })
        } else {
            Err(EditorError::Upload(
                self.error.unwrap_or_else(|| "upload failed".to_string()),
            ))
        }
    }
}

pub trait UploadProvider {
    fn upload(&self, data_url: &str, filename: &str) -> UploadResponse;
}

/// Uploads into a shared folder and links to the copy with a `file://` URL.
#[derive(Debug, Clone)]
pub struct FolderUploader {
    pub root: PathBuf,
}

impl UploadProvider for FolderUploader {
    fn upload(&self, data_url: &str, filename: &str) -> UploadResponse {
        let bytes = match decode_data_url(data_url) {
            Ok((_, bytes)) => bytes,
            Err(err) => return UploadResponse::failed(err.to_string()),
        };
        if let Err(err) = fs::create_dir_all(&self.root) {
            return UploadResponse::failed(format!("{}: {err}", self.root.display()));
        }
        let path = self.root.join(filename);
        if let Err(err) = fs::write(&path, bytes) {
            return UploadResponse::failed(format!("{}: {err}", path.display()));
        }
        let absolute = fs::canonicalize(&path).unwrap_or(path);
        UploadResponse {
            success: true,
            file_id: Some(filename.to_string()),
            file_name: Some(filename.to_string()),
            share_link: Some(format!("file://{}", absolute.display())),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataurl::encode_png_data_url;
    use tempfile::tempdir;

    #[test]
    fn folder_upload_returns_share_link() {
        let dir = tempdir().unwrap();
        let uploader = FolderUploader {
            root: dir.path().join("shared"),
        };
        let response = uploader.upload(&encode_png_data_url(b"abc"), "shot.png");
        assert!(response.success);
        assert_eq!(fs::read(dir.path().join("shared").join("shot.png")).unwrap(), b"abc");
        let receipt = response.into_result("shot.png").unwrap();
        assert!(receipt.share_link.unwrap().starts_with("file://"));
    }

    #[test]
    fn failure_carries_reason() {
        let dir = tempdir().unwrap();
        let uploader = FolderUploader {
            root: dir.path().to_path_buf(),
        };
        let response = uploader.upload("not a data url", "shot.png");
        assert!(!response.success);
        let err = response.into_result("shot.png").unwrap_err();
        assert!(matches!(err, EditorError::Upload(reason) if reason.contains("data URL")));
    }

    #[test]
    fn response_uses_collaborator_field_names() {
        let parsed: UploadResponse = serde_json::from_str(
            r#"{"success": true, "fileId": "1", "fileName": "a.png", "shareLink": "https://x/1"}"#,
        )
        .unwrap();
        assert_eq!(parsed.share_link.as_deref(), Some("https://x/1"));
        assert_eq!(parsed.file_id.as_deref(), Some("1"));
    }
}
