/// Data Transfer Objects (DTOs) for REST API endpoints
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Request DTO for logging in to a remote host
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// `host` or `host:port`
    pub host_ip: String,
    pub username: String,
    pub password: String,
}

/// Request DTO naming a logged-in session
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub host_ip: String,
    pub username: String,
}

/// Request DTO for listing a remote directory
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesRequest {
    pub host_ip: String,
    pub username: String,
    #[serde(default)]
    pub location: String,
}

/// Request DTO for downloading a remote file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFileRequest {
    pub host_ip: String,
    pub username: String,
    pub remote_path: String,
}

/// Request DTO for mkdir and remove
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRequest {
    pub host_ip: String,
    pub username: String,
    pub path: String,
}

/// Request DTO for renaming a remote path
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub host_ip: String,
    pub username: String,
    pub old_path: String,
    pub new_path: String,
}

/// JSON carried in the `upload-params` header of an upload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadParams {
    pub host_ip: String,
    pub username: String,
    pub location: String,
}

impl UploadParams {
    pub fn is_complete(&self) -> bool {
        !self.host_ip.is_empty() && !self.username.is_empty() && !self.location.is_empty()
    }
}

/// Uniform result envelope of the file API
#[derive(Debug, Serialize, PartialEq)]
pub struct ApiResponse {
    #[serde(rename = "status")]
    pub succeeded: bool,

    #[serde(rename = "msg")]
    pub message: String,

    pub data: Value,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            data,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
            data: json!({}),
        }
    }

    pub fn not_logged_in() -> Self {
        Self::fail("Not logged in")
    }
}

/// Generic success response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    /// Success flag
    pub success: bool,

    /// Response message
    pub message: String,
}
