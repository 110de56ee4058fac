/// REST API handlers for remote file management
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Json, Multipart, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use crate::{
    api::dto::{
        ApiResponse, GetFileRequest, ListFilesRequest, LoginRequest, PathRequest, RenameRequest,
        SessionRequest, SuccessResponse, UploadParams,
    },
    app_state::{AppState, SessionKey},
    remote::{RemoteSession, child_path, download_destination, normalize_dir},
};

use super::staging::{StagedUpload, staging_dir, streaming_body};

/// Header carrying the JSON [`UploadParams`] of an upload
const UPLOAD_PARAMS_HEADER: &str = "upload-params";

/// Multipart field holding the uploaded file
const UPLOAD_FIELD: &str = "file";

/// Find the live session for `hostIp` + `username`
async fn lookup(
    state: &AppState,
    host_ip: &str,
    username: &str,
) -> Result<Arc<RemoteSession>, ApiResponse> {
    let key = SessionKey::from_request(host_ip, username).ok_or_else(ApiResponse::not_logged_in)?;
    state
        .session(&key)
        .await
        .ok_or_else(ApiResponse::not_logged_in)
}

fn to_data<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn outcome(succeeded: bool, ok: &str, failed: &str) -> Json<ApiResponse> {
    if succeeded {
        Json(ApiResponse::ok(ok, json!({})))
    } else {
        Json(ApiResponse::fail(failed))
    }
}

/// Authenticate against a remote host and register the session
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Json<ApiResponse> {
    info!("Login request for {} at {}", req.username, req.host_ip);
    match state.login(&req.host_ip, &req.username, &req.password).await {
        Ok(key) => Json(ApiResponse::ok(
            "Login successful",
            json!({
                "key": key.to_string(),
                "hostIp": req.host_ip,
                "username": req.username,
            }),
        )),
        Err(e) => {
            error!("Login failed for {} at {}: {}", req.username, req.host_ip, e);
            Json(ApiResponse::fail(e.to_string()))
        }
    }
}

/// Close the session and forget its stored credentials
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Json<ApiResponse> {
    let Some(key) = SessionKey::from_request(&req.host_ip, &req.username) else {
        return Json(ApiResponse::not_logged_in());
    };
    if state.logout(&key).await {
        info!("Logged out {}", key);
        Json(ApiResponse::ok("Logged out", json!({})))
    } else {
        Json(ApiResponse::not_logged_in())
    }
}

pub async fn list_files(
    State(state): State<AppState>,
    Json(req): Json<ListFilesRequest>,
) -> Json<ApiResponse> {
    let session = match lookup(&state, &req.host_ip, &req.username).await {
        Ok(session) => session,
        Err(response) => return Json(response),
    };
    match session.list_directory(&req.location).await {
        Ok(entries) => Json(ApiResponse::ok("", to_data(entries))),
        Err(e) => {
            error!("Error listing {}: {}", req.location, e);
            Json(ApiResponse {
                succeeded: false,
                message: e.to_string(),
                data: json!([]),
            })
        }
    }
}

/// Stage a multipart upload locally, then push it to `location` on the remote host
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<ApiResponse> {
    let raw = headers
        .get(UPLOAD_PARAMS_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("{}");
    let params: UploadParams = match serde_json::from_str(raw) {
        Ok(params) => params,
        Err(e) => return Json(ApiResponse::fail(format!("Invalid upload parameters: {}", e))),
    };
    if !params.is_complete() {
        return Json(ApiResponse::fail("Missing upload parameters"));
    }
    let session = match lookup(&state, &params.host_ip, &params.username).await {
        Ok(session) => session,
        Err(response) => return Json(response),
    };

    let staged = match stage_upload(&mut multipart, &state.config.transfer.upload_dir).await {
        Ok(Some(staged)) => staged,
        Ok(None) => return Json(ApiResponse::fail("No file in upload")),
        Err(message) => {
            error!("Error receiving upload: {}", message);
            return Json(ApiResponse::fail(message));
        }
    };

    let remote_path = child_path(&normalize_dir(&params.location), &staged.filename);
    let uploaded = session.upload(&staged.local_path(), &remote_path).await;
    let filename = staged.filename.clone();
    staged.discard();

    if uploaded {
        Json(ApiResponse::ok(
            "File uploaded successfully",
            json!({ "filename": filename }),
        ))
    } else {
        Json(ApiResponse::fail("Failed to upload file"))
    }
}

/// Write the `file` field into a fresh directory under `upload_dir`;
/// `Ok(None)` when there is no such field
async fn stage_upload(
    multipart: &mut Multipart,
    upload_dir: &Path,
) -> Result<Option<StagedUpload>, String> {
    while let Some(mut field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // Keep only the final component so a crafted name cannot leave the staging dir
        let filename = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| "Upload has no file name".to_string())?;

        let (staged, mut file) = StagedUpload::create(upload_dir, &filename)
            .await
            .map_err(|e| e.to_string())?;
        while let Some(chunk) = field.chunk().await.map_err(|e| e.to_string())? {
            file.write_all(&chunk).await.map_err(|e| e.to_string())?;
        }
        file.flush().await.map_err(|e| e.to_string())?;

        return Ok(Some(staged));
    }
    Ok(None)
}

/// Download a remote file and stream its bytes back
pub async fn get_file(
    State(state): State<AppState>,
    Json(req): Json<GetFileRequest>,
) -> Response {
    let session = match lookup(&state, &req.host_ip, &req.username).await {
        Ok(session) => session,
        Err(response) => return Json(response).into_response(),
    };

    // One directory per request; it is removed when the response body is dropped
    let staging = match staging_dir(&state.config.transfer.download_dir, "download-") {
        Ok(staging) => staging,
        Err(e) => {
            error!("Failed to create download staging directory: {}", e);
            return Json(ApiResponse::fail(e.to_string())).into_response();
        }
    };
    let staging_path = staging.path().to_string_lossy().to_string();
    if !session.download(&req.remote_path, &staging_path).await {
        return Json(ApiResponse::fail("Failed to download file")).into_response();
    }
    let Some(local_path) = download_destination(&req.remote_path, &staging_path) else {
        return Json(ApiResponse::fail("Failed to download file")).into_response();
    };

    let file = match tokio::fs::File::open(&local_path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open downloaded file {}: {}", local_path, e);
            return Json(ApiResponse::fail(e.to_string())).into_response();
        }
    };
    let filename = Path::new(&local_path)
        .file_name()
        .map(|name| name.to_string_lossy().replace('"', ""))
        .unwrap_or_default();

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        streaming_body(file, staging),
    )
        .into_response()
}

pub async fn mkdir(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Json<ApiResponse> {
    match lookup(&state, &req.host_ip, &req.username).await {
        Ok(session) => outcome(
            session.mkdir(&req.path).await,
            "Directory created",
            "Failed to create directory",
        ),
        Err(response) => Json(response),
    }
}

pub async fn remove(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Json<ApiResponse> {
    match lookup(&state, &req.host_ip, &req.username).await {
        Ok(session) => outcome(
            session.remove(&req.path).await,
            "File/directory removed",
            "Failed to remove or path protected",
        ),
        Err(response) => Json(response),
    }
}

pub async fn rename(
    State(state): State<AppState>,
    Json(req): Json<RenameRequest>,
) -> Json<ApiResponse> {
    match lookup(&state, &req.host_ip, &req.username).await {
        Ok(session) => outcome(
            session.rename(&req.old_path, &req.new_path).await,
            "File/directory renamed",
            "Failed to rename",
        ),
        Err(response) => Json(response),
    }
}

pub async fn get_history(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Json<ApiResponse> {
    match lookup(&state, &req.host_ip, &req.username).await {
        Ok(session) => Json(ApiResponse::ok("", to_data(session.get_history().await))),
        Err(response) => Json(response),
    }
}

pub async fn get_df(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Json<ApiResponse> {
    match lookup(&state, &req.host_ip, &req.username).await {
        Ok(session) => Json(ApiResponse::ok("", to_data(session.get_disk_usage().await))),
        Err(response) => Json(response),
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "Health check passed".to_string(),
        }),
    )
}
