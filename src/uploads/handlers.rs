use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{auth::AuthUser, state::AppState};

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/Upload", post(upload_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub public_id: String,
}

/// POST /Upload (multipart, field `file`). Stores the image in object
/// storage under the configured folder and returns its public URL. File
/// type and size validation is left to the storage provider.
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    _user: AuthUser,
    mut mp: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut file: Option<(bytes::Bytes, String)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field.bytes().await.map_err(|e| {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            })?;
            file = Some((data, content_type));
        }
    }

    let Some((data, content_type)) = file else {
        return Err((
            StatusCode::BAD_REQUEST,
            "No se proporcionó ningún archivo.".into(),
        ));
    };
    if data.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No se proporcionó ningún archivo.".into(),
        ));
    }

    let ext = ext_from_mime(&content_type).unwrap_or("bin");
    let key = format!("{}/{}.{}", state.config.storage.folder, Uuid::new_v4(), ext);

    if let Err(e) = state.storage.put_object(&key, data, &content_type).await {
        error!(error = %e, key = %key, "image upload failed");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }

    let url = state.storage.public_url(&key);
    info!(key = %key, "image uploaded");
    Ok(Json(UploadResponse {
        url,
        public_id: key,
    }))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }

    #[tokio::test]
    async fn public_url_includes_folder_and_key() {
        let state = AppState::fake();
        let url = state.storage.public_url("joyeria_stock/abc.jpg");
        assert!(url.contains("joyeria_stock/abc.jpg"));
    }
}
