use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        repo::Usuario,
        services::{is_valid_email, verify_password, JwtKeys},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/Auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!("login with malformed email");
        return Err((StatusCode::BAD_REQUEST, "Formato de email inválido".into()));
    }

    let user = match Usuario::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            // Same message as a bad password, to avoid account enumeration.
            warn!("login unknown email");
            return Err((
                StatusCode::UNAUTHORIZED,
                "Credenciales incorrectas".into(),
            ));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let ok = match verify_password(&payload.password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err((
            StatusCode::UNAUTHORIZED,
            "Credenciales incorrectas".into(),
        ));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(&user.email, &user.rol) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        email: user.email,
        rol: user.rol,
    }))
}
