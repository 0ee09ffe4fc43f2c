use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::AuthUser,
    egresos::{
        dto::{EgresoConItem, NuevoEgreso},
        repo::{self, Egreso, EgresoError},
    },
    state::AppState,
};

pub fn egreso_routes() -> Router<AppState> {
    Router::new().route("/Egresos", get(list_egresos).post(create_egreso))
}

#[instrument(skip(state))]
pub async fn list_egresos(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<EgresoConItem>>, (StatusCode, String)> {
    let egresos = repo::list_with_items(&state.db).await.map_err(|e| {
        error!(error = %e, "list egresos failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(egresos))
}

#[instrument(skip(state, payload))]
pub async fn create_egreso(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<NuevoEgreso>,
) -> Result<(StatusCode, HeaderMap, Json<Egreso>), (StatusCode, String)> {
    match repo::withdraw(
        &state.db,
        payload.item_id,
        payload.cantidad,
        payload.motivo.as_deref(),
    )
    .await
    {
        Ok(egreso) => {
            info!(
                item_id = payload.item_id,
                cantidad = payload.cantidad,
                egreso_id = egreso.id,
                "stock withdrawn"
            );
            Ok((StatusCode::CREATED, created_location(egreso.id), Json(egreso)))
        }
        Err(e @ EgresoError::CantidadInvalida) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e @ EgresoError::ItemNoEncontrado(_)) => Err((StatusCode::NOT_FOUND, e.to_string())),
        Err(e @ EgresoError::StockInsuficiente { .. }) => {
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(EgresoError::Db(e)) => {
            error!(error = %e, item_id = payload.item_id, "withdrawal transaction failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error interno al registrar el egreso: {e}"),
            ))
        }
    }
}

fn created_location(id: i32) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/Egresos/{}", id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_response_points_at_the_new_egreso() {
        let headers = created_location(7);
        let location = headers
            .get(axum::http::header::LOCATION)
            .expect("Location header");
        assert_eq!(location.to_str().unwrap(), "/api/Egresos/7");
    }
}
