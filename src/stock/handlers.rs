use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::AuthUser,
    state::AppState,
    stock::{
        dto::{ItemInput, PaginatedResponse, StockQuery, StockStats},
        repo::{self, Item},
    },
};

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/Stock", get(list_stock).post(create_item))
        .route("/Stock/stats", get(stock_stats))
        .route("/Stock/paginated", get(stock_paginated))
        .route("/Stock/export", get(stock_export))
        .route(
            "/Stock/:id",
            get(get_item).put(put_item).delete(delete_item),
        )
}

#[instrument(skip(state))]
pub async fn list_stock(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<Item>>, (StatusCode, String)> {
    let items = repo::list_all(&state.db).await.map_err(internal)?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn stock_stats(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<StockStats>, (StatusCode, String)> {
    let stats = repo::stats(&state.db).await.map_err(internal)?;
    Ok(Json(stats))
}

#[instrument(skip(state))]
pub async fn stock_paginated(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<StockQuery>,
) -> Result<Json<PaginatedResponse<Item>>, (StatusCode, String)> {
    let filter = q.filter();
    let page = q.page();
    let page_size = q.page_size();

    let total_items = repo::count_filtered(&state.db, &filter)
        .await
        .map_err(internal)?;
    let items = repo::page_filtered(&state.db, &filter, page_size, (page - 1) * page_size)
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::new(
        items,
        total_items,
        page,
        page_size,
    )))
}

#[instrument(skip(state))]
pub async fn stock_export(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<StockQuery>,
) -> Result<Json<Vec<Item>>, (StatusCode, String)> {
    let items = repo::list_filtered(&state.db, &q.filter())
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<Item>, (StatusCode, String)> {
    match repo::find(&state.db, id).await.map_err(internal)? {
        Some(item) => Ok(Json(item)),
        None => Err((StatusCode::NOT_FOUND, "Ítem no encontrado".into())),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ItemInput>,
) -> Result<(StatusCode, HeaderMap, Json<Item>), (StatusCode, String)> {
    let item = repo::create(&state.db, &payload).await.map_err(internal)?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/Stock/{}", item.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(item)))
}

#[instrument(skip(state, payload))]
pub async fn put_item(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<Item>,
) -> Result<StatusCode, (StatusCode, String)> {
    if id != payload.id {
        return Err((
            StatusCode::BAD_REQUEST,
            "El ID del ítem no coincide con el ID de la URL.".into(),
        ));
    }

    let touched = repo::replace(&state.db, &payload).await.map_err(internal)?;
    if touched == 0 {
        // The row disappeared between the client's read and this write.
        return Err((StatusCode::NOT_FOUND, "Ítem no encontrado".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, (StatusCode, String)> {
    let touched = repo::delete(&state.db, id).await.map_err(internal)?;
    if touched == 0 {
        return Err((StatusCode::NOT_FOUND, "Ítem no encontrado".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "stock handler failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
