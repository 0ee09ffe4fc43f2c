use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::stock::repo::Item;

/// Payload for creating an item. The server stamps the registration
/// timestamp itself, so the client cannot supply one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub sku: Option<String>,
    pub marca: Option<String>,
    pub nombre: Option<String>,
    pub id_categoria: Option<i32>,
    #[serde(default = "default_categoria")]
    pub categoria: Option<String>,
    pub stock: Option<i32>,
    #[serde(default = "default_min_stock")]
    pub min_stock: Option<i32>,
    pub precio: Decimal,
    #[serde(default = "default_es_activo")]
    pub es_activo: Option<bool>,
    pub nombre_imagen: Option<String>,
    pub url_imagen: Option<String>,
    pub maneja_peso: Option<bool>,
}

fn default_categoria() -> Option<String> {
    Some("General".into())
}
fn default_min_stock() -> Option<i32> {
    Some(0)
}
fn default_es_activo() -> Option<bool> {
    Some(true)
}

/// Query string for the paginated and export listings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub search: Option<String>,
    pub category: Option<String>,
    pub stock_status: Option<String>,
}

fn default_page() -> i64 {
    1
}
fn default_page_size() -> i64 {
    10
}

impl StockQuery {
    /// 1-indexed page, clamped so a page below 1 never produces a negative
    /// OFFSET; a non-positive pageSize falls back to the default.
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn page_size(&self) -> i64 {
        if self.page_size < 1 {
            default_page_size()
        } else {
            self.page_size
        }
    }

    pub fn filter(&self) -> ItemFilter {
        ItemFilter {
            search: self.search.clone().filter(|s| !s.is_empty()),
            category: self.category.clone(),
            stock_status: self.stock_status.clone(),
        }
    }
}

/// Normalized filter set shared by the paginated listing and the export.
#[derive(Debug, Default, Clone)]
pub struct ItemFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub stock_status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_items: i64, page: i64, page_size: i64) -> Self {
        // Callers pass the clamped query value, but the arithmetic must not
        // divide by zero either way.
        let page_size = page_size.max(1);
        let total_pages = (total_items + page_size - 1) / page_size;
        Self {
            data,
            total_items,
            total_pages,
            current_page: page,
            page_size,
        }
    }
}

/// Dashboard aggregates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStats {
    pub total_items: i64,
    pub total_watches: i64,
    pub total_jewelry: i64,
    pub low_stock_count: i64,
    pub low_stock_items: Vec<Item>,
    pub recent_items: Vec<Item>,
}
