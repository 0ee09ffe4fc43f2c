use serde::{Deserialize, Serialize};

use crate::egresos::repo::Egreso;
use crate::stock::repo::Item;

/// Request body for a withdrawal. The reason is free text by convention:
/// "Venta", "Devolución a proveedor", "Garantía", "Merma", "Otro".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuevoEgreso {
    pub item_id: i32,
    pub cantidad: i32,
    pub motivo: Option<String>,
}

/// Ledger row with its parent item embedded, for the listing view.
#[derive(Debug, Serialize)]
pub struct EgresoConItem {
    #[serde(flatten)]
    pub egreso: Egreso,
    pub item: Option<Item>,
}
