//! HTTP request handlers

pub mod health;
pub mod product;
pub mod sale_order;
pub mod stock;
pub mod supplier;

pub use health::*;
pub use product::*;
pub use sale_order::*;
pub use stock::*;
pub use supplier::*;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

/// Common list query: free-text search and page number
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<String>,
    pub format: Option<String>,
}

/// Whether the caller asked for a CSV export
pub(crate) fn wants_csv(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.eq_ignore_ascii_case("csv"))
}

/// Serve CSV text as a download
pub(crate) fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
