//! Shared DTO types used across multiple endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::persistence::models::{Page, SortOrder};

/// Largest page a listing endpoint returns.
pub const MAX_ITEMS: i64 = 100;

/// Page size used when `items` is omitted.
pub const DEFAULT_ITEMS: i64 = 50;

/// Paging query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Items per page (1..=100). Defaults to 50.
    #[serde(default = "default_items")]
    pub items: i64,
    /// Page number (0-indexed). Defaults to 0.
    #[serde(default)]
    pub page: i64,
    /// Sort direction. Defaults to `desc`.
    #[serde(default)]
    pub order: SortOrder,
}

fn default_items() -> i64 {
    DEFAULT_ITEMS
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            items: DEFAULT_ITEMS,
            page: 0,
            order: SortOrder::default(),
        }
    }
}

impl ListParams {
    /// Clamps the parameters into a query window.
    #[must_use]
    pub fn to_page(&self) -> Page {
        let limit = self.items.clamp(1, MAX_ITEMS);
        Page {
            limit,
            offset: limit.saturating_mul(self.page.max(0)),
            order: self.order,
        }
    }
}

/// Returns `Err` naming `field` when `value` is blank.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), crate::error::ChatError> {
    if value.trim().is_empty() {
        Err(crate::error::ChatError::InvalidRequest(format!(
            "{field} must not be empty"
        )))
    } else {
        Ok(())
    }
}
