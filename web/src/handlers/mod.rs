//! HTTP request handlers, one module per resource.

pub mod allocations;
pub mod beds;
pub mod dorms;
pub mod health;
pub mod rooms;

use crate::error::AppError;
use accommodation_core::input::{Page, PageRequest};

/// Validate the `page` / `page_size` query parameters.
fn page(request: PageRequest) -> Result<Page, AppError> {
    Ok(Page::new(request)?)
}
