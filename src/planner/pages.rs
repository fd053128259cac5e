//! Pagination enumerator over list endpoints.
//!
//! The API does not report how many pages exist. A page shorter than the
//! requested size, or an empty one, is taken as the last page; an exactly
//! full last page therefore costs one extra (empty) request.

use std::future::Future;
use tracing::trace;

use crate::error::Result;

/// Page size used for services, backends, metrics, methods and mapping rules.
pub const MAX_PER_PAGE: usize = 500;

/// Fetches pages `1, 2, ...` until a short or empty page and concatenates them.
///
/// # Errors
///
/// Returns the first error produced by `fetch`.
pub async fn collect_pages<T, F, Fut>(per_page: usize, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32, usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let batch = fetch(page, per_page).await?;
        let len = batch.len();
        trace!("page {page}: {len} items");

        if len == 0 {
            break;
        }

        items.extend(batch);

        if len < per_page {
            break;
        }

        page += 1;
    }

    Ok(items)
}
