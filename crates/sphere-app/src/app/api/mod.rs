mod ai;
mod calendar_items;
mod healthcheck;
mod items;
mod rooms;
mod users;
pub mod util;

use salvo::{Router, handler};

#[handler]
async fn root() -> &'static str {
    "Hello, World!"
}

/// ## Summary
/// Constructs the main API router.
#[must_use]
pub fn routes() -> Router {
    Router::new()
        .get(root)
        .push(healthcheck::routes())
        .push(rooms::routes())
        .push(users::routes())
        .push(items::routes())
        .push(calendar_items::routes())
        .push(ai::routes())
}
