pub mod auth;
pub mod room_mutations;
pub mod rooms;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(rooms::routes())
        .merge(room_mutations::routes())
        .merge(auth::routes())
}
