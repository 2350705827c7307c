use axum::{
    routing::{get, patch},
    Router,
};

use crate::state::ApiState;

pub fn app() -> Router<ApiState> {
    Router::<ApiState>::new()
        .route(
            "/",
            get(super::list_books::list_books).post(super::create_book::create_book),
        )
        .route(
            "/:book_id",
            patch(super::update_rating::update_rating).delete(super::delete_book::delete_book),
        )
}
