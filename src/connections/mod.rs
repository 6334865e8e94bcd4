mod list;
mod request;
mod respond;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/connections/request", post(request::send_request))
        .route("/api/connections/requests/received", get(list::received))
        .route("/api/connections/requests/sent", get(list::sent))
        .route("/api/connections/requests/{request_id}/respond", put(respond::respond))
        .route("/api/connections/established", get(list::established))
}
