//! `Json`, `Query` and `Path` that reject malformed input with a 422 and the
//! usual `{detail}` body instead of axum's plain-text rejections.

use axum::extract::{FromRequest, FromRequestParts};

use crate::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Counted {
        #[allow(dead_code)]
        count: i64,
    }

    #[derive(Deserialize)]
    struct Params {
        #[allow(dead_code)]
        limit: Option<i64>,
    }

    fn router() -> Router {
        Router::new()
            .route("/body", post(|Json(_): Json<Counted>| async { "ok" }))
            .route("/query", get(|Query(_): Query<Params>| async { "ok" }))
            .route("/path/{n}", get(|Path(_): Path<i64>| async { "ok" }))
    }

    async fn detail(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn rejections_are_json_422() {
        let (status, body) = detail(
            Request::post("/body")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("missing field `count`"));

        let (status, body) = detail(Request::get("/query?limit=abc").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("limit"));

        let (status, _) = detail(Request::get("/path/seven").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = detail(Request::post("/body").body(Body::from("{\"count\":1}")).unwrap()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
