//! Request extractors whose rejections render as [`AppError`] (`422` with `{"detail"}`).

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct ApiForm<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use crate::{app::build_app, state::AppState};
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    async fn assert_json_422(resp: Response) {
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(!json["detail"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mistyped_json_field_is_json_422() {
        let resp = build_app(AppState::fake())
            .oneshot(
                Request::post("/api/v1/users/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_json_422(resp).await;
    }

    #[tokio::test]
    async fn malformed_json_is_json_422() {
        let resp = build_app(AppState::fake())
            .oneshot(
                Request::post("/api/v1/reset-password/")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_json_422(resp).await;
    }

    #[tokio::test]
    async fn missing_content_type_is_json_422() {
        let resp = build_app(AppState::fake())
            .oneshot(
                Request::post("/api/v1/users/signup")
                    .body(Body::from(r#"{"email":"a@x.com","password":"longpass1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_json_422(resp).await;
    }

    #[tokio::test]
    async fn login_form_missing_password_is_json_422() {
        let resp = build_app(AppState::fake())
            .oneshot(
                Request::post("/api/v1/login/access-token")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("username=a@x.com"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_json_422(resp).await;
    }
}
