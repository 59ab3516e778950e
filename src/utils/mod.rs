use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    auth::extractors::CurrentSuperuser,
    common::Message,
    error::AppResult,
    extract::ApiQuery,
    mail,
    state::AppState,
    validation::{normalize_email, validate_email},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/utils/test-email/", post(test_email))
        .route("/utils/health-check/", get(health_check))
}

#[derive(Debug, Deserialize)]
pub struct TestEmailQuery {
    pub email_to: String,
}

#[instrument(skip(state, _admin))]
pub async fn test_email(
    State(state): State<AppState>,
    CurrentSuperuser(_admin): CurrentSuperuser,
    ApiQuery(q): ApiQuery<TestEmailQuery>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let email_to = normalize_email(&q.email_to);
    validate_email(&email_to)?;
    let email_data = mail::test_email(&state.config, &email_to);
    state.mailer.send(&email_to, &email_data).await?;
    info!(%email_to, "test email sent");
    Ok((StatusCode::CREATED, Json(Message::new("Test email sent"))))
}

pub async fn health_check() -> Json<bool> {
    Json(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_app;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_check_is_true() {
        let resp = build_app(AppState::fake())
            .oneshot(
                Request::get("/api/v1/utils/health-check/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"true");
    }

    #[tokio::test]
    async fn test_email_needs_superuser_token() {
        let resp = build_app(AppState::fake())
            .oneshot(
                Request::post("/api/v1/utils/test-email/?email_to=a@x.com")
                    .header("authorization", "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
