//! API handler modules

use std::any::Any;

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::error;

use super::errors::ErrorResponse;

pub mod v1;

/// Turn a panic inside a handler into a JSON 500
pub fn panic_handler(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let details = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "Internal server error".to_string());

    error!("handler panicked: {details}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: details }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use axum::body::to_bytes;
    use testresult::TestResult;

    use super::*;

    fn simulate_panic() -> Box<dyn Any + Send + 'static> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            panic!("Something went wrong");
        }))
        .expect_err("the closure panics")
    }

    #[tokio::test]
    async fn test_panic_handler() -> TestResult {
        let response = panic_handler(simulate_panic());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json = serde_json::from_slice::<serde_json::Value>(&body)?;

        assert_eq!(json, serde_json::json!({ "error": "Something went wrong" }));

        Ok(())
    }

    #[tokio::test]
    async fn test_panic_handler_unknown_payload() -> TestResult {
        let response = panic_handler(Box::new(42_u8));

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json = serde_json::from_slice::<serde_json::Value>(&body)?;

        assert_eq!(json, serde_json::json!({ "error": "Internal server error" }));

        Ok(())
    }
}
