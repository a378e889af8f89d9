//! Error responses of last resort.
//!
//! # Responsibilities
//! - Turn unexpected failures (panics, unparseable requests) into a 500
//! - Hide the failure detail unless debug mode is on

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use std::any::Any;

pub const GENERIC_ERROR_BODY: &str = "Internal Error";

/// 500 for a failure nothing else handled.
pub fn internal_error(debug: bool, detail: &str) -> Response<Body> {
    let body = if debug { detail.to_string() } else { GENERIC_ERROR_BODY.to_string() };
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

/// Panic handler for `CatchPanicLayer`.
#[derive(Debug, Clone, Copy)]
pub struct PanicResponder {
    pub debug: bool,
}

impl tower_http::catch_panic::ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "unknown panic".to_string()
        };

        tracing::error!(panic = %detail, "Request handler panicked");
        internal_error(self.debug, &detail)
    }
}
