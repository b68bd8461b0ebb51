use crate::server::{Result, ServerError};
use axum::response::{IntoResponse, Response};
use axum_extra::TypedHeader;
use bytes::Bytes;
use headers::ContentType;
use serde::Serialize;

/// A view rendered to JSON when the response is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match render(&self.0) {
            Ok(json) => RenderedJson(json).into_response(),
            Err(err) => err.into_response(),
        }
    }
}

/// A view that was already rendered, possibly a while ago.
#[derive(Debug, Clone, Default)]
pub struct RenderedJson(pub Bytes);

impl IntoResponse for RenderedJson {
    fn into_response(self) -> Response {
        (TypedHeader(ContentType::json()), self.0).into_response()
    }
}

pub fn render<T: Serialize>(view: &T) -> Result<Bytes> {
    let json = serde_json::to_vec(view).map_err(ServerError::JsonResponse)?;
    Ok(Bytes::from(json))
}
