use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{FormRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use cache::PageCache;
use json::Json;
use lectern_common::{
    model::{
        Id,
        group::GroupSlug,
        post::PostMarker,
        session::SessionTokenHashError,
        user::Username,
    },
    pagination::Paginator,
};
use lectern_db::client::{DbClient, DbError};
use serde::{Deserialize, Serialize};
use std::{num::NonZeroUsize, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::error;

mod auth;
pub mod cache;
mod forms;
mod json;
mod routes;
mod views;


pub type ServerRouter = Router<ServerState>;

/// Knobs the handlers need at request time.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct SiteSettings {
    pub paginator: Paginator,
    pub index_cache_ttl: Duration,
    pub index_cache_capacity: NonZeroUsize,
    pub login_url: String,
}

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub page_cache: Arc<PageCache>,
    pub site: Arc<SiteSettings>,
}

impl ServerState {
    #[must_use]
    pub fn new(db_client: DbClient, site: SiteSettings) -> Self {
        Self {
            db_client: Arc::new(db_client),
            page_cache: Arc::new(PageCache::new(site.index_cache_capacity)),
            site: Arc::new(site),
        }
    }
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Submitted form rejected: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("The session token could not be hashed: {0}")]
    SessionTokenHash(#[from] SessionTokenHashError),
    #[error("Blocking task failed: {0}")]
    BlockingTask(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("User with username {0} was not found.")]
    UserByUsernameNotFound(Username),
    #[error("Group with slug {0} was not found.")]
    GroupBySlugNotFound(GroupSlug),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::UserByUsernameNotFound(_)
            | ServerError::GroupBySlugNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::QueryRejection(rejection) => rejection.status(),
            ServerError::FormRejection(rejection) => rejection.status(),
            ServerError::JsonResponse(_)
            | ServerError::Database(_)
            | ServerError::SessionTokenHash(_)
            | ServerError::BlockingTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
        };
        (status, Json(error_response)).into_response()
    }
}
