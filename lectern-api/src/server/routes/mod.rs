use crate::server::ServerRouter;
use axum::Router;
use lectern_common::pagination::PageNumber;
use serde::Deserialize;

mod follows;
mod groups;
mod listings;
pub(crate) mod posts;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(listings::routes())
        .merge(posts::routes())
        .merge(groups::routes())
        .merge(follows::routes())
}

/// `?page=` of the paginated listings. Kept as a raw string, since a page
/// that is not a number is page 1 rather than a bad request.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn page_number(&self) -> PageNumber {
        PageNumber::parse(self.page.as_deref())
    }
}
