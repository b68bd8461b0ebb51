use crate::server::{ServerError, SiteSettings, routes::posts::PostDetailPath};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use headers::{Authorization, Cookie, HeaderMapExt, authorization::Bearer};
use lectern_common::model::{
    Id,
    post::Post,
    session::SessionToken,
    user::{User, UserMarker},
};
use lectern_db::client::DbClient;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

pub const SESSION_COOKIE: &str = "session";

/// Characters escaped in the `next` parameter of a login redirect. Path
/// separators stay readable.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser(User);

impl AuthenticatedUser {
    #[must_use]
    pub fn id(&self) -> Id<UserMarker> {
        self.0.id
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.0
    }

    #[must_use]
    pub fn is_author_of(&self, post: &Post) -> bool {
        post.author.id == self.id()
    }
}

/// Whoever sent the request. Anonymous unless a valid, unexpired session
/// token was presented.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Viewer(pub Option<AuthenticatedUser>);

impl Viewer {
    #[must_use]
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.0.as_ref()
    }
}

fn request_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_owned());
    }

    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_owned))
}

async fn authenticate(db: &DbClient, raw_token: &str) -> Result<Option<User>, ServerError> {
    let token: SessionToken = match raw_token.parse() {
        Ok(token) => token,
        Err(e) => {
            debug!(error = %e, "Ignoring malformed session token");
            return Ok(None);
        }
    };

    // Argon2 must not run on an async worker.
    let user_id = token.user_id;
    let token_hash = tokio::task::spawn_blocking(move || token.hash()).await??;
    let Some(session) = db.fetch_session(&token_hash).await? else {
        debug!(%user_id, "Ignoring unknown session token");
        return Ok(None);
    };

    if session.user != user_id || !session.is_active_at(OffsetDateTime::now_utc()) {
        debug!(%user_id, "Ignoring expired or mismatched session");
        return Ok(None);
    }

    let user = db.fetch_user(session.user).await?;
    Ok(user)
}

impl<S> FromRequestParts<S> for Viewer
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw_token) = request_token(&parts.headers) else {
            return Ok(Self(None));
        };

        let db = Arc::<DbClient>::from_ref(state);
        let user = authenticate(&db, &raw_token).await?;

        Ok(Self(user.map(AuthenticatedUser)))
    }
}

#[derive(Debug)]
pub enum Access {
    Allowed(AuthenticatedUser),
    RedirectToLogin(Redirect),
}

/// Lets signed-in viewers through and sends everyone else to the login page,
/// remembering where they wanted to go.
#[must_use]
pub fn require_login(viewer: Viewer, login_url: &str, requested: &Uri) -> Access {
    match viewer.0 {
        Some(user) => Access::Allowed(user),
        None => Access::RedirectToLogin(login_redirect(login_url, requested)),
    }
}

#[must_use]
pub fn login_redirect(login_url: &str, requested: &Uri) -> Redirect {
    let next = requested
        .path_and_query()
        .map_or_else(|| requested.path(), |path_and_query| path_and_query.as_str());
    let separator = if login_url.contains('?') { '&' } else { '?' };
    let next = utf8_percent_encode(next, NEXT_ENCODE_SET);

    Redirect::to(&format!("{login_url}{separator}next={next}"))
}

/// Only the author may touch a post. Everyone else is sent back to its detail
/// view.
pub fn require_author(user: &AuthenticatedUser, post: &Post) -> Result<(), Redirect> {
    if user.is_author_of(post) {
        Ok(())
    } else {
        debug!(user_id = %user.id(), post_id = %post.id, "Rejecting non-author");
        Err(Redirect::to(&PostDetailPath { id: post.id }.to_string()))
    }
}

/// A signed-in user. Rejects anonymous requests with a login redirect.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct LoginRequired(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for LoginRequired
where
    Arc<DbClient>: FromRef<S>,
    Arc<SiteSettings>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let viewer = Viewer::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let site = Arc::<SiteSettings>::from_ref(state);

        match require_login(viewer, &site.login_url, &parts.uri) {
            Access::Allowed(user) => Ok(Self(user)),
            Access::RedirectToLogin(redirect) => Err(redirect.into_response()),
        }
    }
}
