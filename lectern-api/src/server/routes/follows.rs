use crate::server::{
    Result, ServerError, ServerRouter, auth::LoginRequired, routes::listings::FeedPath,
};
use axum::{Router, extract::State, response::Redirect};
use axum_extra::routing::{RouterExt, TypedPath};
use lectern_common::model::user::{User, Username};
use lectern_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    Router::new()
        .typed_get(follow_author)
        .typed_get(unfollow_author)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/follow/", rejection(ServerError))]
pub struct FollowPath {
    pub username: Username,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/unfollow/", rejection(ServerError))]
pub struct UnfollowPath {
    pub username: Username,
}

async fn fetch_author(db: &DbClient, username: Username) -> Result<User> {
    let author = db
        .fetch_user_by_username(&username)
        .await?
        .ok_or(ServerError::UserByUsernameNotFound(username))?;

    Ok(author)
}

fn redirect_to_feed() -> Redirect {
    Redirect::to(&FeedPath.to_string())
}

/// Following yourself or someone you already follow changes nothing.
async fn follow_author(
    FollowPath { username }: FollowPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
) -> Result<Redirect> {
    let author = fetch_author(&db, username).await?;
    db.follow(user.id(), author.id).await?;

    Ok(redirect_to_feed())
}

async fn unfollow_author(
    UnfollowPath { username }: UnfollowPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
) -> Result<Redirect> {
    let author = fetch_author(&db, username).await?;
    db.unfollow(user.id(), author.id).await?;

    Ok(redirect_to_feed())
}
