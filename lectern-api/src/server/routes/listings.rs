use crate::server::{
    Result, ServerError, ServerRouter, SiteSettings,
    auth::{LoginRequired, Viewer},
    cache::PageCache,
    json::{self, Json, RenderedJson},
    routes::PageQuery,
    views::{FeedView, GroupView, IndexView, ProfileView},
};
use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
};
use axum_extra::routing::{RouterExt, TypedPath};
use lectern_common::model::{group::GroupSlug, user::Username};
use lectern_db::{PostListing, client::DbClient};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    Router::new()
        .typed_get(index)
        .typed_get(group_posts)
        .typed_get(profile)
        .typed_get(follow_feed)
}

#[derive(TypedPath)]
#[typed_path("/")]
pub struct IndexPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/group/{slug}/", rejection(ServerError))]
pub struct GroupPath {
    pub slug: GroupSlug,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/", rejection(ServerError))]
pub struct ProfilePath {
    pub username: Username,
}

#[derive(TypedPath)]
#[typed_path("/follow/")]
pub struct FeedPath;

/// Served through the page cache. The cached bytes are what every visitor
/// sees until the entry expires or the cache is flushed. Entries are keyed by
/// the clamped page, so every page past the end shares the last page's entry.
async fn index(
    _: IndexPath,
    State(db): State<Arc<DbClient>>,
    State(page_cache): State<Arc<PageCache>>,
    State(site): State<Arc<SiteSettings>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<RenderedJson> {
    let Query(query) = query?;
    let total_count = db.count_posts(PostListing::All).await?;
    let window = site.paginator.window(total_count, query.page_number());
    let key = format!("index?page={}", window.number());

    let body = page_cache
        .get_or_render(key, site.index_cache_ttl, || async {
            let page = db.fetch_post_window(PostListing::All, window).await?;
            json::render(&IndexView { page })
        })
        .await?;

    Ok(RenderedJson(body))
}

async fn group_posts(
    GroupPath { slug }: GroupPath,
    State(db): State<Arc<DbClient>>,
    State(site): State<Arc<SiteSettings>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<GroupView>> {
    let Query(query) = query?;
    let group = db
        .fetch_group_by_slug(&slug)
        .await?
        .ok_or(ServerError::GroupBySlugNotFound(slug))?;

    let page = db
        .posts_by_group(group.id, site.paginator, query.page_number())
        .await?;

    Ok(Json(GroupView { group, page }))
}

async fn profile(
    ProfilePath { username }: ProfilePath,
    viewer: Viewer,
    State(db): State<Arc<DbClient>>,
    State(site): State<Arc<SiteSettings>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ProfileView>> {
    let Query(query) = query?;
    let author = db
        .fetch_user_by_username(&username)
        .await?
        .ok_or(ServerError::UserByUsernameNotFound(username))?;

    let following = match viewer.user() {
        Some(viewer) => db.is_following(viewer.id(), author.id).await?,
        None => false,
    };
    let follower_count = db.follower_count(author.id).await?;
    let following_count = db.following_count(author.id).await?;
    let page = db
        .posts_by_author(author.id, site.paginator, query.page_number())
        .await?;

    Ok(Json(ProfileView {
        author,
        following,
        follower_count,
        following_count,
        page,
    }))
}

async fn follow_feed(
    _: FeedPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
    State(site): State<Arc<SiteSettings>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<FeedView>> {
    let Query(query) = query?;
    let page = db
        .posts_by_followed_authors(user.id(), site.paginator, query.page_number())
        .await?;

    Ok(Json(FeedView { page }))
}
