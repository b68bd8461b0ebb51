use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{LoginRequired, require_author},
    forms::{Cleaned, CommentForm, FormErrors, PostForm},
    json::Json,
    routes::listings::ProfilePath,
    views::{PostDeletedView, PostDetailView, PostFormView},
};
use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use lectern_common::model::{
    Id,
    post::{Post, PostMarker},
};
use lectern_db::{PostListing, client::DbClient};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    Router::new()
        .typed_get(post_detail)
        .typed_get(create_post_form)
        .typed_post(create_post)
        .typed_get(edit_post_form)
        .typed_post(edit_post)
        .typed_get(delete_post)
        .typed_post(delete_post)
        .typed_post(add_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/", rejection(ServerError))]
pub struct PostDetailPath {
    pub id: Id<PostMarker>,
}

#[derive(TypedPath)]
#[typed_path("/create/")]
pub struct CreatePostPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/edit/", rejection(ServerError))]
pub struct EditPostPath {
    pub id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/delete/", rejection(ServerError))]
pub struct DeletePostPath {
    pub id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comment/", rejection(ServerError))]
pub struct CommentPath {
    pub id: Id<PostMarker>,
}

fn redirect_to_detail(id: Id<PostMarker>) -> Response {
    Redirect::to(&PostDetailPath { id }.to_string()).into_response()
}

async fn fetch_post(db: &DbClient, id: Id<PostMarker>) -> Result<Post> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(post)
}

async fn post_form_view(
    db: &DbClient,
    form: PostForm,
    errors: FormErrors,
    post_id: Option<Id<PostMarker>>,
) -> Result<Json<PostFormView>> {
    let groups = db.fetch_groups().await?;

    Ok(Json(PostFormView {
        form,
        errors,
        groups,
        is_edit: post_id.is_some(),
        post_id,
    }))
}

async fn post_detail(
    PostDetailPath { id }: PostDetailPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<PostDetailView>> {
    let post = fetch_post(&db, id).await?;
    let comments = db.fetch_post_comments(id).await?;
    let author_post_count = db
        .count_posts(PostListing::ByAuthor(post.author.id))
        .await?;

    Ok(Json(PostDetailView {
        post,
        author_post_count,
        comments,
        comment_form: CommentForm::default(),
    }))
}

async fn create_post_form(
    _: CreatePostPath,
    LoginRequired(_): LoginRequired,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<PostFormView>> {
    post_form_view(&db, PostForm::default(), FormErrors::default(), None).await
}

async fn create_post(
    _: CreatePostPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response> {
    let Form(form) = form?;

    match form.clean(&db, None).await? {
        Cleaned::Valid(content) => {
            let post_id = db.create_post(user.id(), &content).await?;
            info!(%post_id, author = %user.id(), "Post created");

            let profile = ProfilePath {
                username: user.user().username.clone(),
            };
            Ok(Redirect::to(&profile.to_string()).into_response())
        }
        Cleaned::Invalid(errors) => Ok(post_form_view(&db, form, errors, None)
            .await?
            .into_response()),
    }
}

async fn edit_post_form(
    EditPostPath { id }: EditPostPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
) -> Result<Response> {
    let post = fetch_post(&db, id).await?;
    if let Err(redirect) = require_author(&user, &post) {
        return Ok(redirect.into_response());
    }

    let form = PostForm::from_post(&post);
    Ok(post_form_view(&db, form, FormErrors::default(), Some(id))
        .await?
        .into_response())
}

async fn edit_post(
    EditPostPath { id }: EditPostPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response> {
    let post = fetch_post(&db, id).await?;
    if let Err(redirect) = require_author(&user, &post) {
        return Ok(redirect.into_response());
    }
    let Form(form) = form?;

    match form.clean(&db, post.image.as_ref()).await? {
        Cleaned::Valid(content) => {
            db.update_post_content(id, &content).await?;
            info!(post_id = %id, "Post updated");

            Ok(redirect_to_detail(id))
        }
        Cleaned::Invalid(errors) => Ok(post_form_view(&db, form, errors, Some(id))
            .await?
            .into_response()),
    }
}

/// Deletes the post and its comments, then confirms the deletion.
async fn delete_post(
    DeletePostPath { id }: DeletePostPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
) -> Result<Response> {
    let post = fetch_post(&db, id).await?;
    if let Err(redirect) = require_author(&user, &post) {
        return Ok(redirect.into_response());
    }

    if db.delete_post(id).await? {
        info!(post_id = %id, "Post deleted");
    }

    Ok(Json(PostDeletedView { post_id: id }).into_response())
}

/// Invalid comments are dropped silently. The user always lands back on the
/// post.
async fn add_comment(
    CommentPath { id }: CommentPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response> {
    let post = fetch_post(&db, id).await?;
    let Form(form) = form?;

    if let Cleaned::Valid(text) = form.clean() {
        let comment_id = db.create_comment(post.id, user.id(), &text).await?;
        info!(%comment_id, post_id = %post.id, "Comment created");
    }

    Ok(redirect_to_detail(post.id))
}
