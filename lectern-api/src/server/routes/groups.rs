use crate::server::{
    Result, ServerRouter,
    auth::LoginRequired,
    forms::{Cleaned, FormErrors, GroupForm, SLUG_TAKEN},
    json::Json,
    routes::listings::GroupPath,
    views::GroupFormView,
};
use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use lectern_db::client::DbClient;
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    Router::new()
        .typed_get(create_group_form)
        .typed_post(create_group)
}

#[derive(TypedPath)]
#[typed_path("/create/group/")]
pub struct CreateGroupPath;

async fn create_group_form(
    _: CreateGroupPath,
    LoginRequired(_): LoginRequired,
) -> Json<GroupFormView> {
    Json(GroupFormView {
        form: GroupForm::default(),
        errors: FormErrors::default(),
    })
}

async fn create_group(
    _: CreateGroupPath,
    LoginRequired(user): LoginRequired,
    State(db): State<Arc<DbClient>>,
    form: Result<Form<GroupForm>, FormRejection>,
) -> Result<Response> {
    let Form(form) = form?;

    let mut errors = match form.clean(&db).await? {
        Cleaned::Valid(group) => match db.create_group(&group).await? {
            Some(group) => {
                info!(
                    group_id = %group.id,
                    slug = %group.slug,
                    creator = %user.id(),
                    "Group created"
                );

                let path = GroupPath { slug: group.slug };
                return Ok(Redirect::to(&path.to_string()).into_response());
            }
            None => FormErrors::default(),
        },
        Cleaned::Invalid(errors) => errors,
    };
    // The slug was free when validated but got taken before the insert.
    if errors.is_empty() {
        errors.add("slug", SLUG_TAKEN);
    }

    Ok(Json(GroupFormView { form, errors }).into_response())
}
