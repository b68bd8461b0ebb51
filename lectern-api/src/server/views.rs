//! Everything a response body can contain.

use crate::server::forms::{CommentForm, FormErrors, GroupForm, PostForm};
use lectern_common::{
    model::{
        Id,
        comment::Comment,
        group::Group,
        post::{Post, PostMarker},
        user::User,
    },
    pagination::Page,
};
use serde::Serialize;

/// The global index. Shared by every visitor, so nothing in here may depend
/// on who is looking.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct IndexView {
    pub page: Page<Post>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct GroupView {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct ProfileView {
    pub author: User,
    /// Whether the viewer follows `author`. Always false for anonymous viewers.
    pub following: bool,
    pub follower_count: u64,
    pub following_count: u64,
    pub page: Page<Post>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct FeedView {
    pub page: Page<Post>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostDetailView {
    pub post: Post,
    pub author_post_count: u64,
    pub comments: Vec<Comment>,
    pub comment_form: CommentForm,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostFormView {
    pub form: PostForm,
    pub errors: FormErrors,
    pub groups: Vec<Group>,
    pub is_edit: bool,
    pub post_id: Option<Id<PostMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct GroupFormView {
    pub form: GroupForm,
    pub errors: FormErrors,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostDeletedView {
    pub post_id: Id<PostMarker>,
}
