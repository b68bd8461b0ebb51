use crate::client::DbClient;
use lectern_common::model::{
    Id,
    group::{CreateGroup, Group, GroupMarker, GroupSlug, GroupTitle},
    post::{PostContent, PostMarker, PostText},
    user::{CreateUser, User, Username},
};

pub(crate) async fn client() -> DbClient {
    let db = DbClient::connect_in_memory().await.unwrap();
    db.migrate().await.unwrap();
    db
}

pub(crate) async fn create_user(db: &DbClient, username: &str) -> User {
    let user = CreateUser {
        username: Username::new(username.to_owned()).unwrap(),
    };
    db.create_user(&user).await.unwrap()
}

pub(crate) async fn create_group(db: &DbClient, slug: &str) -> Group {
    let group = CreateGroup {
        title: GroupTitle::new(&format!("Group {slug}")).unwrap(),
        slug: GroupSlug::new(slug.to_owned()).unwrap(),
        description: format!("All about {slug}"),
    };
    db.create_group(&group).await.unwrap().unwrap()
}

pub(crate) async fn create_post(
    db: &DbClient,
    author: &User,
    text: &str,
    group: Option<Id<GroupMarker>>,
) -> Id<PostMarker> {
    let content = PostContent {
        text: PostText::new(text).unwrap(),
        group,
        image: None,
    };
    db.create_post(author.id, &content).await.unwrap()
}
