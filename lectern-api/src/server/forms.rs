//! Submitted forms and their validation.
//!
//! Every field arrives as a plain string so an invalid submission can be sent
//! back to the user exactly as typed, together with per-field messages.

use lectern_common::model::{
    Id,
    comment::CommentText,
    group::{CreateGroup, GroupMarker, GroupSlug, GroupTitle, InvalidGroupSlugError},
    post::{ImageRef, Post, PostContent, PostText},
};
use lectern_db::client::{DbClient, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const SLUG_TAKEN: &str = "A group with this slug already exists.";

/// Field name to messages. Empty when the form is valid.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Cleaned<T> {
    Valid(T),
    Invalid(FormErrors),
}

impl<T> Cleaned<T> {
    fn from_parts(value: Option<T>, errors: FormErrors) -> Self {
        match value {
            Some(value) if errors.is_empty() => Self::Valid(value),
            _ => Self::Invalid(errors),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    /// Group id, or empty for no group.
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub image: String,
}

impl PostForm {
    /// Prefills the edit form. The image is left empty, meaning "keep".
    #[must_use]
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.get().to_owned(),
            group: post
                .group
                .as_ref()
                .map(|group| group.id.to_string())
                .unwrap_or_default(),
            image: String::new(),
        }
    }

    /// An empty `image` falls back to `current_image`, which is `None` for
    /// new posts.
    pub async fn clean(
        &self,
        db: &DbClient,
        current_image: Option<&ImageRef>,
    ) -> Result<Cleaned<PostContent>> {
        let mut errors = FormErrors::default();

        let text = PostText::new(&self.text)
            .map_err(|e| errors.add("text", e.to_string()))
            .ok();

        let group = self.clean_group(db).await?;
        let group = group.map_err(|()| errors.add("group", INVALID_CHOICE)).ok();

        let image = if self.image.trim().is_empty() {
            Some(current_image.cloned())
        } else {
            ImageRef::new(&self.image)
                .map(Some)
                .map_err(|e| errors.add("image", e.to_string()))
                .ok()
        };

        let content = text.zip(group).zip(image).map(|((text, group), image)| PostContent {
            text,
            group,
            image,
        });
        Ok(Cleaned::from_parts(content, errors))
    }

    async fn clean_group(&self, db: &DbClient) -> Result<Result<Option<Id<GroupMarker>>, ()>> {
        let raw = self.group.trim();
        if raw.is_empty() {
            return Ok(Ok(None));
        }

        let Ok(group_id) = raw.parse::<Id<GroupMarker>>() else {
            return Ok(Err(()));
        };
        let group = db.fetch_group(group_id).await?;

        Ok(group.map(|group| Some(group.id)).ok_or(()))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct GroupForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl GroupForm {
    pub async fn clean(&self, db: &DbClient) -> Result<Cleaned<CreateGroup>> {
        let mut errors = FormErrors::default();

        let title = GroupTitle::new(&self.title)
            .map_err(|e| errors.add("title", e.to_string()))
            .ok();

        let slug = match GroupSlug::new(self.slug.trim().to_owned()) {
            Ok(slug) => Some(slug),
            Err(e) => {
                errors.add("slug", slug_error_message(&e));
                None
            }
        };
        let slug = match slug {
            Some(slug) if db.fetch_group_by_slug(&slug).await?.is_none() => Some(slug),
            Some(_) => {
                errors.add("slug", SLUG_TAKEN);
                None
            }
            None => None,
        };

        let group = title.zip(slug).map(|(title, slug)| CreateGroup {
            title,
            slug,
            description: self.description.trim().to_owned(),
        });
        Ok(Cleaned::from_parts(group, errors))
    }
}

fn slug_error_message(error: &InvalidGroupSlugError) -> String {
    match error {
        InvalidGroupSlugError::Empty => "This field is required.".to_owned(),
        InvalidGroupSlugError::InvalidCharacter(_, _) => {
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.".to_owned()
        }
        InvalidGroupSlugError::TooLong(_) => error.to_string(),
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    #[must_use]
    pub fn clean(&self) -> Cleaned<CommentText> {
        let mut errors = FormErrors::default();
        let text = CommentText::new(&self.text)
            .map_err(|e| errors.add("text", e.to_string()))
            .ok();

        Cleaned::from_parts(text, errors)
    }
}

#[cfg(test)]
mod tests {
    use crate::server::forms::{Cleaned, CommentForm, GroupForm, INVALID_CHOICE, PostForm};
    use lectern_common::model::{
        group::{CreateGroup, GroupSlug, GroupTitle},
        post::ImageRef,
    };
    use lectern_db::client::DbClient;

    async fn client() -> DbClient {
        let db = DbClient::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn post_form(text: &str, group: &str, image: &str) -> PostForm {
        PostForm {
            text: text.to_owned(),
            group: group.to_owned(),
            image: image.to_owned(),
        }
    }

    #[tokio::test]
    async fn post_text_needs_ten_characters() {
        let db = client().await;

        let Cleaned::Invalid(errors) = post_form("123456789", "", "").clean(&db, None).await.unwrap()
        else {
            panic!("nine characters should be rejected");
        };
        assert_eq!(errors.field("text").len(), 1);
        assert!(errors.field("group").is_empty());

        let Cleaned::Valid(content) = post_form("1234567890", "", "").clean(&db, None).await.unwrap()
        else {
            panic!("ten characters should be accepted");
        };
        assert_eq!(content.text.get(), "1234567890");
        assert_eq!(content.group, None);
        assert_eq!(content.image, None);
    }

    #[tokio::test]
    async fn unknown_group_is_an_invalid_choice() {
        let db = client().await;

        for group in ["42", "not a number"] {
            let Cleaned::Invalid(errors) = post_form("long enough text", group, "")
                .clean(&db, None)
                .await
                .unwrap()
            else {
                panic!("group {group:?} should be rejected");
            };
            assert_eq!(errors.field("group"), [INVALID_CHOICE.to_owned()]);
        }

        let group = db
            .create_group(&CreateGroup {
                title: GroupTitle::new("Test group").unwrap(),
                slug: GroupSlug::new("test".to_owned()).unwrap(),
                description: String::new(),
            })
            .await
            .unwrap()
            .unwrap();
        let Cleaned::Valid(content) = post_form("long enough text", &group.id.to_string(), "")
            .clean(&db, None)
            .await
            .unwrap()
        else {
            panic!("existing group should be accepted");
        };
        assert_eq!(content.group, Some(group.id));
    }

    #[tokio::test]
    async fn empty_image_keeps_current_one() {
        let db = client().await;
        let current = ImageRef::new("posts/kitten.jpg").unwrap();

        let Cleaned::Valid(kept) = post_form("long enough text", "", " ")
            .clean(&db, Some(&current))
            .await
            .unwrap()
        else {
            panic!("form should be valid");
        };
        assert_eq!(kept.image, Some(current.clone()));

        let Cleaned::Valid(replaced) = post_form("long enough text", "", "posts/puppy.jpg")
            .clean(&db, Some(&current))
            .await
            .unwrap()
        else {
            panic!("form should be valid");
        };
        assert_eq!(replaced.image.unwrap().get(), "posts/puppy.jpg");
    }

    #[tokio::test]
    async fn taken_slug_is_a_field_error() {
        let db = client().await;
        let form = GroupForm {
            title: "Cats".to_owned(),
            slug: "cats".to_owned(),
            description: "All about cats".to_owned(),
        };

        let Cleaned::Valid(group) = form.clean(&db).await.unwrap() else {
            panic!("fresh slug should be accepted");
        };
        db.create_group(&group).await.unwrap().unwrap();

        let Cleaned::Invalid(errors) = form.clean(&db).await.unwrap() else {
            panic!("taken slug should be rejected");
        };
        assert_eq!(errors.field("slug").len(), 1);
        assert!(errors.field("title").is_empty());
    }

    #[test]
    fn blank_comment_is_rejected() {
        let blank = CommentForm {
            text: "   ".to_owned(),
        };
        assert!(matches!(blank.clean(), Cleaned::Invalid(errors) if errors.field("text").len() == 1));

        let comment = CommentForm {
            text: " Nice post ".to_owned(),
        };
        assert!(matches!(comment.clean(), Cleaned::Valid(text) if text.get() == "Nice post"));
    }
}
