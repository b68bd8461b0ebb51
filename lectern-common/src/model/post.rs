use crate::model::{
    Id,
    group::{Group, GroupMarker},
    user::User,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

pub const POST_TEXT_MIN_LEN: usize = 10;
pub const IMAGE_REF_MAX_LEN: usize = 100;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub text: PostText,
    pub group: Option<Group>,
    pub image: Option<ImageRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The author-editable part of a post.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostContent {
    pub text: PostText,
    pub group: Option<Id<GroupMarker>>,
    pub image: Option<ImageRef>,
}

/// Post body, surrounding whitespace removed, at least [`POST_TEXT_MIN_LEN`] characters.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostText(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
#[error("The post text has {0} characters, at least {POST_TEXT_MIN_LEN} are required")]
pub struct InvalidPostTextError(pub usize);

impl PostText {
    pub fn new(text: &str) -> Result<Self, InvalidPostTextError> {
        let text = text.trim();
        let length = text.chars().count();
        if length < POST_TEXT_MIN_LEN {
            return Err(InvalidPostTextError(length));
        }

        Ok(Self(text.to_owned()))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

/// Key of an image held by the blob store. We never look inside it.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageRef(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidImageRefError {
    #[error("The image reference is empty")]
    Empty,
    #[error("The image reference is longer than {IMAGE_REF_MAX_LEN} characters")]
    TooLong,
}

impl ImageRef {
    pub fn new(reference: &str) -> Result<Self, InvalidImageRefError> {
        let reference = reference.trim();
        if reference.is_empty() {
            Err(InvalidImageRefError::Empty)
        } else if reference.chars().count() > IMAGE_REF_MAX_LEN {
            Err(InvalidImageRefError::TooLong)
        } else {
            Ok(Self(reference.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::{ImageRef, InvalidImageRefError, InvalidPostTextError, PostText};

    #[test]
    fn post_text_minimum_length() {
        assert_eq!(PostText::new("123456789"), Err(InvalidPostTextError(9)));
        assert_eq!(PostText::new("1234567890").unwrap().get(), "1234567890");
    }

    #[test]
    fn post_text_counts_characters_not_bytes() {
        assert_eq!(PostText::new("Тестовый"), Err(InvalidPostTextError(8)));
        assert!(PostText::new("Тестовый пост").is_ok());
    }

    #[test]
    fn post_text_ignores_surrounding_whitespace() {
        assert_eq!(
            PostText::new("   short   \n"),
            Err(InvalidPostTextError(5))
        );
        assert_eq!(PostText::new("  long enough  ").unwrap().get(), "long enough");
    }

    #[test]
    fn image_ref_rules() {
        assert_eq!(ImageRef::new("  "), Err(InvalidImageRefError::Empty));
        assert_eq!(
            ImageRef::new(&"i".repeat(101)),
            Err(InvalidImageRefError::TooLong)
        );
        assert_eq!(ImageRef::new("posts/cat.gif").unwrap().get(), "posts/cat.gif");
    }
}
