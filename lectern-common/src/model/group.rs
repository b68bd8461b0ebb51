use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const GROUP_SLUG_MAX_LEN: usize = 10;
pub const GROUP_TITLE_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct GroupMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
pub struct Group {
    pub id: Id<GroupMarker>,
    pub title: GroupTitle,
    pub slug: GroupSlug,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreateGroup {
    pub title: GroupTitle,
    pub slug: GroupSlug,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupSlug(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidGroupSlugError {
    #[error("The slug is empty")]
    Empty,
    #[error("The slug is longer than {GROUP_SLUG_MAX_LEN} characters: {0:?}")]
    TooLong(String),
    #[error("The slug contains the invalid character {1:?}: {0:?}")]
    InvalidCharacter(String, char),
}

impl GroupSlug {
    pub fn new(slug: String) -> Result<Self, InvalidGroupSlugError> {
        if slug.is_empty() {
            return Err(InvalidGroupSlugError::Empty);
        }
        let invalid = slug
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_')));
        if let Some(invalid) = invalid {
            return Err(InvalidGroupSlugError::InvalidCharacter(slug, invalid));
        }
        if slug.chars().count() > GROUP_SLUG_MAX_LEN {
            return Err(InvalidGroupSlugError::TooLong(slug));
        }

        Ok(Self(slug))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for GroupSlug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for GroupSlug {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        GroupSlug::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"GroupSlug"))
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidGroupTitleError {
    #[error("The group title is empty")]
    Empty,
    #[error("The group title is longer than {GROUP_TITLE_MAX_LEN} characters")]
    TooLong,
}

impl GroupTitle {
    pub fn new(title: &str) -> Result<Self, InvalidGroupTitleError> {
        let title = title.trim();
        if title.is_empty() {
            Err(InvalidGroupTitleError::Empty)
        } else if title.chars().count() > GROUP_TITLE_MAX_LEN {
            Err(InvalidGroupTitleError::TooLong)
        } else {
            Ok(Self(title.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}
