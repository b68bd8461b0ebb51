use crate::model::{Id, user::UserMarker};

/// A directed follower -> author edge. Never points at its own start.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct FollowEdge {
    follower: Id<UserMarker>,
    author: Id<UserMarker>,
}

impl FollowEdge {
    /// Returns `None` for a self-follow.
    #[must_use]
    pub fn new(follower: Id<UserMarker>, author: Id<UserMarker>) -> Option<Self> {
        (follower != author).then_some(Self { follower, author })
    }

    #[must_use]
    pub fn follower(self) -> Id<UserMarker> {
        self.follower
    }

    #[must_use]
    pub fn author(self) -> Id<UserMarker> {
        self.author
    }
}
