use crate::client::{DbClient, Result};
use lectern_common::model::{Id, follow::FollowEdge, user::UserMarker};
use sqlx::{query, query_scalar};
use tracing::info;

impl DbClient {
    /// Creates the edge unless it exists or would be a self-follow.
    ///
    /// Returns whether a new edge was created.
    pub async fn follow(&self, follower: Id<UserMarker>, author: Id<UserMarker>) -> Result<bool> {
        let Some(edge) = FollowEdge::new(follower, author) else {
            return Ok(false);
        };

        let result = query(
            "
            INSERT INTO follows (follower_id, author_id)
            VALUES (?, ?)
            ON CONFLICT (follower_id, author_id) DO NOTHING
            ",
        )
        .bind(edge.follower().get())
        .bind(edge.author().get())
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() > 0;
        if created {
            info!(%follower, %author, "Follow edge created");
        }
        Ok(created)
    }

    /// Removes the edge if present. Returns whether an edge was removed.
    pub async fn unfollow(&self, follower: Id<UserMarker>, author: Id<UserMarker>) -> Result<bool> {
        let result = query(
            "
            DELETE FROM follows
            WHERE follows.follower_id = ? AND follows.author_id = ?
            ",
        )
        .bind(follower.get())
        .bind(author.get())
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!(%follower, %author, "Follow edge removed");
        }
        Ok(removed)
    }

    pub async fn is_following(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM follows
                WHERE follows.follower_id = ? AND follows.author_id = ?
            )
            ",
        )
        .bind(follower.get())
        .bind(author.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn followed_authors(&self, follower: Id<UserMarker>) -> Result<Vec<Id<UserMarker>>> {
        let authors = query_scalar::<_, i64>(
            "
            SELECT follows.author_id
            FROM follows
            WHERE follows.follower_id = ?
            ORDER BY follows.author_id
            ",
        )
        .bind(follower.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(authors.into_iter().map(Id::new).collect())
    }

    pub async fn follower_count(&self, author: Id<UserMarker>) -> Result<u64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE author_id = ?")
            .bind(author.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub async fn following_count(&self, follower: Id<UserMarker>) -> Result<u64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(follower.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
