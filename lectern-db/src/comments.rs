use crate::{
    client::{DbClient, Result},
    record::CommentRecord,
};
use lectern_common::model::{
    Id,
    comment::{Comment, CommentMarker, CommentText},
    post::PostMarker,
    user::UserMarker,
};
use sqlx::{query_as, query_scalar};
use time::OffsetDateTime;

impl DbClient {
    /// Comments of a post, oldest first.
    pub async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.id AS comment_id,
                comments.post_id,
                comments.text,
                comments.created_at,
                users.id AS author_id,
                users.username AS author_username
            FROM
                comments
                JOIN users ON users.id = comments.author_id
            WHERE
                comments.post_id = ?
            ORDER BY
                comments.id
            ",
        )
        .bind(post_id.get())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    pub async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        text: &CommentText,
    ) -> Result<Id<CommentMarker>> {
        let comment_id = query_scalar::<_, i64>(
            "
            INSERT INTO comments (post_id, author_id, text, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING comments.id
            ",
        )
        .bind(post_id.get())
        .bind(author.get())
        .bind(text.get())
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(comment_id.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::{client, create_post, create_user};
    use lectern_common::model::comment::CommentText;
    use time::macros::datetime;

    #[tokio::test]
    async fn comments_belong_to_their_post() {
        let db = client().await;
        let author = create_user(&db, "auth").await;
        let reader = create_user(&db, "reader").await;
        let post_id = create_post(&db, &author, "commented post", None).await;
        let other_post_id = create_post(&db, &author, "quiet post here", None).await;

        let first = CommentText::new("First!").unwrap();
        let second = CommentText::new("Second").unwrap();
        db.create_comment(post_id, reader.id, &first).await.unwrap();
        db.create_comment(post_id, author.id, &second).await.unwrap();

        let comments = db.fetch_post_comments(post_id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, first);
        assert_eq!(comments[0].author, reader);
        assert_eq!(comments[0].post, post_id);
        assert_eq!(comments[1].text, second);

        assert!(db.fetch_post_comments(other_post_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sub_second_timestamps_keep_oldest_first() {
        let db = client().await;
        let author = create_user(&db, "auth").await;
        let post_id = create_post(&db, &author, "commented post", None).await;
        for (text, created_at) in [
            ("earlier", datetime!(2026-01-01 12:00:00.100 UTC)),
            ("later", datetime!(2026-01-01 12:00:00.150 UTC)),
        ] {
            sqlx::query(
                "INSERT INTO comments (post_id, author_id, text, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(post_id.get())
            .bind(author.id.get())
            .bind(text)
            .bind(created_at)
            .execute(&db.pool)
            .await
            .unwrap();
        }

        let comments = db.fetch_post_comments(post_id).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|comment| comment.text.get()).collect();

        assert_eq!(texts, vec!["earlier", "later"]);
    }

    #[tokio::test]
    async fn comments_are_removed_with_their_post() {
        let db = client().await;
        let author = create_user(&db, "auth").await;
        let post_id = create_post(&db, &author, "doomed post text", None).await;
        let text = CommentText::new("Nice").unwrap();
        db.create_comment(post_id, author.id, &text).await.unwrap();

        db.delete_post(post_id).await.unwrap();

        assert!(db.fetch_post_comments(post_id).await.unwrap().is_empty());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
