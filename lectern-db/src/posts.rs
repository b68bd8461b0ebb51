use crate::{
    client::{DbClient, Result},
    record::FullPostRecord,
};
use lectern_common::{
    model::{
        Id,
        group::GroupMarker,
        post::{Post, PostContent, PostMarker},
        user::UserMarker,
    },
    pagination::{Page, PageNumber, PageWindow, Paginator},
};
use sqlx::{query, query_as, query_scalar};
use time::OffsetDateTime;

const SELECT_FULL_POST: &str = "
    SELECT
        posts.id AS post_id,
        posts.text,
        posts.image,
        posts.created_at,
        users.id AS author_id,
        users.username AS author_username,
        post_groups.id AS group_id,
        post_groups.title AS group_title,
        post_groups.slug AS group_slug,
        post_groups.description AS group_description
    FROM
        posts
        JOIN users ON users.id = posts.author_id
        LEFT JOIN post_groups ON post_groups.id = posts.group_id
";

/// An ordered set of posts, evaluated one page at a time.
///
/// Every listing is ordered newest first. Ids only grow and `created_at` is
/// set once on insert, so the listing sorts on the id.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum PostListing {
    All,
    ByAuthor(Id<UserMarker>),
    ByGroup(Id<GroupMarker>),
    /// Posts by every author the viewer follows.
    FollowedBy(Id<UserMarker>),
}

impl PostListing {
    /// The feed of `viewer`. Empty when the viewer follows nobody.
    #[must_use]
    pub fn compose_feed(viewer: Id<UserMarker>) -> Self {
        Self::FollowedBy(viewer)
    }

    fn filter(self) -> (&'static str, Option<i64>) {
        match self {
            Self::All => ("", None),
            Self::ByAuthor(author) => ("WHERE posts.author_id = ?", Some(author.get())),
            Self::ByGroup(group) => ("WHERE posts.group_id = ?", Some(group.get())),
            // A subquery rather than a join, so a post shows up once no matter
            // how the follow rows look.
            Self::FollowedBy(viewer) => (
                "WHERE posts.author_id IN (
                    SELECT follows.author_id FROM follows WHERE follows.follower_id = ?
                )",
                Some(viewer.get()),
            ),
        }
    }
}

impl DbClient {
    pub async fn count_posts(&self, listing: PostListing) -> Result<u64> {
        let (filter, bind) = listing.filter();
        let sql = format!("SELECT COUNT(*) FROM posts {filter}");

        let mut count_query = query_scalar::<_, i64>(&sql);
        if let Some(bind) = bind {
            count_query = count_query.bind(bind);
        }
        let count = count_query.fetch_one(&self.pool).await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub async fn fetch_post_slice(
        &self,
        listing: PostListing,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>> {
        let (filter, bind) = listing.filter();
        let sql = format!(
            "{SELECT_FULL_POST} {filter}
            ORDER BY posts.id DESC
            LIMIT ? OFFSET ?"
        );

        let mut slice_query = query_as::<_, FullPostRecord>(&sql);
        if let Some(bind) = bind {
            slice_query = slice_query.bind(bind);
        }
        let records = slice_query
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    /// Counts the listing, clamps the requested page and loads only that page.
    pub async fn fetch_post_page(
        &self,
        listing: PostListing,
        paginator: Paginator,
        requested: PageNumber,
    ) -> Result<Page<Post>> {
        let total_count = self.count_posts(listing).await?;
        let window = paginator.window(total_count, requested);

        self.fetch_post_window(listing, window).await
    }

    /// Loads the posts of an already clamped `window`.
    pub async fn fetch_post_window(
        &self,
        listing: PostListing,
        window: PageWindow,
    ) -> Result<Page<Post>> {
        let items = self
            .fetch_post_slice(listing, window.offset(), window.limit())
            .await?;

        Ok(Page::new(items, window))
    }

    pub async fn all_posts(&self, paginator: Paginator, page: PageNumber) -> Result<Page<Post>> {
        self.fetch_post_page(PostListing::All, paginator, page).await
    }

    pub async fn posts_by_author(
        &self,
        author: Id<UserMarker>,
        paginator: Paginator,
        page: PageNumber,
    ) -> Result<Page<Post>> {
        self.fetch_post_page(PostListing::ByAuthor(author), paginator, page)
            .await
    }

    pub async fn posts_by_group(
        &self,
        group: Id<GroupMarker>,
        paginator: Paginator,
        page: PageNumber,
    ) -> Result<Page<Post>> {
        self.fetch_post_page(PostListing::ByGroup(group), paginator, page)
            .await
    }

    pub async fn posts_by_followed_authors(
        &self,
        viewer: Id<UserMarker>,
        paginator: Paginator,
        page: PageNumber,
    ) -> Result<Page<Post>> {
        self.fetch_post_page(PostListing::compose_feed(viewer), paginator, page)
            .await
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let sql = format!("{SELECT_FULL_POST} WHERE posts.id = ?");
        let record = query_as::<_, FullPostRecord>(&sql)
            .bind(post_id.get())
            .fetch_optional(&self.pool)
            .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    pub async fn create_post(
        &self,
        author: Id<UserMarker>,
        content: &PostContent,
    ) -> Result<Id<PostMarker>> {
        let post_id = query_scalar::<_, i64>(
            "
            INSERT INTO posts (author_id, text, group_id, image, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING posts.id
            ",
        )
        .bind(author.get())
        .bind(content.text.get())
        .bind(content.group.map(Id::get))
        .bind(content.image.as_ref().map(|image| image.get()))
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(post_id.into())
    }

    /// Replaces the editable content. Author and creation time never change.
    pub async fn update_post_content(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<bool> {
        let result = query(
            "
            UPDATE posts
            SET text = ?, group_id = ?, image = ?
            WHERE posts.id = ?
            ",
        )
        .bind(content.text.get())
        .bind(content.group.map(Id::get))
        .bind(content.image.as_ref().map(|image| image.get()))
        .bind(post_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the post together with its comments.
    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("DELETE FROM posts WHERE posts.id = ?")
            .bind(post_id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
