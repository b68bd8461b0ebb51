use crate::{
    client::{DbClient, Result},
    record::GroupRecord,
};
use lectern_common::model::{
    Id,
    group::{CreateGroup, Group, GroupMarker, GroupSlug},
};
use sqlx::query_as;

impl DbClient {
    pub async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT
                post_groups.id AS group_id,
                post_groups.title,
                post_groups.slug,
                post_groups.description
            FROM
                post_groups
            WHERE
                post_groups.id = ?
            ",
        )
        .bind(group_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    pub async fn fetch_group_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT
                post_groups.id AS group_id,
                post_groups.title,
                post_groups.slug,
                post_groups.description
            FROM
                post_groups
            WHERE
                post_groups.slug = ?
            ",
        )
        .bind(slug.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    pub async fn fetch_groups(&self) -> Result<Vec<Group>> {
        let records = query_as::<_, GroupRecord>(
            "
            SELECT
                post_groups.id AS group_id,
                post_groups.title,
                post_groups.slug,
                post_groups.description
            FROM
                post_groups
            ORDER BY
                post_groups.title,
                post_groups.id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let groups = records
            .into_iter()
            .map(Group::try_from)
            .collect::<Result<_, _>>()?;
        Ok(groups)
    }

    /// Returns `None` when the slug is already taken.
    pub async fn create_group(&self, group: &CreateGroup) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            INSERT INTO post_groups (title, slug, description)
            VALUES (?, ?, ?)
            ON CONFLICT (slug) DO NOTHING
            RETURNING
                post_groups.id AS group_id,
                post_groups.title,
                post_groups.slug,
                post_groups.description
            ",
        )
        .bind(group.title.get())
        .bind(group.slug.get())
        .bind(&group.description)
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::{client, create_group};
    use lectern_common::model::group::{CreateGroup, GroupSlug, GroupTitle};

    #[tokio::test]
    async fn slug_is_unique() {
        let db = client().await;
        let first = create_group(&db, "cats").await;

        let duplicate = CreateGroup {
            title: GroupTitle::new("More cats").unwrap(),
            slug: GroupSlug::new("cats".to_owned()).unwrap(),
            description: String::new(),
        };
        assert!(db.create_group(&duplicate).await.unwrap().is_none());

        let fetched = db.fetch_group_by_slug(&first.slug).await.unwrap().unwrap();
        assert_eq!(fetched, first);
        assert_eq!(db.fetch_groups().await.unwrap(), vec![first]);
    }

    #[tokio::test]
    async fn unknown_slug_is_none() {
        let db = client().await;
        let slug = GroupSlug::new("missing".to_owned()).unwrap();

        assert!(db.fetch_group_by_slug(&slug).await.unwrap().is_none());
    }
}
