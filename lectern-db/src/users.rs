use crate::{
    client::{DbClient, Result},
    record::UserRecord,
};
use lectern_common::model::{
    Id,
    user::{CreateUser, User, UserMarker, Username},
};
use sqlx::query_as;

impl DbClient {
    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.id AS user_id,
                users.username
            FROM
                users
            WHERE
                users.id = ?
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.id AS user_id,
                users.username
            FROM
                users
            WHERE
                users.username = ?
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    /// Mirrors a user account from the identity provider.
    pub async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users (username)
            VALUES (?)
            RETURNING
                users.id AS user_id,
                users.username
            ",
        )
        .bind(user.username.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(User::try_from(record)?)
    }
}
