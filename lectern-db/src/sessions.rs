use crate::{
    client::{DbClient, Result},
    record::SessionRecord,
};
use lectern_common::model::{
    Id,
    session::{Session, SessionTokenHash},
    user::UserMarker,
};
use sqlx::{query, query_as};
use time::OffsetDateTime;

impl DbClient {
    pub async fn fetch_session(&self, token_hash: &SessionTokenHash) -> Result<Option<Session>> {
        let record = query_as::<_, SessionRecord>(
            "
            SELECT
                sessions.user_id,
                sessions.token_hash,
                sessions.created_at,
                sessions.expires_at
            FROM
                sessions
            WHERE
                sessions.token_hash = ?
            ",
        )
        .bind(token_hash.0.as_slice())
        .fetch_optional(&self.pool)
        .await?;

        let session = record.map(Session::try_from).transpose()?;
        Ok(session)
    }

    /// Stores a session on behalf of the identity provider.
    pub async fn create_session(
        &self,
        user: Id<UserMarker>,
        token_hash: &SessionTokenHash,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<()> {
        query(
            "
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(token_hash.0.as_slice())
        .bind(user.get())
        .bind(OffsetDateTime::now_utc())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
