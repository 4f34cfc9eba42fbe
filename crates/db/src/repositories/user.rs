use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::info;

use agentic_core::directory::UserDirectory;
use agentic_core::domain::user::{NewUser, User, UserFilter, UserId, UserPatch};
use agentic_core::errors::ApplicationError;

use super::RepositoryError;
use crate::DbPool;

const USER_COLUMNS: &str = "id, name, age, job_title, created_at, updated_at";

pub struct SqlUserDirectory {
    pool: DbPool,
}

impl SqlUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (name, age, job_title, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_user.name)
        .bind(new_user.age)
        .bind(&new_user.job_title)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let user = User {
            id: UserId(result.last_insert_rowid()),
            name: new_user.name,
            age: new_user.age,
            job_title: new_user.job_title,
            created_at,
            updated_at: None,
        };

        info!(
            event_name = "directory.user.registered",
            user_id = user.id.0,
            user_name = %user.name,
            "registered new user"
        );
        Ok(user)
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn patch(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET
                 name = COALESCE(?, name),
                 age = COALESCE(?, age),
                 job_title = COALESCE(?, job_title),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(patch.name.as_deref())
        .bind(patch.age)
        .bind(patch.job_title.as_deref())
        .bind(Utc::now().to_rfc3339())
        .bind(id.0)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.0)
            .fetch_one(&mut *tx)
            .await?;
        let user = row_to_user(&row)?;
        tx.commit().await?;

        Ok(Some(user))
    }

    async fn remove(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?").bind(id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_all(&self) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn select(&self, filter: UserFilter) -> Result<Vec<User>, RepositoryError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));

        // instr() keeps the substring match case-sensitive, unlike LIKE.
        if let Some(needle) = filter.job_title_needle() {
            builder.push(" AND instr(job_title, ").push_bind(needle.to_string()).push(") > 0");
        }
        if let Some(min_age) = filter.min_age {
            builder.push(" AND age >= ").push_bind(min_age);
        }
        if let Some(max_age) = filter.max_age {
            builder.push(" AND age <= ").push_bind(max_age);
        }
        builder.push(" ORDER BY id ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_user).collect::<Result<Vec<_>, _>>()
    }
}

#[async_trait]
impl UserDirectory for SqlUserDirectory {
    async fn create(&self, new_user: NewUser) -> Result<User, ApplicationError> {
        Ok(self.insert(new_user).await?)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, ApplicationError> {
        Ok(self.find(id).await?)
    }

    async fn update(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> Result<Option<User>, ApplicationError> {
        Ok(self.patch(id, patch).await?)
    }

    async fn delete(&self, id: UserId) -> Result<bool, ApplicationError> {
        Ok(self.remove(id).await?)
    }

    async fn delete_all(&self) -> Result<u64, ApplicationError> {
        Ok(self.remove_all().await?)
    }

    async fn list(&self, filter: UserFilter) -> Result<Vec<User>, ApplicationError> {
        Ok(self.select(filter).await?)
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let age: i64 = row.try_get("age").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let job_title: String =
        row.try_get("job_title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: Option<String> =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let age = i32::try_from(age)
        .map_err(|_| RepositoryError::Decode(format!("age {age} out of range for user {id}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("created_at for user {id}: {e}")))?;
    let updated_at = updated_at_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(User { id: UserId(id), name, age, job_title, created_at, updated_at })
}
