use axum::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{like_pattern, EventFilter, EventStore, Page, StoreError, StoreResult, UserStore};
use crate::{
    config::AppConfig,
    events::repo_types::Event,
    users::repo_types::{User, UserSummary},
};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const EVENT_COLUMNS: &str = "id, title, description, date, location, max_participants, \
                             participants, creator_id, version, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn email_conflict(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            StoreError::Conflict("This email is already in use".into())
        }
        _ => StoreError::Database(e),
    }
}

fn missing_creator(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => StoreError::Conflict("User not found".into()),
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: User) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(email_conflict)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> StoreResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET name = $2, email = $3, password_hash = $4, updated_at = $5
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(email_conflict)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM events WHERE creator_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            UPDATE events
               SET participants = array_remove(participants, $1),
                   version = version + 1,
                   updated_at = now()
             WHERE $1 = ANY(participants)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, UserSummary>("SELECT id, name FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids
            .iter()
            .filter_map(|id| rows.iter().find(|r| r.id == *id).cloned())
            .collect())
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert(&self, event: Event) -> StoreResult<Event> {
        let sql = format!(
            r#"
            INSERT INTO events (id, title, description, date, location, max_participants,
                                participants, creator_id, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Event>(&sql)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.location)
            .bind(event.max_participants)
            .bind(&event.participants)
            .bind(event.creator_id)
            .bind(event.version)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(missing_creator)?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list(&self, filter: &EventFilter) -> StoreResult<Page<Event>> {
        let pattern = filter.search.as_deref().map(like_pattern);
        let predicate = "$1::text IS NULL OR title ILIKE $1 OR description ILIKE $1";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events WHERE {predicate}"))
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
              FROM events
             WHERE {predicate}
             ORDER BY date ASC, id ASC
             LIMIT $2 OFFSET $3
            "#
        );
        let items = sqlx::query_as::<_, Event>(&sql)
            .bind(&pattern)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(Page { items, total })
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Event>> {
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
              FROM events
             WHERE creator_id = $1 OR $1 = ANY(participants)
             ORDER BY date ASC, id ASC
            "#
        );
        let rows = sqlx::query_as::<_, Event>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn save(&self, event: &Event) -> StoreResult<Option<Event>> {
        let sql = format!(
            r#"
            UPDATE events
               SET title = $3, description = $4, date = $5, location = $6,
                   max_participants = $7, participants = $8,
                   version = version + 1, updated_at = $9
             WHERE id = $1 AND version = $2
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Event>(&sql)
            .bind(event.id)
            .bind(event.version)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.location)
            .bind(event.max_participants)
            .bind(&event.participants)
            .bind(event.updated_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
