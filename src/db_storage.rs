use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::{AppError, ResultExt};
use crate::models::{Client, ClientFilter, NewClient};

/// Persistence operations on client records.
///
/// Handlers and services receive an `Arc<dyn ClientStore>` at construction;
/// `PgClientStore` backs the server and `MemoryClientStore` backs tests.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Looks up one client. `Ok(None)` when the id is unknown.
    async fn find_by_id(&self, id: i64) -> Result<Option<Client>, AppError>;

    /// Every stored client, ordered by id.
    async fn list_all(&self) -> Result<Vec<Client>, AppError>;

    /// Clients matching the store-level criteria, ordered by id.
    async fn search(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError>;

    /// Persists a new client and returns it with store-assigned fields.
    async fn insert(&self, client: &NewClient) -> Result<Client, AppError>;
}

/// PostgreSQL-backed client storage
pub struct PgClientStore {
    pool: PgPool,
}

impl PgClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_with_id(&self, id: i64, client: &NewClient) -> Result<Client, AppError> {
        let mut tx = self.pool.begin().await?;

        // Blocks concurrent inserts until commit, so no other transaction can
        // draw from the sequence while it is being moved.
        sqlx::query("LOCK TABLE clients IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .context("locking clients for explicit id insert")?;

        let inserted = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (id, first_name, last_name, age, income, region)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, first_name, last_name, age, income, region, created_at
            "#,
        )
        .bind(id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(client.age)
        .bind(client.income)
        .bind(&client.region)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest(format!("client with id {} already exists", id))
            }
            other => AppError::DatabaseError(other),
        })?;

        // Explicit ids bypass the sequence. It only ever moves forward: a
        // value already handed out must never be issued again.
        sqlx::query(
            "SELECT setval('clients_id_seq', GREATEST($1, (SELECT last_value FROM clients_id_seq)))",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("advancing clients id sequence")?;

        tx.commit().await?;
        Ok(inserted)
    }
}

/// Escapes LIKE wildcards so the query text matches literally.
pub fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT id, first_name, last_name, age, income, region, created_at FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn list_all(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT id, first_name, last_name, age, income, region, created_at FROM clients ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("listing clients")?;

        Ok(clients)
    }

    async fn search(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError> {
        let pattern = filter
            .name_contains
            .as_deref()
            .map(|q| format!("%{}%", escape_like(q)));

        // NULL parameters disable their criterion
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, first_name, last_name, age, income, region, created_at
            FROM clients
            WHERE ($1::TEXT IS NULL OR first_name ILIKE $1 OR last_name ILIKE $1)
              AND ($2::TEXT IS NULL OR region = $2)
            ORDER BY id
            "#,
        )
        .bind(pattern)
        .bind(filter.region.as_deref())
        .fetch_all(&self.pool)
        .await
        .context("searching clients")?;

        Ok(clients)
    }

    async fn insert(&self, client: &NewClient) -> Result<Client, AppError> {
        if let Some(id) = client.requested_id() {
            return self.insert_with_id(id, client).await;
        }

        let inserted = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (first_name, last_name, age, income, region)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, age, income, region, created_at
            "#,
        )
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(client.age)
        .bind(client.income)
        .bind(&client.region)
        .fetch_one(&self.pool)
        .await
        .context("inserting client")?;

        Ok(inserted)
    }
}
