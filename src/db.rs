use sqlx::{postgres::PgPoolOptions, PgPool};

/// Schema for client records. Idempotent, applied on every startup.
const CREATE_CLIENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS clients (
        id          BIGSERIAL PRIMARY KEY,
        first_name  TEXT NOT NULL,
        last_name   TEXT NOT NULL,
        age         INTEGER NOT NULL,
        income      DOUBLE PRECISION NOT NULL CHECK (income >= 0),
        region      TEXT NOT NULL DEFAULT '',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

const CREATE_REGION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_clients_region ON clients (region)";

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Connects to PostgreSQL and makes sure the client schema exists.
    ///
    /// Any failure here is fatal to startup.
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        migrate(&pool).await?;

        Ok(Self { pool })
    }
}

/// Creates the `clients` table and its indexes if missing.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_CLIENTS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_REGION_INDEX).execute(pool).await?;
    tracing::info!("Client schema ensured");
    Ok(())
}
