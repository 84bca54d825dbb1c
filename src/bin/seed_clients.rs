//! Seeds the clients table with demo records.
//!
//! Usage: `seed_clients [clients.json]`. The file holds an array of client
//! payloads in the same shape `POST /api/clients` accepts; without an
//! argument a small built-in demo set is inserted.

use anyhow::Context;
use std::sync::Arc;

use income_insight_api::config::Config;
use income_insight_api::db::Database;
use income_insight_api::db_storage::{ClientStore, PgClientStore};
use income_insight_api::models::NewClient;
use income_insight_api::services::ClientService;

fn demo_clients() -> Vec<NewClient> {
    let rows: [(&str, &str, i32, f64, &str); 6] = [
        ("Иван", "Петров", 42, 185_000.0, "Москва"),
        ("Ольга", "Иванова", 35, 125_000.0, "Санкт-Петербург"),
        ("Пётр", "Сидоров", 29, 72_000.0, "Казань"),
        ("Анна", "Кузнецова", 51, 48_000.0, "Новосибирск"),
        ("Мария", "Орлова", 24, 55_500.0, "Москва"),
        ("Сергей", "Волков", 63, 210_000.0, "Екатеринбург"),
    ];

    rows.iter()
        .map(|(first, last, age, income, region)| NewClient {
            id: None,
            first_name: first.to_string(),
            last_name: last.to_string(),
            age: *age,
            income: *income,
            region: region.to_string(),
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let clients = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path))?;
            serde_json::from_str::<Vec<NewClient>>(&raw)
                .with_context(|| format!("parsing {}", path))?
        }
        None => demo_clients(),
    };

    let db = Database::new(&config.database_url, config.database_max_connections).await?;
    let store: Arc<dyn ClientStore> = Arc::new(PgClientStore::new(db.pool.clone()));
    let service = ClientService::new(store, config.client_region_label.clone());

    let total = clients.len();
    let mut inserted = 0;
    for client in &clients {
        match service.create(client).await {
            Ok(stored) => {
                inserted += 1;
                tracing::info!(
                    "Inserted client {}: {} {}",
                    stored.id,
                    stored.first_name,
                    stored.last_name
                );
            }
            Err(e) => tracing::warn!(
                "Skipped {} {}: {}",
                client.first_name,
                client.last_name,
                e
            ),
        }
    }

    tracing::info!("Seeding complete: {}/{} clients inserted", inserted, total);
    Ok(())
}
