//! In-process client storage with the same filtering semantics as
//! `PgClientStore`. Backs the router and service tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::db_storage::ClientStore;
use crate::errors::AppError;
use crate::models::{Client, ClientFilter, NewClient};

#[derive(Default)]
pub struct MemoryClientStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    clients: Vec<Client>,
    next_id: i64,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(client: &Client, filter: &ClientFilter) -> bool {
    let name_ok = filter.name_contains.as_deref().map_or(true, |q| {
        let q = q.to_lowercase();
        client.first_name.to_lowercase().contains(&q) || client.last_name.to_lowercase().contains(&q)
    });
    let region_ok = filter
        .region
        .as_deref()
        .map_or(true, |region| client.region == region);
    name_ok && region_ok
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Client>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Client>, AppError> {
        Ok(self.inner.read().await.clients.clone())
    }

    async fn search(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .clients
            .iter()
            .filter(|c| matches_filter(c, filter))
            .cloned()
            .collect())
    }

    async fn insert(&self, client: &NewClient) -> Result<Client, AppError> {
        let mut inner = self.inner.write().await;

        let id = match client.requested_id() {
            Some(id) if inner.clients.iter().any(|c| c.id == id) => {
                return Err(AppError::BadRequest(format!(
                    "client with id {} already exists",
                    id
                )));
            }
            Some(id) => id,
            None => inner.next_id + 1,
        };
        inner.next_id = inner.next_id.max(id);

        let stored = Client {
            id,
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            age: client.age,
            income: client.income,
            region: client.region.clone(),
            created_at: Utc::now(),
        };
        let pos = inner.clients.partition_point(|c| c.id < id);
        inner.clients.insert(pos, stored.clone());

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client(first: &str, last: &str, region: &str, id: Option<i64>) -> NewClient {
        NewClient {
            id,
            first_name: first.into(),
            last_name: last.into(),
            age: 30,
            income: 70_000.0,
            region: region.into(),
        }
    }

    #[tokio::test]
    async fn test_assigned_ids_skip_past_explicit_ones() {
        let store = MemoryClientStore::new();

        let first = store.insert(&new_client("A", "A", "", None)).await.unwrap();
        let explicit = store.insert(&new_client("B", "B", "", Some(10))).await.unwrap();
        let next = store.insert(&new_client("C", "C", "", None)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(explicit.id, 10);
        assert_eq!(next.id, 11);
    }

    #[tokio::test]
    async fn test_zero_id_is_store_assigned() {
        let store = MemoryClientStore::new();
        store.insert(&new_client("A", "A", "", Some(4))).await.unwrap();

        let zero = store.insert(&new_client("B", "B", "", Some(0))).await.unwrap();
        assert_eq!(zero.id, 5);
    }

    #[tokio::test]
    async fn test_duplicate_explicit_id_rejected() {
        let store = MemoryClientStore::new();
        store.insert(&new_client("A", "A", "", Some(3))).await.unwrap();

        let err = store
            .insert(&new_client("B", "B", "", Some(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = MemoryClientStore::new();
        store.insert(&new_client("A", "A", "", Some(5))).await.unwrap();
        store.insert(&new_client("B", "B", "", Some(2))).await.unwrap();

        let ids: Vec<i64> = store.list_all().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[tokio::test]
    async fn test_search_name_or_and_region() {
        let store = MemoryClientStore::new();
        store.insert(&new_client("Ivan", "Petrov", "Москва", None)).await.unwrap();
        store.insert(&new_client("Olga", "Ivanova", "Казань", None)).await.unwrap();
        store.insert(&new_client("Petr", "Sidorov", "Москва", None)).await.unwrap();

        let by_name = store
            .search(&ClientFilter {
                name_contains: Some("IVAN".into()),
                region: None,
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 2);

        let by_both = store
            .search(&ClientFilter {
                name_contains: Some("ivan".into()),
                region: Some("Москва".into()),
            })
            .await
            .unwrap();
        assert_eq!(by_both.len(), 1);
        assert_eq!(by_both[0].first_name, "Ivan");
    }
}
