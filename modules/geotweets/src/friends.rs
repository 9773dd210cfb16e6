use serde_json::Value;

use crate::store::{RealtimeStore, StoreError};

const USERS_ROOT: &str = "users";

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub data: Value,
}

/// Look up each user under `users/<id>`, one read at a time, in `ids` order.
/// Users with no record are left out.
pub async fn fetch_user_profiles<S>(
    store: &S,
    ids: &[String],
) -> Result<Vec<UserProfile>, StoreError>
where
    S: RealtimeStore + ?Sized,
{
    let mut profiles = Vec::with_capacity(ids.len());
    for id in ids {
        match store.get(&format!("{USERS_ROOT}/{id}")).await? {
            Some(data) => profiles.push(UserProfile {
                id: id.clone(),
                data,
            }),
            None => tracing::debug!(user_id = %id, "No profile stored for user"),
        }
    }
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn fetches_in_order_and_skips_missing() {
        let store = MemoryStore::new();
        store.set("users/u1", json!({"email": "one@x.io"})).await.unwrap();
        store.set("users/u3", json!({"email": "three@x.io"})).await.unwrap();

        let ids = vec!["u3".to_string(), "u2".to_string(), "u1".to_string()];
        let profiles = fetch_user_profiles(&store, &ids).await.unwrap();

        let found: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(found, vec!["u3", "u1"]);
        assert_eq!(profiles[0].data["email"], "three@x.io");
    }

    #[tokio::test]
    async fn no_ids_no_reads() {
        let store = MemoryStore::new();
        assert!(fetch_user_profiles(&store, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_id_surfaces_store_error() {
        let store = MemoryStore::new();
        let ids = vec!["a//b".to_string()];
        assert!(matches!(
            fetch_user_profiles(&store, &ids).await,
            Err(StoreError::InvalidPath(_))
        ));
    }
}
