//! 메모리 기반 자격증명 저장소.

use std::collections::HashMap;

use async_trait::async_trait;
use gatekeeper_core::{Identity, PageRequest, UserPage};
use tokio::sync::RwLock;

use super::{CredentialStore, StoreError, StoredTokens, TokenUpdate};

#[derive(Default)]
struct Inner {
    /// 가입 순서 유지
    users: Vec<Identity>,
    tokens: HashMap<String, StoredTokens>,
}

impl Inner {
    fn with_tokens(&self, identity: &Identity) -> Identity {
        let mut identity = identity.clone();
        if let Some(tokens) = self.tokens.get(&identity.user_id) {
            identity.token = Some(tokens.token.clone());
            identity.refresh_token = Some(tokens.refresh_token.clone());
            identity.updated_at = tokens.updated_at;
        }
        identity
    }
}

/// 프로세스 메모리에 신원을 보관하는 저장소.
///
/// 재시작하면 모든 데이터가 사라집니다.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자에 대해 마지막으로 저장된 토큰 쌍.
    pub async fn tokens_for(&self, user_id: &str) -> Option<StoredTokens> {
        self.inner.read().await.tokens.get(user_id).cloned()
    }

    /// 저장된 사용자 수.
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.users.iter().any(|u| u.email == email))
    }

    async fn phone_exists(&self, phone: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.users.iter().any(|u| u.phone == phone))
    }

    async fn insert(&self, identity: Identity) -> Result<String, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.email == identity.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if inner.users.iter().any(|u| u.phone == identity.phone) {
            return Err(StoreError::DuplicatePhone);
        }

        let user_id = identity.user_id.clone();
        if let (Some(token), Some(refresh_token)) = (&identity.token, &identity.refresh_token) {
            inner.tokens.insert(
                user_id.clone(),
                StoredTokens {
                    token: token.clone(),
                    refresh_token: refresh_token.clone(),
                    updated_at: identity.updated_at,
                },
            );
        }
        inner.users.push(identity);

        Ok(user_id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| inner.with_tokens(u)))
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<Identity>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(|u| inner.with_tokens(u)))
    }

    async fn update_tokens(&self, user_id: &str, update: TokenUpdate) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .tokens
            .insert(user_id.to_string(), update.into());
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<UserPage, StoreError> {
        let inner = self.inner.read().await;

        let user_items = inner
            .users
            .iter()
            .skip(page.start_index)
            .take(page.limit)
            .map(|u| inner.with_tokens(u).view().without_token())
            .collect();

        Ok(UserPage {
            total_count: inner.users.len() as u64,
            user_items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gatekeeper_core::{NewIdentity, Role};

    fn identity(n: usize) -> Identity {
        Identity::new(
            NewIdentity {
                email: format!("user{n}@x.com"),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
                phone: format!("010-{n:04}"),
                role: Role::User,
            },
            "hash".to_string(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryCredentialStore::new();
        let user = identity(1);
        let id = store.insert(user.clone()).await.unwrap();

        assert_eq!(id, user.user_id);
        assert!(store.email_exists("user1@x.com").await.unwrap());
        assert!(store.phone_exists("010-0001").await.unwrap());
        assert!(!store.email_exists("other@x.com").await.unwrap());

        assert_eq!(store.find_by_email("user1@x.com").await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_by_id(&id).await.unwrap(), Some(user));
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_enforces_uniqueness() {
        let store = InMemoryCredentialStore::new();
        store.insert(identity(1)).await.unwrap();

        let mut same_email = identity(2);
        same_email.email = "user1@x.com".to_string();
        assert!(matches!(
            store.insert(same_email).await,
            Err(StoreError::DuplicateEmail)
        ));

        let mut same_phone = identity(3);
        same_phone.phone = "010-0001".to_string();
        assert!(matches!(
            store.insert(same_phone).await,
            Err(StoreError::DuplicatePhone)
        ));

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_token_update_visible_on_reload() {
        let store = InMemoryCredentialStore::new();
        let id = store.insert(identity(1)).await.unwrap();
        let at = Utc::now();

        store
            .update_tokens(
                &id,
                TokenUpdate {
                    token: "a".to_string(),
                    refresh_token: "r".to_string(),
                    updated_at: at,
                },
            )
            .await
            .unwrap();

        let reloaded = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(reloaded.token.as_deref(), Some("a"));
        assert_eq!(reloaded.refresh_token.as_deref(), Some("r"));
        assert_eq!(reloaded.updated_at, at);
    }

    #[tokio::test]
    async fn test_list_pages_in_insertion_order() {
        let store = InMemoryCredentialStore::new();
        let mut ids = Vec::new();
        for n in 0..5 {
            ids.push(store.insert(identity(n)).await.unwrap());
        }

        let page = store
            .list(PageRequest {
                start_index: 2,
                limit: 2,
            })
            .await
            .unwrap();

        assert_eq!(page.total_count, 5);
        let got: Vec<_> = page.user_items.iter().map(|u| u.user_id.clone()).collect();
        assert_eq!(got, ids[2..4].to_vec());

        let past_end = store
            .list(PageRequest {
                start_index: 10,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(past_end.total_count, 5);
        assert!(past_end.user_items.is_empty());
    }
}
