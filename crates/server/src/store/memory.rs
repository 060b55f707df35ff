//! In-memory store
//!
//! All tables sit behind one lock so that every write is atomic and every
//! read observes a consistent prefix of the append history.

use super::{ConversationStore, StoreError, StoreResult};
use crate::models::{Conversation, Message, Role, User, DEFAULT_CONVERSATION_TITLE};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    users_by_email: HashMap<String, i64>,
    conversations: BTreeMap<i64, Conversation>,
    /// conversation id -> messages in append order
    messages: HashMap<i64, Vec<Message>>,
    last_user_id: i64,
    last_conversation_id: i64,
    last_message_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        username: Option<&str>,
    ) -> StoreResult<User> {
        let mut tables = self.tables.write();

        if tables.users_by_email.contains_key(email) {
            return Err(StoreError::Conflict(email.to_string()));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            username: username.map(str::to_string),
            created_at: Utc::now(),
        };

        tables.users_by_email.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn create_conversation(
        &self,
        user_id: i64,
        title: Option<&str>,
    ) -> StoreResult<Conversation> {
        let mut tables = self.tables.write();

        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound {
                entity: "User",
                id: user_id,
            });
        }

        tables.last_conversation_id += 1;
        let now = Utc::now();
        let conversation = Conversation {
            id: tables.last_conversation_id,
            user_id,
            title: title.unwrap_or(DEFAULT_CONVERSATION_TITLE).to_string(),
            created_at: now,
            updated_at: now,
        };

        tables
            .conversations
            .insert(conversation.id, conversation.clone());

        Ok(conversation)
    }

    async fn get_conversation(&self, id: i64) -> StoreResult<Option<Conversation>> {
        Ok(self.tables.read().conversations.get(&id).cloned())
    }

    async fn get_conversations_by_user(&self, user_id: i64) -> StoreResult<Vec<Conversation>> {
        // BTreeMap iterates in id order, which is creation order.
        Ok(self
            .tables
            .read()
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        role: Role,
        content: &str,
    ) -> StoreResult<Message> {
        let mut tables = self.tables.write();
        let now = Utc::now();

        match tables.conversations.get_mut(&conversation_id) {
            Some(conversation) => conversation.updated_at = now,
            None => {
                return Err(StoreError::NotFound {
                    entity: "Conversation",
                    id: conversation_id,
                })
            }
        }

        tables.last_message_id += 1;
        let message = Message {
            id: tables.last_message_id,
            conversation_id,
            role,
            content: content.to_string(),
            created_at: now,
        };

        tables
            .messages
            .entry(conversation_id)
            .or_default()
            .push(message.clone());

        Ok(message)
    }

    async fn get_messages(&self, conversation_id: i64) -> StoreResult<Vec<Message>> {
        Ok(self
            .tables
            .read()
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn store_with_user() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = store
            .create_user("a@b.com", "hash", Some("alice"))
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn messages_come_back_in_append_order() {
        let (store, user) = store_with_user().await;
        let conv = store.create_conversation(user.id, None).await.unwrap();

        store.append_message(conv.id, Role::User, "m1").await.unwrap();
        store
            .append_message(conv.id, Role::Assistant, "m2")
            .await
            .unwrap();
        store.append_message(conv.id, Role::User, "m3").await.unwrap();

        let contents: Vec<_> = store
            .get_messages(conv.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn append_to_unknown_conversation_writes_nothing() {
        let (store, _) = store_with_user().await;

        let err = store
            .append_message(99, Role::User, "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 99, .. }));
        assert!(store.get_messages(99).await.unwrap().is_empty());

        // The failed append must not consume an id.
        let conv = store.create_conversation(1, None).await.unwrap();
        let msg = store.append_message(conv.id, Role::User, "x").await.unwrap();
        assert_eq!(msg.id, 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (store, _) = store_with_user().await;
        let err = store.create_user("a@b.com", "other", None).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Emails are case-sensitive as stored.
        assert!(store.create_user("A@b.com", "other", None).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_signups_with_same_email_admit_one() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_user("race@b.com", &format!("hash-{}", i), None)
                    .await
                    .is_ok()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn conversations_listed_in_creation_order_per_user() {
        let (store, alice) = store_with_user().await;
        let bob = store.create_user("bob@b.com", "hash", None).await.unwrap();

        let first = store.create_conversation(alice.id, None).await.unwrap();
        store.create_conversation(bob.id, None).await.unwrap();
        let second = store
            .create_conversation(alice.id, Some("Trip"))
            .await
            .unwrap();

        let listed = store.get_conversations_by_user(alice.id).await.unwrap();
        assert_eq!(listed, vec![first.clone(), second]);
        assert_eq!(first.title, DEFAULT_CONVERSATION_TITLE);
    }

    #[tokio::test]
    async fn conversation_for_unknown_user_is_rejected() {
        let store = MemoryStore::new();
        let err = store.create_conversation(7, None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "User", .. }));
    }

    #[tokio::test]
    async fn append_refreshes_updated_at() {
        let (store, user) = store_with_user().await;
        let conv = store.create_conversation(user.id, None).await.unwrap();
        let msg = store.append_message(conv.id, Role::User, "hi").await.unwrap();

        let refreshed = store.get_conversation(conv.id).await.unwrap().unwrap();
        assert_eq!(refreshed.updated_at, msg.created_at);
        assert_eq!(refreshed.created_at, conv.created_at);
    }

    #[tokio::test]
    async fn ids_increase_per_entity() {
        let (store, user) = store_with_user().await;
        let c1 = store.create_conversation(user.id, None).await.unwrap();
        let c2 = store.create_conversation(user.id, None).await.unwrap();
        assert!(c2.id > c1.id);

        let m1 = store.append_message(c1.id, Role::User, "a").await.unwrap();
        let m2 = store.append_message(c2.id, Role::User, "b").await.unwrap();
        assert!(m2.id > m1.id);
    }
}
