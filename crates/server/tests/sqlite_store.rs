use gepetinho_server::models::Role;
use gepetinho_server::store::{ConversationStore, SqliteStore, StoreError};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn messages_survive_reopen_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gepetinho.sqlite");

    let conversation_id = {
        let store = SqliteStore::open(&path).await.unwrap();
        let user = store.create_user("a@b.com", "hash", None).await.unwrap();
        let conv = store.create_conversation(user.id, None).await.unwrap();
        store.append_message(conv.id, Role::User, "m1").await.unwrap();
        store
            .append_message(conv.id, Role::Assistant, "m2")
            .await
            .unwrap();
        store.append_message(conv.id, Role::User, "m3").await.unwrap();
        store.close().await;
        conv.id
    };

    let store = SqliteStore::open(&path).await.unwrap();
    let messages = store.get_messages(conversation_id).await.unwrap();
    let turns: Vec<_> = messages
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        turns,
        vec![(Role::User, "m1"), (Role::Assistant, "m2"), (Role::User, "m3")]
    );

    let conv = store.get_conversation(conversation_id).await.unwrap().unwrap();
    assert_eq!(conv.updated_at, messages[2].created_at);
    assert_eq!(conv.title, "New Conversation");
}

#[tokio::test]
async fn append_to_missing_conversation_is_not_found() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("db.sqlite")).await.unwrap();

    let err = store
        .append_message(5, Role::User, "hello")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            entity: "Conversation",
            id: 5
        }
    ));
    assert!(store.get_messages(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_email_conflicts_atomically() {
    let dir = tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("db.sqlite")).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create_user("race@b.com", &format!("hash-{}", i), None)
                .await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(StoreError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);

    let user = store.get_user_by_email("race@b.com").await.unwrap().unwrap();
    assert_eq!(store.get_user_by_id(user.id).await.unwrap().unwrap().email, "race@b.com");
}

#[tokio::test]
async fn conversation_requires_existing_user() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("db.sqlite")).await.unwrap();

    let err = store.create_conversation(42, None).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "User", .. }));
}

#[tokio::test]
async fn conversations_listed_in_creation_order() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("db.sqlite")).await.unwrap();
    let alice = store.create_user("alice@b.com", "hash", Some("alice")).await.unwrap();
    let bob = store.create_user("bob@b.com", "hash", None).await.unwrap();

    let first = store.create_conversation(alice.id, None).await.unwrap();
    store.create_conversation(bob.id, None).await.unwrap();
    let second = store.create_conversation(alice.id, Some("Trip")).await.unwrap();

    let listed = store.get_conversations_by_user(alice.id).await.unwrap();
    assert_eq!(listed, vec![first, second]);
    assert_eq!(
        store.get_user_by_id(alice.id).await.unwrap().unwrap().username.as_deref(),
        Some("alice")
    );
}

#[tokio::test]
async fn path_with_url_characters_opens_as_a_file() {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().join("data?mode=ro#50%");
    std::fs::create_dir_all(&data_dir).unwrap();
    let path = data_dir.join("gepetinho.sqlite");

    let store = SqliteStore::open(&path).await.unwrap();
    store.create_user("a@b.com", "hash", None).await.unwrap();
    store.close().await;

    assert!(path.exists());
    let store = SqliteStore::open(&path).await.unwrap();
    assert!(store.get_user_by_email("a@b.com").await.unwrap().is_some());
}
