mod common;

use chrono::{Duration, Utc};
use clinicdesk::db::{NewSession, NewUser, Store, User};
use clinicdesk::domain::Role;
use clinicdesk::services::{ClientInfo, SessionManager};

async fn open_store() -> Store {
    Store::new(&common::test_config().general.database_path)
        .await
        .expect("Failed to open store")
}

async fn seed_user(store: &Store, email: &str) -> User {
    store
        .create_user(NewUser {
            name: "Receptionist".to_string(),
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::FrontDesk,
            staff_profile_id: None,
            tv_token: None,
        })
        .await
        .unwrap()
}

fn client() -> ClientInfo {
    ClientInfo::new(Some("10.0.0.5".to_string()), Some("test-agent".to_string()))
}

#[tokio::test]
async fn test_created_session_validates() {
    let store = open_store().await;
    let user = seed_user(&store, "desk@clinic.test").await;
    let sessions = SessionManager::new(store.clone(), Duration::hours(24));

    let token = sessions.create_session(user.id, &client()).await.unwrap();
    assert_eq!(token.len(), 64);

    let resolved = sessions.validate(&token).await.expect("valid session");
    assert_eq!(resolved.id, user.id);

    let record = store.get_session_by_token(&token).await.unwrap().unwrap();
    assert_eq!(record.client_address.as_deref(), Some("10.0.0.5"));
    assert!(record.expires_at > Utc::now() + Duration::hours(23));

    let touched = store.get_user(user.id).await.unwrap().unwrap();
    assert!(touched.last_access_at.is_some());
}

#[tokio::test]
async fn test_unknown_token_does_not_validate() {
    let store = open_store().await;
    let sessions = SessionManager::new(store, Duration::hours(24));

    assert!(sessions.validate("no-such-token").await.is_none());
}

#[tokio::test]
async fn test_expired_session_is_removed_on_validate() {
    let store = open_store().await;
    let user = seed_user(&store, "desk@clinic.test").await;
    let sessions = SessionManager::new(store.clone(), Duration::hours(24));

    store
        .insert_session(NewSession {
            user_id: user.id,
            token: "expired-token".to_string(),
            client_address: None,
            client_agent: None,
            expires_at: Utc::now() - Duration::minutes(1),
        })
        .await
        .unwrap();

    assert!(sessions.validate("expired-token").await.is_none());
    assert!(
        store
            .get_session_by_token("expired-token")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_sweep_removes_only_expired_sessions() {
    let store = open_store().await;
    let user = seed_user(&store, "desk@clinic.test").await;
    let sessions = SessionManager::new(store.clone(), Duration::hours(24));

    let live = sessions.create_session(user.id, &client()).await.unwrap();
    for i in 0..3 {
        store
            .insert_session(NewSession {
                user_id: user.id,
                token: format!("stale-{i}"),
                client_address: None,
                client_agent: None,
                expires_at: Utc::now() - Duration::hours(1),
            })
            .await
            .unwrap();
    }

    assert_eq!(sessions.sweep_expired().await.unwrap(), 3);
    assert_eq!(store.count_sessions().await.unwrap(), 1);
    assert!(sessions.validate(&live).await.is_some());
}

#[tokio::test]
async fn test_concurrent_sessions_for_one_user() {
    let store = open_store().await;
    let user = seed_user(&store, "desk@clinic.test").await;
    let sessions = SessionManager::new(store.clone(), Duration::hours(24));

    let client = client();
    let (a, b) = tokio::join!(
        sessions.create_session(user.id, &client),
        sessions.create_session(user.id, &client),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a, b);
    assert_eq!(store.count_sessions_for_user(user.id).await.unwrap(), 2);
    assert!(sessions.validate(&a).await.is_some());
    assert!(sessions.validate(&b).await.is_some());

    // Ending one leaves the other intact.
    sessions.invalidate(&a).await.unwrap();
    assert!(sessions.validate(&a).await.is_none());
    assert!(sessions.validate(&b).await.is_some());
}

#[tokio::test]
async fn test_invalidate_is_idempotent() {
    let store = open_store().await;
    let user = seed_user(&store, "desk@clinic.test").await;
    let sessions = SessionManager::new(store, Duration::hours(24));

    let token = sessions.create_session(user.id, &client()).await.unwrap();
    sessions.invalidate(&token).await.unwrap();
    sessions.invalidate(&token).await.unwrap();

    assert!(sessions.validate(&token).await.is_none());
}

#[tokio::test]
async fn test_deactivated_owner_invalidates_session() {
    let store = open_store().await;
    let user = seed_user(&store, "desk@clinic.test").await;
    let sessions = SessionManager::new(store.clone(), Duration::hours(24));

    let token = sessions.create_session(user.id, &client()).await.unwrap();
    assert!(store.set_user_active(user.id, false).await.unwrap());

    assert!(sessions.validate(&token).await.is_none());
}
