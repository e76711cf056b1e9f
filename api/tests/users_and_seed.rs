mod common;

use api::seed::{seed_demo, SeedOutcome, DEMO_PASSWORD, DEMO_USERNAME};
use api::services::ProfileUpdate;
use api::ApiError;

use common::test_state;

#[tokio::test]
async fn test_register_and_login() {
    let state = test_state().await;
    let user = state.users.register("  alice ", "secret1").await.unwrap();
    assert_eq!(user.username, "alice");

    let duplicate = state.users.register("alice", "another1").await;
    assert!(matches!(duplicate, Err(ApiError::Validation(msg)) if msg == "Username already exists"));

    assert!(matches!(state.users.register("al", "secret1").await, Err(ApiError::Validation(_))));
    assert!(matches!(state.users.register("bob", "short").await, Err(ApiError::Validation(_))));

    let logged_in = state.users.login("alice", "secret1").await.unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(matches!(state.users.login("alice", "wrong!!").await, Err(ApiError::Unauthorized(_))));
    assert!(matches!(state.users.login("nobody", "secret1").await, Err(ApiError::Unauthorized(_))));
}

#[tokio::test]
async fn test_sessions() {
    let state = test_state().await;
    let user = state.users.register("alice", "secret1").await.unwrap();

    let token = state.users.start_session(user.id).await.unwrap();
    let found = state.users.user_for_session(&token).await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    assert!(state.users.user_for_session("not-a-token").await.unwrap().is_none());

    state.users.end_session(&token).await.unwrap();
    assert!(state.users.user_for_session(&token).await.unwrap().is_none());
    assert_eq!(state.users.purge_expired_sessions().await.unwrap(), 0);
}

#[tokio::test]
async fn test_profile_update() {
    let state = test_state().await;
    let user = state.users.register("alice", "secret1").await.unwrap();
    state.users.register("bob", "secret2").await.unwrap();

    let wrong = state
        .users
        .update_profile(
            user.id,
            ProfileUpdate {
                username: "alice2".to_string(),
                current_password: "nope".to_string(),
                new_password: None,
            },
        )
        .await;
    assert!(matches!(wrong, Err(ApiError::Unauthorized(msg)) if msg == "Current password is incorrect"));

    let taken = state
        .users
        .update_profile(
            user.id,
            ProfileUpdate {
                username: "bob".to_string(),
                current_password: "secret1".to_string(),
                new_password: None,
            },
        )
        .await;
    assert!(matches!(taken, Err(ApiError::Validation(_))));

    let updated = state
        .users
        .update_profile(
            user.id,
            ProfileUpdate {
                username: "alice2".to_string(),
                current_password: "secret1".to_string(),
                new_password: Some("newsecret".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.username, "alice2");
    assert!(state.users.login("alice2", "newsecret").await.is_ok());
    assert!(state.users.login("alice2", "secret1").await.is_err());
}

#[tokio::test]
async fn test_seed_demo_is_idempotent() {
    let state = test_state().await;

    let first = seed_demo(state.db.clone()).await.unwrap();
    assert_eq!(first, SeedOutcome::Seeded { trades: 3, activities: 5 });

    let second = seed_demo(state.db.clone()).await.unwrap();
    assert_eq!(second, SeedOutcome::Skipped { existing_trades: 3 });

    let demo = state.users.login(DEMO_USERNAME, DEMO_PASSWORD).await.unwrap();
    let trades = state.trades.list_trades(demo.id).await.unwrap();
    assert_eq!(trades.len(), 3);
    assert!(trades.iter().all(|t| t.is_active));

    let activities = state.trades.all_activities(demo.id).await.unwrap();
    assert_eq!(activities.len(), 5);
    assert_eq!(activities[0].symbol, "SOL/USD");
    assert_eq!(activities[0].trade_id, None);
}
