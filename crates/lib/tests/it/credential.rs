use kidspark::{Clock, credential::CredentialError};

use crate::helpers::{FAMILY_PASSWORD, MINUTE_MS, test_env};

#[tokio::test]
async fn test_create_and_list_hides_secrets() {
    let env = test_env().await;
    let store = &env.state.credentials;

    let first = store.create("Kitchen tablet", FAMILY_PASSWORD).await.unwrap();
    env.clock.advance(MINUTE_MS);
    let second = store.create("Grandma", "tulip").await.unwrap();

    let listed = store.list().await.unwrap();
    assert_eq!(listed, vec![second.clone(), first.clone()]);
    assert!(first.last_used_at.is_none());

    let json = serde_json::to_value(&listed[0]).unwrap();
    assert!(json.get("password_hash").is_none());
    assert!(json.get("salt").is_none());
    assert_eq!(json["label"], "Grandma");
}

#[tokio::test]
async fn test_empty_fields_are_rejected() {
    let env = test_env().await;
    let err = env.state.credentials.create("  ", "pw").await.unwrap_err();
    assert!(err.is_validation_error());
    let err = env.state.credentials.create("Label", "").await.unwrap_err();
    assert!(err.is_validation_error());
    assert!(env.state.credentials.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_any_matches_first_credential() {
    let env = test_env().await;
    let store = &env.state.credentials;

    assert_eq!(store.verify_any(FAMILY_PASSWORD).await.unwrap(), None);

    let first = store.create("One", "shared").await.unwrap();
    let other = store.create("Two", FAMILY_PASSWORD).await.unwrap();
    store.create("Three", "shared").await.unwrap();

    assert_eq!(store.verify_any("shared").await.unwrap(), Some(first.id));
    assert_eq!(store.verify_any(FAMILY_PASSWORD).await.unwrap(), Some(other.id));
    assert_eq!(store.verify_any("wrong").await.unwrap(), None);
}

#[tokio::test]
async fn test_verify_does_not_record_use() {
    let env = test_env().await;
    let store = &env.state.credentials;
    let credential = store.create("One", FAMILY_PASSWORD).await.unwrap();

    store.verify_any(FAMILY_PASSWORD).await.unwrap();
    assert!(store.list().await.unwrap()[0].last_used_at.is_none());

    env.clock.advance(5 * MINUTE_MS);
    store.record_use(credential.id).await.unwrap();
    let listed = store.list().await.unwrap();
    assert_eq!(listed[0].last_used_at, Some(env.clock.now()));
}

#[tokio::test]
async fn test_delete() {
    let env = test_env().await;
    let store = &env.state.credentials;
    let credential = store.create("One", FAMILY_PASSWORD).await.unwrap();

    store.delete(credential.id).await.unwrap();
    assert!(store.list().await.unwrap().is_empty());
    assert_eq!(store.verify_any(FAMILY_PASSWORD).await.unwrap(), None);

    let err = store.delete(credential.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        err,
        kidspark::Error::Credential(CredentialError::CredentialNotFound { .. })
    ));
}
