use kidspark::{
    kid::{KidUpdate, NewKid},
    progress::ProgressPatch,
};

use crate::helpers::{add_credential, add_kid, test_env};

#[tokio::test]
async fn test_create_trims_and_lists_by_name() {
    let env = test_env().await;
    let kids = &env.state.kids;

    let zoe = kids
        .create(NewKid {
            name: "  Zoe ".to_string(),
            age: 9,
            avatar: Some("fox".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(zoe.name, "Zoe");
    let ada = add_kid(&env, "Ada", 4).await;

    let listed = kids.list().await.unwrap();
    assert_eq!(listed, vec![ada, zoe.clone()]);
    assert_eq!(kids.get(zoe.id).await.unwrap(), Some(zoe));
}

#[tokio::test]
async fn test_create_validates() {
    let env = test_env().await;
    let kids = &env.state.kids;

    for (name, age) in [("", 6), ("Mia", 0), ("Mia", 18)] {
        let err = kids
            .create(NewKid {
                name: name.to_string(),
                age,
                avatar: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_validation_error(), "{name}/{age}: {err}");
    }
    assert!(kids.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_keeps_absent_fields() {
    let env = test_env().await;
    let kids = &env.state.kids;
    let kid = add_kid(&env, "Mia", 7).await;

    let updated = kids
        .update(
            kid.id,
            KidUpdate {
                age: Some(8),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Mia");
    assert_eq!(updated.age, 8);

    let err = kids.update(999, KidUpdate::default()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(kids.require(999).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_removes_sessions_and_progress() {
    let env = test_env().await;
    let mia = add_kid(&env, "Mia", 7).await;
    let leo = add_kid(&env, "Leo", 5).await;

    let credential_id = add_credential(&env, "Family").await;

    let mia_token = env
        .state
        .sessions
        .create_kid_session(mia.id, credential_id)
        .await
        .unwrap();
    let leo_token = env
        .state
        .sessions
        .create_kid_session(leo.id, credential_id)
        .await
        .unwrap();
    for kid in [&mia, &leo] {
        env.state
            .progress
            .upsert(kid.id, 10, &ProgressPatch::in_progress())
            .await
            .unwrap();
    }

    env.state.kids.delete(mia.id).await.unwrap();

    assert!(env.state.kids.get(mia.id).await.unwrap().is_none());
    assert!(env.state.sessions.validate_kid(&mia_token).await.unwrap().is_none());
    assert!(env.state.progress.list(mia.id).await.unwrap().is_empty());

    assert!(env.state.sessions.validate_kid(&leo_token).await.unwrap().is_some());
    assert_eq!(env.state.progress.list(leo.id).await.unwrap().len(), 1);

    assert!(env.state.kids.delete(mia.id).await.unwrap_err().is_not_found());
}
