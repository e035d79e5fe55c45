use gateway::remote::{
    AuthGateway, GatewayError, InMemoryGateway, ProgressGateway, SignUpRequest,
};
use tracker_core::model::{
    Difficulty, NewProgressRecord, ProgressPatch, Project, ProjectId, Stage, Track,
};
use tracker_core::time::{fixed_clock, fixed_now};

fn build_project(id: u64, stage: u8, track: Track) -> Project {
    Project::new(
        ProjectId::new(id),
        format!("Project {id}"),
        "desc",
        Stage::new(stage).unwrap(),
        format!("Stage {stage}"),
        Difficulty::Easy,
        track,
        fixed_now(),
        fixed_now(),
    )
    .unwrap()
}

#[tokio::test]
async fn progress_rows_are_scoped_per_user_and_track() {
    let gateway = InMemoryGateway::new(fixed_clock());
    gateway
        .seed_projects(vec![
            build_project(1, 1, Track::Php),
            build_project(2, 2, Track::Php),
        ])
        .unwrap();

    let alice = gateway.register_account("alice@example.test", "secret1").unwrap();
    let bob = gateway.register_account("bob@example.test", "secret2").unwrap();

    gateway
        .create_progress(NewProgressRecord {
            user_id: alice,
            project_id: ProjectId::new(1),
            track: Track::Php,
            patch: ProgressPatch::new().completion(true, Some(fixed_now())),
        })
        .await
        .unwrap();
    gateway
        .create_progress(NewProgressRecord {
            user_id: alice,
            project_id: ProjectId::new(1),
            track: Track::React,
            patch: ProgressPatch::new(),
        })
        .await
        .unwrap();

    let php_rows = gateway.fetch_progress(alice, Track::Php).await.unwrap();
    assert_eq!(php_rows.len(), 1);
    assert!(php_rows[0].is_completed());

    let bob_rows = gateway.fetch_progress(bob, Track::Php).await.unwrap();
    assert!(bob_rows.is_empty());
}

#[tokio::test]
async fn update_keeps_created_at_and_identity() {
    let gateway = InMemoryGateway::new(fixed_clock());
    let user = gateway.register_account("alice@example.test", "secret1").unwrap();

    let created = gateway
        .create_progress(NewProgressRecord {
            user_id: user,
            project_id: ProjectId::new(7),
            track: Track::HtmlCss,
            patch: ProgressPatch::new().notes("first pass"),
        })
        .await
        .unwrap();
    assert_eq!(created.created_at(), fixed_now());

    let updated = gateway
        .update_progress(created.id(), &ProgressPatch::new().notes("second pass"))
        .await
        .unwrap();

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.created_at(), created.created_at());
    assert_eq!(updated.notes(), "second pass");
    assert_eq!(updated.project_id(), created.project_id());
}

#[tokio::test]
async fn update_of_unknown_row_is_not_found() {
    let gateway = InMemoryGateway::new(fixed_clock());
    let err = gateway
        .update_progress(
            tracker_core::model::ProgressId::new(uuid::Uuid::new_v4()),
            &ProgressPatch::new().notes("nope"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound));
}

#[tokio::test]
async fn sign_up_conflicts_on_known_email() {
    let gateway = InMemoryGateway::new(fixed_clock());
    gateway.register_account("alice@example.test", "secret1").unwrap();

    let err = gateway
        .sign_up(SignUpRequest {
            email: "alice@example.test".into(),
            password: "other".into(),
            full_name: "Alice".into(),
            username: "alice_dev".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Conflict));

    let session = gateway
        .sign_up(SignUpRequest {
            email: "new@example.test".into(),
            password: "secret1".into(),
            full_name: "New".into(),
            username: "new_dev".into(),
        })
        .await
        .unwrap();
    assert_eq!(session.email(), "new@example.test");
    assert_eq!(gateway.session().await, Some(session));
}
