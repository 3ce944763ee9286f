mod common;

use anyhow::Result;
use axum::http::StatusCode;
use tokio::task::JoinSet;

use notes_service::models::Role;
use notes_service::store::Store;

#[tokio::test]
async fn free_plan_admits_exactly_three_notes_per_user() -> Result<()> {
    let app = common::test_app();
    let token = common::register(&app.router, "member@example.com", None).await?;

    for i in 1..=3 {
        let (status, _) = common::create_note(&app.router, &token, &format!("note {}", i)).await?;
        assert_eq!(status, StatusCode::CREATED, "create {}", i);
    }

    let (status, body) = common::create_note(&app.router, &token, "note 4").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("FREE plan allows maximum 3 notes per user"), "{}", message);
    Ok(())
}

#[tokio::test]
async fn quota_is_per_user_not_per_tenant() -> Result<()> {
    let app = common::test_app();
    // Both default registrations share the FREE tenant
    let first = common::register(&app.router, "one@example.com", None).await?;
    let second = common::register(&app.router, "two@example.com", None).await?;

    for i in 1..=3 {
        let (status, _) = common::create_note(&app.router, &first, &format!("a{}", i)).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    // The second user's allowance is untouched
    let (status, _) = common::create_note(&app.router, &second, "b1").await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn pro_plan_is_never_quota_rejected() -> Result<()> {
    let app = common::test_app();
    let token =
        common::register(&app.router, "admin@example.com", Some(common::PRO_INVITE_CODE)).await?;

    for i in 1..=5 {
        let (status, _) = common::create_note(&app.router, &token, &format!("note {}", i)).await?;
        assert_eq!(status, StatusCode::CREATED);
    }
    Ok(())
}

#[tokio::test]
async fn upgrading_the_tenant_lifts_the_cap() -> Result<()> {
    let app = common::test_app();
    let member = common::register(&app.router, "member@example.com", None).await?;

    for i in 1..=3 {
        common::create_note(&app.router, &member, &format!("note {}", i)).await?;
    }
    let (status, _) = common::create_note(&app.router, &member, "note 4").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin of the same FREE tenant upgrades it
    let member_user = app.store.find_user_by_email("member@example.com").await?.unwrap();
    let admin = app
        .store
        .create_user("boss@example.com", "digest", member_user.tenant_id, Role::Admin)
        .await?;
    let admin_token = app.state.codec.issue(admin.id, admin.tenant_id, admin.role)?;

    let (status, body) = common::send_json(
        &app.router,
        "PUT",
        "/api/tenants/upgrade",
        Some(&admin_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tenant successfully upgraded to PRO plan");

    // The same member's next create now succeeds
    let (status, _) = common::create_note(&app.router, &member, "note 4 again").await?;
    assert_eq!(status, StatusCode::CREATED);

    // A second upgrade is a no-op
    let (status, body) = common::send_json(
        &app.router,
        "PUT",
        "/api/tenants/upgrade",
        Some(&admin_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tenant already on PRO plan");
    Ok(())
}

#[tokio::test]
async fn members_cannot_upgrade_the_tenant() -> Result<()> {
    let app = common::test_app();
    let member = common::register(&app.router, "member@example.com", None).await?;

    let (status, body) = common::send_json(
        &app.router,
        "PUT",
        "/api/tenants/upgrade",
        Some(&member),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("permission"));
    Ok(())
}

#[tokio::test]
async fn unrecognized_plan_denies_creation() -> Result<()> {
    let app = common::test_app();
    let (_, _, token) = common::seed_user(
        &app,
        "Legacy Corp",
        "ENTERPRISE",
        "legacy@example.com",
        Role::Member,
    )
    .await?;

    let (status, _) = common::create_note(&app.router, &token, "note").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn concurrent_creates_cannot_overshoot_the_cap() -> Result<()> {
    let app = common::test_app();
    let (tenant_id, user_id, token) =
        common::seed_user(&app, "Busy Co", "FREE", "busy@example.com", Role::Member).await?;

    let mut tasks = JoinSet::new();
    for i in 0..10 {
        let router = app.router.clone();
        let token = token.clone();
        tasks.spawn(async move {
            let (status, _) = common::create_note(&router, &token, &format!("burst {}", i))
                .await
                .expect("create request");
            status
        });
    }

    let mut created = 0;
    let mut rejected = 0;
    while let Some(status) = tasks.join_next().await {
        match status? {
            StatusCode::CREATED => created += 1,
            StatusCode::FORBIDDEN => rejected += 1,
            other => panic!("unexpected status: {}", other),
        }
    }

    assert_eq!(created, 3);
    assert_eq!(rejected, 7);
    assert_eq!(
        app.store
            .count_notes_by_tenant_and_user(tenant_id, user_id)
            .await?,
        3
    );
    Ok(())
}
