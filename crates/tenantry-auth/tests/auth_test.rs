//! Integration tests for the credential backend and session resolver
//! against in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tenantry_auth::{AuthConfig, CredentialBackend, ResolvedUser, SessionResolver};
use tenantry_auth::password::hash_password;
use tenantry_core::config::TenancyConfig;
use tenantry_core::models::UserStatus;
use tenantry_core::models::public_user::CreatePublicUser;
use tenantry_core::models::tenant_user::{CreateTenantUser, TenantUser, UpdateTenantUser};
use tenantry_core::repository::{PublicUserRepository, TenantUserRepository};
use tenantry_core::schema::SchemaName;
use tenantry_db::repository::{
    SurrealPublicUserRepository, SurrealSessionRepository, SurrealTenantUserRepository,
};

fn auth_config() -> AuthConfig {
    AuthConfig {
        secret_key: "integration-secret".into(),
        ..AuthConfig::default()
    }
}

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tenantry_db::run_migrations(&db).await.unwrap();
    db
}

fn schema(name: &str) -> SchemaName {
    SchemaName::new(name.to_string()).unwrap()
}

fn backend(db: &Surreal<Db>) -> CredentialBackend<SurrealTenantUserRepository<Db>> {
    CredentialBackend::new(
        SurrealTenantUserRepository::new(db.clone()),
        auth_config(),
        TenancyConfig::default(),
    )
}

fn resolver(
    db: &Surreal<Db>,
) -> SessionResolver<
    SurrealPublicUserRepository<Db>,
    SurrealTenantUserRepository<Db>,
    SurrealSessionRepository<Db>,
> {
    SessionResolver::new(
        SurrealPublicUserRepository::new(db.clone()),
        SurrealTenantUserRepository::new(db.clone()),
        SurrealSessionRepository::new(db.clone()),
        auth_config(),
        TenancyConfig::default(),
    )
}

async fn seed_tenant_user(db: &Surreal<Db>, sch: &SchemaName, password: &str) -> TenantUser {
    SurrealTenantUserRepository::new(db.clone())
        .create(
            sch,
            CreateTenantUser {
                username: "worker".into(),
                email: "worker@acme.test".into(),
                password_hash: hash_password(password, None).unwrap(),
                is_verified: true,
                is_staff: false,
                is_superuser: false,
                supervisor_id: None,
            },
        )
        .await
        .unwrap()
}

// -----------------------------------------------------------------------
// Credential backend
// -----------------------------------------------------------------------

#[tokio::test]
async fn authenticate_with_correct_credentials() {
    let db = setup().await;
    let sch = schema("auth_1");
    let user = seed_tenant_user(&db, &sch, "hunter2hunter2").await;

    let resolved = backend(&db)
        .authenticate(&sch, "worker@acme.test", "hunter2hunter2")
        .await
        .unwrap();
    assert_eq!(resolved.unwrap().id, user.id);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_silent() {
    let db = setup().await;
    let sch = schema("auth_2");
    seed_tenant_user(&db, &sch, "hunter2hunter2").await;
    let backend = backend(&db);

    let wrong = backend
        .authenticate(&sch, "worker@acme.test", "nope")
        .await
        .unwrap();
    assert!(wrong.is_none());

    let unknown = backend
        .authenticate(&sch, "ghost@acme.test", "hunter2hunter2")
        .await
        .unwrap();
    assert!(unknown.is_none());
}

#[tokio::test]
async fn inactive_accounts_cannot_authenticate() {
    let db = setup().await;
    let sch = schema("auth_3");
    let user = seed_tenant_user(&db, &sch, "hunter2hunter2").await;
    SurrealTenantUserRepository::new(db.clone())
        .update(
            &sch,
            user.id,
            UpdateTenantUser {
                status: Some(UserStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let backend = backend(&db);

    let resolved = backend
        .authenticate(&sch, "worker@acme.test", "hunter2hunter2")
        .await
        .unwrap();
    assert!(resolved.is_none());

    assert!(backend.get_user(&sch, user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn the_public_schema_never_authenticates() {
    let db = setup().await;
    let public = schema("public");

    let resolved = backend(&db)
        .authenticate(&public, "anyone@example.com", "password")
        .await
        .unwrap();
    assert!(resolved.is_none());
}

// -----------------------------------------------------------------------
// Session resolution
// -----------------------------------------------------------------------

#[tokio::test]
async fn tenant_session_round_trip() {
    let db = setup().await;
    let sch = schema("sess_auth_1");
    let user = seed_tenant_user(&db, &sch, "hunter2hunter2").await;
    let resolver = resolver(&db);

    let (_, raw_token) = resolver
        .open_session(&sch, user.id, &user.password_hash, None, None)
        .await
        .unwrap();

    match resolver.resolve_user(&sch, &raw_token).await.unwrap() {
        ResolvedUser::Tenant(resolved) => assert_eq!(resolved.id, user.id),
        other => panic!("expected tenant user, got {other:?}"),
    }
}

#[tokio::test]
async fn password_change_flushes_tenant_sessions() {
    let db = setup().await;
    let sch = schema("sess_auth_2");
    let user = seed_tenant_user(&db, &sch, "hunter2hunter2").await;
    let resolver = resolver(&db);

    let (_, raw_token) = resolver
        .open_session(&sch, user.id, &user.password_hash, None, None)
        .await
        .unwrap();

    // Change the password out from under the session.
    SurrealTenantUserRepository::new(db.clone())
        .update(
            &sch,
            user.id,
            UpdateTenantUser {
                password_hash: Some(hash_password("new-password-9", None).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // The stale auth hash no longer verifies; the session is flushed.
    assert!(resolver.resolve_user(&sch, &raw_token).await.unwrap().is_anonymous());
    // And it stays gone.
    assert!(resolver.resolve_user(&sch, &raw_token).await.unwrap().is_anonymous());
}

#[tokio::test]
async fn unknown_token_is_anonymous() {
    let db = setup().await;
    let resolver = resolver(&db);

    let resolved = resolver
        .resolve_user(&schema("sess_auth_3"), "no-such-token")
        .await
        .unwrap();
    assert!(resolved.is_anonymous());
}

#[tokio::test]
async fn public_schema_sessions_resolve_without_auth_hash() {
    let db = setup().await;
    let public = schema("public");
    let users = SurrealPublicUserRepository::new(db.clone());
    let user = users
        .create(CreatePublicUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: hash_password("hunter2hunter2", None).unwrap(),
            is_verified: true,
            is_staff: false,
            is_superuser: false,
        })
        .await
        .unwrap();
    let resolver = resolver(&db);

    let (_, raw_token) = resolver
        .open_session(&public, user.id, &user.password_hash, None, None)
        .await
        .unwrap();

    match resolver.resolve_user(&public, &raw_token).await.unwrap() {
        ResolvedUser::Public(resolved) => assert_eq!(resolved.id, user.id),
        other => panic!("expected public user, got {other:?}"),
    }
}

#[tokio::test]
async fn closed_sessions_stop_resolving() {
    let db = setup().await;
    let sch = schema("sess_auth_4");
    let user = seed_tenant_user(&db, &sch, "hunter2hunter2").await;
    let resolver = resolver(&db);

    let (session, raw_token) = resolver
        .open_session(&sch, user.id, &user.password_hash, None, None)
        .await
        .unwrap();
    resolver.close_session(&sch, session.id).await.unwrap();

    assert!(resolver.resolve_user(&sch, &raw_token).await.unwrap().is_anonymous());
}

#[tokio::test]
async fn revoke_all_sessions_for_a_user() {
    let db = setup().await;
    let sch = schema("sess_auth_5");
    let user = seed_tenant_user(&db, &sch, "hunter2hunter2").await;
    let resolver = resolver(&db);

    let (_, token_a) = resolver
        .open_session(&sch, user.id, &user.password_hash, None, None)
        .await
        .unwrap();
    let (_, token_b) = resolver
        .open_session(&sch, user.id, &user.password_hash, None, None)
        .await
        .unwrap();

    resolver.revoke_all_sessions(&sch, user.id).await.unwrap();

    assert!(resolver.resolve_user(&sch, &token_a).await.unwrap().is_anonymous());
    assert!(resolver.resolve_user(&sch, &token_b).await.unwrap().is_anonymous());
}

#[tokio::test]
async fn sessions_do_not_cross_schemas() {
    let db = setup().await;
    let sch_a = schema("sess_auth_6a");
    let sch_b = schema("sess_auth_6b");
    let user = seed_tenant_user(&db, &sch_a, "hunter2hunter2").await;
    let resolver = resolver(&db);

    let (_, raw_token) = resolver
        .open_session(&sch_a, user.id, &user.password_hash, None, None)
        .await
        .unwrap();

    // The token only resolves under the schema it was opened for.
    assert!(resolver.resolve_user(&sch_b, &raw_token).await.unwrap().is_anonymous());
    assert!(!resolver.resolve_user(&sch_a, &raw_token).await.unwrap().is_anonymous());
}

#[tokio::test]
async fn deactivated_users_resolve_as_anonymous() {
    let db = setup().await;
    let sch = schema("sess_auth_7");
    let user = seed_tenant_user(&db, &sch, "hunter2hunter2").await;
    let resolver = resolver(&db);

    let (_, raw_token) = resolver
        .open_session(&sch, user.id, &user.password_hash, None, None)
        .await
        .unwrap();

    SurrealTenantUserRepository::new(db.clone())
        .update(
            &sch,
            user.id,
            UpdateTenantUser {
                status: Some(UserStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(resolver.resolve_user(&sch, &raw_token).await.unwrap().is_anonymous());
}
