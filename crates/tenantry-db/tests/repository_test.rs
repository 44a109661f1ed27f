//! Integration tests for the public-scope repositories (tenant,
//! domain, public user) using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tenantry_core::models::UserStatus;
use tenantry_core::models::domain::CreateDomain;
use tenantry_core::models::public_user::{CreatePublicUser, UpdatePublicUser};
use tenantry_core::models::tenant::CreateTenant;
use tenantry_core::repository::{DomainRepository, PublicUserRepository, TenantRepository};
use tenantry_core::schema::SchemaName;
use tenantry_db::repository::{
    SurrealDomainRepository, SurrealPublicUserRepository, SurrealTenantRepository,
};
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tenantry_db::run_migrations(&db).await.unwrap();
    db
}

fn schema(name: &str) -> SchemaName {
    SchemaName::new(name.to_string()).unwrap()
}

fn new_user(email: &str) -> CreatePublicUser {
    CreatePublicUser {
        username: email.split('@').next().unwrap().into(),
        email: email.into(),
        password_hash: "$argon2id$fake".into(),
        is_verified: false,
        is_staff: false,
        is_superuser: false,
    }
}

// -----------------------------------------------------------------------
// Tenant tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_tenant() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);
    let owner_id = Uuid::new_v4();

    let tenant = repo
        .create(CreateTenant {
            schema_name: schema("acme_1"),
            slug: "acme".into(),
            name: "ACME Corp".into(),
            owner_id,
        })
        .await
        .unwrap();

    assert_eq!(tenant.slug, "acme");
    assert_eq!(tenant.owner_id, owner_id);
    assert!(tenant.auto_create_schema);

    let fetched = repo.get_by_id(tenant.id).await.unwrap();
    assert_eq!(fetched.id, tenant.id);
    assert_eq!(fetched.schema_name, schema("acme_1"));

    let by_schema = repo.get_by_schema(&schema("acme_1")).await.unwrap();
    assert_eq!(by_schema.id, tenant.id);
}

#[tokio::test]
async fn duplicate_schema_name_is_rejected() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    repo.create(CreateTenant {
        schema_name: schema("dup_1"),
        slug: "one".into(),
        name: "One".into(),
        owner_id: Uuid::new_v4(),
    })
    .await
    .unwrap();

    let result = repo
        .create(CreateTenant {
            schema_name: schema("dup_1"),
            slug: "two".into(),
            name: "Two".into(),
            owner_id: Uuid::new_v4(),
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn get_by_slug_returns_newest_tenant() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);
    let owner_id = Uuid::new_v4();

    // Same slug is legal (a retired tenant keeps its slug); lookup
    // must return the most recently created one.
    repo.create(CreateTenant {
        schema_name: schema("acme_1000"),
        slug: "acme".into(),
        name: "Old".into(),
        owner_id,
    })
    .await
    .unwrap();
    let newer = repo
        .create(CreateTenant {
            schema_name: schema("acme_2000"),
            slug: "acme".into(),
            name: "New".into(),
            owner_id,
        })
        .await
        .unwrap();

    let fetched = repo.get_by_slug("acme").await.unwrap();
    assert_eq!(fetched.id, newer.id);
}

#[tokio::test]
async fn set_owner_updates_owner_and_modified_at() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let tenant = repo
        .create(CreateTenant {
            schema_name: schema("own_1"),
            slug: "own".into(),
            name: "Own".into(),
            owner_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let new_owner = Uuid::new_v4();
    let updated = repo.set_owner(tenant.id, new_owner).await.unwrap();
    assert_eq!(updated.owner_id, new_owner);
    assert!(updated.modified_at >= tenant.modified_at);
}

#[tokio::test]
async fn delete_tenant_removes_row() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let tenant = repo
        .create(CreateTenant {
            schema_name: schema("gone_1"),
            slug: "gone".into(),
            name: "Gone".into(),
            owner_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    repo.delete(tenant.id).await.unwrap();
    let err = repo.get_by_id(tenant.id).await.unwrap_err();
    assert!(err.is_not_found());
}

// -----------------------------------------------------------------------
// Domain tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_find_domain() {
    let db = setup().await;
    let repo = SurrealDomainRepository::new(db);
    let tenant_id = Uuid::new_v4();

    let domain = repo
        .create(CreateDomain {
            domain: "acme.example.com".into(),
            tenant_id,
            is_primary: true,
        })
        .await
        .unwrap();
    assert!(domain.is_primary);

    let fetched = repo.get_by_domain("acme.example.com").await.unwrap();
    assert_eq!(fetched.id, domain.id);
    assert_eq!(fetched.tenant_id, tenant_id);

    let primary = repo.primary_for(tenant_id).await.unwrap();
    assert_eq!(primary.id, domain.id);
}

#[tokio::test]
async fn duplicate_domain_is_rejected() {
    let db = setup().await;
    let repo = SurrealDomainRepository::new(db);

    repo.create(CreateDomain {
        domain: "taken.example.com".into(),
        tenant_id: Uuid::new_v4(),
        is_primary: true,
    })
    .await
    .unwrap();

    let result = repo
        .create(CreateDomain {
            domain: "taken.example.com".into(),
            tenant_id: Uuid::new_v4(),
            is_primary: true,
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn rename_frees_the_old_hostname() {
    let db = setup().await;
    let repo = SurrealDomainRepository::new(db);
    let tenant_id = Uuid::new_v4();

    let domain = repo
        .create(CreateDomain {
            domain: "old.example.com".into(),
            tenant_id,
            is_primary: true,
        })
        .await
        .unwrap();

    let renamed = repo
        .rename(domain.id, "12345-retired-old.example.com")
        .await
        .unwrap();
    assert_eq!(renamed.domain, "12345-retired-old.example.com");

    // The original hostname no longer resolves and can be reused.
    assert!(repo.get_by_domain("old.example.com").await.unwrap_err().is_not_found());
    repo.create(CreateDomain {
        domain: "old.example.com".into(),
        tenant_id: Uuid::new_v4(),
        is_primary: true,
    })
    .await
    .unwrap();
}

// -----------------------------------------------------------------------
// Public user tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_public_user() {
    let db = setup().await;
    let repo = SurrealPublicUserRepository::new(db);

    let user = repo.create(new_user("alice@example.com")).await.unwrap();
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.is_active());

    let by_id = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(by_id.email, "alice@example.com");

    let by_email = repo.get_by_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn duplicate_public_email_is_rejected() {
    let db = setup().await;
    let repo = SurrealPublicUserRepository::new(db);

    repo.create(new_user("bob@example.com")).await.unwrap();
    assert!(repo.create(new_user("bob@example.com")).await.is_err());
}

#[tokio::test]
async fn update_public_user_status_and_password() {
    let db = setup().await;
    let repo = SurrealPublicUserRepository::new(db);

    let user = repo.create(new_user("carol@example.com")).await.unwrap();
    let updated = repo
        .update(
            user.id,
            UpdatePublicUser {
                status: Some(UserStatus::Inactive),
                password_hash: Some("$argon2id$other".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, UserStatus::Inactive);
    assert_eq!(updated.password_hash, "$argon2id$other");
    // Untouched fields survive.
    assert_eq!(updated.email, "carol@example.com");
    assert_eq!(updated.username, "carol");
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let db = setup().await;
    let repo = SurrealPublicUserRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}
