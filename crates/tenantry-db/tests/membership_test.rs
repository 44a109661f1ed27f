//! Integration tests for the tenant-user and membership repositories:
//! schema scoping, linkage transactions, soft/hard unlink.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tenantry_core::models::UserStatus;
use tenantry_core::models::public_user::CreatePublicUser;
use tenantry_core::models::tenant::CreateTenant;
use tenantry_core::models::tenant_user::{CreateTenantUser, UpdateTenantUser};
use tenantry_core::repository::{
    MembershipRepository, PublicUserRepository, TenantRepository, TenantUserRepository,
};
use tenantry_core::schema::SchemaName;
use tenantry_db::repository::{
    SurrealMembershipRepository, SurrealPublicUserRepository, SurrealTenantRepository,
    SurrealTenantUserRepository,
};
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tenantry_db::run_migrations(&db).await.unwrap();
    db
}

fn schema(name: &str) -> SchemaName {
    SchemaName::new(name.to_string()).unwrap()
}

fn new_tenant_user(email: &str, supervisor_id: Option<Uuid>) -> CreateTenantUser {
    CreateTenantUser {
        username: email.split('@').next().unwrap().into(),
        email: email.into(),
        password_hash: "$argon2id$fake".into(),
        is_verified: false,
        is_staff: false,
        is_superuser: false,
        supervisor_id,
    }
}

async fn seed_public_user(db: &Surreal<surrealdb::engine::local::Db>, email: &str) -> Uuid {
    SurrealPublicUserRepository::new(db.clone())
        .create(CreatePublicUser {
            username: email.split('@').next().unwrap().into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            is_verified: false,
            is_staff: false,
            is_superuser: false,
        })
        .await
        .unwrap()
        .id
}

async fn seed_tenant(db: &Surreal<surrealdb::engine::local::Db>, sch: &str, owner: Uuid) -> Uuid {
    SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            schema_name: schema(sch),
            slug: sch.into(),
            name: sch.into(),
            owner_id: owner,
        })
        .await
        .unwrap()
        .id
}

// -----------------------------------------------------------------------
// Tenant user scoping
// -----------------------------------------------------------------------

#[tokio::test]
async fn tenant_user_queries_are_schema_scoped() {
    let db = setup().await;
    let repo = SurrealTenantUserRepository::new(db);

    let a = schema("alpha_1");
    let b = schema("beta_1");

    let created = repo
        .create(&a, new_tenant_user("dave@example.com", None))
        .await
        .unwrap();
    assert_eq!(created.schema_name, a);
    assert_eq!(created.status, UserStatus::Active);
    assert!(created.groups.is_empty());

    // Same email in another schema is fine.
    repo.create(&b, new_tenant_user("dave@example.com", None))
        .await
        .unwrap();

    // Lookups honor the handle.
    assert!(repo.get_by_email(&a, "dave@example.com").await.is_ok());
    assert!(repo.get_by_id(&b, created.id).await.unwrap_err().is_not_found());

    // Duplicate within one schema violates the composite index.
    assert!(
        repo.create(&a, new_tenant_user("dave@example.com", None))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn get_by_supervisor_finds_the_shadow_user() {
    let db = setup().await;
    let repo = SurrealTenantUserRepository::new(db);
    let sch = schema("gamma_1");
    let supervisor = Uuid::new_v4();

    let created = repo
        .create(&sch, new_tenant_user("erin@example.com", Some(supervisor)))
        .await
        .unwrap();
    assert_eq!(created.supervisor_id, Some(supervisor));

    let found = repo.get_by_supervisor(&sch, supervisor).await.unwrap();
    assert_eq!(found.id, created.id);

    let err = repo.get_by_supervisor(&sch, Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_clears_and_sets_supervisor() {
    let db = setup().await;
    let repo = SurrealTenantUserRepository::new(db);
    let sch = schema("delta_1");
    let supervisor = Uuid::new_v4();

    let created = repo
        .create(&sch, new_tenant_user("frank@example.com", Some(supervisor)))
        .await
        .unwrap();

    // Some(None) clears the link.
    let cleared = repo
        .update(
            &sch,
            created.id,
            UpdateTenantUser {
                supervisor_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.supervisor_id, None);

    // None leaves the (cleared) link alone while updating other fields.
    let updated = repo
        .update(
            &sch,
            created.id,
            UpdateTenantUser {
                groups: Some(vec!["editors".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.supervisor_id, None);
    assert_eq!(updated.groups, vec!["editors".to_string()]);
}

// -----------------------------------------------------------------------
// Membership linkage
// -----------------------------------------------------------------------

#[tokio::test]
async fn link_new_tenant_user_creates_row_and_edge() {
    let db = setup().await;
    let memberships = SurrealMembershipRepository::new(db.clone());
    let sch = schema("link_1");

    let user_id = seed_public_user(&db, "gina@example.com").await;
    let tenant_id = seed_tenant(&db, "link_1", user_id).await;

    assert!(!memberships.is_linked(user_id, tenant_id).await.unwrap());

    let tenant_user = memberships
        .link_new_tenant_user(
            &sch,
            tenant_id,
            user_id,
            new_tenant_user("gina+1@example.com", Some(user_id)),
        )
        .await
        .unwrap();
    assert_eq!(tenant_user.supervisor_id, Some(user_id));
    assert_eq!(tenant_user.status, UserStatus::Active);

    assert!(memberships.is_linked(user_id, tenant_id).await.unwrap());

    let tenants = memberships.tenants_of(user_id).await.unwrap();
    assert_eq!(tenants.len(), 1);
    assert_eq!(tenants[0].id, tenant_id);

    let users = memberships.users_of(tenant_id).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, user_id);
}

#[tokio::test]
async fn link_existing_tenant_user_sets_supervisor_and_edge() {
    let db = setup().await;
    let memberships = SurrealMembershipRepository::new(db.clone());
    let tenant_users = SurrealTenantUserRepository::new(db.clone());
    let sch = schema("link_2");

    let user_id = seed_public_user(&db, "hank@example.com").await;
    let owner_id = seed_public_user(&db, "owner2@example.com").await;
    let tenant_id = seed_tenant(&db, "link_2", owner_id).await;

    let orphan = tenant_users
        .create(&sch, new_tenant_user("standalone@example.com", None))
        .await
        .unwrap();

    memberships
        .link_existing_tenant_user(&sch, tenant_id, user_id, orphan.id)
        .await
        .unwrap();

    assert!(memberships.is_linked(user_id, tenant_id).await.unwrap());
    let connected = tenant_users.get_by_id(&sch, orphan.id).await.unwrap();
    assert_eq!(connected.supervisor_id, Some(user_id));
}

#[tokio::test]
async fn soft_unlink_keeps_groups_and_status() {
    let db = setup().await;
    let memberships = SurrealMembershipRepository::new(db.clone());
    let tenant_users = SurrealTenantUserRepository::new(db.clone());
    let sch = schema("unlink_1");

    let user_id = seed_public_user(&db, "iris@example.com").await;
    let owner_id = seed_public_user(&db, "owner3@example.com").await;
    let tenant_id = seed_tenant(&db, "unlink_1", owner_id).await;

    let tenant_user = memberships
        .link_new_tenant_user(
            &sch,
            tenant_id,
            user_id,
            new_tenant_user("iris+1@example.com", Some(user_id)),
        )
        .await
        .unwrap();
    tenant_users
        .update(
            &sch,
            tenant_user.id,
            UpdateTenantUser {
                groups: Some(vec!["admins".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    memberships
        .unlink(&sch, tenant_id, user_id, Some(tenant_user.id), false)
        .await
        .unwrap();

    assert!(!memberships.is_linked(user_id, tenant_id).await.unwrap());
    let survivor = tenant_users.get_by_id(&sch, tenant_user.id).await.unwrap();
    assert_eq!(survivor.supervisor_id, None);
    assert_eq!(survivor.groups, vec!["admins".to_string()]);
    assert_eq!(survivor.status, UserStatus::Active);
}

#[tokio::test]
async fn hard_unlink_clears_groups_and_deactivates() {
    let db = setup().await;
    let memberships = SurrealMembershipRepository::new(db.clone());
    let tenant_users = SurrealTenantUserRepository::new(db.clone());
    let sch = schema("unlink_2");

    let user_id = seed_public_user(&db, "jack@example.com").await;
    let owner_id = seed_public_user(&db, "owner4@example.com").await;
    let tenant_id = seed_tenant(&db, "unlink_2", owner_id).await;

    let tenant_user = memberships
        .link_new_tenant_user(
            &sch,
            tenant_id,
            user_id,
            new_tenant_user("jack+1@example.com", Some(user_id)),
        )
        .await
        .unwrap();
    tenant_users
        .update(
            &sch,
            tenant_user.id,
            UpdateTenantUser {
                groups: Some(vec!["admins".into(), "editors".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    memberships
        .unlink(&sch, tenant_id, user_id, Some(tenant_user.id), true)
        .await
        .unwrap();

    assert!(!memberships.is_linked(user_id, tenant_id).await.unwrap());
    let survivor = tenant_users.get_by_id(&sch, tenant_user.id).await.unwrap();
    assert_eq!(survivor.supervisor_id, None);
    assert!(survivor.groups.is_empty());
    assert_eq!(survivor.status, UserStatus::Inactive);
}

#[tokio::test]
async fn unlink_without_tenant_user_drops_only_the_edge() {
    let db = setup().await;
    let memberships = SurrealMembershipRepository::new(db.clone());
    let tenant_users = SurrealTenantUserRepository::new(db.clone());
    let sch = schema("unlink_3");

    let user_id = seed_public_user(&db, "kate@example.com").await;
    let owner_id = seed_public_user(&db, "owner5@example.com").await;
    let tenant_id = seed_tenant(&db, "unlink_3", owner_id).await;

    let orphan = tenant_users
        .create(&sch, new_tenant_user("kate+1@example.com", None))
        .await
        .unwrap();
    memberships
        .link_existing_tenant_user(&sch, tenant_id, user_id, orphan.id)
        .await
        .unwrap();

    // Linked-no-tenant-user unlink path: tenant_user_id is None.
    memberships
        .unlink(&sch, tenant_id, user_id, None, false)
        .await
        .unwrap();
    assert!(!memberships.is_linked(user_id, tenant_id).await.unwrap());

    // The tenant user row is untouched, supervisor included.
    let survivor = tenant_users.get_by_id(&sch, orphan.id).await.unwrap();
    assert_eq!(survivor.supervisor_id, Some(user_id));
}
