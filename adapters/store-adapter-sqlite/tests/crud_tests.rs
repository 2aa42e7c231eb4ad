//! Store adapter CRUD operation tests
//!
//! Tests create, read, update and soft delete of users, including the
//! version guard on writes.

use backplate::error::Error;
use backplate::store_adapter::{CrudAdapter, ListOptions, UserAdapter};
use backplate::types::{Patch, RecordId};
use backplate::user::{CreateUser, UpdateUser};
use backplate_store_adapter_sqlite::StoreAdapterSqlite;
use tempfile::TempDir;

async fn create_test_adapter() -> (StoreAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = StoreAdapterSqlite::new(temp_dir.path().join("db").join("backplate.db"))
		.await
		.expect("Failed to create adapter");
	(adapter, temp_dir)
}

fn new_user(n: u32) -> CreateUser {
	CreateUser::new(
		format!("sub-{}", n),
		format!("User {}", n),
		format!("U{}", n),
		format!("user{}@example.com", n),
		"Europe/Budapest",
	)
}

#[tokio::test]
async fn test_create_and_read_user() {
	let (adapter, _temp) = create_test_adapter().await;

	let created = adapter.create(&new_user(1)).await.expect("Should create user");
	assert_eq!(created.meta.version, 1);
	assert_eq!(created.meta.created, created.meta.modified);
	assert!(!created.is_deleted());
	assert_eq!(created.data.sub, "sub-1");
	assert_eq!(created.data.full_name.as_deref(), Some("User 1"));
	assert!(created.data.is_active);
	assert!(!created.data.is_superuser);

	let read = adapter.get(created.id()).await.expect("Should read user").expect("User exists");
	assert_eq!(read.meta, created.meta);
	assert_eq!(read.data, created.data);

	let by_sub = adapter.get_by_sub("sub-1").await.expect("Should query").expect("User exists");
	assert_eq!(by_sub.id(), created.id());
}

#[tokio::test]
async fn test_get_missing_user() {
	let (adapter, _temp) = create_test_adapter().await;

	assert!(adapter.get(RecordId(42)).await.expect("Should query").is_none());
	assert!(adapter.get_by_sub("nobody").await.expect("Should query").is_none());
}

#[tokio::test]
async fn test_create_rejects_invalid_view() {
	let (adapter, _temp) = create_test_adapter().await;

	let mut view = new_user(1);
	view.email = "not-an-email".into();
	let result = adapter.create(&view).await;
	assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_duplicate_sub_and_email() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.create(&new_user(1)).await.expect("Should create user");

	let mut same_sub = new_user(2);
	same_sub.sub = "sub-1".into();
	assert!(matches!(adapter.create(&same_sub).await, Err(Error::Conflict(_))));

	let mut same_email = new_user(3);
	same_email.email = "user1@example.com".into();
	assert!(matches!(adapter.create(&same_email).await, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_list_orders_by_creation_and_skips_deleted() {
	let (adapter, _temp) = create_test_adapter().await;

	let mut ids = Vec::new();
	for i in 1..=4 {
		ids.push(adapter.create(&new_user(i)).await.expect("Should create user").id());
	}
	adapter.remove(ids[1]).await.expect("Should remove user");

	let users = adapter.list(&ListOptions::default()).await.expect("Should list users");
	let listed: Vec<RecordId> = users.iter().map(|u| u.id()).collect();
	assert_eq!(listed, vec![ids[0], ids[2], ids[3]]);

	let page = adapter.list(&ListOptions { offset: 1, limit: 1 }).await.expect("Should list users");
	assert_eq!(page.len(), 1);
	assert_eq!(page[0].id(), ids[2]);
}

#[tokio::test]
async fn test_soft_delete() {
	let (adapter, _temp) = create_test_adapter().await;
	let created = adapter.create(&new_user(1)).await.expect("Should create user");

	let removed = adapter.remove(created.id()).await.expect("Should remove user");
	assert!(removed.is_deleted());
	assert_eq!(removed.meta.version, 2);
	assert!(removed.meta.modified > created.meta.modified);

	assert!(adapter.get(created.id()).await.expect("Should query").is_none());
	assert!(adapter.get_by_sub("sub-1").await.expect("Should query").is_none());

	let kept = adapter
		.get_including_deleted(created.id())
		.await
		.expect("Should query")
		.expect("Row is kept");
	assert!(kept.is_deleted());
	assert_eq!(kept.data.email, "user1@example.com");

	assert!(matches!(adapter.remove(created.id()).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_remove_missing_user() {
	let (adapter, _temp) = create_test_adapter().await;
	assert!(matches!(adapter.remove(RecordId(7)).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_partial_update() {
	let (adapter, _temp) = create_test_adapter().await;
	let created = adapter.create(&new_user(1)).await.expect("Should create user");

	let update = UpdateUser {
		given_name: Patch::Value("Bob".into()),
		age: Patch::Value(33),
		full_name: Patch::Null,
		..UpdateUser::default()
	};
	let updated = adapter.update(&created, &update).await.expect("Should update user");

	assert_eq!(updated.meta.version, 2);
	assert_eq!(updated.meta.created, created.meta.created);
	assert!(updated.meta.modified > created.meta.modified);
	assert_eq!(updated.data.given_name.as_deref(), Some("Bob"));
	assert_eq!(updated.data.age, Some(33));
	assert_eq!(updated.data.full_name, None);
	// Untouched fields keep their values
	assert_eq!(updated.data.email, created.data.email);
	assert_eq!(updated.data.timezone, created.data.timezone);
	assert_eq!(updated.data.notifications_enabled, created.data.notifications_enabled);
}

#[tokio::test]
async fn test_empty_update_bumps_version() {
	let (adapter, _temp) = create_test_adapter().await;
	let created = adapter.create(&new_user(1)).await.expect("Should create user");

	let updated = adapter.update(&created, &UpdateUser::default()).await.expect("Should update user");
	assert_eq!(updated.meta.version, 2);
	assert_eq!(updated.data, created.data);
}

#[tokio::test]
async fn test_stale_update_conflicts() {
	let (adapter, _temp) = create_test_adapter().await;
	let created = adapter.create(&new_user(1)).await.expect("Should create user");

	let first = UpdateUser { given_name: Patch::Value("First".into()), ..UpdateUser::default() };
	adapter.update(&created, &first).await.expect("Should update user");

	// `created` still carries version 1
	let second = UpdateUser { given_name: Patch::Value("Second".into()), ..UpdateUser::default() };
	let result = adapter.update(&created, &second).await;
	assert!(matches!(result, Err(Error::Conflict(_))));

	let current = adapter.get(created.id()).await.expect("Should query").expect("User exists");
	assert_eq!(current.data.given_name.as_deref(), Some("First"));
	assert_eq!(current.meta.version, 2);
}

#[tokio::test]
async fn test_update_duplicate_email_conflicts() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.create(&new_user(1)).await.expect("Should create user");
	let second = adapter.create(&new_user(2)).await.expect("Should create user");

	let update = UpdateUser { email: Patch::Value("user1@example.com".into()), ..UpdateUser::default() };
	assert!(matches!(adapter.update(&second, &update).await, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_update_rejects_null_email() {
	let (adapter, _temp) = create_test_adapter().await;
	let created = adapter.create(&new_user(1)).await.expect("Should create user");

	let update = UpdateUser { email: Patch::Null, ..UpdateUser::default() };
	assert!(matches!(adapter.update(&created, &update).await, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_in_memory_store() {
	let adapter = StoreAdapterSqlite::connect("sqlite::memory:").await.expect("Should open store");
	let created = adapter.create(&new_user(1)).await.expect("Should create user");
	let read = adapter.get(created.id()).await.expect("Should query");
	assert!(read.is_some());
}

#[tokio::test]
async fn test_connect_creates_missing_directory() {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let db_path = temp_dir.path().join("data").join("backplate.db");
	let url = format!("sqlite://{}", db_path.display());

	let adapter = StoreAdapterSqlite::connect(&url).await.expect("Should open store");
	let created = adapter.create(&new_user(1)).await.expect("Should create user");
	assert!(db_path.exists());
	drop(adapter);

	// Reopening the same file sees the stored row
	let adapter = StoreAdapterSqlite::connect(&url).await.expect("Should reopen store");
	let read = adapter.get(created.id()).await.expect("Should query");
	assert!(read.is_some());
}

// vim: ts=4
