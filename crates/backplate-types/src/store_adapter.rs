//! Adapter that persists entity records.
//!
//! Every entity row carries the same bookkeeping columns (`id`, `version`,
//! `created`, `modified`, `deleted`) next to its own fields. Deletion is soft:
//! the row stays, flagged as deleted, and default read paths skip it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Debug;

use crate::prelude::*;
use crate::types::RecordId;
use crate::user::{CreateUser, UpdateUser, User};

pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const MAX_LIST_LIMIT: u32 = 1000;

/// A persisted entity type together with its creation and update views.
pub trait Entity: Clone + Debug + Serialize + Send + Sync + 'static {
	/// Full input needed to create a record
	type Create: Debug + Send + Sync;
	/// Partial input; absent fields are left untouched
	type Update: Debug + Send + Sync;

	/// Entity name used in logs and error messages
	const KIND: &'static str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordState {
	Active,
	Deleted,
}

impl RecordState {
	pub fn is_deleted(self) -> bool {
		self == RecordState::Deleted
	}

	pub fn from_deleted(deleted: bool) -> Self {
		if deleted { RecordState::Deleted } else { RecordState::Active }
	}
}

fn serialize_state_as_deleted<S>(state: &RecordState, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_bool(state.is_deleted())
}

/// Bookkeeping columns shared by every entity row
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordMeta {
	pub id: RecordId,
	/// Starts at 1, incremented by exactly one on every write
	pub version: u32,
	pub created: Timestamp,
	pub modified: Timestamp,
	#[serde(rename = "deleted", serialize_with = "serialize_state_as_deleted")]
	pub state: RecordState,
}

/// A persisted entity: bookkeeping columns plus entity fields
#[derive(Clone, Debug, Serialize)]
pub struct Record<E> {
	#[serde(flatten)]
	pub meta: RecordMeta,
	#[serde(flatten)]
	pub data: E,
}

impl<E> Record<E> {
	pub fn id(&self) -> RecordId {
		self.meta.id
	}

	pub fn version(&self) -> u32 {
		self.meta.version
	}

	pub fn is_deleted(&self) -> bool {
		self.meta.state.is_deleted()
	}
}

/// Pagination for list queries
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ListOptions {
	#[serde(default)]
	pub offset: u32,
	#[serde(default = "default_list_limit")]
	pub limit: u32,
}

fn default_list_limit() -> u32 {
	DEFAULT_LIST_LIMIT
}

impl Default for ListOptions {
	fn default() -> Self {
		Self { offset: 0, limit: DEFAULT_LIST_LIMIT }
	}
}

impl ListOptions {
	/// Limit clamped to `MAX_LIST_LIMIT`
	pub fn effective_limit(&self) -> u32 {
		self.limit.min(MAX_LIST_LIMIT)
	}
}

/// Generic create/read/update/soft-delete operations over one entity type.
#[async_trait]
pub trait CrudAdapter<E: Entity>: Debug + Send + Sync {
	/// Non-deleted record with the given id
	async fn get(&self, id: RecordId) -> BpResult<Option<Record<E>>>;

	/// Record with the given id, deleted or not
	async fn get_including_deleted(&self, id: RecordId) -> BpResult<Option<Record<E>>>;

	/// Non-deleted records ordered by creation time ascending
	async fn list(&self, opts: &ListOptions) -> BpResult<Vec<Record<E>>>;

	/// Persist a new record; it starts at version 1 with `created == modified`
	async fn create(&self, view: &E::Create) -> BpResult<Record<E>>;

	/// Apply the fields present in `view` onto `existing`.
	///
	/// Fails with `Error::Conflict` if the stored version no longer matches
	/// `existing.meta.version`, and with `Error::NotFound` if the row is gone.
	async fn update(&self, existing: &Record<E>, view: &E::Update) -> BpResult<Record<E>>;

	/// Flag the record as deleted without erasing it
	async fn remove(&self, id: RecordId) -> BpResult<Record<E>>;
}

impl Entity for User {
	type Create = CreateUser;
	type Update = UpdateUser;

	const KIND: &'static str = "user";
}

#[async_trait]
pub trait UserAdapter: CrudAdapter<User> {
	/// Non-deleted user owning the given identity-provider subject
	async fn get_by_sub(&self, sub: &str) -> BpResult<Option<Record<User>>>;
}


// vim: ts=4
