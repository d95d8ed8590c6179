//! Durable backends for the registry.
//!
//! The registry only ever loads everything at start and then saves one entry
//! at a time, so that is all a backend has to support.

mod json_file;
mod memory;
mod sqlite;

use std::collections::HashMap;

use axum::async_trait;
use serde::{Deserialize, Serialize};

pub use self::{
	json_file::JsonFileStorage,
	memory::MemoryStorage,
	sqlite::{MigratedDbPool, SqliteStorage},
};

/// A DID document as stored: a plain JSON object, so that arbitrary top level
/// keys survive updates.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// What the registry keeps per DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
	pub did_document: Document,
	/// PEM public key of legacy (RSA) identities, tracked apart from the
	/// document so that updates to the document cannot swap it out.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub public_key: Option<String>,
}

#[async_trait]
pub trait Storage: std::fmt::Debug + Send + Sync + 'static {
	/// Reads every entry.
	async fn load(&self) -> Result<HashMap<String, RegistryEntry>, StorageError>;

	/// Durably writes a single entry, overwriting any previous value. Must not
	/// return before the write is durable.
	async fn save(&self, did: &str, entry: &RegistryEntry) -> Result<(), StorageError>;
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
	#[error("io error on {path}: {source}")]
	Io {
		path: std::path::PathBuf,
		source: std::io::Error,
	},
	#[error("registry contents are not valid json: {0}")]
	Json(#[from] serde_json::Error),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Migrate(#[from] sqlx::migrate::MigrateError),
}
