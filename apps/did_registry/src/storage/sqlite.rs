use std::{collections::HashMap, path::Path};

use axum::async_trait;
use sqlx::{
	migrate::Migrator,
	sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};

use super::{RegistryEntry, Storage, StorageError};

static MIGRATOR: Migrator = sqlx::migrate!();

/// A [`SqlitePool`] that has had the migrations applied.
#[derive(Debug, Clone)]
pub struct MigratedDbPool(SqlitePool);

impl MigratedDbPool {
	pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::migrate::MigrateError> {
		MIGRATOR.run(&pool).await?;
		Ok(Self(pool))
	}
}

/// One row per DID, upserted on save.
#[derive(Debug)]
pub struct SqliteStorage {
	pool: MigratedDbPool,
}

impl SqliteStorage {
	pub fn new(pool: MigratedDbPool) -> Self {
		Self { pool }
	}

	/// Opens (creating if needed) the database at `path` and migrates it.
	pub async fn connect(path: &Path) -> Result<Self, StorageError> {
		let connect_opts = SqliteConnectOptions::new()
			.create_if_missing(true)
			.filename(path);
		let pool = SqlitePoolOptions::new()
			.connect_with(connect_opts)
			.await?;
		Ok(Self::new(MigratedDbPool::new(pool).await?))
	}
}

#[async_trait]
impl Storage for SqliteStorage {
	async fn load(&self) -> Result<HashMap<String, RegistryEntry>, StorageError> {
		let rows: Vec<(String, String)> =
			sqlx::query_as("SELECT did, entry FROM did_registry")
				.fetch_all(&self.pool.0)
				.await?;
		rows.into_iter()
			.map(|(did, entry)| -> Result<_, StorageError> {
				let entry: RegistryEntry = serde_json::from_str(&entry)?;
				Ok((did, entry))
			})
			.collect()
	}

	async fn save(&self, did: &str, entry: &RegistryEntry) -> Result<(), StorageError> {
		let serialized = serde_json::to_string(entry)?;
		sqlx::query(
			"INSERT INTO did_registry (did, entry) VALUES (?, ?) \
			ON CONFLICT (did) DO UPDATE SET entry = excluded.entry",
		)
		.bind(did)
		.bind(serialized)
		.execute(&self.pool.0)
		.await?;
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::storage::test_utils::entry;

	#[tokio::test]
	async fn test_save_then_reload() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("identities.db");

		let storage = SqliteStorage::connect(&path).await.unwrap();
		assert!(storage.load().await.unwrap().is_empty());
		for n in 0..3 {
			storage.save(&format!("did:key:{n}"), &entry(n)).await.unwrap();
		}
		storage.save("did:key:0", &entry(5)).await.unwrap();
		drop(storage);

		let reopened = SqliteStorage::connect(&path).await.unwrap();
		let loaded = reopened.load().await.unwrap();
		assert_eq!(loaded.len(), 3);
		assert_eq!(loaded["did:key:0"], entry(5));
		assert_eq!(loaded["did:key:2"], entry(2));
	}
}
