use std::{
	collections::HashMap,
	sync::{Mutex, PoisonError},
};

use axum::async_trait;

use super::{RegistryEntry, Storage, StorageError};

/// Keeps everything in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	entries: Mutex<HashMap<String, RegistryEntry>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Storage for MemoryStorage {
	async fn load(&self) -> Result<HashMap<String, RegistryEntry>, StorageError> {
		Ok(self
			.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone())
	}

	async fn save(&self, did: &str, entry: &RegistryEntry) -> Result<(), StorageError> {
		self.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(did.to_owned(), entry.clone());
		Ok(())
	}
}
