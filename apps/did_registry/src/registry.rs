//! The mapping from DID to its current document.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, PoisonError, RwLock},
};

use tracing::{debug, info};

use crate::{
	error::RegistryError,
	storage::{Document, RegistryEntry, Storage, StorageError},
};

/// Owns every registry entry.
///
/// Writes are persisted before they are applied in memory, so whatever a
/// reader sees is durable. Writes to the same DID are serialized, writes to
/// different DIDs are not.
#[derive(Debug)]
pub struct Registry {
	entries: RwLock<HashMap<String, RegistryEntry>>,
	/// One lock per DID that has ever been written.
	writers: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
	storage: Box<dyn Storage>,
}

impl Registry {
	/// Loads every entry from `storage`.
	pub async fn load(storage: Box<dyn Storage>) -> Result<Self, StorageError> {
		let entries = storage.load().await?;
		info!(entries = entries.len(), "loaded registry");
		Ok(Self {
			entries: RwLock::new(entries),
			writers: Mutex::default(),
			storage,
		})
	}

	pub fn len(&self) -> usize {
		self.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn contains(&self, did: &str) -> bool {
		self.read().contains_key(did)
	}

	pub fn get(&self, did: &str) -> Result<RegistryEntry, RegistryError> {
		self.read()
			.get(did)
			.cloned()
			.ok_or_else(|| RegistryError::not_found(did))
	}

	/// Registers a new DID. Fails with [`RegistryError::Conflict`] if the DID
	/// is already taken.
	pub async fn create(
		&self,
		did: &str,
		did_document: Document,
		public_key: Option<String>,
	) -> Result<(), RegistryError> {
		let lock = self.writer(did);
		let _guard = lock.lock().await;
		if self.contains(did) {
			return Err(RegistryError::Conflict(did.to_owned()));
		}
		self.commit(
			did,
			RegistryEntry {
				did_document,
				public_key,
			},
		)
		.await?;
		info!(did, "registered DID");
		Ok(())
	}

	/// Overwrites the document of an existing DID.
	pub async fn replace(
		&self,
		did: &str,
		did_document: Document,
	) -> Result<(), RegistryError> {
		self.modify(did, |_| Ok(did_document)).await.map(|_| ())
	}

	/// Read-modify-write of a single DID's document, atomic with respect to
	/// other writers of the same DID. `f` sees the current entry and returns
	/// the replacement document, or an error to leave everything untouched.
	pub async fn modify<F>(&self, did: &str, f: F) -> Result<Document, RegistryError>
	where
		F: FnOnce(&RegistryEntry) -> Result<Document, RegistryError>,
	{
		// DIDs are never removed, so only registered ones ever get a writer.
		if !self.contains(did) {
			return Err(RegistryError::not_found(did));
		}
		let lock = self.writer(did);
		let _guard = lock.lock().await;
		let current = self.get(did)?;
		let did_document = f(&current)?;
		let entry = RegistryEntry {
			did_document,
			public_key: current.public_key,
		};
		self.commit(did, entry.clone()).await?;
		debug!(did, "replaced DID document");
		Ok(entry.did_document)
	}

	/// Must be called with the writer lock of `did` held.
	async fn commit(&self, did: &str, entry: RegistryEntry) -> Result<(), RegistryError> {
		self.storage.save(did, &entry).await?;
		self.entries
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(did.to_owned(), entry);
		Ok(())
	}

	fn writer(&self, did: &str) -> Arc<tokio::sync::Mutex<()>> {
		let mut writers = self.writers.lock().unwrap_or_else(PoisonError::into_inner);
		Arc::clone(writers.entry(did.to_owned()).or_default())
	}

	fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, RegistryEntry>> {
		self.entries.read().unwrap_or_else(PoisonError::into_inner)
	}
}
