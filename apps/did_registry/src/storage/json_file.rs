use std::{
	collections::{BTreeMap, HashMap},
	path::{Path, PathBuf},
};

use axum::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{RegistryEntry, Storage, StorageError};

/// The whole registry as one pretty printed JSON object, rewritten on every
/// save.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// registry file, so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonFileStorage {
	path: PathBuf,
	/// Mirror of the file contents. Only ever holds what was written.
	snapshot: Mutex<BTreeMap<String, RegistryEntry>>,
}

impl JsonFileStorage {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			snapshot: Mutex::default(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn io_err(&self, source: std::io::Error) -> StorageError {
		StorageError::Io {
			path: self.path.clone(),
			source,
		}
	}

	async fn write(
		&self,
		snapshot: &BTreeMap<String, RegistryEntry>,
	) -> Result<(), StorageError> {
		let serialized = serde_json::to_vec_pretty(snapshot)?;
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				tokio::fs::create_dir_all(parent)
					.await
					.map_err(|e| self.io_err(e))?;
			}
		}
		let tmp_path = self.path.with_extension("tmp");
		let file = {
			let mut file = tokio::fs::File::create(&tmp_path)
				.await
				.map_err(|e| self.io_err(e))?;
			tokio::io::AsyncWriteExt::write_all(&mut file, &serialized)
				.await
				.map_err(|e| self.io_err(e))?;
			file
		};
		file.sync_all().await.map_err(|e| self.io_err(e))?;
		tokio::fs::rename(&tmp_path, &self.path)
			.await
			.map_err(|e| self.io_err(e))?;
		debug!(path = %self.path.display(), entries = snapshot.len(), "wrote registry");
		Ok(())
	}
}

#[async_trait]
impl Storage for JsonFileStorage {
	async fn load(&self) -> Result<HashMap<String, RegistryEntry>, StorageError> {
		let loaded: BTreeMap<String, RegistryEntry> =
			match tokio::fs::read(&self.path).await {
				Ok(contents) => serde_json::from_slice(&contents)?,
				Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
					BTreeMap::new()
				}
				Err(err) => return Err(self.io_err(err)),
			};
		let mut snapshot = self.snapshot.lock().await;
		*snapshot = loaded.clone();
		Ok(loaded.into_iter().collect())
	}

	async fn save(&self, did: &str, entry: &RegistryEntry) -> Result<(), StorageError> {
		let mut snapshot = self.snapshot.lock().await;
		let mut next = snapshot.clone();
		next.insert(did.to_owned(), entry.clone());
		// If this future is dropped mid-write the mirror stays as it was.
		self.write(&next).await?;
		*snapshot = next;
		Ok(())
	}
}
