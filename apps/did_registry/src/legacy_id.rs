//! Surrogate DIDs for legacy identities.

use did_keys::DidKey;
use uuid::Uuid;

/// Hands out `did:key:<uuid v4>` identifiers.
pub struct LegacyDidProvider {
	next_uuid: Box<dyn Fn() -> Uuid + Send + Sync>,
}

impl LegacyDidProvider {
	pub fn random() -> Self {
		Self {
			next_uuid: Box::new(Uuid::new_v4),
		}
	}

	/// Cycles through `uuids`, so tests know their DIDs up front.
	#[cfg(test)]
	pub fn from_sequence(uuids: Vec<Uuid>) -> Self {
		use std::sync::atomic::{AtomicUsize, Ordering};

		assert!(!uuids.is_empty());
		let pos = AtomicUsize::new(0);
		Self {
			next_uuid: Box::new(move || {
				uuids[pos.fetch_add(1, Ordering::Relaxed) % uuids.len()]
			}),
		}
	}

	pub fn next_did(&self) -> String {
		format!("{}{}", DidKey::PREFIX, (self.next_uuid)())
	}
}

impl Default for LegacyDidProvider {
	fn default() -> Self {
		Self::random()
	}
}

impl std::fmt::Debug for LegacyDidProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LegacyDidProvider").finish_non_exhaustive()
	}
}
