//! Decides whether a mutation of a DID document may go through.
//!
//! A request moves through [`Stage`]s in order and is rejected at the first one
//! that fails. Only the owner of the registered authentication key can get past
//! [`Stage::SignatureChecked`], and nothing is written before that.

use std::fmt::Display;

use did_keys::KeyScheme;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
	document::{self, AUTH_KEY_FRAGMENT},
	error::RegistryError,
	registry::Registry,
	storage::{Document, RegistryEntry},
};

/// Body of an update. Every field is optional so that missing fields are
/// reported by the gate rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
	pub did: Option<String>,
	/// Standard base64 signature over the UTF-8 bytes of `did`.
	pub signature: Option<String>,
	#[serde(default)]
	pub updates: Document,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Stage {
	Received,
	KeyResolved,
	SignatureChecked,
	Applied,
}

impl Display for Stage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Self::Received => "received",
			Self::KeyResolved => "key resolved",
			Self::SignatureChecked => "signature checked",
			Self::Applied => "applied",
		};
		f.write_str(s)
	}
}

/// The key a DID's owner authenticates with.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AuthKey {
	pub scheme: KeyScheme,
	/// PEM for [`KeyScheme::Rsa2048`], multibase otherwise.
	pub public_key: String,
}

impl AuthKey {
	/// Looks up the authentication key of `did`.
	///
	/// The PEM tracked beside the document wins, since updates cannot touch it.
	/// After that come the `#auth-key` verification method and the flat
	/// `publicKey` of a legacy document.
	pub fn resolve(did: &str, entry: &RegistryEntry) -> Result<Self, RegistryError> {
		if let Some(pem) = &entry.public_key {
			return Ok(Self {
				scheme: KeyScheme::Rsa2048,
				public_key: pem.clone(),
			});
		}
		let auth_id = document::fragment_id(did, AUTH_KEY_FRAGMENT);
		if let Some(vm) = document::find_verification_method(&entry.did_document, &auth_id)
		{
			let scheme = KeyScheme::from_verification_method_type(&vm.type_)
				.ok_or_else(|| RegistryError::Signature {
					details: format!("unsupported verification method type {:?}", vm.type_),
				})?;
			return Ok(Self {
				scheme,
				public_key: vm.public_key_multibase,
			});
		}
		if let Some(pem) = document::legacy_public_key(&entry.did_document) {
			return Ok(Self {
				scheme: KeyScheme::Rsa2048,
				public_key: pem.to_owned(),
			});
		}
		Err(RegistryError::NotFound(String::from(
			"no authentication key registered",
		)))
	}

	/// Checks `signature` over the UTF-8 bytes of `did`.
	pub fn verify_did(&self, did: &str, signature: &str) -> Result<(), RegistryError> {
		self.scheme
			.verify(&self.public_key, signature, did.as_bytes())
			.map_err(RegistryError::from)
	}
}

fn required(field: Option<String>, name: &str) -> Result<String, RegistryError> {
	field
		.filter(|value| !value.is_empty())
		.ok_or_else(|| RegistryError::Validation(format!("missing field `{name}`")))
}

fn rejected(stage: Stage, did: &str, err: RegistryError) -> RegistryError {
	warn!(%stage, did, error = %err, "rejected update");
	err
}

/// Runs an update through every stage and returns the document as stored
/// afterwards. On rejection the stored document is left untouched.
pub async fn authorize_update(
	registry: &Registry,
	request: UpdateRequest,
) -> Result<Document, RegistryError> {
	let UpdateRequest {
		did,
		signature,
		updates,
	} = request;
	let did = required(did, "did").map_err(|e| rejected(Stage::Received, "", e))?;
	let signature =
		required(signature, "signature").map_err(|e| rejected(Stage::Received, &did, e))?;

	let document = registry
		.modify(&did, |entry| {
			let key = AuthKey::resolve(&did, entry)
				.map_err(|e| rejected(Stage::KeyResolved, &did, e))?;
			debug!(did, scheme = %key.scheme, "resolved authentication key");

			key.verify_did(&did, &signature)
				.map_err(|e| rejected(Stage::SignatureChecked, &did, e))?;

			let mut document = entry.did_document.clone();
			document.extend(updates);
			Ok(document)
		})
		.await?;

	let dangling = document::dangling_references(&document);
	if !dangling.is_empty() {
		warn!(did, ?dangling, "updated document references unknown verification methods");
	}
	debug!(did, stage = %Stage::Applied, "updated DID document");
	Ok(document)
}

/// Whether `signature` is a valid signature of `did` by its registered
/// authentication key. Unknown DIDs and DIDs without a key are errors. A bad
/// signature, or a key of a type that cannot sign, is not.
pub fn verify_signed_did(
	registry: &Registry,
	did: Option<String>,
	signature: Option<String>,
) -> Result<bool, RegistryError> {
	let did = required(did, "did")?;
	let signature = required(signature, "signature")?;
	let entry = registry.get(&did)?;
	match AuthKey::resolve(&did, &entry).and_then(|key| key.verify_did(&did, &signature)) {
		Ok(()) => Ok(true),
		Err(RegistryError::Signature { details }) => {
			debug!(did, details, "signature did not verify");
			Ok(false)
		}
		Err(err) => Err(err),
	}
}

#[cfg(test)]
mod test {
	use base64::{prelude::BASE64_STANDARD, Engine as _};
	use did_keys::crypto::{ed25519, rsa2048};
	use serde_json::json;

	use super::*;
	use crate::{
		document::{KeyDocument, LegacyDocument},
		storage::MemoryStorage,
	};

	fn as_document(value: serde_json::Value) -> Document {
		let serde_json::Value::Object(document) = value else {
			panic!("not an object")
		};
		document
	}

	async fn registry_with_ed25519() -> (Registry, ed25519::SigningKey, String) {
		let registry = Registry::load(Box::new(MemoryStorage::new())).await.unwrap();
		let signing = ed25519::SigningKey::generate();
		let mb_auth = signing.verifying_key().to_multibase();
		let doc = KeyDocument::build(&mb_auth, "zEnc", "https://e.x");
		let did = doc.id.clone();
		registry
			.create(&did, doc.into_document().unwrap(), None)
			.await
			.unwrap();
		(registry, signing, did)
	}

	fn request(did: &str, signature: &str, updates: serde_json::Value) -> UpdateRequest {
		UpdateRequest {
			did: Some(did.to_owned()),
			signature: Some(signature.to_owned()),
			updates: as_document(updates),
		}
	}

	#[tokio::test]
	async fn test_ed25519_update_merges_shallowly() {
		let (registry, signing, did) = registry_with_ed25519().await;
		let before = registry.get(&did).unwrap().did_document;
		let signature = signing.sign(did.as_bytes());

		let after = authorize_update(
			&registry,
			request(&did, &signature, json!({ "name": "alice", "service": [] })),
		)
		.await
		.unwrap();

		assert_eq!(after["name"], "alice");
		assert_eq!(after["service"], json!([]));
		assert_eq!(after["verificationMethod"], before["verificationMethod"]);
		assert_eq!(after.len(), before.len() + 1);
		assert_eq!(registry.get(&did).unwrap().did_document, after);
	}

	#[tokio::test]
	async fn test_bad_signature_changes_nothing() {
		let (registry, _signing, did) = registry_with_ed25519().await;
		let before = registry.get(&did).unwrap();
		let other = ed25519::SigningKey::generate().sign(did.as_bytes());

		let result =
			authorize_update(&registry, request(&did, &other, json!({ "name": "eve" })))
				.await;
		assert!(matches!(result, Err(RegistryError::Signature { .. })));

		let garbage =
			authorize_update(&registry, request(&did, "%%%", json!({ "name": "eve" })))
				.await;
		assert!(matches!(garbage, Err(RegistryError::Signature { .. })));
		assert_eq!(registry.get(&did).unwrap(), before);
	}

	#[tokio::test]
	async fn test_signature_must_cover_the_did() {
		let (registry, signing, did) = registry_with_ed25519().await;
		let signature = signing.sign(b"something else");
		let result =
			authorize_update(&registry, request(&did, &signature, json!({}))).await;
		assert!(matches!(result, Err(RegistryError::Signature { .. })));
	}

	#[tokio::test]
	async fn test_missing_fields() {
		let (registry, signing, did) = registry_with_ed25519().await;
		let signature = signing.sign(did.as_bytes());
		let no_did = UpdateRequest {
			signature: Some(signature),
			..Default::default()
		};
		assert!(matches!(
			authorize_update(&registry, no_did).await,
			Err(RegistryError::Validation(_))
		));
		let empty_signature = request(&did, "", json!({}));
		assert!(matches!(
			authorize_update(&registry, empty_signature).await,
			Err(RegistryError::Validation(_))
		));
	}

	#[tokio::test]
	async fn test_unknown_did() {
		let (registry, signing, _did) = registry_with_ed25519().await;
		let did = "did:key:zUnknown";
		let signature = signing.sign(did.as_bytes());
		assert!(matches!(
			authorize_update(&registry, request(did, &signature, json!({ "a": 1 }))).await,
			Err(RegistryError::NotFound(_))
		));
		assert!(!registry.contains(did));
		assert!(matches!(
			verify_signed_did(&registry, Some(did.into()), Some(signature)),
			Err(RegistryError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_no_authentication_key() {
		let registry = Registry::load(Box::new(MemoryStorage::new())).await.unwrap();
		registry
			.create("did:key:bare", as_document(json!({ "id": "did:key:bare" })), None)
			.await
			.unwrap();
		let result =
			authorize_update(&registry, request("did:key:bare", "AAAA", json!({}))).await;
		let Err(RegistryError::NotFound(msg)) = result else {
			panic!("expected NotFound")
		};
		assert_eq!(msg, "no authentication key registered");
	}

	#[tokio::test]
	async fn test_unsupported_auth_key_type() {
		let (registry, signing, did) = registry_with_ed25519().await;
		let signature = signing.sign(did.as_bytes());
		// the owner can repoint their auth key at something that cannot sign
		let mut vms = registry.get(&did).unwrap().did_document["verificationMethod"].clone();
		vms[0]["type"] = json!("X25519KeyAgreementKey2020");
		authorize_update(
			&registry,
			request(&did, &signature, json!({ "verificationMethod": vms })),
		)
		.await
		.unwrap();
		assert!(matches!(
			authorize_update(&registry, request(&did, &signature, json!({}))).await,
			Err(RegistryError::Signature { .. })
		));

		let registry = Registry::load(Box::new(MemoryStorage::new())).await.unwrap();
		let mut document = KeyDocument::build("zA", "zB", "https://e.x")
			.into_document()
			.unwrap();
		document["verificationMethod"][0]["type"] = json!("MadeUpKey2099");
		registry.create("did:key:zA", document, None).await.unwrap();
		let entry = registry.get("did:key:zA").unwrap();
		assert!(matches!(
			AuthKey::resolve("did:key:zA", &entry),
			Err(RegistryError::Signature { .. })
		));
	}

	#[tokio::test]
	async fn test_verify_with_unusable_key_type_is_unverified() {
		let (registry, signing, did) = registry_with_ed25519().await;
		let signature = signing.sign(did.as_bytes());
		let mut vms = registry.get(&did).unwrap().did_document["verificationMethod"].clone();
		vms[0]["type"] = json!("MadeUpKey2099");
		authorize_update(
			&registry,
			request(&did, &signature, json!({ "verificationMethod": vms })),
		)
		.await
		.unwrap();

		let verified =
			verify_signed_did(&registry, Some(did.clone()), Some(signature.clone()));
		assert!(!verified.unwrap());

		vms[0]["type"] = json!("X25519KeyAgreementKey2020");
		let registry = Registry::load(Box::new(MemoryStorage::new())).await.unwrap();
		let document = as_document(json!({ "id": did, "verificationMethod": vms }));
		registry.create(&did, document, None).await.unwrap();
		assert!(!verify_signed_did(&registry, Some(did), Some(signature)).unwrap());
	}

	#[tokio::test]
	async fn test_legacy_key_cannot_be_swapped_by_update() {
		let owner = rsa2048::generate().unwrap();
		let attacker = rsa2048::generate().unwrap();
		let did = "did:key:00000000-0000-4000-8000-000000000000";
		let registry = Registry::load(Box::new(MemoryStorage::new())).await.unwrap();
		let document = LegacyDocument::build(did, "ACME", "printer", "test", &owner.public_key)
			.into_document()
			.unwrap();
		registry
			.create(did, document, Some(owner.public_key.clone()))
			.await
			.unwrap();

		let signature = rsa2048::sign(&owner.private_key, did.as_bytes()).unwrap();
		let updated = authorize_update(
			&registry,
			request(did, &signature, json!({ "publicKey": attacker.public_key })),
		)
		.await
		.unwrap();
		assert_eq!(updated["publicKey"], json!(attacker.public_key));

		// the tracked key still decides
		let forged = rsa2048::sign(&attacker.private_key, did.as_bytes()).unwrap();
		assert!(!verify_signed_did(&registry, Some(did.into()), Some(forged)).unwrap());
		assert!(verify_signed_did(&registry, Some(did.into()), Some(signature)).unwrap());
	}

	#[tokio::test]
	async fn test_verify_signed_did() {
		let (registry, signing, did) = registry_with_ed25519().await;
		let good = signing.sign(did.as_bytes());
		assert!(verify_signed_did(&registry, Some(did.clone()), Some(good)).unwrap());
		let bad = BASE64_STANDARD.encode([0; 64]);
		assert!(!verify_signed_did(&registry, Some(did.clone()), Some(bad)).unwrap());
		assert!(matches!(
			verify_signed_did(&registry, Some(did), None),
			Err(RegistryError::Validation(_))
		));
	}
}
