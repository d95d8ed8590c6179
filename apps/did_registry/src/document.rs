//! Builds DID documents.
//!
//! Two document shapes exist side by side. Legacy identities carry a flat
//! `publicKey` PEM, key-derived identities carry W3C verification methods and
//! their DID is derived from the authentication key itself.

use color_eyre::eyre::WrapErr as _;
use did_keys::{DidKey, KeyAlgo};
use serde::{Deserialize, Serialize};

use crate::storage::Document;

pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
pub const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const X25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/x25519-2020/v1";

pub const AUTH_KEY_FRAGMENT: &str = "auth-key";
pub const ENC_KEY_FRAGMENT: &str = "enc-key";
pub const DIDCOMM_FRAGMENT: &str = "didcomm";
pub const DIDCOMM_SERVICE_TYPE: &str = "DIDCommMessaging";

/// `<did>#<fragment>`
pub fn fragment_id(did: &str, fragment: &str) -> String {
	format!("{did}#{fragment}")
}

/// The DID of a key-derived identity. The identity *is* its authentication
/// key.
pub fn key_derived_did(mb_auth: &str) -> String {
	format!("{}{mb_auth}", DidKey::PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
	pub id: String,
	#[serde(rename = "type")]
	pub type_: String,
	pub controller: String,
	pub public_key_multibase: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
	pub id: String,
	#[serde(rename = "type")]
	pub type_: String,
	pub service_endpoint: String,
}

/// Document of a key-derived (Ed25519 + X25519) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDocument {
	#[serde(rename = "@context")]
	pub context: Vec<String>,
	pub id: String,
	pub verification_method: Vec<VerificationMethod>,
	pub authentication: Vec<String>,
	pub key_agreement: Vec<String>,
	pub service: Vec<Service>,
}

impl KeyDocument {
	pub fn build(mb_auth: &str, mb_enc: &str, service_endpoint: &str) -> Self {
		let did = key_derived_did(mb_auth);
		let auth_id = fragment_id(&did, AUTH_KEY_FRAGMENT);
		let enc_id = fragment_id(&did, ENC_KEY_FRAGMENT);
		Self {
			context: vec![
				DID_CONTEXT.to_owned(),
				ED25519_2020_CONTEXT.to_owned(),
				X25519_2020_CONTEXT.to_owned(),
			],
			verification_method: vec![
				VerificationMethod {
					id: auth_id.clone(),
					type_: KeyAlgo::Ed25519.verification_method_type().to_owned(),
					controller: did.clone(),
					public_key_multibase: mb_auth.to_owned(),
				},
				VerificationMethod {
					id: enc_id.clone(),
					type_: KeyAlgo::X25519.verification_method_type().to_owned(),
					controller: did.clone(),
					public_key_multibase: mb_enc.to_owned(),
				},
			],
			authentication: vec![auth_id],
			key_agreement: vec![enc_id],
			service: vec![Service {
				id: fragment_id(&did, DIDCOMM_FRAGMENT),
				type_: DIDCOMM_SERVICE_TYPE.to_owned(),
				service_endpoint: service_endpoint.to_owned(),
			}],
			id: did,
		}
	}

	pub fn into_document(self) -> color_eyre::Result<Document> {
		to_document(&self)
	}
}

/// Document of a legacy (RSA) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDocument {
	pub id: String,
	pub controller: String,
	pub name: String,
	pub purpose: String,
	/// SubjectPublicKeyInfo PEM, doubles as the authentication key.
	pub public_key: String,
}

impl LegacyDocument {
	pub fn build(
		did: &str,
		controller: &str,
		name: &str,
		purpose: &str,
		public_key_pem: &str,
	) -> Self {
		Self {
			id: did.to_owned(),
			controller: controller.to_owned(),
			name: name.to_owned(),
			purpose: purpose.to_owned(),
			public_key: public_key_pem.to_owned(),
		}
	}

	pub fn into_document(self) -> color_eyre::Result<Document> {
		to_document(&self)
	}
}

fn to_document(doc: &impl Serialize) -> color_eyre::Result<Document> {
	serde_json::to_value(doc)
		.and_then(serde_json::from_value)
		.wrap_err("failed to serialize DID document")
}

/// The verification method with the given id, if the document has one that
/// parses.
pub fn find_verification_method(
	document: &Document,
	id: &str,
) -> Option<VerificationMethod> {
	document
		.get("verificationMethod")?
		.as_array()?
		.iter()
		.filter(|vm| vm.get("id").and_then(|v| v.as_str()) == Some(id))
		.find_map(|vm| serde_json::from_value(vm.clone()).ok())
}

/// The flat `publicKey` of a legacy document.
pub fn legacy_public_key(document: &Document) -> Option<&str> {
	document.get("publicKey")?.as_str()
}

/// Ids referenced from `authentication` or `keyAgreement` that have no
/// matching entry in `verificationMethod`.
pub fn dangling_references(document: &Document) -> Vec<String> {
	let known: Vec<&str> = document
		.get("verificationMethod")
		.and_then(|v| v.as_array())
		.into_iter()
		.flatten()
		.filter_map(|vm| vm.get("id")?.as_str())
		.collect();
	["authentication", "keyAgreement"]
		.into_iter()
		.filter_map(|section| document.get(section)?.as_array())
		.flatten()
		.filter_map(|reference| reference.as_str())
		.filter(|reference| !known.contains(reference))
		.map(str::to_owned)
		.collect()
}

#[cfg(test)]
mod test {
	use std::str::FromStr as _;

	use super::*;
	use did_keys::{crypto::ed25519, multibase};

	#[test]
	fn test_zero_keys_document() -> color_eyre::Result<()> {
		let mb_auth = multibase::encode([0xed, 0x01], &[0; 32]);
		let mb_enc = multibase::encode([0xec, 0x01], &[0; 32]);
		let doc = KeyDocument::build(&mb_auth, &mb_enc, "https://example.com/didcomm");
		let did = format!("did:key:{mb_auth}");

		assert_eq!(doc.id, did);
		assert_eq!(doc.authentication, vec![format!("{did}#auth-key")]);
		assert_eq!(doc.key_agreement, vec![format!("{did}#enc-key")]);
		assert_eq!(doc.service.len(), 1);
		assert_eq!(doc.service[0].type_, "DIDCommMessaging");

		let document = doc.into_document()?;
		assert!(dangling_references(&document).is_empty());
		let auth = find_verification_method(&document, &format!("{did}#auth-key"))
			.expect("auth key present");
		assert_eq!(auth.type_, "Ed25519VerificationKey2020");
		assert_eq!(auth.controller, did);
		assert_eq!(auth.public_key_multibase, mb_auth);
		let enc = find_verification_method(&document, &format!("{did}#enc-key"))
			.expect("enc key present");
		assert_eq!(enc.type_, "X25519KeyAgreementKey2020");
		assert_eq!(enc.public_key_multibase, mb_enc);
		Ok(())
	}

	#[test]
	fn test_json_shape() -> color_eyre::Result<()> {
		let document = KeyDocument::build("zA", "zB", "https://e.x").into_document()?;
		assert_eq!(
			serde_json::Value::Object(document),
			serde_json::json!({
				"@context": [
					"https://www.w3.org/ns/did/v1",
					"https://w3id.org/security/suites/ed25519-2020/v1",
					"https://w3id.org/security/suites/x25519-2020/v1",
				],
				"id": "did:key:zA",
				"verificationMethod": [
					{
						"id": "did:key:zA#auth-key",
						"type": "Ed25519VerificationKey2020",
						"controller": "did:key:zA",
						"publicKeyMultibase": "zA",
					},
					{
						"id": "did:key:zA#enc-key",
						"type": "X25519KeyAgreementKey2020",
						"controller": "did:key:zA",
						"publicKeyMultibase": "zB",
					},
				],
				"authentication": ["did:key:zA#auth-key"],
				"keyAgreement": ["did:key:zA#enc-key"],
				"service": [{
					"id": "did:key:zA#didcomm",
					"type": "DIDCommMessaging",
					"serviceEndpoint": "https://e.x",
				}],
			})
		);
		Ok(())
	}

	#[test]
	fn test_self_certifying() -> color_eyre::Result<()> {
		let signing = ed25519::SigningKey::generate();
		let mb_auth = signing.verifying_key().to_multibase();
		let doc = KeyDocument::build(&mb_auth, "zEnc", "https://e.x");

		// anybody can recover the key from the DID alone
		let parsed = DidKey::from_str(&doc.id)?;
		assert_eq!(parsed.key_algo(), KeyAlgo::Ed25519);
		assert_eq!(parsed.pub_key(), signing.verifying_key().as_bytes());
		assert_eq!(parsed.multibase(), doc.verification_method[0].public_key_multibase);
		Ok(())
	}

	#[test]
	fn test_legacy_document() -> color_eyre::Result<()> {
		let document = LegacyDocument::build(
			"did:key:1234",
			"ACME",
			"printer",
			"testing",
			"-----BEGIN PUBLIC KEY-----",
		)
		.into_document()?;
		assert_eq!(
			serde_json::Value::Object(document.clone()),
			serde_json::json!({
				"id": "did:key:1234",
				"controller": "ACME",
				"name": "printer",
				"purpose": "testing",
				"publicKey": "-----BEGIN PUBLIC KEY-----",
			})
		);
		assert_eq!(
			legacy_public_key(&document),
			Some("-----BEGIN PUBLIC KEY-----")
		);
		assert!(find_verification_method(&document, "did:key:1234#auth-key").is_none());
		Ok(())
	}

	#[test]
	fn test_dangling_references() {
		let serde_json::Value::Object(document) = serde_json::json!({
			"verificationMethod": [{ "id": "a" }],
			"authentication": ["a", "b"],
			"keyAgreement": ["c"],
		}) else {
			unreachable!()
		};
		assert_eq!(dangling_references(&document), vec!["b", "c"]);
	}
}
