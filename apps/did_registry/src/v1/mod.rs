//! V1 of the API. This is subject to change until we commit to stability, after
//! which point any breaking changes will go in a V2 api.

use std::sync::Arc;

use axum::{
	extract::{
		rejection::{JsonRejection, QueryRejection},
		Query, State,
	},
	http::StatusCode,
	routing::{get, post},
	Json, Router,
};
use color_eyre::eyre::WrapErr as _;
use did_keys::{KeyAlgo, KeyScheme};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
	document::{KeyDocument, LegacyDocument},
	error::RegistryError,
	gate::{self, UpdateRequest},
	jwk,
	legacy_id::LegacyDidProvider,
	registry::Registry,
	storage::Document,
};

#[derive(Debug, Clone)]
struct RouterState {
	registry: Arc<Registry>,
	legacy_ids: Arc<LegacyDidProvider>,
	service_endpoint: Arc<str>,
}

/// Configuration for the V1 api's router.
#[derive(Debug)]
pub struct RouterConfig {
	pub registry: Arc<Registry>,
	pub legacy_ids: LegacyDidProvider,
	/// Endpoint of the `DIDCommMessaging` service in key-derived documents.
	pub service_endpoint: String,
}

impl RouterConfig {
	pub fn build(self) -> Router {
		Router::new()
			.route("/CreateDID", post(create_did))
			.route("/DIDRegistryGet", get(registry_get))
			.route("/VerifyDID", get(verify_did))
			.route("/VerifySignedDID", post(verify_signed_did))
			.route("/UpdateDID", post(update_did))
			.with_state(RouterState {
				registry: self.registry,
				legacy_ids: Arc::new(self.legacy_ids),
				service_endpoint: self.service_endpoint.into(),
			})
	}
}

/// Either scheme. The presence of `jwk_auth` or `jwk_enc` selects the
/// key-derived one.
#[derive(Debug, Deserialize)]
struct CreateRequest {
	jwk_auth: Option<serde_json::Value>,
	jwk_enc: Option<serde_json::Value>,
	entity: Option<String>,
	name: Option<String>,
	purpose: Option<String>,
}

#[derive(Debug, Serialize)]
struct KeyDerivedCreated {
	#[serde(rename = "DID")]
	did: String,
	#[serde(rename = "DID_Document")]
	did_document: Document,
}

#[derive(derive_more::Debug, Serialize)]
struct LegacyCreated {
	#[serde(rename = "DID")]
	did: String,
	#[serde(rename = "DID_Document")]
	did_document: Document,
	#[serde(rename = "PublicKey")]
	public_key: String,
	/// Handed out once, never stored.
	#[serde(rename = "PrivateKey")]
	#[debug(skip)]
	private_key: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Created {
	KeyDerived(KeyDerivedCreated),
	Legacy(LegacyCreated),
}

#[tracing::instrument(skip_all)]
#[axum_macros::debug_handler]
async fn create_did(
	State(state): State<RouterState>,
	payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), RegistryError> {
	let Json(req) = payload?;
	let created = if req.jwk_auth.is_some() || req.jwk_enc.is_some() {
		Created::KeyDerived(create_key_derived(&state, req).await?)
	} else {
		Created::Legacy(create_legacy(&state, req).await?)
	};
	Ok((StatusCode::CREATED, Json(created)))
}

async fn create_key_derived(
	state: &RouterState,
	req: CreateRequest,
) -> Result<KeyDerivedCreated, RegistryError> {
	let (Some(jwk_auth), Some(jwk_enc)) = (req.jwk_auth, req.jwk_enc) else {
		return Err(RegistryError::Validation(String::from(
			"both jwk_auth and jwk_enc are required",
		)));
	};
	let mb_auth = jwk::derive_identifier(jwk_auth, KeyAlgo::Ed25519)?;
	let mb_enc = jwk::derive_identifier(jwk_enc, KeyAlgo::X25519)?;
	let doc = KeyDocument::build(&mb_auth, &mb_enc, &state.service_endpoint);
	let did = doc.id.clone();
	let did_document = doc.into_document()?;
	state
		.registry
		.create(&did, did_document.clone(), None)
		.await?;
	info!(did, "created key-derived DID");
	Ok(KeyDerivedCreated { did, did_document })
}

async fn create_legacy(
	state: &RouterState,
	req: CreateRequest,
) -> Result<LegacyCreated, RegistryError> {
	let (Some(entity), Some(name), Some(purpose)) = (req.entity, req.name, req.purpose)
	else {
		return Err(RegistryError::Validation(String::from(
			"Missing required fields",
		)));
	};
	let key_pair = tokio::task::spawn_blocking(|| KeyScheme::Rsa2048.generate())
		.await
		.wrap_err("key generation task panicked")?
		.wrap_err("failed to generate RSA key pair")?;
	let did = state.legacy_ids.next_did();
	let did_document =
		LegacyDocument::build(&did, &entity, &name, &purpose, &key_pair.public_key)
			.into_document()?;
	state
		.registry
		.create(&did, did_document.clone(), Some(key_pair.public_key.clone()))
		.await?;
	info!(did, "created legacy DID");
	Ok(LegacyCreated {
		did,
		did_document,
		public_key: key_pair.public_key,
		private_key: key_pair.private_key,
	})
}

#[derive(Debug, Deserialize)]
struct DidQuery {
	did: Option<String>,
}

impl DidQuery {
	fn did(query: Result<Query<Self>, QueryRejection>) -> Result<String, RegistryError> {
		let Query(query) = query?;
		// An absent DID is just one more DID that is not registered.
		Ok(query.did.unwrap_or_default())
	}
}

#[derive(Debug, Serialize)]
struct RegistryGetResponse {
	#[serde(rename = "DID_Document")]
	did_document: Document,
	#[serde(rename = "PublicKey", skip_serializing_if = "Option::is_none")]
	public_key: Option<String>,
}

#[tracing::instrument(skip_all)]
#[axum_macros::debug_handler]
async fn registry_get(
	State(state): State<RouterState>,
	query: Result<Query<DidQuery>, QueryRejection>,
) -> Result<Json<RegistryGetResponse>, RegistryError> {
	let did = DidQuery::did(query)?;
	let entry = state.registry.get(&did)?;
	Ok(Json(RegistryGetResponse {
		did_document: entry.did_document,
		public_key: entry.public_key,
	}))
}

#[derive(Debug, Serialize)]
struct VerifyDidResponse {
	verified: bool,
	#[serde(rename = "DID")]
	did: String,
}

#[tracing::instrument(skip_all)]
#[axum_macros::debug_handler]
async fn verify_did(
	State(state): State<RouterState>,
	query: Result<Query<DidQuery>, QueryRejection>,
) -> Result<Json<VerifyDidResponse>, RegistryError> {
	let did = DidQuery::did(query)?;
	if !state.registry.contains(&did) {
		return Err(RegistryError::not_found(&did));
	}
	Ok(Json(VerifyDidResponse {
		verified: true,
		did,
	}))
}

#[derive(Debug, Deserialize)]
struct SignedDid {
	did: Option<String>,
	signature: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifiedResponse {
	verified: bool,
}

#[tracing::instrument(skip_all)]
#[axum_macros::debug_handler]
async fn verify_signed_did(
	State(state): State<RouterState>,
	payload: Result<Json<SignedDid>, JsonRejection>,
) -> Result<Json<VerifiedResponse>, RegistryError> {
	let Json(req) = payload?;
	let verified = gate::verify_signed_did(&state.registry, req.did, req.signature)?;
	Ok(Json(VerifiedResponse { verified }))
}

#[derive(Debug, Serialize)]
struct UpdatedResponse {
	status: &'static str,
	#[serde(rename = "DIDDocument")]
	did_document: Document,
}

#[tracing::instrument(skip_all)]
#[axum_macros::debug_handler]
async fn update_did(
	State(state): State<RouterState>,
	payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<UpdatedResponse>, RegistryError> {
	let Json(req) = payload?;
	let did_document = gate::authorize_update(&state.registry, req).await?;
	Ok(Json(UpdatedResponse {
		status: "DID Document updated",
		did_document,
	}))
}
