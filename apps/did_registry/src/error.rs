use axum::{
	extract::rejection::{JsonRejection, QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use did_keys::SignatureError;
use serde::Serialize;
use tracing::{error, warn};

use crate::{jwk::JwkError, storage::StorageError};

/// Every way a request against the registry can be rejected.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
	/// Missing or malformed request fields.
	#[error("{0}")]
	Validation(String),
	/// Malformed multibase, multicodec or base64 encoding.
	#[error("{0}")]
	Format(String),
	/// Unknown DID, or a DID without usable key material.
	#[error("{0}")]
	NotFound(String),
	/// The signature did not verify. `details` is diagnostic only, it never
	/// changes how the rejection is reported.
	#[error("invalid signature: {details}")]
	Signature { details: String },
	#[error("DID already registered: {0}")]
	Conflict(String),
	#[error(transparent)]
	Storage(#[from] StorageError),
	#[error(transparent)]
	Internal(#[from] color_eyre::eyre::Report),
}

impl RegistryError {
	pub fn not_found(did: &str) -> Self {
		Self::NotFound(format!("DID not found: {did}"))
	}
}

impl From<SignatureError> for RegistryError {
	fn from(value: SignatureError) -> Self {
		Self::Signature {
			details: value.cause().to_string(),
		}
	}
}

impl From<JwkError> for RegistryError {
	fn from(value: JwkError) -> Self {
		let msg = format!("invalid JWK: {value}");
		match value {
			JwkError::Derive(_) => Self::Format(msg),
			_ => Self::Validation(msg),
		}
	}
}

impl From<JsonRejection> for RegistryError {
	fn from(value: JsonRejection) -> Self {
		Self::Validation(value.body_text())
	}
}

impl From<QueryRejection> for RegistryError {
	fn from(value: QueryRejection) -> Self {
		Self::Validation(value.body_text())
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	details: Option<String>,
}

impl IntoResponse for RegistryError {
	fn into_response(self) -> Response {
		let (status, error, details) = match self {
			Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
			Self::Format(msg) => (StatusCode::BAD_REQUEST, msg, None),
			Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
			Self::Signature { details } => (
				StatusCode::FORBIDDEN,
				String::from("Invalid signature"),
				Some(details),
			),
			Self::Conflict(did) => (
				StatusCode::CONFLICT,
				format!("DID already registered: {did}"),
				None,
			),
			Self::Storage(err) => {
				error!("{err:?}");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					String::from("failed to persist the registry"),
					None,
				)
			}
			Self::Internal(err) => {
				error!("{err:?}");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					String::from("internal error"),
					None,
				)
			}
		};
		if status.is_client_error() {
			warn!(%status, %error, ?details, "rejected request");
		}
		(status, Json(ErrorBody { error, details })).into_response()
	}
}
