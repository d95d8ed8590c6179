//! The JWKs clients use to hand us their public keys.

use std::collections::BTreeSet;

use did_keys::{crypto::ed25519, KeyAlgo, KeyScheme};
use jose_jwk::{Jwk, Key, Okp, OkpCurves, Operations, Parameters};
use serde_json::Value;

fn okp_curve(algo: KeyAlgo) -> OkpCurves {
	match algo {
		KeyAlgo::Ed25519 => OkpCurves::Ed25519,
		KeyAlgo::X25519 => OkpCurves::X25519,
	}
}

/// `x` should be unpadded base64url, but clients also send it padded.
fn strip_x_padding(mut jwk: Value) -> Value {
	if let Some(Value::String(x)) = jwk.get_mut("x") {
		let len = x.trim_end_matches('=').len();
		x.truncate(len);
	}
	jwk
}

/// Parses a public OKP JWK on the curve of `algo` and returns the raw key.
pub fn public_key(jwk: Value, algo: KeyAlgo) -> Result<Vec<u8>, JwkError> {
	let jwk: Jwk = serde_json::from_value(strip_x_padding(jwk))?;
	let Key::Okp(Okp { crv, x, d, .. }) = jwk.key else {
		return Err(JwkError::NotOkp);
	};
	if d.is_some() {
		return Err(JwkError::PrivateKey);
	}
	if crv != okp_curve(algo) {
		return Err(JwkError::WrongCurve {
			expected: algo,
			got: format!("{crv:?}"),
		});
	}
	if x.len() != algo.pub_key_len() {
		return Err(JwkError::WrongLength {
			expected: algo.pub_key_len(),
			got: x.len(),
		});
	}
	Ok(x.to_vec())
}

/// Multibase identifier of the key in `jwk`, tagged with the multicodec of
/// `algo`.
pub fn derive_identifier(jwk: Value, algo: KeyAlgo) -> Result<String, JwkError> {
	let raw = public_key(jwk, algo)?;
	KeyScheme::from(algo)
		.derive_identifier(&raw)
		.map_err(|err| JwkError::Derive(err.to_string()))
}

/// Creates a JWK from a ed25519 verifying key.
pub fn ed25519_pub_jwk(pub_key: &ed25519::PubKey) -> Jwk {
	Jwk {
		key: Okp {
			crv: OkpCurves::Ed25519,
			x: pub_key.as_bytes().as_slice().to_owned().into(),
			d: None,
		}
		.into(),
		prm: Parameters {
			ops: Some(BTreeSet::from([Operations::Verify])),
			..Default::default()
		},
	}
}

/// Creates a JWK from a raw x25519 public key.
pub fn x25519_pub_jwk(pub_key: &[u8; 32]) -> Jwk {
	Jwk {
		key: Okp {
			crv: OkpCurves::X25519,
			x: pub_key.as_slice().to_owned().into(),
			d: None,
		}
		.into(),
		prm: Parameters {
			ops: Some(BTreeSet::from([Operations::DeriveKey])),
			..Default::default()
		},
	}
}

#[derive(thiserror::Error, Debug)]
pub enum JwkError {
	#[error("not a valid JWK: {0}")]
	Invalid(#[from] serde_json::Error),
	#[error("expected kty \"OKP\"")]
	NotOkp,
	#[error("expected a public key but got private key material")]
	PrivateKey,
	#[error("expected crv {expected} but got {got}")]
	WrongCurve { expected: KeyAlgo, got: String },
	#[error("expected a {expected} byte public key but got {got} bytes")]
	WrongLength { expected: usize, got: usize },
	#[error("{0}")]
	Derive(String),
}
