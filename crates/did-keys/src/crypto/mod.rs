//! Implementations of cryptographic operations.
//!
//! Every DID is bound to exactly one [`KeyScheme`]. The scheme is picked from
//! the `type` recorded on a verification method (or from the legacy flow that
//! created the DID), never by guessing from the shape of the key material.

use std::fmt::Display;

// Re-exports
#[cfg(feature = "random")]
pub use rand_core;

pub mod ed25519;
pub mod rsa2048;
pub mod x25519;

use crate::{key_algos::KeyAlgo, multibase::FormatError};

/// Verification method `type` for keys of the legacy scheme.
pub const RSA_VERIFICATION_METHOD_TYPE: &str = "RsaVerificationKey2018";

/// The closed set of supported key schemes.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum KeyScheme {
	/// RSA-2048, PKCS#1 v1.5 over SHA-256. Keys are PEM text.
	Rsa2048,
	/// Ed25519 authentication keys, identified by multibase.
	Ed25519,
	/// X25519 key agreement keys, identified by multibase. Cannot sign.
	X25519,
}

impl KeyScheme {
	pub fn from_verification_method_type(ty: &str) -> Option<Self> {
		if ty == RSA_VERIFICATION_METHOD_TYPE {
			return Some(Self::Rsa2048);
		}
		KeyAlgo::from_verification_method_type(ty).map(Self::from)
	}

	/// Generates a fresh key pair for this scheme.
	///
	/// For RSA both halves are PEM. For the curve schemes the public half is
	/// the multibase identifier and the private half is the unpadded base64url
	/// secret, same as the `d` member of a JWK.
	#[cfg(feature = "random")]
	pub fn generate(&self) -> Result<KeyPair, rsa2048::GenerateError> {
		use base64::{prelude::BASE64_URL_SAFE_NO_PAD, Engine as _};

		match self {
			Self::Rsa2048 => rsa2048::generate(),
			Self::Ed25519 => {
				let signing = ed25519::SigningKey::generate();
				Ok(KeyPair {
					public_key: signing.verifying_key().to_multibase(),
					private_key: BASE64_URL_SAFE_NO_PAD.encode(signing.to_bytes()),
				})
			}
			Self::X25519 => {
				let (secret, public) = x25519::generate();
				Ok(KeyPair {
					public_key: crate::multibase::encode(
						KeyAlgo::X25519.multicodec_tag(),
						&public,
					),
					private_key: BASE64_URL_SAFE_NO_PAD.encode(secret),
				})
			}
		}
	}

	/// Derives the multibase identifier of a raw public key.
	pub fn derive_identifier(&self, raw: &[u8]) -> Result<String, DeriveError> {
		match self {
			Self::Rsa2048 => Err(DeriveError::Unsupported(*self)),
			Self::Ed25519 => Ok(ed25519::derive_identifier(raw)?),
			Self::X25519 => Ok(x25519::derive_identifier(raw)?),
		}
	}

	/// Verifies a standard base64 `signature` over `message`. `public_key` is
	/// PEM for RSA and multibase otherwise.
	pub fn verify(
		&self,
		public_key: &str,
		signature_b64: &str,
		message: &[u8],
	) -> Result<(), SignatureError> {
		match self {
			Self::Rsa2048 => rsa2048::verify(public_key, signature_b64, message),
			Self::Ed25519 => ed25519::verify(public_key, signature_b64, message),
			Self::X25519 => Err(SignatureFailure::Unsupported(*self).into()),
		}
	}
}

impl From<KeyAlgo> for KeyScheme {
	fn from(value: KeyAlgo) -> Self {
		match value {
			KeyAlgo::Ed25519 => Self::Ed25519,
			KeyAlgo::X25519 => Self::X25519,
		}
	}
}

impl Display for KeyScheme {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Rsa2048 => f.write_str("RSA-2048"),
			Self::Ed25519 => f.write_str("Ed25519"),
			Self::X25519 => f.write_str("X25519"),
		}
	}
}

/// A freshly generated key pair. The private half is meant to be handed to
/// its owner exactly once.
#[derive(Clone)]
pub struct KeyPair {
	pub public_key: String,
	pub private_key: String,
}

impl std::fmt::Debug for KeyPair {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("KeyPair")
			.field("public_key", &self.public_key)
			.field("private_key", &"<redacted>")
			.finish()
	}
}

#[derive(thiserror::Error, Debug)]
pub enum DeriveError {
	#[error("{0} keys have no multibase identifier")]
	Unsupported(KeyScheme),
	#[error(transparent)]
	Format(#[from] FormatError),
}

/// A signature did not verify. Why it did not verify is available through
/// [`SignatureError::cause`], for diagnostics only.
#[derive(thiserror::Error, Debug)]
#[error("invalid signature")]
pub struct SignatureError(#[source] SignatureFailure);

impl SignatureError {
	pub fn cause(&self) -> &SignatureFailure {
		&self.0
	}
}

impl From<SignatureFailure> for SignatureError {
	fn from(value: SignatureFailure) -> Self {
		Self(value)
	}
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum SignatureFailure {
	#[error(transparent)]
	Format(#[from] FormatError),
	#[error("signature is not valid base64: {0}")]
	Base64(#[from] base64::DecodeError),
	#[error(transparent)]
	Ed25519Key(#[from] ed25519::TryFromBytesError),
	#[error("ed25519 verification failed: {0}")]
	Ed25519(ed25519_dalek::SignatureError),
	#[error("rsa public key is not a SubjectPublicKeyInfo PEM: {0}")]
	RsaKey(rsa::pkcs8::spki::Error),
	#[error("rsa verification failed: {0}")]
	Rsa(rsa::signature::Error),
	#[error("{0} keys cannot verify signatures")]
	Unsupported(KeyScheme),
}
