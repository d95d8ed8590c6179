use base64::{prelude::BASE64_STANDARD, Engine as _};
use ed25519_dalek::{Signature, VerifyingKey};

use crate::{
	crypto::{SignatureError, SignatureFailure},
	key_algos::{Ed25519, StaticKeyAlgo as _},
	multibase::{self, FormatError},
};

/// An ed25519 public key.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct PubKey(VerifyingKey);

impl PubKey {
	pub const LEN: usize = Self::key_len();

	/// Instantiates `PubKey` from some bytes. Performs all necessary validation
	/// that the key is valid and of sufficient strength.
	///
	/// Note that we will reject any keys that are too weak (aka low order).
	pub fn try_from(bytes: &[u8; Self::LEN]) -> Result<Self, TryFromBytesError> {
		let key = VerifyingKey::from_bytes(bytes)
			.map_err(|_| TryFromBytesError::NotOnCurve)?;
		if key.is_weak() {
			return Err(TryFromBytesError::WeakKey);
		}
		Ok(Self(key))
	}

	/// Decodes a `publicKeyMultibase` value. The multicodec tag must be the
	/// ed25519 one.
	pub fn from_multibase(s: &str) -> Result<Self, SignatureFailure> {
		let bytes = decode_multibase(s)?;
		Ok(Self::try_from(&bytes)?)
	}

	pub fn to_multibase(&self) -> String {
		multibase::encode(Ed25519::MULTICODEC_TAG, self.0.as_bytes())
	}

	pub fn as_bytes(&self) -> &[u8; Self::LEN] {
		self.0.as_bytes()
	}

	pub fn into_inner(self) -> VerifyingKey {
		self.0
	}

	/// Strict verification: rejects non-canonical signatures in addition to
	/// the checks done by plain ed25519.
	pub fn verify(
		&self,
		message: &[u8],
		signature: &Signature,
	) -> Result<(), ed25519_dalek::SignatureError> {
		self.0.verify_strict(message, signature)
	}

	// TODO: Turn this into inline const when that feature stabilizes
	const fn key_len() -> usize {
		let len = Ed25519::PUB_KEY_LEN;
		assert!(len == ed25519_dalek::PUBLIC_KEY_LENGTH);
		len
	}
}

/// An ed25519 private key. Never leaves the client in this system, it only
/// exists here so that clients and tests can produce signatures.
#[cfg(feature = "random")]
pub struct SigningKey(ed25519_dalek::SigningKey);

#[cfg(feature = "random")]
impl SigningKey {
	pub fn generate() -> Self {
		Self(ed25519_dalek::SigningKey::generate(&mut rand_core::OsRng))
	}

	pub fn from_bytes(bytes: &[u8; ed25519_dalek::SECRET_KEY_LENGTH]) -> Self {
		Self(ed25519_dalek::SigningKey::from_bytes(bytes))
	}

	pub fn to_bytes(&self) -> [u8; ed25519_dalek::SECRET_KEY_LENGTH] {
		self.0.to_bytes()
	}

	pub fn verifying_key(&self) -> PubKey {
		PubKey(self.0.verifying_key())
	}

	/// Signs `message` and returns the signature as standard base64.
	pub fn sign(&self, message: &[u8]) -> String {
		use ed25519_dalek::Signer as _;
		BASE64_STANDARD.encode(self.0.sign(message).to_bytes())
	}
}

#[cfg(feature = "random")]
impl std::fmt::Debug for SigningKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("SigningKey")
			.field(&self.verifying_key().to_multibase())
			.finish()
	}
}

/// Multibase identifier of a raw ed25519 public key.
pub fn derive_identifier(raw: &[u8]) -> Result<String, FormatError> {
	check_len(raw)?;
	Ok(multibase::encode(Ed25519::MULTICODEC_TAG, raw))
}

/// Verifies a standard base64 `signature` over `message` against a
/// multibase encoded ed25519 public key.
pub fn verify(
	public_key_multibase: &str,
	signature_b64: &str,
	message: &[u8],
) -> Result<(), SignatureError> {
	let key = PubKey::from_multibase(public_key_multibase)?;
	let signature = BASE64_STANDARD
		.decode(signature_b64)
		.map_err(SignatureFailure::Base64)?;
	let signature =
		Signature::from_slice(&signature).map_err(SignatureFailure::Ed25519)?;
	key.verify(message, &signature)
		.map_err(SignatureFailure::Ed25519)?;
	Ok(())
}

fn decode_multibase(s: &str) -> Result<[u8; PubKey::LEN], FormatError> {
	let (tag, raw) = multibase::decode(s)?;
	if tag != Ed25519::MULTICODEC_TAG {
		return Err(FormatError::WrongKeyType {
			expected: Ed25519::MULTICODEC_TAG,
			got: tag,
		});
	}
	check_len(&raw)?;
	let mut bytes = [0; PubKey::LEN];
	bytes.copy_from_slice(&raw);
	Ok(bytes)
}

fn check_len(raw: &[u8]) -> Result<(), FormatError> {
	if raw.len() != PubKey::LEN {
		return Err(FormatError::WrongKeyLength {
			expected: PubKey::LEN,
			got: raw.len(),
		});
	}
	Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum TryFromBytesError {
	#[error(
		"the provided bytes was not the y coordinate of a valid point on the curve"
	)]
	NotOnCurve,
	#[error("public key has a low order and is too weak, which would allow the key to generate signatures that work for almost any message. To prevent this, we reject weak keys.")]
	WeakKey,
}
