//! The legacy scheme: RSA-2048 keys as PEM text, PKCS#1 v1.5 signatures over
//! a SHA-256 digest.

use base64::{prelude::BASE64_STANDARD, Engine as _};
use rsa::{
	pkcs1v15,
	pkcs8::DecodePublicKey as _,
	signature::Verifier as _,
	RsaPublicKey,
};
use sha2::Sha256;

use crate::crypto::{SignatureError, SignatureFailure};

pub const BITS: usize = 2048;
pub const PUBLIC_EXPONENT: u64 = 65537;

/// Generates a fresh key pair. The private key is serialized as PKCS#1
/// ("RSA PRIVATE KEY") and the public key as SubjectPublicKeyInfo
/// ("PUBLIC KEY").
#[cfg(feature = "random")]
pub fn generate() -> Result<super::KeyPair, GenerateError> {
	use rsa::{
		pkcs1::EncodeRsaPrivateKey as _, pkcs8::EncodePublicKey as _,
		pkcs8::LineEnding, BigUint, RsaPrivateKey,
	};

	let private_key = RsaPrivateKey::new_with_exp(
		&mut rand_core::OsRng,
		BITS,
		&BigUint::from(PUBLIC_EXPONENT),
	)?;
	let private_pem = private_key.to_pkcs1_pem(LineEnding::LF)?;
	let public_pem = private_key
		.to_public_key()
		.to_public_key_pem(LineEnding::LF)?;
	Ok(super::KeyPair {
		public_key: public_pem,
		private_key: private_pem.as_str().to_owned(),
	})
}

/// Signs `message` with a PEM private key (PKCS#1 or PKCS#8) and returns the
/// signature as standard base64.
pub fn sign(private_key_pem: &str, message: &[u8]) -> Result<String, SignError> {
	use rsa::{
		pkcs1::DecodeRsaPrivateKey as _, pkcs8::DecodePrivateKey as _,
		signature::{SignatureEncoding as _, Signer as _},
		RsaPrivateKey,
	};

	let private_key = match RsaPrivateKey::from_pkcs1_pem(private_key_pem) {
		Ok(key) => key,
		Err(pkcs1_err) => RsaPrivateKey::from_pkcs8_pem(private_key_pem)
			.map_err(|_| SignError::InvalidKey(pkcs1_err))?,
	};
	let signing_key = pkcs1v15::SigningKey::<Sha256>::new(private_key);
	let signature = signing_key.try_sign(message)?;
	Ok(BASE64_STANDARD.encode(signature.to_bytes()))
}

/// Verifies a standard base64 `signature` over `message` against a
/// SubjectPublicKeyInfo PEM public key.
pub fn verify(
	public_key_pem: &str,
	signature_b64: &str,
	message: &[u8],
) -> Result<(), SignatureError> {
	let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
		.map_err(SignatureFailure::RsaKey)?;
	let signature = BASE64_STANDARD
		.decode(signature_b64)
		.map_err(SignatureFailure::Base64)?;
	let signature = pkcs1v15::Signature::try_from(signature.as_slice())
		.map_err(SignatureFailure::Rsa)?;
	pkcs1v15::VerifyingKey::<Sha256>::new(public_key)
		.verify(message, &signature)
		.map_err(SignatureFailure::Rsa)?;
	Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
	#[error("failed to generate rsa key: {0}")]
	Rsa(#[from] rsa::Error),
	#[error("failed to serialize private key: {0}")]
	Pkcs1(#[from] rsa::pkcs1::Error),
	#[error("failed to serialize public key: {0}")]
	Spki(#[from] rsa::pkcs8::spki::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum SignError {
	#[error("private key is neither PKCS#1 nor PKCS#8 PEM: {0}")]
	InvalidKey(rsa::pkcs1::Error),
	#[error("failed to sign: {0}")]
	Sign(#[from] rsa::signature::Error),
}
