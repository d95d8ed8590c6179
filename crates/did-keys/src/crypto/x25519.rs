//! X25519 is only ever used for key agreement, so there is nothing to verify
//! here. We just need its multibase identifier.

use crate::{
	key_algos::{StaticKeyAlgo as _, X25519},
	multibase::{self, FormatError},
};

pub const PUB_KEY_LEN: usize = X25519::PUB_KEY_LEN;

/// Multibase identifier of a raw x25519 public key.
pub fn derive_identifier(raw: &[u8]) -> Result<String, FormatError> {
	if raw.len() != PUB_KEY_LEN {
		return Err(FormatError::WrongKeyLength {
			expected: PUB_KEY_LEN,
			got: raw.len(),
		});
	}
	Ok(multibase::encode(X25519::MULTICODEC_TAG, raw))
}

/// Generates a fresh x25519 key pair, returned as `(secret, public)`.
#[cfg(feature = "random")]
pub fn generate() -> ([u8; 32], [u8; PUB_KEY_LEN]) {
	use curve25519_dalek::montgomery::MontgomeryPoint;
	use rand_core::RngCore as _;

	let mut secret = [0u8; 32];
	rand_core::OsRng.fill_bytes(&mut secret);
	let public = MontgomeryPoint::mul_base_clamped(secret);
	(secret, public.to_bytes())
}

#[cfg(test)]
mod test {
	use super::*;

	use hex_literal::hex;

	#[test]
	fn test_rfc7748_public_key() {
		// See https://datatracker.ietf.org/doc/html/rfc7748#section-6.1
		let alice_secret =
			hex!("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a");
		let alice_public =
			hex!("8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a");
		assert_eq!(
			curve25519_dalek::montgomery::MontgomeryPoint::mul_base_clamped(alice_secret)
				.to_bytes(),
			alice_public
		);
	}

	#[test]
	fn test_identifier_is_tagged() -> eyre::Result<()> {
		let (_secret, public) = generate();
		let mb = derive_identifier(&public)?;
		assert!(mb.starts_with("z6LS"), "got {mb}");
		let (tag, raw) = multibase::decode(&mb)?;
		assert_eq!(tag, [0xec, 0x01]);
		assert_eq!(raw, public);
		assert!(derive_identifier(&public[..16]).is_err());
		Ok(())
	}
}
