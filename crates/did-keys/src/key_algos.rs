use std::fmt::Display;

use crate::multibase::Tag;

/// Key algorithms that are identified inside a multibase string by their
/// multicodec tag.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum KeyAlgo {
	Ed25519,
	X25519,
}

impl KeyAlgo {
	pub fn pub_key_len(&self) -> usize {
		match self {
			Self::Ed25519 => Ed25519::PUB_KEY_LEN,
			Self::X25519 => X25519::PUB_KEY_LEN,
		}
	}

	/// The varint encoded multicodec value that prefixes the raw key bytes.
	pub fn multicodec_tag(&self) -> Tag {
		match self {
			Self::Ed25519 => Ed25519::MULTICODEC_TAG,
			Self::X25519 => X25519::MULTICODEC_TAG,
		}
	}

	pub fn from_multicodec_tag(tag: Tag) -> Option<Self> {
		[Self::Ed25519, Self::X25519]
			.into_iter()
			.find(|algo| algo.multicodec_tag() == tag)
	}

	/// The `type` of a DID document verification method holding this kind of
	/// key.
	pub fn verification_method_type(&self) -> &'static str {
		match self {
			Self::Ed25519 => Ed25519::VERIFICATION_METHOD_TYPE,
			Self::X25519 => X25519::VERIFICATION_METHOD_TYPE,
		}
	}

	pub fn from_verification_method_type(ty: &str) -> Option<Self> {
		[Self::Ed25519, Self::X25519]
			.into_iter()
			.find(|algo| algo.verification_method_type() == ty)
	}
}

impl Display for KeyAlgo {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Ed25519 => f.write_str("Ed25519"),
			Self::X25519 => f.write_str("X25519"),
		}
	}
}

// ---- internal code ----

/// A key algorithm that is known statically, at compile time.
pub(crate) trait StaticKeyAlgo {
	const PUB_KEY_LEN: usize;
	const MULTICODEC_TAG: Tag;
	const VERIFICATION_METHOD_TYPE: &'static str;
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) struct Ed25519;

impl StaticKeyAlgo for Ed25519 {
	const PUB_KEY_LEN: usize = 32;
	const MULTICODEC_TAG: Tag = [0xed, 0x01];
	const VERIFICATION_METHOD_TYPE: &'static str = "Ed25519VerificationKey2020";
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) struct X25519;

impl StaticKeyAlgo for X25519 {
	const PUB_KEY_LEN: usize = 32;
	const MULTICODEC_TAG: Tag = [0xec, 0x01];
	const VERIFICATION_METHOD_TYPE: &'static str = "X25519KeyAgreementKey2020";
}
