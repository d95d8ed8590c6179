//! An implementation of the [did:key] method.
//!
//! A `did:key` is its own public key: the method specific id is the multibase
//! identifier of the key, so anybody can check that a document belongs to a
//! DID without asking a registry.
//!
//! [did:key]: https://w3c-ccg.github.io/did-method-key/

use std::{fmt::Display, str::FromStr};

use crate::{
	key_algos::KeyAlgo,
	multibase::{self, FormatError},
};

/// A parsed `did:key` whose identifier is a multibase encoded public key.
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub struct DidKey {
	/// The string representation of the DID.
	s: String,
	algo: KeyAlgo,
	/// The decoded key, without its multicodec tag.
	pub_key: Vec<u8>,
}

impl DidKey {
	pub const PREFIX: &'static str = "did:key:";

	/// Builds the DID of a raw public key.
	pub fn from_pub_key(algo: KeyAlgo, pub_key: &[u8]) -> Result<Self, FormatError> {
		check_len(algo, pub_key)?;
		let mb = multibase::encode(algo.multicodec_tag(), pub_key);
		Ok(Self {
			s: format!("{}{mb}", Self::PREFIX),
			algo,
			pub_key: pub_key.to_owned(),
		})
	}

	/// Gets the did:key uri as a str.
	pub fn as_str(&self) -> &str {
		&self.s
	}

	/// The method specific id, which is the multibase encoded public key.
	pub fn multibase(&self) -> &str {
		&self.s[Self::PREFIX.len()..]
	}

	pub fn key_algo(&self) -> KeyAlgo {
		self.algo
	}

	pub fn pub_key(&self) -> &[u8] {
		&self.pub_key
	}

	pub fn into_inner(self) -> String {
		self.s
	}
}

fn check_len(algo: KeyAlgo, pub_key: &[u8]) -> Result<(), FormatError> {
	if pub_key.len() != algo.pub_key_len() {
		return Err(FormatError::WrongKeyLength {
			expected: algo.pub_key_len(),
			got: pub_key.len(),
		});
	}
	Ok(())
}

impl FromStr for DidKey {
	type Err = FromStrError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mb = s
			.strip_prefix(Self::PREFIX)
			.ok_or(FromStrError::WrongPrefix)?;
		let (tag, pub_key) = multibase::decode(mb)?;
		let algo = KeyAlgo::from_multicodec_tag(tag)
			.ok_or(FromStrError::UnknownMulticodec(tag))?;
		check_len(algo, &pub_key)?;
		Ok(Self {
			s: s.to_owned(),
			algo,
			pub_key,
		})
	}
}

#[derive(thiserror::Error, Debug)]
pub enum FromStrError {
	#[error("expected the did:key: prefix")]
	WrongPrefix,
	#[error("unsupported multicodec {0:02x?}")]
	UnknownMulticodec(multibase::Tag),
	#[error(transparent)]
	Multibase(#[from] FormatError),
}

impl Display for DidKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}
