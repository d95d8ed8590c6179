//! A Decentralized Identifier (aka [DID][did-core]), is a globally unique
//! identifier that provides a general purpose way of looking up public keys
//! associated with the globally unique identifier.
//!
//! This crate contains the byte level parts of issuing DIDs:
//!
//! - [`multibase`]: the `z<base58-btc>` encoding with a two byte multicodec
//!   tag in front of the raw key.
//! - [`crypto`]: the key schemes a DID can be bound to, each able to derive an
//!   identifier and verify signatures.
//! - [`did_key`]: parsing a `did:key` back into the public key it embeds.
//!
//! Getting any of these bytes wrong does not fail loudly, it silently produces
//! identifiers that nobody else can resolve. The tests pin the encodings to
//! published test vectors.
//!
//! [did-core]: https://www.w3.org/TR/did-core/

#![forbid(unsafe_code)]

pub mod crypto;
pub mod did_key;
pub mod key_algos;
pub mod multibase;

pub use crate::{
	crypto::{KeyPair, KeyScheme, SignatureError},
	did_key::DidKey,
	key_algos::KeyAlgo,
	multibase::FormatError,
};
