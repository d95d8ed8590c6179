//! The `z` (base58-btc) flavor of [multibase], wrapping a two byte
//! [multicodec] tag followed by raw key bytes.
//!
//! [multibase]: https://github.com/multiformats/multibase
//! [multicodec]: https://github.com/multiformats/multicodec

/// The multibase marker for base58-btc.
pub const BASE58_BTC: u8 = b'z';

/// Length of the multicodec tags used by this crate.
pub const TAG_LEN: usize = 2;

/// A two byte multicodec tag, as it appears on the wire.
pub type Tag = [u8; TAG_LEN];

/// Prepends `tag` to `raw`, base58-btc encodes the result and prepends the
/// multibase marker `z`.
pub fn encode(tag: Tag, raw: &[u8]) -> String {
	let mut buf = Vec::with_capacity(TAG_LEN + raw.len());
	buf.extend_from_slice(&tag);
	buf.extend_from_slice(raw);
	let encoded = bs58::encode(buf)
		.with_alphabet(bs58::Alphabet::BITCOIN)
		.into_string();
	format!("{}{encoded}", BASE58_BTC as char)
}

/// Splits a multibase string back into its multicodec tag and the remaining
/// bytes.
///
/// The remaining bytes are returned as-is; checking them against the size
/// expected for the tag is up to the caller.
pub fn decode(s: &str) -> Result<(Tag, Vec<u8>), FormatError> {
	let Some(&base) = s.as_bytes().first() else {
		return Err(FormatError::Empty);
	};
	if base != BASE58_BTC {
		return Err(FormatError::WrongBase(base));
	}
	let mut decoded = bs58::decode(&s[1..])
		.with_alphabet(bs58::Alphabet::BITCOIN)
		.into_vec()?;
	if decoded.len() < TAG_LEN {
		return Err(FormatError::MissingTag(decoded.len()));
	}
	let raw = decoded.split_off(TAG_LEN);
	let tag = [decoded[0], decoded[1]];
	Ok((tag, raw))
}

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
	#[error("expected a multibase string but got an empty string")]
	Empty,
	#[error(
		"expected \"base58-btc\" encoding which should be identified in multibase as ascii 'z' (0x7a) but got {0:#x}"
	)]
	WrongBase(u8),
	#[error(transparent)]
	Bs58(#[from] bs58::decode::Error),
	#[error("decoded {0} bytes, which is too short to hold a multicodec tag")]
	MissingTag(usize),
	#[error("wrong key type: expected multicodec {expected:02x?} but got {got:02x?}")]
	WrongKeyType { expected: Tag, got: Tag },
	#[error("expected a key of {expected} bytes but got {got}")]
	WrongKeyLength { expected: usize, got: usize },
}

#[cfg(test)]
mod test {
	use super::*;

	use eyre::WrapErr;
	use hex_literal::hex;

	#[test]
	fn test_decode_known_base58() -> eyre::Result<()> {
		#[derive(Debug)]
		struct Example {
			decoded: &'static [u8],
			encoded: &'static str,
		}
		// from: https://datatracker.ietf.org/doc/html/draft-msporny-base58-03#section-5
		let examples = [
			Example {
				decoded: b"Hello World!",
				encoded: "2NEpo7TZRRrLZSi2U",
			},
			Example {
				decoded: b"The quick brown fox jumps over the lazy dog.",
				encoded: "USm3fpXnKG5EUBx2ndxBDMPVciP5hGey2Jh4NDv6gmeo1LkMeiKrLJUUBk6Z",
			},
			Example {
				decoded: &hex!("0000287fb4cd"),
				encoded: "11233QC4",
			},
		];

		for e @ Example { decoded, encoded } in examples {
			let (tag, raw) = decode(&format!("z{encoded}"))
				.wrap_err_with(|| format!("Failed to decode example {e:?}"))?;
			assert_eq!(tag, decoded[..2], "failed tag comparison in {e:?}");
			assert_eq!(raw, decoded[2..], "failed comparison in example {e:?}");
		}
		Ok(())
	}

	#[test]
	fn test_roundtrip_keeps_tag_and_bytes() -> eyre::Result<()> {
		let cases: [(Tag, &[u8]); 3] = [
			([0xed, 0x01], &[0u8; 32]),
			([0xec, 0x01], &hex!("de ad be ef")),
			([0x00, 0x00], &[]),
		];
		for (tag, raw) in cases {
			let encoded = encode(tag, raw);
			assert!(encoded.starts_with('z'));
			let (decoded_tag, decoded_raw) = decode(&encoded)?;
			assert_eq!(decoded_tag, tag);
			assert_eq!(decoded_raw, raw);
		}
		Ok(())
	}

	#[test]
	fn test_ed25519_prefix_renders_as_z6mk() {
		// every did:key ed25519 identifier starts with z6Mk
		let encoded = encode([0xed, 0x01], &[0x42; 32]);
		assert!(encoded.starts_with("z6Mk"), "got {encoded}");
	}

	#[test]
	fn test_rejects_malformed_input() {
		assert!(matches!(decode(""), Err(FormatError::Empty)));
		assert!(matches!(decode("f00ff"), Err(FormatError::WrongBase(b'f'))));
		// '0' is not part of the bitcoin alphabet
		assert!(matches!(decode("z0OIl"), Err(FormatError::Bs58(_))));
		// a single decoded byte cannot hold a tag
		assert!(matches!(decode("z2"), Err(FormatError::MissingTag(1))));
		assert!(matches!(decode("z"), Err(FormatError::MissingTag(0))));
	}
}
