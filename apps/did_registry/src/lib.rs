//! A registry of `did:key` identities.
//!
//! Two kinds of identity live here. Legacy ones get a random DID and a server
//! generated RSA key pair. Key-derived ones bring their own Ed25519 and X25519
//! keys and their DID is the multibase of the Ed25519 key. Either way, changes
//! to a document must be signed by its authentication key, see [`gate`].

pub mod document;
pub mod error;
pub mod gate;
pub mod jwk;
pub mod legacy_id;
pub mod registry;
pub mod storage;
pub mod v1;

use axum::routing::get;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Main router of API
#[derive(Debug)]
pub struct RouterConfig {
	pub v1: crate::v1::RouterConfig,
}

impl RouterConfig {
	pub fn build(self) -> axum::Router<()> {
		axum::Router::new()
			.route("/", get(root))
			.nest("/api/v1", self.v1.build())
			.layer(TraceLayer::new_for_http())
			.layer(CorsLayer::permissive())
	}
}

async fn root() -> &'static str {
	"did registry is up, the api lives under /api/v1"
}
