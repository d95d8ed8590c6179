use std::{
	net::{Ipv6Addr, SocketAddr},
	path::PathBuf,
	sync::Arc,
};

use clap::Parser as _;
use color_eyre::eyre::Context as _;
use did_registry::{
	legacy_id::LegacyDidProvider,
	registry::Registry,
	storage::{JsonFileStorage, MemoryStorage, SqliteStorage, Storage},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum StorageKind {
	/// One JSON file holding the whole registry.
	Json,
	/// A sqlite database, one row per DID.
	Sqlite,
	/// Nothing is persisted.
	Memory,
}

#[derive(clap::Parser, Debug)]
struct Cli {
	#[clap(long, short, env, default_value = "0")]
	port: u16,
	#[clap(long, env, value_enum, default_value = "json")]
	storage: StorageKind,
	/// Path of the JSON file or sqlite database. Ignored for `memory`.
	#[clap(long, env, default_value = "did_registry.json")]
	registry_path: PathBuf,
	/// Endpoint advertised by the `DIDCommMessaging` service of key-derived
	/// documents.
	#[clap(long, env, default_value = "https://example.com/didcomm")]
	service_endpoint: String,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or("info".into()))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let cli = Cli::parse();

	let storage: Box<dyn Storage> = match cli.storage {
		StorageKind::Json => Box::new(JsonFileStorage::new(&cli.registry_path)),
		StorageKind::Sqlite => Box::new(
			SqliteStorage::connect(&cli.registry_path)
				.await
				.wrap_err_with(|| {
					format!(
						"failed to open database with path {}",
						cli.registry_path.display()
					)
				})?,
		),
		StorageKind::Memory => Box::new(MemoryStorage::new()),
	};
	let registry = Registry::load(storage)
		.await
		.wrap_err("failed to load the registry")?;

	let router = did_registry::RouterConfig {
		v1: did_registry::v1::RouterConfig {
			registry: Arc::new(registry),
			legacy_ids: LegacyDidProvider::random(),
			service_endpoint: cli.service_endpoint,
		},
	}
	.build();

	let listener = tokio::net::TcpListener::bind(SocketAddr::new(
		Ipv6Addr::UNSPECIFIED.into(),
		cli.port,
	))
	.await
	.wrap_err("failed to bind listener")?;
	info!(
		"listening on {}",
		listener.local_addr().wrap_err("listener has no address")?
	);
	axum::serve(listener, router)
		.await
		.wrap_err("server exited with an error")
}
