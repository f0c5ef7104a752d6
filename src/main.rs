use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;

use jsonapi_cache::config::{CacheBackend, Config};
use jsonapi_cache::logging::init_tracing;
use jsonapi_cache::{
  CacheItemPool, ClientFactory, Filters, JsonApiClient, MemoryPool, Severity, SqlitePool, VoidPool,
};

#[derive(Parser, Debug)]
#[command(name = "jsonapi-cache")]
#[command(about = "Fetch JSON:API resources through a local cache")]
#[command(version)]
struct Args {
  /// Resource path, relative to the endpoint
  path: String,

  /// Path to config file (default: $XDG_CONFIG_HOME/jsonapi-cache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of the API
  #[arg(short, long)]
  endpoint: Option<String>,

  /// Filter as name=value, may be repeated
  #[arg(short = 'f', long = "filter", value_parser = parse_filter)]
  filters: Vec<(String, String)>,

  /// HTTP verb
  #[arg(short, long)]
  method: Option<String>,

  /// Default cache lifetime in seconds
  #[arg(long)]
  ttl: Option<u64>,

  /// Level failures are logged at
  #[arg(long)]
  error_level: Option<Severity>,

  /// Cache backend
  #[arg(long, value_enum)]
  cache: Option<CacheBackend>,
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
  s.split_once('=')
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .ok_or_else(|| format!("expected name=value, got '{}'", s))
}

fn open_pool(config: &Config) -> Result<Arc<dyn CacheItemPool>> {
  let pool: Arc<dyn CacheItemPool> = match config.cache.backend {
    CacheBackend::Sqlite => match &config.cache.path {
      Some(path) => Arc::new(SqlitePool::open(path)?),
      None => Arc::new(SqlitePool::open_default()?),
    },
    CacheBackend::Memory => Arc::new(MemoryPool::new()),
    CacheBackend::Disabled => Arc::new(VoidPool),
  };
  Ok(pool)
}

fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration, command line wins
  let mut config = Config::load(args.config.as_deref())?.unwrap_or_default();
  if let Some(endpoint) = args.endpoint {
    config.api.endpoint = endpoint;
  }
  if let Some(method) = args.method {
    config.client.method = method;
  }
  if let Some(ttl) = args.ttl {
    config.client.cache_lifetime = ttl;
  }
  if let Some(level) = args.error_level {
    config.client.error_level = level;
  }
  if let Some(backend) = args.cache {
    config.cache.backend = backend;
  }
  if config.api.endpoint.is_empty() {
    return Err(eyre!(
      "No API endpoint configured. Pass --endpoint or set api.endpoint in the config file."
    ));
  }

  let _guard = init_tracing(config.log_file.as_deref())?;

  let http = ClientFactory.create(&config.api.endpoint, config.token().as_deref());
  let client = JsonApiClient::new(http, open_pool(&config)?)
    .with_error_level(config.client.error_level)
    .with_cache_lifetime(config.client.cache_lifetime)
    .with_method(config.client.method.clone());

  let filters: Filters = args.filters.into_iter().collect();
  let items = client.fetch(&args.path, &filters)?;

  println!("{}", serde_json::to_string_pretty(&items)?);

  Ok(())
}
