use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the hosted genie functions
    #[arg(long, env = "GENIE_BASE_URL")]
    pub base_url: Option<String>,

    /// Bearer token for the hosted genie functions
    #[arg(long, env = "GENIE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Upper bound for non-streaming requests.
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
    /// Directory served under `/static`.
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Upper bound on waiting for the response head or any body chunk.
    pub read_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Assistant messages stop growing past this many bytes.
    pub max_message_bytes: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.request_timeout_secs", 120)?
            .set_default("server.body_limit_bytes", 1024 * 1024)?
            .set_default("server.static_dir", "static")?
            .set_default("backend.base_url", "http://127.0.0.1:54321")?
            .set_default("backend.api_key", "")?
            .set_default("backend.read_timeout_secs", 30)?
            .set_default("backend.connect_timeout_secs", 10)?
            .set_default("limits.max_message_bytes", 256 * 1024)?;

        // An explicit file must exist; ./config.* is picked up when present.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(base_url) = &cli.base_url {
            builder = builder.set_override("backend.base_url", base_url.as_str())?;
        }
        if let Some(api_key) = &cli.api_key {
            builder = builder.set_override("backend.api_key", api_key.as_str())?;
        }

        // E.g. GENIE_SERVER__PORT=8000, GENIE_BACKEND__BASE_URL=https://...
        builder = builder.add_source(
            Environment::with_prefix("GENIE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        Url::parse(&self.backend.base_url).map_err(|e| {
            config::ConfigError::Message(format!(
                "backend.base_url is not a valid URL ({}): {e}",
                self.backend.base_url
            ))
        })?;
        if self.limits.max_message_bytes == 0 {
            return Err(config::ConfigError::Message(
                "limits.max_message_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
