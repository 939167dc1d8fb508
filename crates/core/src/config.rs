use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, Map};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::modes::LogFormat;
use crate::utils::{parse_address, parse_decimal};

const ENV_PREFIX: &str = "PAIRWATCH";

/// Flat environment keys accepted on top of the `PAIRWATCH__SECTION__KEY`
/// form, mapped to their config path.
const FLAT_ENV_KEYS: &[(&str, &str)] = &[
    ("WS_RPC", "chain.rpc_ws"),
    ("FACTORY_ADDRESS", "dex.factory"),
    ("WBNB_ADDRESS", "dex.wrapped_native"),
    ("EXECUTOR_URL", "executor.url"),
    ("BUY_AMOUNT_BNB", "executor.buy_amount_bnb"),
    ("SLIPPAGE", "executor.slippage"),
    ("DEADLINE_SECS", "executor.deadline_secs"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub dex: DexConfig,
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_ws: String,
    /// Name of the env var holding the signing key. The key itself never
    /// lives in the config tree.
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    pub factory: String,
    /// Reference asset. Unset means every new pair is watched.
    #[serde(default)]
    pub wrapped_native: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub url: String,
    #[serde(default = "default_buy_amount_bnb")]
    pub buy_amount_bnb: String,
    #[serde(default = "default_slippage")]
    pub slippage: f64,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_liquidity_timeout_secs")]
    pub liquidity_timeout_secs: u64,
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            liquidity_timeout_secs: default_liquidity_timeout_secs(),
            seen_capacity: default_seen_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default)]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_bind")]
    pub metrics_bind: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: false,
            metrics_bind: default_metrics_bind(),
        }
    }
}

impl AppConfig {
    /// Layers the optional TOML file, `PAIRWATCH__*` variables and the flat
    /// deployment variables, in that order, then validates the result.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        Self::finish(builder, std::env::vars().collect())
    }

    /// Same layering as [`load`](Self::load) over an inline TOML document and
    /// an explicit environment snapshot.
    pub fn from_toml_str(raw: &str, env: Map<String, String>) -> Result<Self> {
        let builder = Config::builder().add_source(File::from_str(raw, FileFormat::Toml));
        Self::finish(builder, env)
    }

    fn finish(builder: ConfigBuilder<DefaultState>, env: Map<String, String>) -> Result<Self> {
        let flat: Vec<_> = FLAT_ENV_KEYS
            .iter()
            .map(|(env_key, config_key)| (*config_key, env.get(*env_key).cloned()))
            .collect();
        // Values stay strings until deserialization so decimal amounts keep
        // every digit.
        let mut builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(false)
                .source(Some(env)),
        );
        for (config_key, value) in flat {
            let value = value.and_then(normalize_env);
            builder = builder.set_override_option(config_key, value)?;
        }
        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_ws.trim().is_empty() {
            return Err(Error::Invalid("chain.rpc_ws is empty".to_string()));
        }
        if self.executor.url.trim().is_empty() {
            return Err(Error::Invalid("executor.url is empty".to_string()));
        }
        parse_address(&self.dex.factory)?;
        if let Some(raw) = self.wrapped_native() {
            parse_address(raw)?;
        }
        self.buy_amount()?;
        let slippage = self.executor.slippage;
        if !slippage.is_finite() || !(0.0..1.0).contains(&slippage) {
            return Err(Error::Invalid(format!(
                "executor.slippage must be in [0, 1): {slippage}"
            )));
        }
        LogFormat::parse(&self.observability.log_format)?;
        if self.watcher.liquidity_timeout_secs == 0 {
            return Err(Error::Invalid(
                "watcher.liquidity_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn wrapped_native(&self) -> Option<&str> {
        self.dex
            .wrapped_native
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
    }

    pub fn buy_amount(&self) -> Result<Decimal> {
        let amount = parse_decimal(&self.executor.buy_amount_bnb)?;
        if amount <= Decimal::ZERO {
            return Err(Error::Invalid(format!(
                "executor.buy_amount_bnb must be positive: {amount}"
            )));
        }
        Ok(amount)
    }
}

fn normalize_env(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn default_private_key_env() -> String {
    "PRIVATE_KEY".to_string()
}

fn default_buy_amount_bnb() -> String {
    "0.02".to_string()
}

fn default_slippage() -> f64 {
    0.30
}

fn default_deadline_secs() -> u64 {
    60
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_liquidity_timeout_secs() -> u64 {
    120
}

fn default_seen_capacity() -> usize {
    100_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_bind() -> String {
    "127.0.0.1:9100".to_string()
}
