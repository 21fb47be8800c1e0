//! Configuration constants and provider credentials

pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";
pub const DEFAULT_COINS_URL: &str = "https://api.coins.xyz";
pub const DEFAULT_VALORPRO_TEMPLATE: &str = "https://{}.api.valorpro.com.br";

/// Pairs resolved by `get_all_prices` unless configured otherwise
pub const DEFAULT_TRACKED_PAIRS: [&str; 3] = ["GBPUSDT", "USDTBRL", "GBPBRL"];

/// Provider secrets. Every field is optional: a missing key degrades the
/// adapter, it never prevents the oracle from starting.
///
/// Binance and Coins.xyz tickers are public endpoints that only take an API
/// key header, so their signing secrets are not read.
#[derive(Clone, Default)]
pub struct Credentials {
    pub binance_api_key: Option<String>,
    pub coins_api_key: Option<String>,
    pub valorpro_client_id: Option<String>,
    pub valorpro_client_secret: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            binance_api_key: resolve_env(&["BINANCE_API_KEY"]),
            coins_api_key: resolve_env(&["COINS_API_KEY"]),
            valorpro_client_id: resolve_env(&["VALORPRO_CLIENT_ID", "VALOR_PRO_CLIENT_ID"]),
            valorpro_client_secret: resolve_env(&[
                "VALORPRO_CLIENT_SECRET",
                "VALOR_PRO_CLIENT_SECRET",
            ]),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mask(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Credentials")
            .field("binance_api_key", &mask(&self.binance_api_key))
            .field("coins_api_key", &mask(&self.coins_api_key))
            .field("valorpro_client_id", &mask(&self.valorpro_client_id))
            .field("valorpro_client_secret", &mask(&self.valorpro_client_secret))
            .finish()
    }
}

/// First non-blank value among the given environment variables
fn resolve_env(var_names: &[&str]) -> Option<String> {
    for var in var_names {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
    }
    None
}
