use crate::error::Error;
use url::Url;

pub const API_URL_VAR: &str = "PONY_EXPRESS_API_URL";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    base_url: Url,
}

impl Config {
    /// Reads the base URL from the process environment when there is one, and
    /// falls back to the value baked in at compile time. The browser has no
    /// process environment, so wasm builds only see the compile time value.
    pub fn from_env() -> Result<Self, Error> {
        let runtime = std::env::var(API_URL_VAR).ok();
        let value = runtime.as_deref().or(option_env!("PONY_EXPRESS_API_URL"));
        Self::resolve(value)
    }

    pub fn resolve(value: Option<&str>) -> Result<Self, Error> {
        let value = value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_API_URL);
        let base_url = Url::parse(value)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("{value} cannot be a base url")));
        }
        Ok(Self { base_url })
    }

    /// Appends `path` to the base URL. This is concatenation, not URL
    /// resolution: a base of `http://host/api` keeps its `/api` prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("Default url"),
        }
    }
}
