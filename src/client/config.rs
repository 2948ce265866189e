use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, Secret};
use url::Url;

use crate::error::{KoboldError, Result};

/// Default address of a locally launched KoboldCpp.
pub const KOBOLDCPP_BASE_URL: &str = "http://localhost:5001";
/// Environment variable consulted for the server password.
pub const KOBOLDCPP_API_KEY_ENV_VAR: &str = "KOBOLDCPP_API_KEY";
/// Whole-request timeout applied by the transport. Streams count against it too.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
/// Total time budget for retrying busy (429/503) responses on plain calls.
pub const DEFAULT_RETRY_MAX_ELAPSED: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
    pub api_key_env_var: String,
    pub timeout: Duration,
    pub retry_max_elapsed: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: KOBOLDCPP_BASE_URL.to_string(),
            api_key: None,
            api_key_env_var: KOBOLDCPP_API_KEY_ENV_VAR.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_max_elapsed: DEFAULT_RETRY_MAX_ELAPSED,
        }
    }
}

impl ApiConfig {
    /// KoboldCpp only wants a key when launched with `--password`, so a
    /// missing key is not an error.
    pub(crate) fn load_api_key(&self) -> Option<Secret<String>> {
        if let Some(api_key) = self.api_key.as_ref() {
            crate::trace!("Using api_key from parameter");
            return Some(api_key.to_owned());
        }
        crate::trace!("api_key not set. Attempting to load from .env");
        dotenvy::dotenv().ok();

        match dotenvy::var(&self.api_key_env_var) {
            Ok(api_key) if !api_key.is_empty() => {
                crate::trace!("Successfully loaded api_key from .env");
                Some(api_key.into())
            }
            _ => {
                crate::trace!(
                    "{} not found in dotenv, nor was it set manually",
                    self.api_key_env_var
                );
                None
            }
        }
    }

    /// Parses the base url, making sure relative endpoint paths join beneath it.
    pub(crate) fn parsed_base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| KoboldError::Setup(format!("invalid base url {}: {e}", self.base_url)))?;
        if url.cannot_be_a_base() {
            return Err(KoboldError::Setup(format!(
                "base url {} cannot be a base",
                self.base_url
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub(crate) fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            if let Ok(header_value) =
                HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            {
                headers.insert(AUTHORIZATION, header_value);
            } else {
                crate::error!("Failed to create header value from authorization value");
            }
        }
        headers
    }
}

pub trait KoboldApiConfigTrait {
    fn api_config_mut(&mut self) -> &mut ApiConfig;

    fn api_config(&self) -> &ApiConfig;

    /// Address of the server, e.g. `http://192.168.1.20:5001`. A path prefix is
    /// kept, so servers behind a reverse proxy work too.
    fn with_base_url<S: AsRef<str>>(mut self, base_url: S) -> Self
    where
        Self: Sized,
    {
        self.api_config_mut().base_url = base_url.as_ref().to_string();
        self
    }

    fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self
    where
        Self: Sized,
    {
        self.api_config_mut().api_key = Some(Secret::from(api_key.into()));
        self
    }

    /// Set the environment variable name for the API key. Default is `KOBOLDCPP_API_KEY`.
    fn with_api_key_env_var<S: Into<String>>(mut self, api_key_env_var: S) -> Self
    where
        Self: Sized,
    {
        self.api_config_mut().api_key_env_var = api_key_env_var.into();
        self
    }

    fn with_timeout(mut self, timeout: Duration) -> Self
    where
        Self: Sized,
    {
        self.api_config_mut().timeout = timeout;
        self
    }

    fn with_retry_max_elapsed(mut self, retry_max_elapsed: Duration) -> Self
    where
        Self: Sized,
    {
        self.api_config_mut().retry_max_elapsed = retry_max_elapsed;
        self
    }
}
