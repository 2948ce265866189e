pub(crate) mod api;
pub mod config;

use api::ApiClient;
use config::{ApiConfig, KoboldApiConfigTrait};

use crate::{
    error::{KoboldError, Result},
    logging::{LoggingConfig, LoggingConfigTrait},
};

/// Handle to one KoboldCpp server.
///
/// Cheap to clone; clones share the underlying `reqwest::Client` and its
/// connection pool.
#[derive(Clone, Debug)]
pub struct KoboldClient {
    pub(crate) api: ApiClient,
    pub logging_config: LoggingConfig,
}

impl KoboldClient {
    pub fn builder() -> KoboldClientBuilder {
        KoboldClientBuilder::default()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.api.config
    }

    pub fn base_url(&self) -> &url::Url {
        self.api.base_url()
    }

    /// `true` when the server answers its model route with a success status.
    /// Transport failures are logged and reported as `false`.
    pub async fn is_available(&self) -> bool {
        match self.api.probe("api/v1/model").await {
            Ok(available) => {
                if !available {
                    crate::warn!("KoboldCpp at {} answered with an error", self.base_url());
                }
                available
            }
            Err(e) => {
                crate::warn!("KoboldCpp at {} is unreachable: {}", self.base_url(), e);
                false
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct KoboldClientBuilder {
    pub config: ApiConfig,
    pub logging_config: LoggingConfig,
    http_client: Option<reqwest::Client>,
}

impl KoboldClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Use a pre-built transport. Its own timeout and TLS settings win over
    /// [`with_timeout`](KoboldApiConfigTrait::with_timeout).
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn init(mut self) -> Result<KoboldClient> {
        self.logging_config.load_logger()?;
        let base_url = self.config.parsed_base_url()?;
        self.config.api_key = self.config.load_api_key();

        let http_client = match self.http_client.take() {
            Some(http_client) => http_client,
            None => reqwest::Client::builder()
                .timeout(self.config.timeout)
                .build()
                .map_err(|e| KoboldError::Setup(format!("failed to build http client: {e}")))?,
        };
        crate::info!("KoboldClient initialized for {}", base_url);

        Ok(KoboldClient {
            api: ApiClient::new(http_client, base_url, self.config),
            logging_config: self.logging_config,
        })
    }
}

impl KoboldApiConfigTrait for KoboldClientBuilder {
    fn api_config_mut(&mut self) -> &mut ApiConfig {
        &mut self.config
    }

    fn api_config(&self) -> &ApiConfig {
        &self.config
    }
}

impl LoggingConfigTrait for KoboldClientBuilder {
    fn logging_config_mut(&mut self) -> &mut LoggingConfig {
        &mut self.logging_config
    }
}
