use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::ConnectorConfig;
use crate::error::{AmpError, Result};
use crate::metrics;
use crate::signer::{SigV4Signer, APS_SERVICE};
use crate::transport::{HttpTransport, ReqwestHttp};

/// Signed-GET client for one workspace endpoint.
///
/// Each call issues exactly one request and decodes the complete response
/// body; there is no retry, pagination, or caching.
pub struct AmpClient {
    transport: Arc<dyn HttpTransport>,
    signer: SigV4Signer,
    base_url: String,
}

impl AmpClient {
    pub fn new(config: &ConnectorConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestHttp::new()))
    }

    pub fn with_transport(config: &ConnectorConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            signer: SigV4Signer::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                config.region.clone(),
                APS_SERVICE,
            ),
            base_url: config.base_url(),
        }
    }

    /// GET `base_url + path`, requiring a 2xx status and a JSON body.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut headers = HeaderMap::new();
        // Signing is the last mutation of the header set before send.
        self.signer.sign("GET", &url, &mut headers, b"")?;

        debug!(%url, "issuing signed GET");
        let started = Instant::now();
        let resp = match self.transport.get(&url, headers).await {
            Ok(resp) => resp,
            Err(e) => {
                metrics::request_error();
                return Err(e);
            }
        };
        if !(200..=299).contains(&resp.status) {
            metrics::request_error();
            return Err(AmpError::Api {
                message: format!("GET {} returned status {}", url, resp.status),
            });
        }
        metrics::request_success(started.elapsed().as_secs_f64(), resp.bytes.len());
        Ok(serde_json::from_slice(&resp.bytes)?)
    }
}
