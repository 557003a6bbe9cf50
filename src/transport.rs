use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::error::Result;

/// Minimal HTTP capability the streams depend on. Production code uses the
/// reqwest adapter below; tests substitute canned responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
}

pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestHttp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttp {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpGetResult> {
        let resp = self.client.get(url).headers(headers).send().await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?.to_vec();
        Ok(HttpGetResult { status, bytes })
    }
}
