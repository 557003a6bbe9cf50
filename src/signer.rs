use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, HOST};
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::error::{AmpError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signing service identifier for Amazon Managed Prometheus.
pub const APS_SERVICE: &str = "aps";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-date";

/// AWS Signature Version 4 signer for a single region/service scope.
///
/// The canonical header set is fixed to `host;x-amz-date`, which is all a
/// GET-only client needs; signing requests with additional headers would
/// require sorting an arbitrary header set and is left as an extension point.
pub struct SigV4Signer {
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    /// Add `x-amz-date`, `host` and `Authorization` to `headers` for the given
    /// request. The signature covers the exact `body` bytes; any header
    /// mutation after this call invalidates it, so callers sign immediately
    /// before transmission.
    pub fn sign(&self, method: &str, url: &str, headers: &mut HeaderMap, body: &[u8]) -> Result<()> {
        self.sign_at(Utc::now(), method, url, headers, body)
    }

    fn sign_at(
        &self,
        instant: DateTime<Utc>,
        method: &str,
        url: &str,
        headers: &mut HeaderMap,
        body: &[u8],
    ) -> Result<()> {
        // Both date forms must come from the same captured instant.
        let amz_date = instant.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = instant.format("%Y%m%d").to_string();

        let parsed = Url::parse(url).map_err(|e| AmpError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(AmpError::InvalidUrl {
                    url: url.to_string(),
                    reason: "URL has no host".to_string(),
                })
            }
        };
        let canonical_uri = if parsed.path().is_empty() {
            "/"
        } else {
            parsed.path()
        };
        let canonical_querystring = parsed.query().unwrap_or("");

        let payload_hash = hex::encode(Sha256::digest(body));
        // The canonical headers block is newline-terminated; the empty line
        // between it and the signed-headers list is part of the format.
        let canonical_headers = format!("host:{}\nx-amz-date:{}\n", host, amz_date);
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, canonical_uri, canonical_querystring, canonical_headers, SIGNED_HEADERS, payload_hash
        );

        let credential_scope = format!(
            "{}/{}/{}/aws4_request",
            date_stamp, self.region, self.service
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(&date_stamp);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, credential_scope, SIGNED_HEADERS, signature
        );

        headers.insert(
            HeaderName::from_static("x-amz-date"),
            HeaderValue::from_str(&amz_date)?,
        );
        headers.insert(HOST, HeaderValue::from_str(&host)?);
        let mut authorization = HeaderValue::from_str(&authorization)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        Ok(())
    }

    /// Chained HMAC key derivation: date -> region -> service -> aws4_request.
    fn signing_key(&self, date_stamp: &str) -> Vec<u8> {
        let k_date = hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        );
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}
