//! Alibaba Cloud DNS record store.
//!
//! Implements the idempotent upsert contract against the Alidns RPC API:
//! look the record up by its exact `(domain, rr, type)` key, update it in
//! place when it exists, create it otherwise. Requests are signed with the
//! ACS3-HMAC-SHA256 scheme.

use crate::config::ProviderConfig;
use crate::core::{RecordSpec, RecordStore};
use crate::dns::DnsError;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::debug;

const API_VERSION: &str = "2015-01-09";
const SIGNATURE_ALGORITHM: &str = "ACS3-HMAC-SHA256";

type HmacSha256 = Hmac<Sha256>;

/// [`RecordStore`] backed by the Alibaba Cloud DNS ("Alidns") API.
pub struct AlidnsStore {
    http: reqwest::Client,
    endpoint: String,
    host: String,
    access_key_id: String,
    access_key_secret: String,
}

impl AlidnsStore {
    /// Builds a store from provider configuration. Credentials must already
    /// have been validated.
    pub fn from_config(provider: &ProviderConfig) -> Result<Self, DnsError> {
        let endpoint = provider.endpoint.trim_end_matches('/').to_string();
        let host = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .unwrap_or(&endpoint)
            .to_string();
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            host,
            access_key_id: provider.access_key_id.clone(),
            access_key_secret: provider.access_key_secret.clone(),
        })
    }

    /// Performs one signed RPC call and returns the parsed JSON body.
    async fn call(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, DnsError> {
        let mut sorted: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect();
        sorted.sort();
        let canonical_query = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = format!("{:032x}", rand::random::<u128>());
        let payload_hash = hex::encode(Sha256::digest(b""));

        // Headers participating in the signature, sorted by name.
        let signed = [
            ("host", self.host.as_str()),
            ("x-acs-action", action),
            ("x-acs-content-sha256", payload_hash.as_str()),
            ("x-acs-date", timestamp.as_str()),
            ("x-acs-signature-nonce", nonce.as_str()),
            ("x-acs-version", API_VERSION),
        ];
        let canonical_headers: String =
            signed.iter().map(|(k, v)| format!("{k}:{v}\n")).collect();
        let signed_headers = signed
            .iter()
            .map(|(k, _)| *k)
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "GET\n/\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
        );
        let string_to_sign = format!(
            "{SIGNATURE_ALGORITHM}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );
        let mut mac = HmacSha256::new_from_slice(self.access_key_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(string_to_sign.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        let authorization = format!(
            "{SIGNATURE_ALGORITHM} Credential={},SignedHeaders={},Signature={}",
            self.access_key_id, signed_headers, signature
        );

        let url = format!("{}/?{}", self.endpoint, canonical_query);
        debug!(action, "Calling Alidns API");
        let response = self
            .http
            .get(&url)
            .header("x-acs-action", action)
            .header("x-acs-version", API_VERSION)
            .header("x-acs-date", &timestamp)
            .header("x-acs-signature-nonce", &nonce)
            .header("x-acs-content-sha256", &payload_hash)
            .header("Authorization", authorization)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DnsError::Response(format!("non-JSON body: {e}")))?;
        if !status.is_success() {
            return Err(DnsError::Api {
                code: json_str(&body, "Code").unwrap_or_else(|| status.to_string()),
                message: json_str(&body, "Message").unwrap_or_default(),
            });
        }
        Ok(body)
    }

    /// Looks up the provider-side id of the record matching the exact
    /// `(domain, rr, record_type)` key, if any.
    ///
    /// `KeyWord` is a substring search on the provider side, so the response
    /// is filtered for an exact RR and type match here; `www` must not match
    /// `www2`, and an A record must not shadow a TXT record of the same name.
    async fn find_record_id(&self, spec: &RecordSpec) -> Result<Option<String>, DnsError> {
        let body = self
            .call(
                "DescribeDomainRecords",
                &[
                    ("DomainName", spec.domain.clone()),
                    ("KeyWord", spec.rr.clone()),
                    ("PageSize", "50".to_string()),
                ],
            )
            .await?;

        let records = body
            .pointer("/DomainRecords/Record")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        for record in records {
            let rr = json_str(&record, "RR");
            let record_type = json_str(&record, "Type");
            if rr.as_deref() == Some(spec.rr.as_str())
                && record_type.as_deref() == Some(spec.record_type.as_str())
            {
                return json_str(&record, "RecordId")
                    .map(Some)
                    .ok_or_else(|| DnsError::Response("record without RecordId".into()));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl RecordStore for AlidnsStore {
    async fn upsert(&self, spec: &RecordSpec) -> Result<(), DnsError> {
        match self.find_record_id(spec).await? {
            Some(record_id) => {
                debug!(rr = %spec.rr, record_id, "Updating existing record.");
                self.call(
                    "UpdateDomainRecord",
                    &[
                        ("RecordId", record_id),
                        ("RR", spec.rr.clone()),
                        ("Type", spec.record_type.clone()),
                        ("Value", spec.value.clone()),
                        ("TTL", spec.ttl.to_string()),
                    ],
                )
                .await?;
            }
            None => {
                debug!(rr = %spec.rr, "Creating new record.");
                self.call(
                    "AddDomainRecord",
                    &[
                        ("DomainName", spec.domain.clone()),
                        ("RR", spec.rr.clone()),
                        ("Type", spec.record_type.clone()),
                        ("Value", spec.value.clone()),
                        ("TTL", spec.ttl.to_string()),
                    ],
                )
                .await?;
            }
        }
        Ok(())
    }
}

/// RFC 3986 percent-encoding as required by the signature scheme.
fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::percent_encode;

    #[test]
    fn percent_encoding_is_rfc3986() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("*"), "%2A");
        assert_eq!(percent_encode("unreserved-._~"), "unreserved-._~");
    }
}
