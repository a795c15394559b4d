//! Master-key request signing.
//!
//! The signature is an HMAC-SHA256, keyed with the base64-decoded master
//! key, over `verb\nresourceType\nresourceId\ndate\n\n` where verb, type and
//! date are lower-cased. The header value is the URL-encoded form of
//! `type=master&ver=1.0&sig=<base64 signature>`.

use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::client::AuthorizationTokenProvider;
use crate::error::{Result, TestkitError};
use crate::headers::{names, Headers};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_PREFIX: &str = "type=master&ver=1.0&sig=";

/// Signs requests with an account master key.
#[derive(Clone)]
pub struct MasterKeyAuthorization {
    key: Vec<u8>,
}

impl std::fmt::Debug for MasterKeyAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeyAuthorization")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl MasterKeyAuthorization {
    /// `master_key` is the base64 key as issued by the service.
    pub fn new(master_key: &str) -> Result<Self> {
        if master_key.is_empty() {
            return Err(TestkitError::invalid_argument("key"));
        }
        let key = STANDARD
            .decode(master_key)
            .map_err(|e| TestkitError::invalid_argument(format!("key is not base64: {e}")))?;
        Ok(Self { key })
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TestkitError::invalid_argument(format!("key: {e}")))
    }

    /// URL-encoded authorization header value.
    pub fn sign(&self, verb: &str, resource_id: &str, resource_type: &str, date: &str) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(string_to_sign(verb, resource_id, resource_type, date).as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        let token = format!("{TOKEN_PREFIX}{signature}");
        Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
    }

    /// Check a header value produced by [`MasterKeyAuthorization::sign`].
    pub fn verify(
        &self,
        token: &str,
        verb: &str,
        resource_id: &str,
        resource_type: &str,
        date: &str,
    ) -> bool {
        let decoded: String = url::form_urlencoded::parse(format!("t={token}").as_bytes())
            .map(|(_, v)| v.into_owned())
            .next()
            .unwrap_or_default();
        let Some(signature) = decoded.strip_prefix(TOKEN_PREFIX) else {
            return false;
        };
        let Ok(signature) = STANDARD.decode(signature) else {
            return false;
        };
        let Ok(mut mac) = self.mac() else {
            return false;
        };
        mac.update(string_to_sign(verb, resource_id, resource_type, date).as_bytes());
        mac.verify_slice(&signature).is_ok()
    }
}

impl AuthorizationTokenProvider for MasterKeyAuthorization {
    fn authorization_token(
        &self,
        verb: &str,
        resource_id: &str,
        resource_type: &str,
        headers: &mut Headers,
    ) -> Result<String> {
        let date = match headers.get(names::X_DATE) {
            Some(date) => date.to_string(),
            None => {
                let date = rfc1123_now();
                headers.insert(names::X_DATE, date.clone());
                date
            }
        };
        self.sign(verb, resource_id, resource_type, &date)
    }
}

fn string_to_sign(verb: &str, resource_id: &str, resource_type: &str, date: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_id,
        date.to_lowercase()
    )
}

/// Current time in the `x-ms-date` format.
pub fn rfc1123_now() -> String {
    httpdate::fmt_http_date(SystemTime::now())
}

/// Stamp a fresh `x-ms-date` and a master-key `authorization` header,
/// replacing any earlier values.
pub fn add_master_authorization_header(
    headers: &mut Headers,
    verb: &str,
    resource_id: &str,
    resource_type: &str,
    key: &str,
) -> Result<()> {
    if verb.is_empty() {
        return Err(TestkitError::invalid_argument("verb"));
    }
    let auth = MasterKeyAuthorization::new(key)?;
    let date = rfc1123_now();
    headers.insert(names::X_DATE, date.clone());
    let token = auth.sign(verb, resource_id, resource_type, &date)?;
    headers.insert(names::AUTHORIZATION, token);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";
    const DATE: &str = "Tue, 01 Nov 1994 08:12:31 GMT";

    #[test]
    fn signature_is_url_encoded_master_token() {
        let auth = MasterKeyAuthorization::new(KEY).unwrap();
        let token = auth.sign("GET", "dbs/db1", "dbs", DATE).unwrap();
        assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        assert!(auth.verify(&token, "get", "dbs/db1", "DBS", DATE));
    }

    #[test]
    fn verify_rejects_other_resource() {
        let auth = MasterKeyAuthorization::new(KEY).unwrap();
        let token = auth.sign("GET", "dbs/db1", "dbs", DATE).unwrap();
        assert!(!auth.verify(&token, "GET", "dbs/db2", "dbs", DATE));
        assert!(!auth.verify("garbage", "GET", "dbs/db1", "dbs", DATE));
    }

    #[test]
    fn resource_id_is_case_sensitive() {
        let auth = MasterKeyAuthorization::new(KEY).unwrap();
        let token = auth.sign("GET", "dbs/DB1", "dbs", DATE).unwrap();
        assert!(!auth.verify(&token, "GET", "dbs/db1", "dbs", DATE));
    }

    #[test]
    fn add_header_validates_and_replaces() {
        let mut headers = Headers::new();
        headers.insert(names::X_DATE, "stale");
        headers.insert(names::AUTHORIZATION, "stale");
        add_master_authorization_header(&mut headers, "POST", "dbs/db1", "colls", KEY).unwrap();
        assert_ne!(headers.get(names::X_DATE), Some("stale"));
        assert_ne!(headers.get(names::AUTHORIZATION), Some("stale"));

        assert!(add_master_authorization_header(&mut headers, "", "x", "dbs", KEY).is_err());
        assert!(add_master_authorization_header(&mut headers, "GET", "x", "dbs", "").is_err());
    }

    #[test]
    fn provider_keeps_existing_date() {
        let auth = MasterKeyAuthorization::new(KEY).unwrap();
        let mut headers = Headers::new();
        headers.insert(names::X_DATE, DATE);
        let token = auth
            .authorization_token("DELETE", "AbCd", "sprocs", &mut headers)
            .unwrap();
        assert!(auth.verify(&token, "DELETE", "AbCd", "sprocs", DATE));
    }
}
