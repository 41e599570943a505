//! Time-limited retrieval URLs for stored blobs.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use rand_distr::Alphanumeric;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Route prefix under which signed blobs are served.
pub const BLOB_ROUTE_PREFIX: &str = "/v1/blob";

const SHA256_BLOCK_LEN: usize = 64;

/// HMAC-SHA256 (RFC 2104) over the concatenation of `parts`.
fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut block = [0u8; SHA256_BLOCK_LEN];
    if key.len() > SHA256_BLOCK_LEN {
        let digest = Sha256::digest(key);
        block[..digest.len()].copy_from_slice(&digest);
    } else {
        block[..key.len()].copy_from_slice(key);
    }

    let mut inner = Sha256::new();
    inner.update(block.map(|b| b ^ 0x36));
    for part in parts {
        inner.update(*part);
    }
    let inner = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(block.map(|b| b ^ 0x5c));
    outer.update(inner);
    outer.finalize().to_vec()
}

pub struct UrlSigner {
    secret: Vec<u8>,
    public_base_url: String,
}

impl UrlSigner {
    pub fn new(secret: impl Into<Vec<u8>>, public_base_url: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// A signer with a random secret; its URLs die with the process.
    pub fn with_random_secret(public_base_url: impl Into<String>) -> Self {
        let secret: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        Self::new(secret, public_base_url)
    }

    /// HMAC-SHA256 keyed with the secret over `path NUL expires`.
    pub fn signature(&self, path: &str, expires: i64) -> String {
        let expires = expires.to_string();
        let mac = hmac_sha256(&self.secret, &[path.as_bytes(), &[0u8], expires.as_bytes()]);
        URL_SAFE_NO_PAD.encode(mac)
    }

    /// Builds `<base>/v1/blob/<path>?expires=..&signature=..`.
    pub fn signed_url(&self, path: &str, ttl: Duration, now: i64) -> String {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = now.saturating_add(ttl_secs);
        let encoded_path = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}{}/{}?expires={}&signature={}",
            self.public_base_url,
            BLOB_ROUTE_PREFIX,
            encoded_path,
            expires,
            self.signature(path, expires)
        )
    }

    pub fn verify(&self, path: &str, expires: i64, signature: &str, now: i64) -> bool {
        if expires < now {
            return false;
        }
        let expected = self.signature(path, expires);
        expected.len() == signature.len()
            && expected
                .bytes()
                .zip(signature.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}
