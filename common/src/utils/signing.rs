//! Signing of SQL fragments handed to the browser.
//!
//! Where clauses travel through the client and come back in later requests;
//! the signature proves they were produced by this server.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct QuerySigner {
    secret: Vec<u8>,
}

impl QuerySigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Option<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).ok()
    }

    /// Hex-encoded HMAC-SHA256 of `sql`.
    pub fn sign(&self, sql: &str) -> String {
        match self.mac() {
            Some(mut mac) => {
                mac.update(sql.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
            None => String::new(),
        }
    }

    /// Checks `signature` against `sql` in constant time.
    pub fn verify(&self, sql: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        match self.mac() {
            Some(mut mac) => {
                mac.update(sql.as_bytes());
                mac.verify_slice(&expected).is_ok()
            }
            None => false,
        }
    }
}
