//! Webhook signature verification.
//!
//! The gateway sends `X-WAREST-Signature: <TOKEN>=<hex>` where the digest is an
//! HMAC keyed with `secret + X-WAREST-Username`. Several secrets may be live at
//! once during rotation, so every configured secret is tried.
//!
//! Two payload encodings are checked: the raw bytes as received and the compact
//! re-serialization of the parsed JSON body. Some gateway builds sign the latter;
//! which one a given sender uses is not fixed, so both are accepted.

use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use tracing::debug;
use warest_common::HeaderList;

pub const SIGNATURE_HEADER: &str = "X-WAREST-Signature";
pub const SIGNATURE_ALG_HEADER: &str = "X-WAREST-Signature-Alg";
pub const USERNAME_HEADER: &str = "X-WAREST-Username";

static ALGORITHM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*HMAC-SHA(224|256|384|512)\s*$").expect("valid algorithm pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HmacAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HmacAlgorithm {
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = ALGORITHM.captures(raw)?;
        match caps.get(1)?.as_str() {
            "224" => Some(Self::Sha224),
            "256" => Some(Self::Sha256),
            "384" => Some(Self::Sha384),
            "512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Explicit header first, then the signature token, else SHA-256.
    pub fn resolve(alg_header: Option<&str>, token: &str) -> Self {
        alg_header
            .and_then(Self::parse)
            .or_else(|| Self::parse(token))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha224 => "HMAC-SHA224",
            Self::Sha256 => "HMAC-SHA256",
            Self::Sha384 => "HMAC-SHA384",
            Self::Sha512 => "HMAC-SHA512",
        }
    }

    /// Lower-case hex HMAC of `payload` under `key`.
    pub fn hex_digest(&self, key: &[u8], payload: &[u8]) -> String {
        macro_rules! digest {
            ($hash:ty) => {{
                // HMAC accepts keys of any length.
                let Ok(mut mac) = Hmac::<$hash>::new_from_slice(key) else {
                    return String::new();
                };
                mac.update(payload);
                hex::encode(mac.finalize().into_bytes())
            }};
        }
        match self {
            Self::Sha224 => digest!(Sha224),
            Self::Sha256 => digest!(Sha256),
            Self::Sha384 => digest!(Sha384),
            Self::Sha512 => digest!(Sha512),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub token: String,
    pub digest: String,
}

/// `TOKEN=HEX`; `None` when either side is empty.
pub fn parse_signature_header(raw: &str) -> Option<SignatureHeader> {
    let (token, digest) = raw.trim().split_once('=')?;
    let (token, digest) = (token.trim(), digest.trim());
    if token.is_empty() || digest.is_empty() {
        return None;
    }
    Some(SignatureHeader {
        token: token.to_string(),
        digest: digest.to_ascii_lowercase(),
    })
}

/// Raw bytes plus the compact re-serialization of `parsed`, without duplicates.
pub fn candidate_payloads(raw: &[u8], parsed: Option<&Value>) -> Vec<Vec<u8>> {
    let mut out = vec![raw.to_vec()];
    if let Some(reserialized) = parsed.and_then(|value| serde_json::to_vec(value).ok())
        && !out.contains(&reserialized)
    {
        out.push(reserialized);
    }
    out
}

/// Equal-length constant-time comparison of two hex digests.
pub fn digests_match(computed: &str, received: &str) -> bool {
    if computed.len() != received.len() {
        return false;
    }
    computed.as_bytes().ct_eq(received.as_bytes()).into()
}

#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    secrets: Vec<String>,
    debug: bool,
}

impl SignatureVerifier {
    pub fn new(secrets: Vec<String>) -> Self {
        Self {
            secrets,
            debug: false,
        }
    }

    /// Log every computed digest on mismatch.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn verify(&self, headers: &HeaderList, raw: &[u8], parsed: Option<&Value>) -> bool {
        let Some(header) = headers
            .get_non_empty(SIGNATURE_HEADER)
            .and_then(parse_signature_header)
        else {
            if self.debug {
                debug!("signature header missing or malformed");
            }
            return false;
        };
        let algorithm = HmacAlgorithm::resolve(headers.get(SIGNATURE_ALG_HEADER), &header.token);
        let username = headers.get(USERNAME_HEADER).unwrap_or_default().trim();
        let payloads = candidate_payloads(raw, parsed);

        for (secret_index, secret) in self.secrets.iter().enumerate() {
            let key = format!("{secret}{username}");
            for (payload_index, payload) in payloads.iter().enumerate() {
                let computed = algorithm.hex_digest(key.as_bytes(), payload);
                if digests_match(&computed, &header.digest) {
                    return true;
                }
                if self.debug {
                    debug!(
                        algorithm = algorithm.as_str(),
                        secret_index,
                        payload_index,
                        computed = %computed,
                        received = %header.digest,
                        "signature mismatch"
                    );
                }
            }
        }
        false
    }
}

/// True when any secret reproduces the received digest.
pub fn verify(
    headers: &HeaderList,
    raw: &[u8],
    parsed: Option<&Value>,
    secrets: &[String],
) -> bool {
    SignatureVerifier::new(secrets.to_vec()).verify(headers, raw, parsed)
}

/// Header value a sender would attach for `raw` under `secret`.
pub fn sign(algorithm: HmacAlgorithm, secret: &str, username: &str, raw: &[u8]) -> String {
    let key = format!("{secret}{username}");
    format!(
        "{}={}",
        algorithm.as_str(),
        algorithm.hex_digest(key.as_bytes(), raw)
    )
}
