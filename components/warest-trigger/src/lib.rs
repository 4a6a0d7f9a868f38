//! WARest webhook trigger: signature checks, freshness, event routing and
//! response synthesis for gateway callbacks.

pub mod config;
pub mod events;
pub mod freshness;
pub mod handler;
pub mod response;
pub mod server;
pub mod signature;

pub use config::{ResponseMode, TriggerConfig, parse_secrets};
pub use events::CHANNELS;
pub use freshness::is_fresh;
pub use handler::{ChannelItem, WarestTrigger, WebhookOutcome, WebhookRequest};
pub use signature::{HmacAlgorithm, SignatureVerifier, sign, verify};
