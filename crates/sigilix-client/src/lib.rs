//! # sigilix-client
//!
//! The Sigilix protocol engine: chat handshakes, signed and encrypted
//! messaging, and reconciliation of server notifications into local state.
//!
//! [`Client`] owns the identity file and the sign-up/unlock lifecycle. Once
//! unlocked it hands out a [`Session`], on which every protocol operation is
//! defined. A session is generic over its transport ([`SigilixApi`]) and its
//! chat store ([`ChatStore`](sigilix_store::ChatStore)).

pub mod api;
pub mod client;
pub mod config;
pub mod events;
pub mod handshake;
pub mod http;
#[cfg(any(test, feature = "loopback"))]
pub mod loopback;
pub mod messaging;
pub mod profile;
pub mod reconcile;
pub mod session;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use api::{SigilixApi, TransportError};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::{ChatSummary, ClientEvent};
pub use http::HttpApi;
pub use profile::Profile;
pub use session::Session;

/// Install a fmt subscriber filtered by `RUST_LOG`, or a crate-level default.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sigilix_client=info,sigilix_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
