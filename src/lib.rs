//! Exchange Autodiscover client.
//!
//! Resolves, for a mailbox address and password, the EWS endpoint URL
//! and the server release lineage. Up to three candidate endpoints are
//! probed in order: the mailbox domain itself, the `autodiscover.`
//! subdomain, and the target of a 302 redirect served by that
//! subdomain. The first candidate answering 200 with a parseable
//! document wins; every failure short of full exhaustion only skips to
//! the next candidate.
//!
//! ```no_run
//! use ews_autodiscover::{discover, HttpTransport};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let transport = HttpTransport::insecure();
//! let info = discover(&transport, "somebody@example.org", "secret").await?;
//! println!("EWS at {} ({})", info.ews_url, info.version);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::correctness,
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::wildcard_imports,
    clippy::needless_borrow,
    clippy::cast_lossless,
    clippy::unused_async
)]
#![cfg_attr(not(test), warn(clippy::indexing_slicing))]

mod candidates;
mod observer;
mod request;
mod response;
mod transport;
mod version;

#[cfg(test)]
pub mod test_utils;

use anyhow::{format_err, Context as _, Result};
use base64::Engine as _;

pub use crate::observer::DiscoveryObserver;
pub use crate::response::DiscoveredInfo;
pub use crate::transport::{HttpTransport, Response, Transport};
pub use crate::version::ExchangeVersion;

/// Credential for an `Authorization: Basic` header.
fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{username}:{password}");
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
}

/// Discovers the EWS endpoint for the given mailbox.
///
/// Issues up to four HTTP requests through `transport`: one
/// unauthenticated redirect probe while deriving the candidate list,
/// then one authenticated GET per candidate until a parseable answer
/// arrives. A failing candidate is skipped without retry. Only when
/// every candidate has failed does the call itself fail, and the
/// per-candidate causes are not part of that error; use
/// [`discover_with_observer`] to receive them.
///
/// `email_address` must be a plain `local@domain` mailbox address;
/// anything else fails before any network traffic.
pub async fn discover(
    transport: &impl Transport,
    email_address: &str,
    password: &str,
) -> Result<DiscoveredInfo> {
    discover_with_observer(transport, &(), email_address, password).await
}

/// Like [`discover`], reporting every skipped candidate to `observer`.
pub async fn discover_with_observer(
    transport: &impl Transport,
    observer: &dyn DiscoveryObserver,
    email_address: &str,
    password: &str,
) -> Result<DiscoveredInfo> {
    let payload =
        request::build_request(email_address).context("failed to build Autodiscover request")?;
    let authorization = basic_auth(email_address, password);

    for url in candidates::candidate_urls(transport, email_address).await? {
        if url.is_empty() {
            continue;
        }

        let response = match transport
            .get(&url, Some(&authorization), Some(payload.clone().into_bytes()))
            .await
        {
            Ok(response) => response,
            Err(err) => {
                observer.candidate_failed(&url, &err);
                continue;
            }
        };

        if response.status != 200 {
            observer.candidate_failed(
                &url,
                &format_err!("unexpected HTTP status {}", response.status),
            );
            continue;
        }

        let text = String::from_utf8_lossy(&response.body);
        match response::parse_response(&text) {
            Ok(info) => return Ok(info),
            Err(err) => observer.candidate_failed(&url, &err),
        }
    }

    Err(format_err!("failed to fetch discovery information"))
}
