//! Derivation of the ordered Autodiscover candidate URLs.

use anyhow::{bail, Result};

use crate::transport::Transport;

/// Produces the ordered candidate list for a mailbox address.
///
/// Order encodes precedence: the mailbox domain itself, the
/// `autodiscover.` subdomain, and finally the target of a 302 redirect
/// served by that subdomain. The third slot is the empty string when
/// the redirect probe yields nothing, which downstream treats as
/// "skip".
pub(crate) async fn candidate_urls<T: Transport>(
    transport: &T,
    email_address: &str,
) -> Result<[String; 3]> {
    let domain = email_domain(email_address)?;

    Ok([
        format!("https://{domain}/autodiscover/autodiscover.xml"),
        format!("https://autodiscover.{domain}/autodiscover/autodiscover.xml"),
        redirected_url(transport, domain).await.unwrap_or_default(),
    ])
}

/// Resolves the redirect-based candidate.
///
/// Issues one unauthenticated GET to the `autodiscover.` subdomain and
/// keeps the `Location` target only for an exact 302 answer. Anything
/// else, including transport errors, yields no candidate; the probe is
/// never retried.
async fn redirected_url<T: Transport>(transport: &T, domain: &str) -> Option<String> {
    let url = format!("https://autodiscover.{domain}/autodiscover/autodiscover.xml");
    let response = transport.get(&url, None, None).await.ok()?;

    if response.status != 302 {
        return None;
    }

    response.location.filter(|location| !location.is_empty())
}

/// Extracts the domain of a plain `local@domain` mailbox address.
fn email_domain(email_address: &str) -> Result<&str> {
    match email_address.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(domain)
        }
        _ => bail!("email {email_address:?} must have the form local@domain"),
    }
}
