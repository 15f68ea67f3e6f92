//! Parsing of the Autodiscover response document.

use anyhow::{bail, Context as _, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::version::ExchangeVersion;

/// Discovery result: the EWS endpoint and the server release lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredInfo {
    /// URL of the EWS endpoint.
    pub ews_url: String,

    /// Server release, decoded from the EXCH `ServerVersion` token.
    pub version: ExchangeVersion,
}

/// One `Response/Account/Protocol` record of the response document.
/// Everything else in the document is ignored.
#[derive(Debug, Default)]
struct ProtocolRecord {
    protocol_type: String,
    server_version: String,
    ews_url: String,
}

/// Parses a response body and selects the authoritative record.
///
/// The internal ("EXCH") record is mandatory and always supplies the
/// server version; its `EwsUrl` is preferred, with the first external
/// ("EXPR") record serving as an endpoint fallback only.
pub(crate) fn parse_response(body: &str) -> Result<DiscoveredInfo> {
    let protocols = parse_protocols(body)?;

    let exchange = protocols
        .iter()
        .find(|protocol| protocol.protocol_type == "EXCH")
        .context("failed to find Exchange protocol in response")?;

    let mut ews_url = exchange.ews_url.clone();
    if ews_url.is_empty() {
        let express = protocols
            .iter()
            .find(|protocol| protocol.protocol_type == "EXPR")
            .context("failed to find Express protocol in response")?;
        ews_url = express.ews_url.clone();
    }

    // The version comes from the EXCH record even when EXPR supplied
    // the URL.
    let version = ExchangeVersion::from_server_version(&exchange.server_version)?;

    Ok(DiscoveredInfo { ews_url, version })
}

fn parse_protocols(body: &str) -> Result<Vec<ProtocolRecord>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut protocols = Vec::new();
    let mut record: Option<ProtocolRecord> = None;
    let mut current_tag: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();

                if tag == "protocol" {
                    record = Some(ProtocolRecord::default());
                    current_tag = None;
                } else {
                    current_tag = Some(tag);
                }
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();

                if tag == "protocol" {
                    if let Some(record) = record.take() {
                        protocols.push(record);
                    }
                }
                current_tag = None;
            }
            Ok(Event::Text(ref e)) => {
                let val = e.unescape().context("invalid entity in response")?;

                if let (Some(tag), Some(record)) = (current_tag.as_deref(), record.as_mut()) {
                    match tag {
                        "type" => record.protocol_type = val.trim().to_string(),
                        "serverversion" => record.server_version = val.trim().to_string(),
                        "ewsurl" => record.ews_url = val.trim().to_string(),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!(
                "response XML error at position {}: {e}",
                reader.buffer_position()
            ),
            _ => (),
        }
    }

    Ok(protocols)
}
