//! Construction of the outbound Autodiscover request payload.

use anyhow::Result;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Namespace of the Autodiscover request document.
const REQUEST_SCHEMA: &str =
    "http://schemas.microsoft.com/exchange/autodiscover/outlook/requestschema/2006";

/// The only response schema this client accepts.
const ACCEPTABLE_RESPONSE_SCHEMA: &str =
    "http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a";

/// Builds the request document for the given mailbox address.
///
/// The payload does not depend on the probed URL, so it is built once
/// per discovery call and reused for every candidate. The mailbox
/// address gets standard XML escaping and nothing else.
pub(crate) fn build_request(email_address: &str) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    let mut root = BytesStart::new("Autodiscover");
    root.push_attribute(("xmlns", REQUEST_SCHEMA));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("Request")))?;

    writer.write_event(Event::Start(BytesStart::new("EMailAddress")))?;
    writer.write_event(Event::Text(BytesText::new(email_address)))?;
    writer.write_event(Event::End(BytesEnd::new("EMailAddress")))?;

    writer.write_event(Event::Start(BytesStart::new("AcceptableResponseSchema")))?;
    writer.write_event(Event::Text(BytesText::new(ACCEPTABLE_RESPONSE_SCHEMA)))?;
    writer.write_event(Event::End(BytesEnd::new("AcceptableResponseSchema")))?;

    writer.write_event(Event::End(BytesEnd::new("Request")))?;
    writer.write_event(Event::End(BytesEnd::new("Autodiscover")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}
