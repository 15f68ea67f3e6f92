//! Decoding of the Exchange `ServerVersion` token.

use anyhow::{bail, Context as _, Result};
use strum_macros::Display;

/// Exchange server release lineage, as reported by Autodiscover.
///
/// `Display` renders the canonical label, e.g. `Exchange2010_SP1`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeVersion {
    /// Exchange 2007 RTM.
    Exchange2007,

    /// Exchange 2007 SP1 and later service packs.
    #[strum(serialize = "Exchange2007_SP1")]
    Exchange2007Sp1,

    /// Exchange 2010 RTM.
    Exchange2010,

    /// Exchange 2010 SP1.
    #[strum(serialize = "Exchange2010_SP1")]
    Exchange2010Sp1,

    /// Exchange 2010 SP2 and SP3.
    #[strum(serialize = "Exchange2010_SP2")]
    Exchange2010Sp2,

    /// Exchange 2013 RTM.
    Exchange2013,

    /// Exchange 2013 SP1.
    #[strum(serialize = "Exchange2013_SP1")]
    Exchange2013Sp1,

    /// Exchange 2016, also reported by Office 365 mailboxes.
    Exchange2016,

    /// Exchange 2019.
    Exchange2019,
}

impl ExchangeVersion {
    /// Decodes the hexadecimal `ServerVersion` token from an EXCH
    /// protocol record.
    ///
    /// The encoding is not documented by the vendor; the field layout
    /// and the mapping below reproduce observed server behaviour.
    pub fn from_server_version(raw: &str) -> Result<Self> {
        let value = u32::from_str_radix(raw, 16)
            .with_context(|| format!("invalid ServerVersion token {raw:?}"))?;

        // Counted from the most significant bit: 4 unused bits, 6-bit
        // major, 6-bit minor, 1 unused bit, 15-bit build number.
        let major = (value >> 22) & 0x3f;
        let minor = (value >> 16) & 0x3f;
        let build = value & 0x7fff;

        match (major, minor) {
            (8, 0) => Ok(Self::Exchange2007),
            (8, 1..=3) => Ok(Self::Exchange2007Sp1),
            (14, 0) => Ok(Self::Exchange2010),
            (14, 1) => Ok(Self::Exchange2010Sp1),
            (14, 2..=3) => Ok(Self::Exchange2010Sp2),
            // Builds starting from 847 are Exchange2013_SP1.
            (15, 0) if build >= 847 => Ok(Self::Exchange2013Sp1),
            (15, 0) => Ok(Self::Exchange2013),
            (15, 1) => Ok(Self::Exchange2016),
            (15, 2) => Ok(Self::Exchange2019),
            // Office 365 reports this minor but runs the 2016 release.
            (15, 20) => Ok(Self::Exchange2016),
            (8 | 14 | 15, minor) => bail!("unknown minor version {minor}"),
            (major, _) => bail!("unknown major version {major}"),
        }
    }
}
