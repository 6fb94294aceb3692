//! The closed set of supported institutions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::adapter::FormatAdapter;
use crate::document::Document;
use crate::error::{IngestError, Result};
use crate::parsers::{
    axis::AxisAdapter, central_bank::CentralBankAdapter, iob::IobAdapter, kotak::KotakAdapter,
    rbl::RblAdapter, sbi::SbiAdapter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Institution {
    Kotak,
    Sbi,
    CentralBank,
    Iob,
    Rbl,
    Axis,
}

impl Institution {
    pub const ALL: [Institution; 6] = [
        Institution::Kotak,
        Institution::Sbi,
        Institution::CentralBank,
        Institution::Iob,
        Institution::Rbl,
        Institution::Axis,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Institution::Kotak => "kotak",
            Institution::Sbi => "sbi",
            Institution::CentralBank => "central-bank",
            Institution::Iob => "iob",
            Institution::Rbl => "rbl",
            Institution::Axis => "axis",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Institution::Kotak => "Kotak Mahindra Bank",
            Institution::Sbi => "State Bank of India",
            Institution::CentralBank => "Central Bank of India",
            Institution::Iob => "Indian Overseas Bank",
            Institution::Rbl => "RBL Bank",
            Institution::Axis => "Axis Bank",
        }
    }

    /// Build this institution's adapter. Fails only if one of its patterns
    /// does not compile.
    pub fn adapter(&self) -> Result<Box<dyn FormatAdapter>> {
        let adapter: Box<dyn FormatAdapter> = match self {
            Institution::Kotak => Box::new(KotakAdapter::new()?),
            Institution::Sbi => Box::new(SbiAdapter::new()?),
            Institution::CentralBank => Box::new(CentralBankAdapter::new()?),
            Institution::Iob => Box::new(IobAdapter::new()?),
            Institution::Rbl => Box::new(RblAdapter::new()?),
            Institution::Axis => Box::new(AxisAdapter::new()?),
        };
        Ok(adapter)
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Institution {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Institution::ALL
            .into_iter()
            .find(|i| i.slug() == wanted)
            .ok_or_else(|| IngestError::UnknownInstitution {
                given: s.to_string(),
                expected: Institution::ALL.map(|i| i.slug()).join(", "),
            })
    }
}

/// Guess the institution from bank-name markers in the document header.
/// `Ok(None)` when no adapter recognises it.
pub fn detect_institution(document: &Document, header_lines: usize) -> Result<Option<Institution>> {
    let header = document.header_lines(header_lines).join("\n");
    for institution in Institution::ALL {
        if institution.adapter()?.detect(&header) {
            log::debug!("detected institution: {institution}");
            return Ok(Some(institution));
        }
    }
    Ok(None)
}
