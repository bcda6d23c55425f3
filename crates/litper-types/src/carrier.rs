use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LitperError;

/// Shipping companies whose reports the operations team receives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Carrier {
    Interrapidisimo,
    Envia,
    Coordinadora,
    Tcc,
    Servientrega,
    Deprisa,
    #[default]
    Unknown,
}

impl Carrier {
    pub const ALL: [Carrier; 7] = [
        Carrier::Interrapidisimo,
        Carrier::Envia,
        Carrier::Coordinadora,
        Carrier::Tcc,
        Carrier::Servientrega,
        Carrier::Deprisa,
        Carrier::Unknown,
    ];

    /// Name as printed on carrier reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Carrier::Interrapidisimo => "Interrapidísimo",
            Carrier::Envia => "Envía",
            Carrier::Coordinadora => "Coordinadora",
            Carrier::Tcc => "TCC",
            Carrier::Servientrega => "Servientrega",
            Carrier::Deprisa => "Deprisa",
            Carrier::Unknown => "Desconocida",
        }
    }

    pub fn is_known(self) -> bool {
        self != Carrier::Unknown
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Countries the operation ships in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Country {
    #[default]
    Colombia,
    Chile,
    Ecuador,
}

impl Country {
    /// International dialing prefix without the leading `+`.
    pub fn dialing_code(self) -> &'static str {
        match self {
            Country::Colombia => "57",
            Country::Chile => "56",
            Country::Ecuador => "593",
        }
    }

    /// Expected length of a national mobile number once separators are removed.
    pub fn mobile_len(self) -> usize {
        match self {
            Country::Colombia => 10,
            Country::Chile => 9,
            Country::Ecuador => 10,
        }
    }

    /// Leading digits every national mobile number starts with.
    pub fn mobile_prefix(self) -> &'static str {
        match self {
            Country::Colombia => "3",
            Country::Chile => "9",
            Country::Ecuador => "09",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Country::Colombia => "Colombia",
            Country::Chile => "Chile",
            Country::Ecuador => "Ecuador",
        };
        f.write_str(name)
    }
}

impl FromStr for Country {
    type Err = LitperError;

    /// Accepts the name or the ISO code, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "co" | "colombia" => Ok(Country::Colombia),
            "cl" | "chile" => Ok(Country::Chile),
            "ec" | "ecuador" => Ok(Country::Ecuador),
            other => Err(LitperError::InvalidInput(format!("Unknown country: {other}"))),
        }
    }
}
