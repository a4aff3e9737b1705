//! Typed upstream queries.
//!
//! [`DirectionsQuery`] and [`GeocodeQuery`] carry already-validated values.
//! They render themselves into the query string sent upstream, with every
//! value percent-encoded the way browsers encode a URI component (space
//! becomes `%20`, not `+`).

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Characters left unescaped in a URI component: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single query value.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

macro_rules! query_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $param:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            const ACCEPTED: &'static str = concat!($($text, ", "),+);

            /// Every accepted value, comma separated, for error messages.
            pub fn expected() -> &'static str {
                Self::ACCEPTED.trim_end_matches([',', ' '])
            }

            /// Wire value sent upstream.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(Error::InvalidParameter {
                        name: $param,
                        value: s.to_string(),
                        expected: Self::expected(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

query_enum! {
    /// Travel mode for a directions lookup.
    TravelMode, "mode" {
        #[default]
        Driving => "driving",
        Walking => "walking",
        Bicycling => "bicycling",
        Transit => "transit",
    }
}

query_enum! {
    /// Polyline detail level.
    Overview, "overview" {
        #[default]
        Full => "full",
        Simplified => "simplified",
    }
}

query_enum! {
    /// Unit system for distances in the upstream response text.
    Units, "units" {
        #[default]
        Metric => "metric",
        Imperial => "imperial",
    }
}

/// A directions lookup between two free-form locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionsQuery {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default)]
    pub overview: Overview,
    #[serde(default)]
    pub units: Units,
}

impl DirectionsQuery {
    /// Create a query with default mode, overview, and units.
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            mode: TravelMode::default(),
            overview: Overview::default(),
            units: Units::default(),
        }
    }

    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_overview(mut self, overview: Overview) -> Self {
        self.overview = overview;
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Render the upstream query string, injecting `api_key`.
    pub fn to_query_string(&self, api_key: &str) -> String {
        format!(
            "origin={}&destination={}&key={}&mode={}&overview={}&units={}",
            encode_component(&self.origin),
            encode_component(&self.destination),
            encode_component(api_key),
            encode_component(self.mode.as_str()),
            encode_component(self.overview.as_str()),
            encode_component(self.units.as_str()),
        )
    }
}

/// A reverse-geocoding lookup for a `"lat,lng"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeQuery {
    pub latlng: String,
}

impl GeocodeQuery {
    pub fn new(latlng: impl Into<String>) -> Self {
        Self {
            latlng: latlng.into(),
        }
    }

    /// Render the upstream query string, injecting `api_key`.
    pub fn to_query_string(&self, api_key: &str) -> String {
        format!(
            "latlng={}&key={}",
            encode_component(&self.latlng),
            encode_component(api_key)
        )
    }
}
