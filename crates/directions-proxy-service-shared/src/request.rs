//! Raw query parameters and their validation.
//!
//! The handlers deserialize query strings into the `*Params` structs below,
//! where every field is optional text. [`Validate`] then turns them into the
//! typed library queries, applying defaults, or fails with a 400 body before
//! any upstream call is made.

use serde::{Deserialize, Serialize};

use directions_proxy_lib::{DirectionsQuery, GeocodeQuery, Overview, TravelMode, Units};

use crate::error::{ErrorResponse, MSG_DIRECTIONS_REQUIRED, MSG_LATLNG_REQUIRED};

/// Validation trait for request parameter types.
pub trait Validate {
    /// The typed value produced by successful validation.
    type Output;

    /// Validate the parameters.
    ///
    /// Returns a boxed `ErrorResponse` to avoid large `Result::Err` variants.
    fn validate(&self) -> Result<Self::Output, Box<ErrorResponse>>;
}

/// Query parameters of `GET /directions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionsParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub mode: Option<String>,
    pub overview: Option<String>,
    pub units: Option<String>,
}

impl Validate for DirectionsParams {
    type Output = DirectionsQuery;

    fn validate(&self) -> Result<DirectionsQuery, Box<ErrorResponse>> {
        let (Some(origin), Some(destination)) = (
            present(self.origin.as_deref()),
            present(self.destination.as_deref()),
        ) else {
            return Err(Box::new(ErrorResponse::bad_request(
                MSG_DIRECTIONS_REQUIRED,
            )));
        };

        let mode = parse_optional::<TravelMode>(self.mode.as_deref())?;
        let overview = parse_optional::<Overview>(self.overview.as_deref())?;
        let units = parse_optional::<Units>(self.units.as_deref())?;

        Ok(DirectionsQuery::new(origin, destination)
            .with_mode(mode)
            .with_overview(overview)
            .with_units(units))
    }
}

impl DirectionsParams {
    /// Short label for the first failing field, used as a metric label.
    pub fn failure_reason(&self) -> &'static str {
        if present(self.origin.as_deref()).is_none() {
            "missing_origin"
        } else if present(self.destination.as_deref()).is_none() {
            "missing_destination"
        } else {
            "invalid_option"
        }
    }
}

/// Query parameters of `GET /geocode`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocodeParams {
    pub latlng: Option<String>,
}

impl Validate for GeocodeParams {
    type Output = GeocodeQuery;

    fn validate(&self) -> Result<GeocodeQuery, Box<ErrorResponse>> {
        match present(self.latlng.as_deref()) {
            Some(latlng) => Ok(GeocodeQuery::new(latlng)),
            None => Err(Box::new(ErrorResponse::bad_request(MSG_LATLNG_REQUIRED))),
        }
    }
}

/// Non-blank value of a parameter; the value itself is forwarded untrimmed.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse an optional enum parameter, falling back to its default when the
/// parameter is absent or blank.
fn parse_optional<T>(value: Option<&str>) -> Result<T, Box<ErrorResponse>>
where
    T: std::str::FromStr<Err = directions_proxy_lib::Error> + Default,
{
    match present(value) {
        None => Ok(T::default()),
        Some(raw) => raw.parse::<T>().map_err(|e| {
            let name = match &e {
                directions_proxy_lib::Error::InvalidParameter { name, .. } => *name,
                _ => "parameter",
            };
            Box::new(
                ErrorResponse::bad_request(format!("invalid {}", name)).with_details(e.to_string()),
            )
        }),
    }
}
