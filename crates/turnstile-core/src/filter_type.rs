//! Filter roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role a filter plays in the pipeline.
///
/// The role decides which stage may select the filter:
///
/// | Type | Wire name | Stage |
/// |------|-----------|-------|
/// | [`Inbound`](Self::Inbound) | `pre` | inbound, all filters in order |
/// | [`Route`](Self::Route) | `route` | endpoint, selected by name |
/// | [`Endpoint`](Self::Endpoint) | `end` | endpoint, selected by name |
/// | [`Outbound`](Self::Outbound) | `post` | outbound, all filters in order |
///
/// # Example
///
/// ```
/// use turnstile_core::FilterType;
///
/// let t: FilterType = "pre".parse().unwrap();
/// assert_eq!(t, FilterType::Inbound);
/// assert_eq!(FilterType::Endpoint.to_string(), "end");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    /// Runs before the endpoint.
    #[serde(rename = "pre")]
    Inbound,
    /// Routing endpoint.
    #[serde(rename = "route")]
    Route,
    /// Runs after the endpoint, on the response.
    #[serde(rename = "post")]
    Outbound,
    /// Endpoint or error endpoint; produces the response.
    #[serde(rename = "end")]
    Endpoint,
}

impl FilterType {
    /// Returns the wire name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "pre",
            Self::Route => "route",
            Self::Outbound => "post",
            Self::Endpoint => "end",
        }
    }

    /// Returns true if filters of this type may be selected by the endpoint stage.
    #[must_use]
    pub const fn is_endpoint_role(self) -> bool {
        matches!(self, Self::Endpoint | Self::Route)
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter type `{0}` (expected one of: pre, route, post, end)")]
pub struct ParseFilterTypeError(pub String);

impl FromStr for FilterType {
    type Err = ParseFilterTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre" => Ok(Self::Inbound),
            "route" => Ok(Self::Route),
            "post" => Ok(Self::Outbound),
            "end" => Ok(Self::Endpoint),
            _ => Err(ParseFilterTypeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        for t in [
            FilterType::Inbound,
            FilterType::Route,
            FilterType::Outbound,
            FilterType::Endpoint,
        ] {
            assert_eq!(t.to_string().parse::<FilterType>(), Ok(t));
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(" POST ".parse::<FilterType>(), Ok(FilterType::Outbound));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "error".parse::<FilterType>().unwrap_err();
        assert!(err.to_string().contains("error"));
    }

    #[test]
    fn test_endpoint_role() {
        assert!(FilterType::Endpoint.is_endpoint_role());
        assert!(FilterType::Route.is_endpoint_role());
        assert!(!FilterType::Inbound.is_endpoint_role());
        assert!(!FilterType::Outbound.is_endpoint_role());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&FilterType::Endpoint).unwrap();
        assert_eq!(json, "\"end\"");
        let parsed: FilterType = serde_json::from_str("\"pre\"").unwrap();
        assert_eq!(parsed, FilterType::Inbound);
    }
}
