//! Tracker configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tracker::detection::ReferenceSpot;

/// Configuration for the [`Tracker`](crate::tracker::Tracker).
///
/// Serde names follow the FastTrack parameter keys so a `[parameters]` table
/// can be deserialized as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(rename = "spot", alias = "referenceSpot")]
    pub reference_spot: ReferenceSpot,
    /// Distance normalization; `0` disables the distance term.
    #[serde(rename = "normDist")]
    pub norm_dist: f64,
    /// Angle normalization in radians; `0` disables the angle term.
    #[serde(rename = "normAngle")]
    pub norm_angle: f64,
    #[serde(rename = "normArea")]
    pub norm_area: f64,
    #[serde(rename = "normPerim")]
    pub norm_perim: f64,
    /// Pairs at least this far apart are never matched.
    #[serde(rename = "maxDist")]
    pub max_dist: f64,
    /// Consecutive unmatched frames tolerated before a track is evicted.
    #[serde(rename = "maxTime")]
    pub max_time: u32,
}

impl TrackerConfig {
    pub const SPOT: &'static str = "spot";
    pub const REFERENCE_SPOT: &'static str = "referenceSpot";
    pub const NORM_DIST: &'static str = "normDist";
    pub const NORM_ANGLE: &'static str = "normAngle";
    pub const NORM_AREA: &'static str = "normArea";
    pub const NORM_PERIM: &'static str = "normPerim";
    pub const MAX_DIST: &'static str = "maxDist";
    pub const MAX_TIME: &'static str = "maxTime";

    /// Build a configuration from a flat key/value map.
    ///
    /// Unrelated keys (detector settings, paths...) are ignored.
    pub fn from_map(params: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let spot_raw = params
            .get(Self::SPOT)
            .or_else(|| params.get(Self::REFERENCE_SPOT))
            .ok_or_else(|| ConfigError::MissingParameter(Self::SPOT.to_string()))?;
        let reference_spot = spot_raw
            .parse::<ReferenceSpot>()
            .map_err(|reason| ConfigError::invalid(Self::SPOT, spot_raw, reason))?;

        let config = Self {
            reference_spot,
            norm_dist: parse_f64(params, Self::NORM_DIST)?,
            norm_angle: parse_f64(params, Self::NORM_ANGLE)?,
            norm_area: parse_f64(params, Self::NORM_AREA)?,
            norm_perim: parse_f64(params, Self::NORM_PERIM)?,
            max_dist: parse_f64(params, Self::MAX_DIST)?,
            max_time: parse_count(params, Self::MAX_TIME)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges. Called by [`Tracker::new`](crate::tracker::Tracker::new).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            (Self::NORM_DIST, self.norm_dist),
            (Self::NORM_ANGLE, self.norm_angle),
            (Self::NORM_AREA, self.norm_area),
            (Self::NORM_PERIM, self.norm_perim),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    key,
                    value,
                    "must be a finite, non-negative number",
                ));
            }
        }
        // An infinite gate is allowed and disables the distance cut-off.
        if self.max_dist.is_nan() || self.max_dist < 0.0 {
            return Err(ConfigError::invalid(
                Self::MAX_DIST,
                self.max_dist,
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

fn lookup<'a>(params: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConfigError> {
    params
        .get(key)
        .map(|v| v.trim())
        .ok_or_else(|| ConfigError::MissingParameter(key.to_string()))
}

pub(crate) fn parse_f64(params: &HashMap<String, String>, key: &str) -> Result<f64, ConfigError> {
    let raw = lookup(params, key)?;
    raw.parse::<f64>()
        .map_err(|e| ConfigError::invalid(key, raw, e.to_string()))
}

/// Non-negative integer; integral floats such as `10.0` are accepted.
pub(crate) fn parse_count(params: &HashMap<String, String>, key: &str) -> Result<u32, ConfigError> {
    let raw = lookup(params, key)?;
    if let Ok(value) = raw.parse::<u32>() {
        return Ok(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => {
            Ok(value as u32)
        }
        _ => Err(ConfigError::invalid(
            key,
            raw,
            "must be a non-negative integer",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> HashMap<String, String> {
        [
            ("spot", "0"),
            ("normDist", "1"),
            ("normAngle", "1.5707963"),
            ("normArea", "0"),
            ("normPerim", "0"),
            ("maxDist", "50"),
            ("maxTime", "10"),
            ("thresh", "40"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_from_map() {
        let config = TrackerConfig::from_map(&params()).unwrap();
        assert_eq!(config.reference_spot, ReferenceSpot::Head);
        assert_eq!(config.norm_dist, 1.0);
        assert_eq!(config.max_dist, 50.0);
        assert_eq!(config.max_time, 10);
    }

    #[test]
    fn test_reference_spot_alias() {
        let mut p = params();
        p.remove("spot");
        p.insert("referenceSpot".into(), "body".into());
        let config = TrackerConfig::from_map(&p).unwrap();
        assert_eq!(config.reference_spot, ReferenceSpot::Body);
    }

    #[test]
    fn test_missing_key_rejected() {
        for key in ["spot", "normDist", "normAngle", "normArea", "normPerim", "maxDist", "maxTime"] {
            let mut p = params();
            p.remove(key);
            assert_eq!(
                TrackerConfig::from_map(&p),
                Err(ConfigError::MissingParameter(key.to_string()))
            );
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            ("normDist", "abc"),
            ("normArea", "-1"),
            ("maxDist", "-3"),
            ("maxTime", "2.5"),
            ("maxTime", "-1"),
            ("spot", "3"),
        ];
        for (key, value) in cases {
            let mut p = params();
            p.insert(key.to_string(), value.to_string());
            let err = TrackerConfig::from_map(&p).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidParameter { key: k, .. } if k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_integral_float_max_time() {
        let mut p = params();
        p.insert("maxTime".into(), "12.0".into());
        assert_eq!(TrackerConfig::from_map(&p).unwrap().max_time, 12);
    }

    #[test]
    fn test_serde_keys() {
        let json = r#"{"spot":"tail","normDist":2.0,"normAngle":0.5,"normArea":0.0,
            "normPerim":0.0,"maxDist":30.0,"maxTime":5}"#;
        let config: TrackerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.reference_spot, ReferenceSpot::Tail);
        assert_eq!(config.max_time, 5);
    }
}
