#![forbid(unsafe_code)]

//! Packing configuration.
//!
//! Every field affects packing output, so a [`PackConfig`] is part of any
//! reproducible fixture. Defaults describe a three-hour region measured in
//! minutes.
//!
//! # Sources
//!
//! - [`PackConfig::default()`]: the built-in constants.
//! - [`PackConfig::from_json`]: a JSON document; missing fields keep defaults.
//! - [`PackConfig::from_env`]: defaults overridden by `QUADPLAN_*` variables.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Weight that fills one full container (three hours in minutes).
pub const DEFAULT_BASE_WEIGHT: u32 = 180;
/// Smallest side a placed rect shrinks to.
pub const DEFAULT_MIN_SIDE: u16 = 8;
/// Largest fraction of a container dimension a single rect may span.
pub const DEFAULT_MAX_RATIO: f64 = 0.9;
/// Largest fraction of the container area a single item may request.
pub const DEFAULT_AREA_CAP: f64 = 0.8;
/// Free units required between any two placed rects.
pub const DEFAULT_OVERLAP_BUFFER: u16 = 1;
/// Aspect ratio for weights above the last band.
pub const DEFAULT_WIDE_RATIO: f64 = 2.0;

/// Width/height ratio applied to weights up to `max_weight`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectBand {
    pub max_weight: u32,
    pub ratio: f64,
}

impl AspectBand {
    pub const fn new(max_weight: u32, ratio: f64) -> Self {
        Self { max_weight, ratio }
    }
}

fn default_bands() -> Vec<AspectBand> {
    vec![
        AspectBand::new(30, 1.0),
        AspectBand::new(60, 1.25),
        AspectBand::new(120, 1.6),
    ]
}

/// Constants that drive dimension derivation and overlap testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub base_weight: u32,
    pub min_side: u16,
    pub max_ratio: f64,
    pub area_cap: f64,
    pub overlap_buffer: u16,
    /// Bands sorted by strictly increasing `max_weight`.
    pub aspect_bands: Vec<AspectBand>,
    pub wide_ratio: f64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            base_weight: DEFAULT_BASE_WEIGHT,
            min_side: DEFAULT_MIN_SIDE,
            max_ratio: DEFAULT_MAX_RATIO,
            area_cap: DEFAULT_AREA_CAP,
            overlap_buffer: DEFAULT_OVERLAP_BUFFER,
            aspect_bands: default_bands(),
            wide_ratio: DEFAULT_WIDE_RATIO,
        }
    }
}

impl PackConfig {
    /// Set the weight that fills one container.
    #[must_use]
    pub fn base_weight(mut self, base_weight: u32) -> Self {
        self.base_weight = base_weight;
        self
    }

    /// Set the minimum side length.
    #[must_use]
    pub fn min_side(mut self, min_side: u16) -> Self {
        self.min_side = min_side;
        self
    }

    /// Set the maximum fraction of a container dimension per rect.
    #[must_use]
    pub fn max_ratio(mut self, max_ratio: f64) -> Self {
        self.max_ratio = max_ratio;
        self
    }

    /// Set the maximum fraction of the container area per item.
    #[must_use]
    pub fn area_cap(mut self, area_cap: f64) -> Self {
        self.area_cap = area_cap;
        self
    }

    /// Set the spacing buffer between rects.
    #[must_use]
    pub fn overlap_buffer(mut self, overlap_buffer: u16) -> Self {
        self.overlap_buffer = overlap_buffer;
        self
    }

    /// Replace the aspect bands.
    #[must_use]
    pub fn aspect_bands(mut self, bands: impl IntoIterator<Item = AspectBand>) -> Self {
        self.aspect_bands = bands.into_iter().collect();
        self
    }

    /// Set the ratio used above the last band.
    #[must_use]
    pub fn wide_ratio(mut self, wide_ratio: f64) -> Self {
        self.wide_ratio = wide_ratio;
        self
    }

    /// Width/height ratio for an item of the given weight.
    pub fn aspect_ratio(&self, weight: u32) -> f64 {
        self.aspect_bands
            .iter()
            .find(|band| weight <= band.max_weight)
            .map_or(self.wide_ratio, |band| band.ratio)
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_weight == 0 {
            return Err(ConfigError::ZeroBaseWeight);
        }
        if self.min_side == 0 {
            return Err(ConfigError::ZeroMinSide);
        }
        for (field, value) in [("max_ratio", self.max_ratio), ("area_cap", self.area_cap)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::RatioOutOfRange { field, value });
            }
        }
        if !(self.wide_ratio.is_finite() && self.wide_ratio > 0.0) {
            return Err(ConfigError::RatioOutOfRange {
                field: "wide_ratio",
                value: self.wide_ratio,
            });
        }
        for (index, band) in self.aspect_bands.iter().enumerate() {
            if !(band.ratio.is_finite() && band.ratio > 0.0) {
                return Err(ConfigError::InvalidAspectBand {
                    index,
                    max_weight: band.max_weight,
                    ratio: band.ratio,
                });
            }
            if index > 0 && band.max_weight <= self.aspect_bands[index - 1].max_weight {
                return Err(ConfigError::UnsortedAspectBands { index });
            }
        }
        Ok(())
    }

    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables.
    ///
    /// Reads `QUADPLAN_BASE_WEIGHT`, `QUADPLAN_MIN_SIDE`, `QUADPLAN_MAX_RATIO`,
    /// `QUADPLAN_AREA_CAP` and `QUADPLAN_OVERLAP_BUFFER`. Unset variables keep
    /// their defaults; unparsable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = read_var(&lookup, "QUADPLAN_BASE_WEIGHT")? {
            config.base_weight = v;
        }
        if let Some(v) = read_var(&lookup, "QUADPLAN_MIN_SIDE")? {
            config.min_side = v;
        }
        if let Some(v) = read_var(&lookup, "QUADPLAN_MAX_RATIO")? {
            config.max_ratio = v;
        }
        if let Some(v) = read_var(&lookup, "QUADPLAN_AREA_CAP")? {
            config.area_cap = v;
        }
        if let Some(v) = read_var(&lookup, "QUADPLAN_OVERLAP_BUFFER")? {
            config.overlap_buffer = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn read_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVar { name, value: raw }),
    }
}
