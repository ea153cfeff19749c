use crate::error::{CpError, Result};
use crate::projection::AreaProjection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the OpenRouteService key when the config file has none.
pub const ORS_API_KEY_ENV: &str = "ORS_API_KEY";

/// Runtime configuration, usually loaded from a TOML file. Every section and
/// key is optional and falls back to the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub geocoder: GeocoderConfig,
    pub isochrone: IsochroneConfig,
    pub overpass: OverpassConfig,
    pub area: AreaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_candidates: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub cache_size: usize,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "CP_selection".to_string(),
            timeout_secs: 300,
            cache_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochroneConfig {
    pub url: String,
    pub profile: String,
    pub api_key: Option<String>,
    pub smoothing: f64,
    pub timeout_secs: u64,
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openrouteservice.org".to_string(),
            profile: "foot-walking".to_string(),
            api_key: None,
            smoothing: 0.85,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverpassConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: "https://overpass-api.de/api/interpreter".to_string(),
            timeout_secs: 500,
        }
    }
}

/// Planar CRS used to size parking hulls. Without an EPSG code the hull is
/// projected onto a local equal-area plane centred on itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    pub epsg: Option<u32>,
}

impl AreaConfig {
    pub fn projection(&self) -> Result<AreaProjection> {
        match self.epsg {
            None => Ok(AreaProjection::LocalEqualArea),
            Some(code) if cfg!(feature = "proj") => Ok(AreaProjection::Epsg(code)),
            Some(code) => Err(CpError::Config(format!(
                "area.epsg = {} needs the `proj` feature",
                code
            ))),
        }
    }
}

impl Config {
    /// Load a TOML config file and fill the API key from the environment when missing.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)
            .map_err(|e| CpError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(contents).map_err(|e| CpError::Config(e.to_string()))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if self.isochrone.api_key.is_none() {
            if let Ok(key) = std::env::var(ORS_API_KEY_ENV) {
                if !key.trim().is_empty() {
                    self.isochrone.api_key = Some(key.trim().to_string());
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.max_candidates == 0 {
            return Err(CpError::Config(
                "search.max_candidates must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.isochrone.smoothing) {
            return Err(CpError::Config(format!(
                "isochrone.smoothing must be within [0, 100], got {}",
                self.isochrone.smoothing
            )));
        }
        for (name, secs) in [
            ("geocoder.timeout_secs", self.geocoder.timeout_secs),
            ("isochrone.timeout_secs", self.isochrone.timeout_secs),
            ("overpass.timeout_secs", self.overpass.timeout_secs),
        ] {
            if secs == 0 {
                return Err(CpError::Config(format!("{} must be positive", name)));
            }
        }
        if self.geocoder.cache_size == 0 {
            return Err(CpError::Config(
                "geocoder.cache_size must be at least 1".to_string(),
            ));
        }
        self.area.projection()?;
        Ok(())
    }
}

pub(crate) fn timeout(secs: u64) -> Duration {
    Duration::from_secs(secs)
}
