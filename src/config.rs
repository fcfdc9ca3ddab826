//! Machine and pattern configuration.
//!
//! Loaded from a TOML file; every section and field is optional and falls
//! back to the defaults of the reference machine (85 mm workspace radius).

use crate::error::{Result, ToolpathError};
use crate::transform::DEFAULT_SHIFT;
use crate::types::LaserPower;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Workspace geometry and tessellation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Radius of the safe workspace disk (mm)
    pub radius: f64,
    /// Height of the workpiece added to absolute focal moves (mm)
    pub object_height: f64,
    /// Maximum deviation when flattening curves (mm)
    pub curve_tolerance: f64,
    /// Resolution of composited previews
    pub pixel_per_mm: u32,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            radius: 85.0,
            object_height: 0.0,
            curve_tolerance: 0.1,
            pixel_per_mm: 10,
        }
    }
}

/// Alignment logo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoSettings {
    pub speed: f64,
    /// Speed of travel moves and of the alignment pass
    pub travel_speed: f64,
    pub alignment_power: LaserPower,
    pub power: LaserPower,
    pub shift_x: f64,
    pub shift_y: f64,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self {
            speed: 300.0,
            travel_speed: 400.0,
            alignment_power: LaserPower(253),
            power: LaserPower::MAX,
            shift_x: DEFAULT_SHIFT.x,
            shift_y: DEFAULT_SHIFT.y,
        }
    }
}

/// Bed grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Distance between chords of the same set; the second set sits half a
    /// pitch off the first
    pub pitch: u32,
    pub speed: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            pitch: 10,
            speed: 300.0,
        }
    }
}

/// Focal sweep settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocalSettings {
    pub focal_max: f64,
    /// Exclusive lower bound of the sweep
    pub focal_min: f64,
    pub focal_step: f64,
    /// Test ticks per row
    pub batch: usize,
    pub row_length: f64,
    pub row_pitch: f64,
    pub speed: f64,
}

impl Default for FocalSettings {
    fn default() -> Self {
        Self {
            focal_max: 10.0,
            focal_min: 0.1,
            focal_step: 0.02,
            batch: 50,
            row_length: 30.0,
            row_pitch: 5.0,
            speed: 300.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub machine: MachineSettings,
    pub logo: LogoSettings,
    pub grid: GridSettings,
    pub focal: FocalSettings,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| ToolpathError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ToolpathError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ToolpathError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.machine.radius > 0.0) {
            return Err(ToolpathError::Config(format!(
                "machine.radius must be positive, got {}",
                self.machine.radius
            )));
        }
        if !(self.machine.curve_tolerance > 0.0) {
            return Err(ToolpathError::Config(
                "machine.curve_tolerance must be positive".to_string(),
            ));
        }
        if self.machine.pixel_per_mm == 0 {
            return Err(ToolpathError::Config(
                "machine.pixel_per_mm must be positive".to_string(),
            ));
        }
        if self.grid.pitch < 2 {
            return Err(ToolpathError::Config(format!(
                "grid.pitch must be at least 2, got {}",
                self.grid.pitch
            )));
        }
        if !(self.focal.focal_step > 0.0) || self.focal.focal_min >= self.focal.focal_max {
            return Err(ToolpathError::Config(format!(
                "focal sweep {} -> {} by {} is empty",
                self.focal.focal_max, self.focal.focal_min, self.focal.focal_step
            )));
        }
        if self.focal.batch == 0 {
            return Err(ToolpathError::Config("focal.batch must be positive".to_string()));
        }
        Ok(())
    }
}
