//! Water, light, sky and wind parameters stored with a board.
//!
//! These are pure data: the board keeps them so renderers and editors
//! share one source of truth, but nothing here is evaluated in the core.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Radians};

/// Number of directional lights on a board.
pub const NUM_LIGHTS: usize = 2;

/// Water level meaning "no water on this board".
pub const NO_WATER: i8 = i8::MIN;

/// Water parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterParams {
    /// Level in heightfield units, [`NO_WATER`] for none.
    pub level: i8,
    /// RGB color.
    pub color: u32,
    /// Amplitude scale of the waves.
    #[serde(with = "fixed_serde")]
    pub amplitude: Fixed,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            level: NO_WATER,
            color: 0x00_32_32,
            amplitude: Fixed::from_num(25),
        }
    }
}

/// A directional light.
///
/// Azimuth zero points the light along positive x, increasing values
/// rotate counter-clockwise. Elevation zero is the horizon, pi/2 overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Azimuth about the board.
    pub azimuth: Radians,
    /// Elevation above the horizon.
    pub elevation: Radians,
    /// RGB diffuse color.
    pub diffuse_color: u32,
    /// RGB ambient color.
    pub ambient_color: u32,
}

/// Default lights: a white key light from the east and an unlit fill.
#[must_use]
pub fn default_lights() -> [DirectionalLight; NUM_LIGHTS] {
    [
        DirectionalLight {
            azimuth: Radians::ZERO,
            elevation: Radians::FRAC_PI_4,
            diffuse_color: 0xFF_FF_FF,
            ambient_color: 0x32_32_32,
        },
        DirectionalLight {
            azimuth: Radians::PI,
            elevation: Radians(-Fixed::FRAC_PI_4),
            diffuse_color: 0,
            ambient_color: 0,
        },
    ]
}

/// Sky dome parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkyParams {
    /// Color at the bottom of the dome.
    pub horizon_color: u32,
    /// Color at the top of the dome.
    pub overhead_color: u32,
    /// Exponential falloff between the two; higher fades faster.
    #[serde(with = "fixed_serde")]
    pub falloff: Fixed,
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            horizon_color: 0xFF_FF_FF,
            overhead_color: 0x00_FF_FF,
            falloff: Fixed::from_num(10),
        }
    }
}

/// Wind parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindParams {
    /// Direction the wind blows towards.
    pub direction: Radians,
    /// Wind speed.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            direction: Radians::ZERO,
            speed: Fixed::from_num(20),
        }
    }
}

/// Every environment parameter of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Water.
    pub water: WaterParams,
    /// Directional lights.
    pub lights: [DirectionalLight; NUM_LIGHTS],
    /// Sky dome.
    pub sky: SkyParams,
    /// Wind.
    pub wind: WindParams,
    /// Intensity of cast shadows, 0 to 1.
    #[serde(with = "fixed_serde")]
    pub shadow_intensity: Fixed,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            water: WaterParams::default(),
            lights: default_lights(),
            sky: SkyParams::default(),
            wind: WindParams::default(),
            shadow_intensity: Fixed::ONE,
        }
    }
}
