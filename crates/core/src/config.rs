//! Nesting configuration and its packed wire form.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration shared by the controller and the workers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NestConfig {
    /// Scale applied when converting to integer clipping coordinates.
    pub clipper_scale: f64,
    /// Maximum deviation when cleaning curves, in part units.
    pub curve_tolerance: f64,
    /// Gap kept between parts and between parts and the bin edge.
    pub spacing: f64,
    /// Number of rotation steps over a full turn.
    pub rotations: u32,
    /// Genetic search population size.
    pub population_size: usize,
    /// Per-gene mutation probability in percent.
    pub mutation_rate: u32,
    /// Allow parts to be placed inside holes of other parts.
    pub use_holes: bool,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            clipper_scale: 10_000_000.0,
            curve_tolerance: 0.3,
            spacing: 0.0,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            use_holes: false,
        }
    }
}

impl NestConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clipper_scale(mut self, scale: f64) -> Self {
        self.clipper_scale = scale;
        self
    }

    pub fn with_curve_tolerance(mut self, tolerance: f64) -> Self {
        self.curve_tolerance = tolerance;
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_rotations(mut self, rotations: u32) -> Self {
        self.rotations = rotations;
        self
    }

    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn with_mutation_rate(mut self, rate: u32) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_use_holes(mut self, use_holes: bool) -> Self {
        self.use_holes = use_holes;
        self
    }

    /// Checks that every field fits its packed bit width and that rotation
    /// indices fit the 4-bit fields of the NFP cache key.
    pub fn validate(&self) -> Result<()> {
        if self.rotations > MAX_KEYED_ROTATIONS {
            return Err(Error::ConfigError(format!(
                "rotations = {} exceeds the {} rotation indices a cache key can address",
                self.rotations, MAX_KEYED_ROTATIONS
            )));
        }
        if !(self.clipper_scale.is_finite() && self.clipper_scale > 0.0) {
            return Err(Error::ConfigError(format!(
                "clipper_scale = {} must be positive",
                self.clipper_scale
            )));
        }
        PackedConfig::try_from(self).map(|_| ())
    }
}

/// Rotation indices occupy 4 bits in the NFP cache key.
pub const MAX_KEYED_ROTATIONS: u32 = 16;

/// Bit layout of the packed configuration word.
///
/// | bits    | field                 |
/// |---------|-----------------------|
/// | 0..4    | curve tolerance x 10  |
/// | 4..9    | spacing               |
/// | 9..14   | rotations             |
/// | 14..21  | population size       |
/// | 21..28  | mutation rate         |
/// | 28..29  | use holes             |
const FIELDS: [(u32, u32); 6] = [(0, 4), (4, 5), (9, 5), (14, 7), (21, 7), (28, 1)];

/// Configuration fields as they travel inside job packets.
///
/// Spacing and tolerance lose precision in the packed form: spacing is an
/// integer and the tolerance is kept in tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedConfig {
    pub curve_tolerance_tenths: u32,
    pub spacing: u32,
    pub rotations: u32,
    pub population_size: u32,
    pub mutation_rate: u32,
    pub use_holes: bool,
}

impl PackedConfig {
    /// Packs the fields into one word.
    pub fn pack(&self) -> u32 {
        let values = self.values();
        FIELDS
            .iter()
            .zip(values)
            .fold(0u32, |word, (&(offset, width), value)| {
                word | ((value & field_mask(width)) << offset)
            })
    }

    /// Unpacks a word produced by [`PackedConfig::pack`].
    pub fn unpack(word: u32) -> Self {
        let field = |i: usize| {
            let (offset, width) = FIELDS[i];
            (word >> offset) & field_mask(width)
        };
        Self {
            curve_tolerance_tenths: field(0),
            spacing: field(1),
            rotations: field(2),
            population_size: field(3),
            mutation_rate: field(4),
            use_holes: field(5) == 1,
        }
    }

    fn values(&self) -> [u32; 6] {
        [
            self.curve_tolerance_tenths,
            self.spacing,
            self.rotations,
            self.population_size,
            self.mutation_rate,
            u32::from(self.use_holes),
        ]
    }

    /// Expands into a [`NestConfig`], taking the clipper scale from the caller
    /// since it is not part of the packed word.
    pub fn to_config(&self, clipper_scale: f64) -> NestConfig {
        NestConfig {
            clipper_scale,
            curve_tolerance: f64::from(self.curve_tolerance_tenths) / 10.0,
            spacing: f64::from(self.spacing),
            rotations: self.rotations,
            population_size: self.population_size as usize,
            mutation_rate: self.mutation_rate,
            use_holes: self.use_holes,
        }
    }
}

#[inline]
fn field_mask(width: u32) -> u32 {
    (1u32 << width) - 1
}

fn checked(name: &str, value: f64, width: u32) -> Result<u32> {
    let max = field_mask(width);
    if !value.is_finite() || value < 0.0 || value > f64::from(max) {
        return Err(Error::ConfigError(format!(
            "{} = {} does not fit in {} bits (max {})",
            name, value, width, max
        )));
    }
    Ok(value.round() as u32)
}

impl TryFrom<&NestConfig> for PackedConfig {
    type Error = Error;

    fn try_from(config: &NestConfig) -> Result<Self> {
        Ok(Self {
            curve_tolerance_tenths: checked(
                "curve_tolerance x 10",
                (config.curve_tolerance * 10.0).round(),
                FIELDS[0].1,
            )?,
            spacing: checked("spacing", config.spacing, FIELDS[1].1)?,
            rotations: checked("rotations", f64::from(config.rotations), FIELDS[2].1)?,
            population_size: checked(
                "population_size",
                config.population_size as f64,
                FIELDS[3].1,
            )?,
            mutation_rate: checked("mutation_rate", f64::from(config.mutation_rate), FIELDS[4].1)?,
            use_holes: config.use_holes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(NestConfig::default().validate().is_ok());
    }

    #[test]
    fn test_pack_round_trip() {
        let config = NestConfig::new()
            .with_curve_tolerance(0.7)
            .with_spacing(12.0)
            .with_rotations(8)
            .with_population_size(100)
            .with_mutation_rate(35)
            .with_use_holes(true);
        let packed = PackedConfig::try_from(&config).unwrap();
        let word = packed.pack();
        assert_eq!(PackedConfig::unpack(word), packed);

        let restored = packed.to_config(config.clipper_scale);
        assert_eq!(restored, config);
    }

    #[test]
    fn test_field_positions() {
        let packed = PackedConfig {
            curve_tolerance_tenths: 3,
            spacing: 0,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            use_holes: true,
        };
        let word = packed.pack();
        assert_eq!(word & 0xF, 3);
        assert_eq!((word >> 9) & 0x1F, 4);
        assert_eq!((word >> 14) & 0x7F, 10);
        assert_eq!((word >> 21) & 0x7F, 10);
        assert_eq!(word >> 28, 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(NestConfig::new().with_population_size(128).validate().is_err());
        assert!(NestConfig::new().with_spacing(32.0).validate().is_err());
        assert!(NestConfig::new().with_curve_tolerance(1.6).validate().is_err());
        assert!(NestConfig::new().with_rotations(16).validate().is_ok());
        assert!(NestConfig::new().with_rotations(17).validate().is_err());
        assert!(PackedConfig::try_from(&NestConfig::new().with_rotations(31)).is_ok());
    }
}
