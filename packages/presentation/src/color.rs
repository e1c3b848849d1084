//! Sequential color scales for choropleth and bar charts.

use flood_impact_models::Variable;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Fill for regions without data. Not part of any palette.
pub const NO_DATA_COLOR: &str = "#D3D3D3";

/// A six-stop sequential palette, light to dark.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColorScale {
    /// Economic damages.
    Greens,
    /// Population affected.
    Purples,
    /// Flooded area and precipitation.
    Blues,
    /// Flood counts.
    Reds,
}

impl ColorScale {
    /// Default palette for a variable.
    #[must_use]
    pub const fn for_variable(variable: Variable) -> Self {
        match variable {
            Variable::Damage => Self::Greens,
            Variable::PopulationAffected => Self::Purples,
            Variable::FloodCount => Self::Reds,
            Variable::FloodedArea | Variable::Precipitation | Variable::ExtremePrecipitation => {
                Self::Blues
            }
        }
    }

    const fn stops(self) -> [u32; 6] {
        match self {
            Self::Greens => [0xE8_F5_E9, 0x81_C7_84, 0x66_BB_6A, 0x4C_AF_50, 0x38_8E_3C, 0x1B_5E_20],
            Self::Purples => [0xF3_E5_F5, 0xCE_93_D8, 0xBA_68_C8, 0xAB_47_BC, 0x8E_24_AA, 0x6A_1B_9A],
            Self::Blues => [0xE3_F2_FD, 0x90_CA_F9, 0x42_A5_F5, 0x1E_88_E5, 0x15_65_C0, 0x0D_47_A1],
            Self::Reds => [0xFF_EB_EE, 0xEF_9A_9A, 0xE5_73_73, 0xEF_53_50, 0xE5_39_35, 0xC6_28_28],
        }
    }

    /// The palette's stops as `#RRGGBB` strings.
    #[must_use]
    pub fn hex_stops(self) -> Vec<String> {
        self.stops().into_iter().map(rgb).map(hex).collect()
    }

    /// Color at position `t` in `[0, 1]`, linearly interpolated between
    /// stops. Out-of-range and NaN positions are clamped.
    #[must_use]
    pub fn color_at(self, t: f64) -> String {
        let stops = self.stops();
        let segments = stops.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        #[allow(clippy::cast_precision_loss)]
        let position = t * segments as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (position.floor() as usize).min(segments - 1);
        #[allow(clippy::cast_precision_loss)]
        let fraction = position - index as f64;

        let from = rgb(stops[index]);
        let to = rgb(stops[index + 1]);
        let mut mixed = [0_u8; 3];
        for (channel, out) in mixed.iter_mut().enumerate() {
            *out = lerp(from[channel], to[channel], fraction);
        }
        hex(mixed)
    }

    /// Color for `value` on a scale spanning `lo..=hi`.
    ///
    /// A degenerate span (all values equal) maps to the palette midpoint.
    #[must_use]
    pub fn color_for(self, value: f64, lo: f64, hi: f64) -> String {
        let span = hi - lo;
        if span <= 0.0 || !span.is_finite() {
            return self.color_at(0.5);
        }
        self.color_at((value - lo) / span)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Greens, Self::Purples, Self::Blues, Self::Reds]
    }
}

const fn rgb(stop: u32) -> [u8; 3] {
    let [_, r, g, b] = stop.to_be_bytes();
    [r, g, b]
}

fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp(from: u8, to: u8, fraction: f64) -> u8 {
    let from = f64::from(from);
    let to = f64::from(to);
    (to - from).mul_add(fraction, from).round().clamp(0.0, 255.0) as u8
}
