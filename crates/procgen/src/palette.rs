//! Color tables for hilt finishes and blade colors.

use engine_core::Color3;

use crate::saber_catalog::{BladeColor, PartColor};

/// Base diffuse color of a hilt finish.
pub fn part_color(color: PartColor) -> Color3 {
    match color {
        PartColor::Gray => Color3::new(0.4, 0.4, 0.4),
        PartColor::Gold => Color3::new(0.8, 0.6, 0.2),
        PartColor::Silver => Color3::new(0.7, 0.7, 0.8),
        PartColor::Black => Color3::new(0.1, 0.1, 0.1),
        PartColor::Bronze => Color3::new(0.6, 0.4, 0.2),
        PartColor::Brown => Color3::new(0.6, 0.35, 0.15),
        PartColor::Chrome => Color3::new(0.9, 0.9, 1.0),
    }
}

/// Nominal blade color. For [`BladeColor::Unstable`] the blade material ignores this entry
/// and uses [`UNSTABLE_EMISSIVE`] / [`UNSTABLE_DIFFUSE`].
pub fn blade_color(color: BladeColor) -> Color3 {
    match color {
        BladeColor::Blue => Color3::new(0.0, 0.5, 1.0),
        BladeColor::Red => Color3::new(1.0, 0.0, 0.0),
        BladeColor::Green => Color3::new(0.0, 1.0, 0.0),
        BladeColor::Purple => Color3::new(0.8, 0.0, 1.0),
        BladeColor::Yellow => Color3::new(1.0, 1.0, 0.0),
        BladeColor::White => Color3::new(1.0, 1.0, 1.0),
        BladeColor::Orange => Color3::new(1.0, 0.5, 0.0),
        BladeColor::Unstable => Color3::new(1.0, 0.2, 0.2),
    }
}

pub const UNSTABLE_EMISSIVE: Color3 = Color3::new(1.0, 0.3, 0.3);
pub const UNSTABLE_DIFFUSE: Color3 = Color3::new(1.0, 0.1, 0.1);

/// Neutral finish for grip cores that ignore the selected part color.
pub const GRIP_CORE: Color3 = Color3::gray(0.3);

pub const POMMEL_SPECULAR: Color3 = Color3::gray(0.6);
pub const EMITTER_SPECULAR: Color3 = Color3::gray(0.8);
/// Matte cloth/leather highlights.
pub const CLOTH_SPECULAR: Color3 = Color3::gray(0.05);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_entry_has_a_color() {
        for &c in PartColor::ALL {
            let rgb = part_color(c);
            assert!(rgb.r <= 1.0 && rgb.g <= 1.0 && rgb.b <= 1.0);
        }
        for &c in BladeColor::ALL {
            assert_ne!(blade_color(c), Color3::BLACK);
        }
    }

    #[test]
    fn unstable_table_entry_differs_from_override() {
        assert_eq!(blade_color(BladeColor::Unstable), Color3::new(1.0, 0.2, 0.2));
        assert_ne!(blade_color(BladeColor::Unstable).scale(0.8), UNSTABLE_EMISSIVE);
    }
}
