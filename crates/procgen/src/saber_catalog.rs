//! The fixed saber part catalog: every selectable part type and color.
//!
//! Wire names are the lowercase variant names (`"basic"`, `"unstable"`, ...). Parsing is
//! case-insensitive and ignores surrounding whitespace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error for a name that is not a member of a catalog enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    pub catalog: &'static str,
    pub name: String,
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.catalog, self.name)
    }
}

impl std::error::Error for UnknownName {}

macro_rules! catalog_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal, default = $default:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Every member, in menu order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Case-insensitive lookup by wire name.
            pub fn parse(name: &str) -> Option<Self> {
                let name = name.trim();
                Self::ALL.iter().copied().find(|v| v.as_str().eq_ignore_ascii_case(name))
            }

            /// Lookup by wire name, falling back to the default member.
            pub fn parse_or_default(name: &str) -> Self {
                Self::parse(name).unwrap_or_else(|| {
                    log::debug!("Unknown {} '{}', using '{}'", $label, name, Self::default().as_str());
                    Self::default()
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| UnknownName {
                    catalog: $label,
                    name: s.to_string(),
                })
            }
        }
    };
}

catalog_enum! {
    /// The four structural slots of a saber.
    PartKind, "part kind", default = Pommel {
        Pommel => "pommel",
        Grip => "grip",
        Emitter => "emitter",
        Blade => "blade",
    }
}

catalog_enum! {
    PommelType, "pommel type", default = Basic {
        Basic => "basic",
        Spiked => "spiked",
        Rounded => "rounded",
        Heavy => "heavy",
        Curved => "curved",
        Ceremonial => "ceremonial",
        Coiled => "coiled",
        Layered => "layered",
    }
}

catalog_enum! {
    GripType, "grip type", default = Smooth {
        Smooth => "smooth",
        Ribbed => "ribbed",
        Segmented => "segmented",
        Textured => "textured",
        Curved => "curved",
        Grooved => "grooved",
        Wrapped => "wrapped",
    }
}

impl GripType {
    /// Grips offered by random configurations. `Wrapped` is only selectable by name.
    pub const RANDOM: &'static [GripType] = &[
        GripType::Smooth,
        GripType::Ribbed,
        GripType::Segmented,
        GripType::Textured,
        GripType::Curved,
        GripType::Grooved,
    ];
}

catalog_enum! {
    EmitterType, "emitter type", default = Standard {
        Standard => "standard",
        Wide => "wide",
        Focused => "focused",
        Shroud => "shroud",
        Dual => "dual",
        Crossguard => "crossguard",
        Complex => "complex",
        Layered => "layered",
    }
}

catalog_enum! {
    /// Blade color. `Unstable` is a red, flickering variant with extra geometry.
    BladeColor, "blade color", default = Blue {
        Blue => "blue",
        Red => "red",
        Green => "green",
        Purple => "purple",
        Yellow => "yellow",
        White => "white",
        Orange => "orange",
        Unstable => "unstable",
    }
}

catalog_enum! {
    /// Hilt finish for the pommel, grip and emitter.
    PartColor, "part color", default = Gray {
        Gray => "gray",
        Gold => "gold",
        Silver => "silver",
        Black => "black",
        Bronze => "bronze",
        Brown => "brown",
        Chrome => "chrome",
    }
}

/// Hilt parts that carry a [`PartColor`]. The blade is colored by [`BladeColor`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    Pommel,
    Grip,
    Emitter,
}

impl ColorSlot {
    pub const ALL: [ColorSlot; 3] = [ColorSlot::Pommel, ColorSlot::Grip, ColorSlot::Emitter];

    pub fn from_kind(kind: PartKind) -> Option<Self> {
        match kind {
            PartKind::Pommel => Some(Self::Pommel),
            PartKind::Grip => Some(Self::Grip),
            PartKind::Emitter => Some(Self::Emitter),
            PartKind::Blade => None,
        }
    }

    pub fn kind(self) -> PartKind {
        match self {
            Self::Pommel => PartKind::Pommel,
            Self::Grip => PartKind::Grip,
            Self::Emitter => PartKind::Emitter,
        }
    }
}

/// A concrete catalog choice for one part kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartSelection {
    Pommel(PommelType),
    Grip(GripType),
    Emitter(EmitterType),
    Blade(BladeColor),
}

impl PartSelection {
    /// Resolve a type name for `kind`; unknown names select that kind's default.
    pub fn parse(kind: PartKind, name: &str) -> Self {
        match kind {
            PartKind::Pommel => Self::Pommel(PommelType::parse_or_default(name)),
            PartKind::Grip => Self::Grip(GripType::parse_or_default(name)),
            PartKind::Emitter => Self::Emitter(EmitterType::parse_or_default(name)),
            PartKind::Blade => Self::Blade(BladeColor::parse_or_default(name)),
        }
    }

    pub fn kind(self) -> PartKind {
        match self {
            Self::Pommel(_) => PartKind::Pommel,
            Self::Grip(_) => PartKind::Grip,
            Self::Emitter(_) => PartKind::Emitter,
            Self::Blade(_) => PartKind::Blade,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pommel(t) => t.as_str(),
            Self::Grip(t) => t.as_str(),
            Self::Emitter(t) => t.as_str(),
            Self::Blade(c) => c.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_sizes_match_menu() {
        assert_eq!(PommelType::ALL.len(), 8);
        assert_eq!(GripType::ALL.len(), 7);
        assert_eq!(EmitterType::ALL.len(), 8);
        assert_eq!(BladeColor::ALL.len(), 8);
        assert_eq!(PartColor::ALL.len(), 7);
    }

    #[test]
    fn parse_is_case_insensitive_and_falls_back() {
        assert_eq!(EmitterType::parse(" Shroud "), Some(EmitterType::Shroud));
        assert_eq!(PommelType::parse("laser"), None);
        assert_eq!(GripType::parse_or_default("laser"), GripType::Smooth);
        assert!("nope".parse::<BladeColor>().is_err());
        assert_eq!(
            PartSelection::parse(PartKind::Blade, "unstable"),
            PartSelection::Blade(BladeColor::Unstable)
        );
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&BladeColor::Purple).unwrap();
        assert_eq!(json, "\"purple\"");
        let back: PartColor = serde_json::from_str("\"chrome\"").unwrap();
        assert_eq!(back, PartColor::Chrome);
    }

    #[test]
    fn color_slots_exclude_blade() {
        assert_eq!(ColorSlot::from_kind(PartKind::Blade), None);
        for slot in ColorSlot::ALL {
            assert_eq!(ColorSlot::from_kind(slot.kind()), Some(slot));
        }
    }
}
