//! The persisted saber configuration and its pure update operations.

use procgen::{BladeColor, ColorSlot, EmitterType, GripType, PartColor, PartKind, PommelType};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Selected finish per colored hilt part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartColors {
    pub pommel: PartColor,
    pub grip: PartColor,
    pub emitter: PartColor,
}

impl PartColors {
    pub fn get(&self, slot: ColorSlot) -> PartColor {
        match slot {
            ColorSlot::Pommel => self.pommel,
            ColorSlot::Grip => self.grip,
            ColorSlot::Emitter => self.emitter,
        }
    }

    pub fn set(&mut self, slot: ColorSlot, color: PartColor) {
        match slot {
            ColorSlot::Pommel => self.pommel = color,
            ColorSlot::Grip => self.grip = color,
            ColorSlot::Emitter => self.emitter = color,
        }
    }
}

/// A complete saber choice. Serialized as a flat camelCase JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaberConfiguration {
    pub pommel_type: PommelType,
    pub grip_type: GripType,
    pub emitter_type: EmitterType,
    pub blade_color: BladeColor,
    pub part_colors: PartColors,
    pub blade_on: bool,
    /// Epoch milliseconds of the last save. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Default for SaberConfiguration {
    fn default() -> Self {
        Self::create_default()
    }
}

impl SaberConfiguration {
    /// Blue blade, basic/smooth/standard hilt, all gray, blade on.
    pub fn create_default() -> Self {
        Self {
            pommel_type: PommelType::default(),
            grip_type: GripType::default(),
            emitter_type: EmitterType::default(),
            blade_color: BladeColor::default(),
            part_colors: PartColors::default(),
            blade_on: true,
            timestamp: None,
        }
    }

    /// Uniformly random parts and colors with the blade on. Grips come from `GripType::RANDOM`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        fn pick<T: Copy + Default, R: Rng + ?Sized>(all: &[T], rng: &mut R) -> T {
            all.choose(rng).copied().unwrap_or_default()
        }
        Self {
            pommel_type: pick(PommelType::ALL, rng),
            grip_type: pick(GripType::RANDOM, rng),
            emitter_type: pick(EmitterType::ALL, rng),
            blade_color: pick(BladeColor::ALL, rng),
            part_colors: PartColors {
                pommel: pick(PartColor::ALL, rng),
                grip: pick(PartColor::ALL, rng),
                emitter: pick(PartColor::ALL, rng),
            },
            blade_on: true,
            timestamp: None,
        }
    }

    /// Build a configuration from any decoded JSON value. Missing, mistyped or unknown
    /// fields take their default; a non-object yields the default configuration.
    pub fn validate(raw: &Value) -> Self {
        let defaults = Self::create_default();
        let Some(obj) = raw.as_object() else {
            log::debug!("Saber configuration is not an object, using defaults");
            return defaults;
        };

        let colors = obj.get("partColors").and_then(Value::as_object);
        let color = |key: &str, fallback: PartColor| match colors {
            Some(colors) => field(colors, key, PartColor::parse, fallback),
            None => fallback,
        };

        Self {
            pommel_type: field(obj, "pommelType", PommelType::parse, defaults.pommel_type),
            grip_type: field(obj, "gripType", GripType::parse, defaults.grip_type),
            emitter_type: field(obj, "emitterType", EmitterType::parse, defaults.emitter_type),
            blade_color: field(obj, "bladeColor", BladeColor::parse, defaults.blade_color),
            part_colors: PartColors {
                pommel: color("pommel", defaults.part_colors.pommel),
                grip: color("grip", defaults.part_colors.grip),
                emitter: color("emitter", defaults.part_colors.emitter),
            },
            blade_on: obj.get("bladeOn").and_then(Value::as_bool).unwrap_or(defaults.blade_on),
            timestamp: obj.get("timestamp").and_then(Value::as_u64),
        }
    }

    /// Copy with the selection for `kind` replaced. For [`PartKind::Blade`] `new_type` is a
    /// blade color. Unknown names select the kind's default.
    pub fn apply_part_change(&self, kind: PartKind, new_type: &str) -> Self {
        let mut next = self.clone();
        match kind {
            PartKind::Pommel => next.pommel_type = PommelType::parse_or_default(new_type),
            PartKind::Grip => next.grip_type = GripType::parse_or_default(new_type),
            PartKind::Emitter => next.emitter_type = EmitterType::parse_or_default(new_type),
            PartKind::Blade => next.blade_color = BladeColor::parse_or_default(new_type),
        }
        next
    }

    pub fn apply_color_change(&self, slot: ColorSlot, color: PartColor) -> Self {
        let mut next = self.clone();
        next.part_colors.set(slot, color);
        next
    }

    /// Flip the power flag; the blade color is kept.
    pub fn toggle_blade(&self) -> Self {
        Self {
            blade_on: !self.blade_on,
            ..self.clone()
        }
    }

    /// Catalog name of the selection for `kind`.
    pub fn type_name(&self, kind: PartKind) -> &'static str {
        match kind {
            PartKind::Pommel => self.pommel_type.as_str(),
            PartKind::Grip => self.grip_type.as_str(),
            PartKind::Emitter => self.emitter_type.as_str(),
            PartKind::Blade => self.blade_color.as_str(),
        }
    }

    pub fn color(&self, slot: ColorSlot) -> PartColor {
        self.part_colors.get(slot)
    }
}

fn field<T>(obj: &Map<String, Value>, key: &str, parse: fn(&str) -> Option<T>, fallback: T) -> T {
    match obj.get(key) {
        None => fallback,
        Some(value) => match value.as_str().and_then(parse) {
            Some(parsed) => parsed,
            None => {
                log::debug!("Repairing saber field '{}': {} is not valid", key, value);
                fallback
            }
        },
    }
}
