//! Standard materials: diffuse/specular/emissive colors with optional transparency.

use glam::Vec3;

/// Linear RGB color with components nominally in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color3 {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Multiply every channel by `factor`.
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Largest per-channel difference, for tolerant comparisons.
    pub fn max_abs_diff(self, other: Self) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<Vec3> for Color3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Color3> for Vec3 {
    fn from(c: Color3) -> Self {
        Vec3::new(c.r, c.g, c.b)
    }
}

/// Surface material attached to a mesh node.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: Color3,
    pub specular: Color3,
    pub emissive: Color3,
    /// 1.0 is opaque.
    pub alpha: f32,
    pub roughness: Option<f32>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            diffuse: Color3::WHITE,
            specular: Color3::WHITE,
            emissive: Color3::BLACK,
            alpha: 1.0,
            roughness: None,
        }
    }
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_diffuse(mut self, color: Color3) -> Self {
        self.diffuse = color;
        self
    }

    pub fn with_specular(mut self, color: Color3) -> Self {
        self.specular = color;
        self
    }

    pub fn with_emissive(mut self, color: Color3) -> Self {
        self.emissive = color;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = Some(roughness);
        self
    }

    pub fn is_emissive(&self) -> bool {
        self.emissive != Color3::BLACK
    }
}
