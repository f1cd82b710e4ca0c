//! Parametric primitive shapes a mesh node can carry.

/// Default radial subdivisions for cylinders.
pub const DEFAULT_CYLINDER_TESSELLATION: u32 = 24;
/// Default radial subdivisions for spheres.
pub const DEFAULT_SPHERE_SEGMENTS: u32 = 32;
/// Default radial subdivisions for toruses.
pub const DEFAULT_TORUS_TESSELLATION: u32 = 16;

/// Shape description. All shapes are centered on their local origin; cylinders and boxes
/// extend `height / 2` above and below it along Y, toruses lie in the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cylinder {
        height: f32,
        diameter_top: f32,
        diameter_bottom: f32,
        tessellation: u32,
    },
    Sphere {
        diameter: f32,
        segments: u32,
    },
    Torus {
        diameter: f32,
        thickness: f32,
        tessellation: u32,
    },
    Cuboid {
        width: f32,
        height: f32,
        depth: f32,
    },
}

/// Discriminant of a [`Primitive`], for topology comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Cylinder,
    Sphere,
    Torus,
    Cuboid,
}

impl Primitive {
    /// Straight cylinder.
    pub fn cylinder(height: f32, diameter: f32) -> Self {
        Self::cone(height, diameter, diameter)
    }

    /// Truncated cone (cylinder with different end diameters).
    pub fn cone(height: f32, diameter_top: f32, diameter_bottom: f32) -> Self {
        Self::Cylinder {
            height,
            diameter_top,
            diameter_bottom,
            tessellation: DEFAULT_CYLINDER_TESSELLATION,
        }
    }

    pub fn sphere(diameter: f32) -> Self {
        Self::Sphere {
            diameter,
            segments: DEFAULT_SPHERE_SEGMENTS,
        }
    }

    pub fn torus(diameter: f32, thickness: f32) -> Self {
        Self::Torus {
            diameter,
            thickness,
            tessellation: DEFAULT_TORUS_TESSELLATION,
        }
    }

    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::Cuboid { width, height, depth }
    }

    /// Override the radial subdivision count. No effect on boxes.
    pub fn with_tessellation(self, sides: u32) -> Self {
        match self {
            Self::Cylinder {
                height,
                diameter_top,
                diameter_bottom,
                ..
            } => Self::Cylinder {
                height,
                diameter_top,
                diameter_bottom,
                tessellation: sides,
            },
            Self::Sphere { diameter, .. } => Self::Sphere {
                diameter,
                segments: sides,
            },
            Self::Torus {
                diameter, thickness, ..
            } => Self::Torus {
                diameter,
                thickness,
                tessellation: sides,
            },
            Self::Cuboid { .. } => self,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Cylinder { .. } => PrimitiveKind::Cylinder,
            Self::Sphere { .. } => PrimitiveKind::Sphere,
            Self::Torus { .. } => PrimitiveKind::Torus,
            Self::Cuboid { .. } => PrimitiveKind::Cuboid,
        }
    }

    /// Extent above the local origin along Y, before any node rotation.
    pub fn half_height(&self) -> f32 {
        match *self {
            Self::Cylinder { height, .. } | Self::Cuboid { height, .. } => height * 0.5,
            Self::Sphere { diameter, .. } => diameter * 0.5,
            Self::Torus { thickness, .. } => thickness * 0.5,
        }
    }
}
