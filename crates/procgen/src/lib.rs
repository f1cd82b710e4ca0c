//! Procedural generation for saber parts: catalog, palette, part shapes and meshes.

pub mod mesh;
pub mod palette;
pub mod saber_catalog;
pub mod saber_parts;

pub use mesh::*;
pub use palette::*;
pub use saber_catalog::*;
pub use saber_parts::*;
