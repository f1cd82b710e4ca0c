//! Core engine types and utilities for SaberForge.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and spatial components
//! - Time management
//! - Scene graph, materials, primitives and the glow layer
//! - Keyframed property animation

pub mod animation;
pub mod material;
pub mod primitive;
pub mod scene;
pub mod time;
pub mod transform;

pub use animation::*;
pub use material::*;
pub use primitive::*;
pub use scene::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::Entity;
