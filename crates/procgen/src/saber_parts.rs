//! Procedural saber part generation
//! Maps catalog entries (pommel, grip, emitter, blade) onto composite primitive shapes.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use engine_core::{Color3, Entity, Material, Primitive, PrimitiveKind, Scene, Transform};
use glam::{Quat, Vec3};
use rand::prelude::*;

use crate::mesh::{vertex_color, MeshData};
use crate::palette::{self, CLOTH_SPECULAR, EMITTER_SPECULAR, GRIP_CORE, POMMEL_SPECULAR};
use crate::saber_catalog::{BladeColor, EmitterType, GripType, PartColor, PartKind, PommelType};

/// Length of the blade body; the tip sits at half of it.
pub const BLADE_LENGTH: f32 = 5.5;
pub const BLADE_DIAMETER: f32 = 0.25;
pub const BLADE_ALPHA: f32 = 0.9;

/// How a node takes part in material assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Painted with the part's selected color.
    Body,
    /// Fixed dark core, skipped by the color pass.
    Base,
    /// Carries its own material, skipped by the color pass.
    Decoration,
    /// Blade geometry: blade material, glow.
    Blade,
}

impl NodeRole {
    pub fn is_part_colored(self) -> bool {
        matches!(self, Self::Body)
    }
}

/// One primitive leaf of a composite shape.
#[derive(Debug, Clone)]
pub struct ShapeNode {
    pub name: String,
    pub role: NodeRole,
    pub primitive: Primitive,
    pub transform: Transform,
    pub material: Material,
    /// Registered with the glow layer when realized.
    pub glow: bool,
}

/// Description of a part: a root node owning primitive leaves at local offsets.
#[derive(Debug, Clone)]
pub struct CompositeShape {
    pub name: String,
    pub nodes: Vec<ShapeNode>,
}

impl CompositeShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    fn push(&mut self, name: impl Into<String>, role: NodeRole, primitive: Primitive, transform: Transform) -> &mut ShapeNode {
        let material = match role {
            NodeRole::Base => Material::new("baseMaterial").with_diffuse(GRIP_CORE),
            _ => Material::default(),
        };
        self.nodes.push(ShapeNode {
            name: name.into(),
            role,
            primitive,
            transform,
            material,
            glow: role == NodeRole::Blade,
        });
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    fn body(&mut self, name: impl Into<String>, primitive: Primitive, y: f32) {
        self.push(name, NodeRole::Body, primitive, Transform::from_y(y));
    }

    /// Assign `material` to every node the color pass covers.
    fn paint(&mut self, material: &Material, roles: impl Fn(NodeRole) -> bool) {
        for node in self.nodes.iter_mut().filter(|n| roles(n.role)) {
            node.material = material.clone();
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Role and primitive kind of every node, in build order.
    pub fn topology(&self) -> Vec<(NodeRole, PrimitiveKind)> {
        self.nodes.iter().map(|n| (n.role, n.primitive.kind())).collect()
    }

    pub fn node(&self, name: &str) -> Option<&ShapeNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Highest point of the unrotated nodes, in shape-local coordinates.
    pub fn top_surface(&self) -> f32 {
        self.nodes
            .iter()
            .filter(|n| n.transform.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6))
            .map(|n| n.transform.position.y + n.primitive.half_height() * n.transform.scale.y)
            .fold(0.0, f32::max)
    }

    /// Realize the shape in `scene` and return its root node. Glow nodes are added to the
    /// scene's glow layer.
    pub fn spawn(&self, scene: &mut Scene, transform: Transform, parent: Option<Entity>) -> Entity {
        let root = scene.create_node(&self.name, transform, parent);
        for node in &self.nodes {
            let mesh = scene.create_mesh(&node.name, node.primitive, node.transform, node.material.clone(), Some(root));
            if node.glow {
                scene.glow_layer_mut().add_included_only(mesh);
            }
        }
        log::trace!("Spawned '{}' with {} mesh node(s)", self.name, self.nodes.len());
        root
    }

    /// Flatten every node into one mesh in shape-local space. Emissive materials color
    /// their vertices with the emissive color, others with the diffuse color.
    pub fn to_mesh_data(&self) -> MeshData {
        let mut mesh = MeshData::new();
        for node in &self.nodes {
            let color = vertex_color(&node.material);
            mesh.append(&MeshData::from_primitive(&node.primitive), node.transform.to_matrix(), color);
        }
        mesh
    }
}

/// An emitter shape plus the local height of its top surface, where the blade starts.
#[derive(Debug, Clone)]
pub struct EmitterBuildResult {
    pub shape: CompositeShape,
    pub top_offset: f32,
}

/// Builds saber parts from catalog entries. Randomized decoration draws from `R`.
pub struct PartBuilder<R = StdRng> {
    rng: R,
}

impl PartBuilder<StdRng> {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> PartBuilder<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Build any part by catalog name. Unknown names build the kind's default. For
    /// [`PartKind::Blade`] the name is the blade color and `color` is unused.
    pub fn build(&mut self, kind: PartKind, type_name: &str, color: PartColor) -> CompositeShape {
        match kind {
            PartKind::Pommel => self.build_pommel(PommelType::parse_or_default(type_name), color),
            PartKind::Grip => self.build_grip(GripType::parse_or_default(type_name), color),
            PartKind::Emitter => self.build_emitter(EmitterType::parse_or_default(type_name), color).shape,
            PartKind::Blade => self.build_blade(BladeColor::parse_or_default(type_name)),
        }
    }

    pub fn build_pommel(&mut self, kind: PommelType, color: PartColor) -> CompositeShape {
        let mut shape = CompositeShape::new(format!("{}Pommel", kind.as_str()));
        match kind {
            PommelType::Basic => shape.body("pommel", Primitive::cylinder(0.6, 0.6), 0.0),
            PommelType::Spiked => shape.body("pommel", Primitive::cone(0.8, 0.6, 0.4).with_tessellation(8), 0.0),
            PommelType::Rounded => shape.body("pommel", Primitive::sphere(0.7), 0.0),
            PommelType::Heavy => shape.body("pommel", Primitive::cone(1.2, 0.8, 0.6).with_tessellation(12), 0.0),
            PommelType::Ceremonial => shape.body("pommel", Primitive::cone(1.0, 0.9, 0.5).with_tessellation(16), 0.0),
            PommelType::Curved => {
                shape.body("pommelBase", Primitive::cylinder(0.4, 0.6), 0.0);
                shape.push(
                    "pommelCurve",
                    NodeRole::Body,
                    Primitive::torus(0.8, 0.15),
                    Transform::from_position_euler(Vec3::new(0.0, 0.3, 0.0), Vec3::new(FRAC_PI_2, 0.0, 0.0)),
                );
            }
            PommelType::Coiled => {
                shape.body("coilBase", Primitive::cylinder(0.4, 0.6), 0.0);
                for i in 0..12 {
                    shape.body(format!("coil{i}"), Primitive::torus(0.65, 0.04), 0.2 + i as f32 * 0.05);
                }
                shape.body("endCap", Primitive::cone(0.15, 0.5, 0.65), 0.8);
            }
            PommelType::Layered => {
                shape.body("pommelMainBase", Primitive::cylinder(0.4, 0.8), 0.0);
                shape.body("pommelMiddle", Primitive::cylinder(0.3, 0.65), 0.35);
                shape.body("pommelUpper", Primitive::cylinder(0.25, 0.5), 0.625);
                shape.body("pommelTopCap", Primitive::cylinder(0.15, 0.35), 0.825);
                for i in 0..4 {
                    let angle = i as f32 * FRAC_PI_2;
                    let position = Vec3::new(angle.cos() * 0.45, 0.05, angle.sin() * 0.45);
                    shape.push(
                        format!("pommelProtrusion{i}"),
                        NodeRole::Body,
                        Primitive::cuboid(0.15, 0.08, 0.25),
                        Transform::from_position_euler(position, Vec3::new(0.0, angle, 0.0)),
                    );
                }
                shape.body("pommelDetailRing1", Primitive::cylinder(0.05, 0.7), 0.225);
                shape.body("pommelDetailRing2", Primitive::cylinder(0.04, 0.55), 0.525);
            }
        }

        let material = Material::new("pommelMaterial")
            .with_diffuse(palette::part_color(color))
            .with_specular(POMMEL_SPECULAR);
        shape.paint(&material, NodeRole::is_part_colored);
        shape
    }

    pub fn build_grip(&mut self, kind: GripType, color: PartColor) -> CompositeShape {
        let base_color = palette::part_color(color);
        let mut shape = CompositeShape::new(format!("{}Grip", kind.as_str()));
        match kind {
            GripType::Smooth => shape.body("grip", Primitive::cylinder(2.0, 0.6), 0.0),
            GripType::Textured => shape.body("grip", Primitive::cylinder(2.0, 0.62).with_tessellation(12), 0.0),
            GripType::Curved => shape.body("grip", Primitive::cone(2.0, 0.55, 0.7).with_tessellation(16), 0.0),
            GripType::Ribbed => {
                shape.push("baseGrip", NodeRole::Base, Primitive::cylinder(2.0, 0.6), Transform::default());
                for i in 0..8 {
                    shape.body(format!("ring{i}"), Primitive::cylinder(0.1, 0.72), -0.75 + i as f32 * 0.25);
                }
                for i in 0..2 {
                    self.loose_end(&mut shape, i, base_color);
                }
            }
            GripType::Segmented => {
                shape.push("connector", NodeRole::Base, Primitive::cylinder(2.0, 0.55), Transform::default());
                for i in 0..4 {
                    let diameter = 0.62 + (i % 2) as f32 * 0.08;
                    shape.body(format!("segment{i}"), Primitive::cylinder(0.35, diameter), -0.75 + i as f32 * 0.5);
                }
            }
            GripType::Grooved => {
                shape.body("mainGrip", Primitive::cylinder(2.0, 0.62), 0.0);
                for i in 0..8 {
                    let angle = i as f32 * TAU / 8.0;
                    shape.push(
                        format!("raisedSection{i}"),
                        NodeRole::Body,
                        Primitive::cylinder(1.8, 0.1).with_tessellation(6),
                        Transform::from_position(Vec3::new(angle.cos() * 0.32, 0.0, angle.sin() * 0.32)),
                    );
                }
                shape.body("topCap", Primitive::cylinder(0.15, 0.68), 0.925);
                shape.body("bottomCap", Primitive::cylinder(0.15, 0.68), -0.925);
                for i in 0..3 {
                    let y = 0.7 + i as f32 * 0.08;
                    shape.body(format!("topRing{i}"), Primitive::cylinder(0.03, 0.66), y);
                    shape.body(format!("bottomRing{i}"), Primitive::cylinder(0.03, 0.66), -y);
                }
            }
            GripType::Wrapped => {
                shape.push("baseWrap", NodeRole::Base, Primitive::cylinder(2.0, 0.6), Transform::default());
                let leather = Material::new("wrapMaterial")
                    .with_diffuse(base_color.scale(0.6))
                    .with_specular(CLOTH_SPECULAR);
                for i in 0..10 {
                    let position = Vec3::new(0.0, -0.9 + i as f32 * 0.2, 0.0);
                    shape
                        .push(
                            format!("wrap{i}"),
                            NodeRole::Decoration,
                            Primitive::torus(0.64, 0.035),
                            Transform::from_position_euler(position, Vec3::new(0.15, 0.0, 0.0)),
                        )
                        .material = leather.clone();
                }
                shape.body("wrapCapTop", Primitive::cylinder(0.1, 0.66), 0.95);
                shape.body("wrapCapBottom", Primitive::cylinder(0.1, 0.66), -0.95);
            }
        }

        let material = Material::new("gripMaterial").with_diffuse(base_color);
        shape.paint(&material, NodeRole::is_part_colored);
        shape
    }

    /// Frayed strap end hanging off a ribbed grip at a random angle.
    fn loose_end(&mut self, shape: &mut CompositeShape, index: usize, base_color: Color3) {
        let depth = 0.15 + self.rng.gen::<f32>() * 0.1;
        let angle = self.rng.gen::<f32>() * TAU;
        let y = -0.9 + self.rng.gen::<f32>() * 0.15;
        let yaw = angle + (self.rng.gen::<f32>() - 0.5) * 0.3;
        let pitch = (self.rng.gen::<f32>() - 0.5) * 0.2;
        let roll = (self.rng.gen::<f32>() - 0.5) * 0.15;

        let position = Vec3::new(angle.cos() * 0.32, y, angle.sin() * 0.32);
        let node = shape.push(
            format!("looseEnd{index}"),
            NodeRole::Decoration,
            Primitive::cuboid(0.06, 0.015, depth),
            Transform::from_position_euler(position, Vec3::new(pitch, yaw, roll)),
        );
        node.material = Material::new(format!("endMaterial{index}"))
            .with_diffuse(base_color.scale(0.85))
            .with_specular(CLOTH_SPECULAR)
            .with_roughness(0.95);
    }

    pub fn build_emitter(&mut self, kind: EmitterType, color: PartColor) -> EmitterBuildResult {
        let mut shape = CompositeShape::new(format!("{}Emitter", kind.as_str()));
        let top_offset = match kind {
            EmitterType::Standard => {
                shape.body("emitter", Primitive::cylinder(1.0, 0.7), 0.0);
                0.5
            }
            EmitterType::Wide => {
                shape.body("emitter", Primitive::cone(1.0, 0.8, 0.6), 0.0);
                0.5
            }
            EmitterType::Focused => {
                shape.body("emitter", Primitive::cone(1.2, 0.4, 0.6), 0.0);
                0.6
            }
            EmitterType::Shroud => {
                shape.body("emitterBase", Primitive::cylinder(1.2, 0.7), 0.0);
                shape.body("shroud", Primitive::cone(1.0, 0.5, 0.8), 0.6);
                1.1
            }
            EmitterType::Dual => {
                shape.body("mainEmitter", Primitive::cylinder(1.0, 0.7), 0.0);
                for (i, x) in [0.4f32, -0.4].into_iter().enumerate() {
                    shape.push(
                        format!("sideEmitter{}", i + 1),
                        NodeRole::Body,
                        Primitive::cylinder(0.6, 0.3),
                        Transform::from_position(Vec3::new(x, 0.0, 0.0)),
                    );
                }
                0.5
            }
            EmitterType::Crossguard => {
                shape.body("mainEmitter", Primitive::cylinder(1.0, 0.7), 0.0);
                for (i, side) in [1.0f32, -1.0].into_iter().enumerate() {
                    shape.push(
                        format!("guard{}", i + 1),
                        NodeRole::Body,
                        Primitive::cylinder(0.8, 0.25),
                        Transform::from_position_euler(Vec3::new(0.5 * side, 0.3, 0.0), Vec3::new(0.0, 0.0, FRAC_PI_4 * side)),
                    );
                }
                0.5
            }
            EmitterType::Complex => {
                shape.body("mainBase", Primitive::cylinder(0.6, 0.75), -0.2);
                for i in 0..8 {
                    shape.body(format!("rib{i}"), Primitive::cylinder(0.03, 0.8), 0.1 + i as f32 * 0.04);
                }
                shape.body("upperSection", Primitive::cone(0.4, 0.6, 0.75), 0.55);
                shape.body("topRing", Primitive::cylinder(0.08, 0.65), 0.8);
                shape.body("emitterTip", Primitive::cone(0.2, 0.45, 0.6), 0.95);
                1.05
            }
            EmitterType::Layered => {
                shape.body("layerBase", Primitive::cylinder(0.2, 0.5), -0.4);
                for (i, (diameter, height, y)) in [(0.3, 0.3, -0.25), (0.5, 0.08, -0.1), (0.3, 0.1, -0.05)]
                    .into_iter()
                    .enumerate()
                {
                    shape.body(format!("layerRing{i}"), Primitive::cylinder(height, diameter), y);
                }
                shape.body("emitterOpening", Primitive::cone(0.2, 0.7, 0.65), 0.1);
                0.2
            }
        };

        let material = Material::new("emitterMaterial")
            .with_diffuse(palette::part_color(color))
            .with_specular(EMITTER_SPECULAR);
        shape.paint(&material, NodeRole::is_part_colored);
        EmitterBuildResult { shape, top_offset }
    }

    /// Blade body and tip; `Unstable` adds freshly randomized spikes on every build.
    pub fn build_blade(&mut self, color: BladeColor) -> CompositeShape {
        let name = if color == BladeColor::Unstable { "unstableBlade" } else { "blade" };
        let mut shape = CompositeShape::new(name);
        shape.push(
            "mainBlade",
            NodeRole::Blade,
            Primitive::cylinder(BLADE_LENGTH, BLADE_DIAMETER).with_tessellation(16),
            Transform::default(),
        );
        shape.push("bladeTop", NodeRole::Blade, Primitive::sphere(BLADE_DIAMETER), Transform::from_y(BLADE_LENGTH * 0.5));

        if color == BladeColor::Unstable {
            for i in 0..5 {
                let position = Vec3::new(
                    (self.rng.gen::<f32>() - 0.5) * 0.3,
                    self.rng.gen::<f32>() * 4.0 - 2.0,
                    (self.rng.gen::<f32>() - 0.5) * 0.3,
                );
                shape.push(format!("spike{i}"), NodeRole::Blade, Primitive::cylinder(0.3, 0.08), Transform::from_position(position));
            }
        }

        shape.paint(&blade_material(color), |role| role == NodeRole::Blade);
        shape
    }
}

/// Glowing, slightly translucent blade material.
pub fn blade_material(color: BladeColor) -> Material {
    let material = Material::new("bladeMaterial").with_alpha(BLADE_ALPHA);
    if color == BladeColor::Unstable {
        return material
            .with_emissive(palette::UNSTABLE_EMISSIVE)
            .with_diffuse(palette::UNSTABLE_DIFFUSE);
    }
    let base = palette::blade_color(color);
    material.with_emissive(base.scale(0.8)).with_diffuse(base.scale(0.3))
}
