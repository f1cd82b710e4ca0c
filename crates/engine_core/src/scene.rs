//! Scene graph: named transform nodes and primitive meshes stored in a hecs world.
//!
//! Nodes form parent/child trees. Disposing a node destroys its whole subtree, detaches it
//! from its parent and removes it from the glow layer.

use std::collections::HashSet;

use glam::Mat4;
use hecs::{Entity, World};

use crate::material::Material;
use crate::primitive::Primitive;
use crate::transform::Transform;

/// Debug name of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Parent link of a child node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Ordered child links of a node.
#[derive(Debug, Clone, Default)]
pub struct Children(pub Vec<Entity>);

/// Geometry of a mesh leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshShape(pub Primitive);

/// Post-process glow registration. Only meshes explicitly included are rendered as
/// light-emitting.
#[derive(Debug, Clone)]
pub struct GlowLayer {
    pub intensity: f32,
    included: HashSet<Entity>,
}

impl Default for GlowLayer {
    fn default() -> Self {
        Self {
            intensity: 1.5,
            included: HashSet::new(),
        }
    }
}

impl GlowLayer {
    pub fn add_included_only(&mut self, mesh: Entity) {
        self.included.insert(mesh);
    }

    pub fn remove(&mut self, mesh: Entity) -> bool {
        self.included.remove(&mesh)
    }

    pub fn contains(&self, mesh: Entity) -> bool {
        self.included.contains(&mesh)
    }

    pub fn len(&self) -> usize {
        self.included.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}

/// Scene container: the node world plus scene-wide effects.
#[derive(Default)]
pub struct Scene {
    world: World,
    glow: GlowLayer,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty transform node.
    pub fn create_node(&mut self, name: &str, transform: Transform, parent: Option<Entity>) -> Entity {
        let entity = self.world.spawn((Name(name.to_string()), transform, Children::default()));
        if let Some(parent) = parent {
            self.attach(entity, parent);
        }
        entity
    }

    /// Create a mesh leaf carrying a primitive and its material.
    pub fn create_mesh(
        &mut self,
        name: &str,
        primitive: Primitive,
        transform: Transform,
        material: Material,
        parent: Option<Entity>,
    ) -> Entity {
        let entity = self.world.spawn((
            Name(name.to_string()),
            transform,
            Children::default(),
            MeshShape(primitive),
            material,
        ));
        if let Some(parent) = parent {
            self.attach(entity, parent);
        }
        entity
    }

    /// Re-parent `child` under `parent`, detaching it from any previous parent.
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) {
        self.detach(child);
        if let Some(parent) = parent {
            self.attach(child, parent);
        }
    }

    fn attach(&mut self, child: Entity, parent: Entity) {
        if let Ok(children) = self.world.query_one_mut::<&mut Children>(parent) {
            children.0.push(child);
            let _ = self.world.insert_one(child, Parent(parent));
        } else {
            log::warn!("Cannot attach {:?}: parent {:?} does not exist", child, parent);
        }
    }

    fn detach(&mut self, child: Entity) {
        if let Ok(Parent(parent)) = self.world.remove_one::<Parent>(child) {
            if let Ok(children) = self.world.query_one_mut::<&mut Children>(parent) {
                children.0.retain(|&c| c != child);
            }
        }
    }

    /// Destroy `entity` and its whole subtree. Returns the number of nodes removed.
    pub fn dispose(&mut self, entity: Entity) -> usize {
        if !self.world.contains(entity) {
            return 0;
        }
        self.detach(entity);
        let doomed = self.subtree(entity);
        for &node in &doomed {
            self.glow.remove(node);
            let _ = self.world.despawn(node);
        }
        log::debug!("Disposed {} scene node(s) rooted at {:?}", doomed.len(), entity);
        doomed.len()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn node_count(&self) -> usize {
        self.world.len() as usize
    }

    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world.get::<&Name>(entity).ok().map(|n| n.0.clone())
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(entity).ok().map(|p| p.0)
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .get::<&Children>(entity)
            .map(|c| c.0.clone())
            .unwrap_or_default()
    }

    /// `entity` followed by every descendant, depth first.
    pub fn subtree(&self, entity: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack = vec![entity];
        while let Some(node) = stack.pop() {
            if !self.world.contains(node) {
                continue;
            }
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Every mesh leaf in the subtree rooted at `entity` (including `entity` itself).
    pub fn meshes(&self, entity: Entity) -> Vec<Entity> {
        self.subtree(entity)
            .into_iter()
            .filter(|&e| self.world.get::<&MeshShape>(e).is_ok())
            .collect()
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform> {
        self.world.query_one_mut::<&mut Transform>(entity).ok()
    }

    pub fn primitive(&self, entity: Entity) -> Option<Primitive> {
        self.world.get::<&MeshShape>(entity).ok().map(|m| m.0)
    }

    pub fn material(&self, entity: Entity) -> Option<Material> {
        self.world.get::<&Material>(entity).ok().map(|m| (*m).clone())
    }

    pub fn material_mut(&mut self, entity: Entity) -> Option<&mut Material> {
        self.world.query_one_mut::<&mut Material>(entity).ok()
    }

    /// Model matrix of `entity` composed through all of its ancestors.
    pub fn world_matrix(&self, entity: Entity) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(entity);
        while let Some(node) = current {
            if let Some(t) = self.transform(node) {
                matrix = t.to_matrix() * matrix;
            }
            current = self.parent(node);
        }
        matrix
    }

    pub fn glow_layer(&self) -> &GlowLayer {
        &self.glow
    }

    pub fn glow_layer_mut(&mut self) -> &mut GlowLayer {
        &mut self.glow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn mesh(scene: &mut Scene, name: &str, y: f32, parent: Entity) -> Entity {
        scene.create_mesh(
            name,
            Primitive::cylinder(1.0, 0.5),
            Transform::from_y(y),
            Material::new("m"),
            Some(parent),
        )
    }

    #[test]
    fn dispose_removes_whole_subtree_and_detaches() {
        let mut scene = Scene::new();
        let root = scene.create_node("root", Transform::default(), None);
        let group = scene.create_node("group", Transform::default(), Some(root));
        let a = mesh(&mut scene, "a", 0.0, group);
        let b = mesh(&mut scene, "b", 1.0, group);
        let keep = mesh(&mut scene, "keep", 2.0, root);
        scene.glow_layer_mut().add_included_only(a);

        assert_eq!(scene.dispose(group), 3);
        assert!(!scene.contains(a) && !scene.contains(b));
        assert!(scene.contains(keep));
        assert_eq!(scene.children(root), vec![keep]);
        assert!(scene.glow_layer().is_empty());
        assert_eq!(scene.dispose(group), 0);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let root = scene.create_node("root", Transform::from_position(Vec3::new(2.0, 0.0, 0.0)), None);
        let child = mesh(&mut scene, "child", 1.0, root);
        let p = scene.world_matrix(child).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn set_parent_moves_child() {
        let mut scene = Scene::new();
        let a = scene.create_node("a", Transform::default(), None);
        let b = scene.create_node("b", Transform::default(), None);
        let c = mesh(&mut scene, "c", 0.0, a);
        scene.set_parent(c, Some(b));
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(b), vec![c]);
        assert_eq!(scene.parent(c), Some(b));
    }
}
