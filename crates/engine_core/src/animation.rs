//! Keyframed property animation for scene nodes.
//!
//! An [`Animation`] is a list of keys over a frame axis sampled at `fps`. The [`Animator`]
//! plays animations against scene nodes, advancing every active one once per
//! [`Animator::update`] and reporting which non-looping animations finished that frame.

use glam::Vec3;
use hecs::Entity;

use crate::material::Color3;
use crate::scene::Scene;

/// Node property an animation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatedProperty {
    PositionY,
    ScalingY,
    Scaling,
    /// Roll component of the node's Euler rotation.
    RotationZ,
    /// Emissive color of every mesh material in the node's subtree.
    EmissiveColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimValue {
    Float(f32),
    Vector(Vec3),
    Color(Color3),
}

impl AnimValue {
    fn lerp(self, other: Self, t: f32) -> Self {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => Self::Float(a + (b - a) * t),
            (Self::Vector(a), Self::Vector(b)) => Self::Vector(a.lerp(b, t)),
            (Self::Color(a), Self::Color(b)) => Self::Color(a.lerp(b, t)),
            (a, _) => a,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub frame: f32,
    pub value: AnimValue,
}

impl Keyframe {
    pub fn new(frame: f32, value: AnimValue) -> Self {
        Self { frame, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Hold the last key and complete.
    Constant,
    /// Wrap back to the first key forever.
    Cycle,
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub property: AnimatedProperty,
    pub fps: f32,
    pub loop_mode: LoopMode,
    keys: Vec<Keyframe>,
}

impl Animation {
    pub fn new(name: &str, property: AnimatedProperty, fps: f32, loop_mode: LoopMode) -> Self {
        Self {
            name: name.to_string(),
            property,
            fps,
            loop_mode,
            keys: Vec::new(),
        }
    }

    /// Two-key animation from `from` at frame 0 to `to` at `total_frames`.
    pub fn from_to(
        name: &str,
        property: AnimatedProperty,
        fps: f32,
        total_frames: f32,
        from: AnimValue,
        to: AnimValue,
    ) -> Self {
        let mut animation = Self::new(name, property, fps, LoopMode::Constant);
        animation.set_keys(vec![Keyframe::new(0.0, from), Keyframe::new(total_frames, to)]);
        animation
    }

    /// Replace the keys, ordering them by frame.
    pub fn set_keys(&mut self, mut keys: Vec<Keyframe>) {
        keys.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        self.keys = keys;
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn last_frame(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.frame)
    }

    /// Playback length in seconds at speed ratio 1.
    pub fn duration(&self) -> f32 {
        if self.fps > 0.0 {
            self.last_frame() / self.fps
        } else {
            0.0
        }
    }

    /// Linearly interpolated value at `frame`, clamped to the key range.
    pub fn evaluate(&self, frame: f32) -> Option<AnimValue> {
        let first = self.keys.first()?;
        if frame <= first.frame {
            return Some(first.value);
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if frame <= b.frame {
                let span = b.frame - a.frame;
                let t = if span > 0.0 { (frame - a.frame) / span } else { 1.0 };
                return Some(a.value.lerp(b.value, t));
            }
        }
        self.keys.last().map(|k| k.value)
    }
}

/// Handle to a playing animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(u64);

#[derive(Debug)]
struct ActiveAnimation {
    id: AnimationId,
    target: Entity,
    animation: Animation,
    frame: f32,
    speed_ratio: f32,
}

/// Plays animations against scene nodes.
#[derive(Debug, Default)]
pub struct Animator {
    active: Vec<ActiveAnimation>,
    next_id: u64,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `animation` on `target`. `speed_ratio` scales playback rate.
    pub fn begin(&mut self, target: Entity, animation: Animation, speed_ratio: f32) -> AnimationId {
        self.next_id += 1;
        let id = AnimationId(self.next_id);
        log::trace!("Animation '{}' started on {:?} as {:?}", animation.name, target, id);
        self.active.push(ActiveAnimation {
            id,
            target,
            animation,
            frame: 0.0,
            speed_ratio,
        });
        id
    }

    /// Stop one animation without completing it. Returns whether it was running.
    pub fn stop(&mut self, id: AnimationId) -> bool {
        let before = self.active.len();
        self.active.retain(|a| a.id != id);
        self.active.len() != before
    }

    /// Stop every animation on `target`. Returns how many were stopped.
    pub fn stop_target(&mut self, target: Entity) -> usize {
        let before = self.active.len();
        self.active.retain(|a| a.target != target);
        before - self.active.len()
    }

    pub fn is_running(&self, id: AnimationId) -> bool {
        self.active.iter().any(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance every animation by `dt` seconds and write values into the scene.
    ///
    /// Returns the ids of `Constant` animations that reached their last key this frame, in
    /// start order. Animations whose target no longer exists are dropped silently.
    pub fn update(&mut self, scene: &mut Scene, dt: f32) -> Vec<AnimationId> {
        let mut completed = Vec::new();
        self.active.retain_mut(|active| {
            if !scene.contains(active.target) {
                log::debug!("Dropping animation '{}': target is gone", active.animation.name);
                return false;
            }
            let last = active.animation.last_frame();
            active.frame += dt * active.animation.fps * active.speed_ratio;

            let finished = match active.animation.loop_mode {
                LoopMode::Constant if active.frame >= last => {
                    active.frame = last;
                    true
                }
                LoopMode::Cycle if last > 0.0 => {
                    active.frame %= last;
                    false
                }
                _ => false,
            };

            if let Some(value) = active.animation.evaluate(active.frame) {
                apply(scene, active.target, active.animation.property, value);
            }
            if finished {
                completed.push(active.id);
            }
            !finished
        });
        completed
    }
}

fn apply(scene: &mut Scene, target: Entity, property: AnimatedProperty, value: AnimValue) {
    match (property, value) {
        (AnimatedProperty::PositionY, AnimValue::Float(y)) => {
            if let Some(t) = scene.transform_mut(target) {
                t.position.y = y;
            }
        }
        (AnimatedProperty::ScalingY, AnimValue::Float(s)) => {
            if let Some(t) = scene.transform_mut(target) {
                t.scale.y = s;
            }
        }
        (AnimatedProperty::Scaling, AnimValue::Vector(s)) => {
            if let Some(t) = scene.transform_mut(target) {
                t.scale = s;
            }
        }
        (AnimatedProperty::RotationZ, AnimValue::Float(roll)) => {
            if let Some(t) = scene.transform_mut(target) {
                let mut euler = t.euler();
                euler.z = roll;
                t.set_euler(euler);
            }
        }
        (AnimatedProperty::EmissiveColor, AnimValue::Color(color)) => {
            for mesh in scene.meshes(target) {
                if let Some(material) = scene.material_mut(mesh) {
                    material.emissive = color;
                }
            }
        }
        (property, value) => {
            log::warn!("Animation value {:?} does not fit property {:?}", value, property);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::primitive::Primitive;
    use crate::transform::Transform;

    fn scene_with_node() -> (Scene, Entity) {
        let mut scene = Scene::new();
        let node = scene.create_node("node", Transform::default(), None);
        scene.create_mesh("leaf", Primitive::sphere(1.0), Transform::default(), Material::new("m"), Some(node));
        (scene, node)
    }

    #[test]
    fn constant_animation_completes_once_at_end_value() {
        let (mut scene, node) = scene_with_node();
        let mut animator = Animator::new();
        let anim = Animation::from_to("rise", AnimatedProperty::PositionY, 30.0, 15.0, AnimValue::Float(1.0), AnimValue::Float(3.0));
        assert!((anim.duration() - 0.5).abs() < 1e-6);
        let id = animator.begin(node, anim, 1.0);

        assert!(animator.update(&mut scene, 0.25).is_empty());
        let mid = scene.transform(node).unwrap().position.y;
        assert!((mid - 2.0).abs() < 1e-4);

        assert_eq!(animator.update(&mut scene, 0.3), vec![id]);
        assert_eq!(scene.transform(node).unwrap().position.y, 3.0);
        assert!(animator.update(&mut scene, 0.3).is_empty());
        assert!(!animator.is_running(id));
    }

    #[test]
    fn cycle_animation_wraps_and_never_completes() {
        let (mut scene, node) = scene_with_node();
        let mut animator = Animator::new();
        let mut anim = Animation::new("pulse", AnimatedProperty::ScalingY, 10.0, LoopMode::Cycle);
        anim.set_keys(vec![Keyframe::new(0.0, AnimValue::Float(1.0)), Keyframe::new(10.0, AnimValue::Float(2.0))]);
        let id = animator.begin(node, anim, 2.0);
        for _ in 0..20 {
            assert!(animator.update(&mut scene, 0.1).is_empty());
        }
        assert!(animator.is_running(id));
        let s = scene.transform(node).unwrap().scale.y;
        assert!((1.0..=2.0).contains(&s));
    }

    #[test]
    fn emissive_reaches_every_leaf_and_stop_target_halts() {
        let (mut scene, node) = scene_with_node();
        let mut animator = Animator::new();
        let red = Color3::new(1.0, 0.0, 0.0);
        let anim = Animation::from_to("glow", AnimatedProperty::EmissiveColor, 60.0, 6.0, AnimValue::Color(Color3::BLACK), AnimValue::Color(red));
        animator.begin(node, anim, 1.0);
        animator.update(&mut scene, 1.0);
        let leaf = scene.meshes(node)[0];
        assert_eq!(scene.material(leaf).unwrap().emissive, red);

        let roll = Animation::from_to("roll", AnimatedProperty::RotationZ, 60.0, 30.0, AnimValue::Float(0.0), AnimValue::Float(1.0));
        animator.begin(node, roll, 1.0);
        assert_eq!(animator.stop_target(node), 1);
        assert!(animator.is_empty());
    }

    #[test]
    fn animations_on_disposed_targets_are_dropped() {
        let (mut scene, node) = scene_with_node();
        let mut animator = Animator::new();
        let anim = Animation::from_to("rise", AnimatedProperty::PositionY, 30.0, 15.0, AnimValue::Float(0.0), AnimValue::Float(1.0));
        animator.begin(node, anim, 1.0);
        scene.dispose(node);
        assert!(animator.update(&mut scene, 1.0).is_empty());
        assert!(animator.is_empty());
    }
}
