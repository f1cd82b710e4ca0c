//! Blade power sequences: extend, retract and the unstable flicker loop.
//!
//! One sequence runs per blade at a time. Starting a new one stops whatever was running
//! and continues from the blade's current pose, so a retraction interrupted by a power-on
//! reverses without a jump.

use engine_core::{
    AnimValue, AnimatedProperty, Animation, AnimationId, Animator, Color3, Entity, Keyframe, LoopMode, Scene,
};
use glam::Vec3;
use rand::Rng;

/// Distance the blade travels between retracted and extended.
pub const BLADE_TRAVEL: f32 = 2.75;
pub const EXTEND_FPS: f32 = 30.0;
pub const EXTEND_FRAMES: f32 = 15.0;

pub const FLICKER_FPS: f32 = 60.0;
/// Keys per flicker loop (frames 0 through 60 inclusive).
pub const FLICKER_KEYS: usize = 61;
pub const FLICKER_COLOR_SPEED: f32 = 2.0;
pub const FLICKER_SCALE_SPEED: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BladeState {
    #[default]
    Off,
    Extending,
    Extended,
    Retracting,
}

/// Outcome of a finished sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEvent {
    Extended,
    /// The blade is fully retracted and must now be disposed.
    Retracted,
}

#[derive(Debug, Default)]
pub struct BladeSequencer {
    state: BladeState,
    tracks: Vec<AnimationId>,
    completion: Option<AnimationId>,
    flicker: Vec<AnimationId>,
    flicker_target: Option<Entity>,
    rest_emissive: Option<Color3>,
}

impl BladeSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BladeState {
        self.state
    }

    pub fn is_flickering(&self) -> bool {
        !self.flicker.is_empty()
    }

    /// Grow the blade to full length at `extended_y`. A blade in `Off` is first placed at
    /// `retracted_y` with zero Y scale; otherwise it continues from its current pose.
    pub fn extend(&mut self, animator: &mut Animator, scene: &mut Scene, blade: Entity, retracted_y: f32, extended_y: f32) {
        self.halt(animator, scene);
        if self.state == BladeState::Off {
            if let Some(t) = scene.transform_mut(blade) {
                t.position.y = retracted_y;
                t.scale = Vec3::new(1.0, 0.0, 1.0);
            }
        }
        let Some(pose) = scene.transform(blade) else {
            return;
        };
        let progress = pose.scale.y.clamp(0.0, 1.0);
        let frames = (EXTEND_FRAMES * (1.0 - progress)).max(1.0);

        self.begin(animator, blade, "bladeExtension", frames, (progress, 1.0), (pose.position.y, extended_y));
        log::debug!("Blade {:?}: {:?} -> Extending", blade, self.state);
        self.state = BladeState::Extending;
    }

    /// Shrink the blade back into the emitter at `retracted_y`, from its current pose.
    pub fn retract(&mut self, animator: &mut Animator, scene: &mut Scene, blade: Entity, retracted_y: f32) {
        self.halt(animator, scene);
        let Some(pose) = scene.transform(blade) else {
            return;
        };
        let progress = pose.scale.y.clamp(0.0, 1.0);
        let frames = (EXTEND_FRAMES * progress).max(1.0);

        self.begin(animator, blade, "bladeRetraction", frames, (progress, 0.0), (pose.position.y, retracted_y));
        log::debug!("Blade {:?}: {:?} -> Retracting", blade, self.state);
        self.state = BladeState::Retracting;
    }

    /// Put the blade at full length immediately, without animating.
    pub fn snap_extended(&mut self, animator: &mut Animator, scene: &mut Scene, blade: Entity, extended_y: f32) {
        self.halt(animator, scene);
        if let Some(t) = scene.transform_mut(blade) {
            t.position.y = extended_y;
            t.scale.y = 1.0;
        }
        self.state = BladeState::Extended;
    }

    fn begin(
        &mut self,
        animator: &mut Animator,
        blade: Entity,
        name: &str,
        frames: f32,
        (scale_from, scale_to): (f32, f32),
        (y_from, y_to): (f32, f32),
    ) {
        let scale = Animation::from_to(
            name,
            AnimatedProperty::ScalingY,
            EXTEND_FPS,
            frames,
            AnimValue::Float(scale_from),
            AnimValue::Float(scale_to),
        );
        let position = Animation::from_to(
            &format!("{name}Position"),
            AnimatedProperty::PositionY,
            EXTEND_FPS,
            frames,
            AnimValue::Float(y_from),
            AnimValue::Float(y_to),
        );
        let scale_id = animator.begin(blade, scale, 1.0);
        let position_id = animator.begin(blade, position, 1.0);
        self.tracks = vec![scale_id, position_id];
        self.completion = Some(position_id);
    }

    /// Start the looping unstable flicker. Keys are baked once from `rng`.
    pub fn start_flicker<R: Rng + ?Sized>(&mut self, animator: &mut Animator, scene: &mut Scene, blade: Entity, rng: &mut R) {
        self.stop_flicker(animator, scene);
        self.rest_emissive = scene
            .meshes(blade)
            .first()
            .and_then(|&mesh| scene.material(mesh))
            .map(|m| m.emissive);
        self.flicker_target = Some(blade);

        let color = flicker_color_animation(rng);
        let scale = flicker_scale_animation(rng);
        self.flicker = vec![
            animator.begin(blade, color, FLICKER_COLOR_SPEED),
            animator.begin(blade, scale, FLICKER_SCALE_SPEED),
        ];
        log::debug!("Blade {:?}: flicker started", blade);
    }

    /// Stop the flicker loop and restore the resting emissive color and width.
    fn stop_flicker(&mut self, animator: &mut Animator, scene: &mut Scene) {
        for id in self.flicker.drain(..) {
            animator.stop(id);
        }
        if let (Some(blade), Some(emissive)) = (self.flicker_target.take(), self.rest_emissive.take()) {
            restore_blade(scene, blade, emissive);
        }
    }

    /// Stop every running track. The state is left as is.
    fn halt(&mut self, animator: &mut Animator, scene: &mut Scene) {
        for id in self.tracks.drain(..) {
            animator.stop(id);
        }
        self.completion = None;
        self.stop_flicker(animator, scene);
    }

    /// Stop everything and forget the blade, e.g. before it is disposed.
    pub fn reset(&mut self, animator: &mut Animator) {
        for id in self.tracks.drain(..).chain(self.flicker.drain(..)) {
            animator.stop(id);
        }
        self.completion = None;
        self.flicker_target = None;
        self.rest_emissive = None;
        self.state = BladeState::Off;
    }

    /// Feed one finished animation. Returns the sequence outcome when it was this blade's
    /// sequence that finished.
    pub fn on_completed(&mut self, id: AnimationId) -> Option<SequenceEvent> {
        if self.completion != Some(id) {
            return None;
        }
        self.completion = None;
        self.tracks.clear();
        let event = match self.state {
            BladeState::Extending => {
                self.state = BladeState::Extended;
                SequenceEvent::Extended
            }
            BladeState::Retracting => {
                self.state = BladeState::Off;
                SequenceEvent::Retracted
            }
            state => {
                log::warn!("Sequence completed in unexpected state {:?}", state);
                return None;
            }
        };
        log::debug!("Blade sequence finished: {:?}", event);
        Some(event)
    }
}

fn restore_blade(scene: &mut Scene, blade: Entity, emissive: Color3) {
    if let Some(t) = scene.transform_mut(blade) {
        t.scale.x = 1.0;
        t.scale.z = 1.0;
    }
    for mesh in scene.meshes(blade) {
        if let Some(material) = scene.material_mut(mesh) {
            material.emissive = emissive;
        }
    }
}

/// Emissive loop: red-dominant color at a random intensity per key.
pub fn flicker_color_animation<R: Rng + ?Sized>(rng: &mut R) -> Animation {
    let keys = (0..FLICKER_KEYS)
        .map(|i| {
            let intensity = 0.5 + rng.gen::<f32>() * 0.8;
            let red = 0.8 + rng.gen::<f32>() * 0.4;
            let color = Color3::new(red * intensity, 0.2 * intensity, 0.1 * intensity);
            Keyframe::new(i as f32, AnimValue::Color(color))
        })
        .collect();
    let mut animation = Animation::new("unstableFlicker", AnimatedProperty::EmissiveColor, FLICKER_FPS, LoopMode::Cycle);
    animation.set_keys(keys);
    animation
}

/// Width loop: X and Z scale jitter within 5%.
pub fn flicker_scale_animation<R: Rng + ?Sized>(rng: &mut R) -> Animation {
    let keys = (0..FLICKER_KEYS)
        .map(|i| {
            let s = 0.95 + rng.gen::<f32>() * 0.1;
            Keyframe::new(i as f32, AnimValue::Vector(Vec3::new(s, 1.0, s)))
        })
        .collect();
    let mut animation = Animation::new("unstableScaleFlicker", AnimatedProperty::Scaling, FLICKER_FPS, LoopMode::Cycle);
    animation.set_keys(keys);
    animation
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Material, Primitive, Transform};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blade_scene() -> (Scene, Animator, Entity) {
        let mut scene = Scene::new();
        let blade = scene.create_node("blade", Transform::default(), None);
        let material = Material::new("bladeMaterial").with_emissive(Color3::new(1.0, 0.3, 0.3));
        scene.create_mesh("mainBlade", Primitive::cylinder(5.5, 0.25), Transform::default(), material, Some(blade));
        (scene, Animator::new(), blade)
    }

    fn run(seq: &mut BladeSequencer, animator: &mut Animator, scene: &mut Scene, dt: f32) -> Vec<SequenceEvent> {
        animator
            .update(scene, dt)
            .into_iter()
            .filter_map(|id| seq.on_completed(id))
            .collect()
    }

    #[test]
    fn extend_runs_half_a_second_from_retracted_pose() {
        let (mut scene, mut animator, blade) = blade_scene();
        let mut seq = BladeSequencer::new();
        seq.extend(&mut animator, &mut scene, blade, 1.5, 4.25);
        let start = scene.transform(blade).unwrap();
        assert_eq!(start.position.y, 1.5);
        assert_eq!(start.scale.y, 0.0);
        assert_eq!(seq.state(), BladeState::Extending);

        assert!(run(&mut seq, &mut animator, &mut scene, 0.25).is_empty());
        let mid = scene.transform(blade).unwrap();
        assert!((mid.scale.y - 0.5).abs() < 1e-4);

        assert_eq!(run(&mut seq, &mut animator, &mut scene, 0.3), vec![SequenceEvent::Extended]);
        let end = scene.transform(blade).unwrap();
        assert_eq!(end.position.y, 4.25);
        assert_eq!(end.scale.y, 1.0);
        assert_eq!(seq.state(), BladeState::Extended);
    }

    #[test]
    fn power_on_during_retraction_reverses_from_current_pose() {
        let (mut scene, mut animator, blade) = blade_scene();
        let mut seq = BladeSequencer::new();
        seq.snap_extended(&mut animator, &mut scene, blade, 4.25);
        seq.retract(&mut animator, &mut scene, blade, 1.5);
        run(&mut seq, &mut animator, &mut scene, 0.2);
        let partial = scene.transform(blade).unwrap();
        assert!(partial.scale.y > 0.0 && partial.scale.y < 1.0);

        seq.extend(&mut animator, &mut scene, blade, 1.5, 4.25);
        let resumed = scene.transform(blade).unwrap();
        assert_eq!(resumed.position.y, partial.position.y);
        assert_eq!(resumed.scale.y, partial.scale.y);
        assert_eq!(animator.len(), 2);

        let events = run(&mut seq, &mut animator, &mut scene, 1.0);
        assert_eq!(events, vec![SequenceEvent::Extended]);
        assert!((scene.transform(blade).unwrap().position.y - 4.25).abs() < 1e-5);
    }

    #[test]
    fn retraction_reports_once_and_superseded_tracks_never_complete() {
        let (mut scene, mut animator, blade) = blade_scene();
        let mut seq = BladeSequencer::new();
        seq.extend(&mut animator, &mut scene, blade, 1.5, 4.25);
        run(&mut seq, &mut animator, &mut scene, 0.1);
        seq.retract(&mut animator, &mut scene, blade, 1.5);

        let mut events = Vec::new();
        for _ in 0..60 {
            events.extend(run(&mut seq, &mut animator, &mut scene, 1.0 / 60.0));
        }
        assert_eq!(events, vec![SequenceEvent::Retracted]);
        assert_eq!(seq.state(), BladeState::Off);
        assert!(animator.is_empty());
    }

    #[test]
    fn flicker_loops_and_restores_on_retract() {
        let (mut scene, mut animator, blade) = blade_scene();
        let mut seq = BladeSequencer::new();
        let mut rng = StdRng::seed_from_u64(7);
        seq.snap_extended(&mut animator, &mut scene, blade, 4.25);
        seq.start_flicker(&mut animator, &mut scene, blade, &mut rng);
        assert!(seq.is_flickering());

        for _ in 0..120 {
            assert!(run(&mut seq, &mut animator, &mut scene, 1.0 / 60.0).is_empty());
        }
        let t = scene.transform(blade).unwrap();
        assert!((0.95..=1.05).contains(&t.scale.x));
        assert_eq!(t.scale.y, 1.0);

        seq.retract(&mut animator, &mut scene, blade, 1.5);
        assert!(!seq.is_flickering());
        assert_eq!(scene.transform(blade).unwrap().scale.x, 1.0);
        let leaf = scene.meshes(blade)[0];
        assert_eq!(scene.material(leaf).unwrap().emissive, Color3::new(1.0, 0.3, 0.3));
    }

    #[test]
    fn flicker_keys_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let color = flicker_color_animation(&mut rng);
        assert_eq!(color.keys().len(), FLICKER_KEYS);
        assert_eq!(color.last_frame(), 60.0);
        for key in color.keys() {
            let AnimValue::Color(c) = key.value else { panic!("not a color") };
            assert!(c.r >= 0.8 * 0.5 - 1e-6 && c.r <= 1.2 * 1.3 + 1e-6);
            assert!((c.g - 2.0 * c.b).abs() < 1e-6);
        }
        let scale = flicker_scale_animation(&mut rng);
        assert_eq!(scale.loop_mode, LoopMode::Cycle);
    }
}
