//! Assembling a configuration into a positioned saber in the scene.
//!
//! Parts are stacked along the saber root's local Y axis:
//!
//! | part    | local Y                               |
//! |---------|---------------------------------------|
//! | pommel  | -1.7                                  |
//! | grip    | -0.5                                  |
//! | emitter | 1.0                                   |
//! | blade   | 1.0 + top offset (+ 2.75 when extended) |

use engine_core::{AnimationId, Animator, Entity, Scene, Transform, Vec3};
use procgen::{BladeColor, ColorSlot, PartBuilder, PartKind};
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::SaberConfiguration;
use crate::sequencer::{BladeSequencer, BladeState, SequenceEvent, BLADE_TRAVEL};

pub const POMMEL_Y: f32 = -1.7;
pub const GRIP_Y: f32 = -0.5;
pub const EMITTER_Y: f32 = 1.0;

/// Everything a saber needs to live in: the scene, the animator that drives it and the
/// part builder that supplies its geometry.
pub struct Stage<R = StdRng> {
    pub scene: Scene,
    pub animator: Animator,
    pub parts: PartBuilder<R>,
}

impl Stage<StdRng> {
    pub fn new(seed: u64) -> Self {
        Self::with_parts(PartBuilder::new(seed))
    }
}

impl<R: Rng> Stage<R> {
    pub fn with_parts(parts: PartBuilder<R>) -> Self {
        Self {
            scene: Scene::new(),
            animator: Animator::new(),
            parts,
        }
    }

    /// Advance every animation by `dt` seconds. Returns the animations that finished.
    pub fn update(&mut self, dt: f32) -> Vec<AnimationId> {
        self.animator.update(&mut self.scene, dt)
    }
}

/// How a freshly built blade appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BladeStart {
    /// Grows out of the emitter.
    Animated,
    /// Already at full length.
    Extended,
}

/// A realized saber: the root group and its part subtrees.
#[derive(Debug)]
pub struct SaberInstance {
    root: Entity,
    pommel: Entity,
    grip: Entity,
    emitter: Entity,
    blade: Option<Entity>,
    blade_color: BladeColor,
    emitter_top_offset: f32,
    sequencer: BladeSequencer,
}

impl SaberInstance {
    /// Build every part of `config` under a new root node. The blade is only built when
    /// `config.blade_on`.
    pub fn assemble<R: Rng>(
        stage: &mut Stage<R>,
        config: &SaberConfiguration,
        root_transform: Transform,
        parent: Option<Entity>,
        start: BladeStart,
    ) -> Self {
        let root = stage.scene.create_node("saberGroup", root_transform, parent);
        let pommel = stage
            .parts
            .build_pommel(config.pommel_type, config.color(ColorSlot::Pommel))
            .spawn(&mut stage.scene, Transform::from_y(POMMEL_Y), Some(root));
        let grip = stage
            .parts
            .build_grip(config.grip_type, config.color(ColorSlot::Grip))
            .spawn(&mut stage.scene, Transform::from_y(GRIP_Y), Some(root));
        let emitter = stage.parts.build_emitter(config.emitter_type, config.color(ColorSlot::Emitter));
        let emitter_top_offset = emitter.top_offset;
        let emitter = emitter.shape.spawn(&mut stage.scene, Transform::from_y(EMITTER_Y), Some(root));

        let mut saber = Self {
            root,
            pommel,
            grip,
            emitter,
            blade: None,
            blade_color: config.blade_color,
            emitter_top_offset,
            sequencer: BladeSequencer::new(),
        };
        if config.blade_on {
            saber.spawn_blade(stage, config.blade_color, start);
        }
        log::debug!(
            "Assembled saber {}/{}/{} with {} blade ({})",
            config.pommel_type,
            config.grip_type,
            config.emitter_type,
            config.blade_color,
            if config.blade_on { "on" } else { "off" }
        );
        saber
    }

    fn spawn_blade<R: Rng>(&mut self, stage: &mut Stage<R>, color: BladeColor, start: BladeStart) {
        let shape = stage.parts.build_blade(color);
        let blade = shape.spawn(&mut stage.scene, Transform::from_y(self.blade_retracted_y()), Some(self.root));
        self.blade = Some(blade);
        self.blade_color = color;
        self.sequencer = BladeSequencer::new();

        let (retracted, extended) = (self.blade_retracted_y(), self.blade_extended_y());
        let Stage { scene, animator, parts } = stage;
        match start {
            BladeStart::Animated => self.sequencer.extend(animator, scene, blade, retracted, extended),
            BladeStart::Extended => {
                self.sequencer.snap_extended(animator, scene, blade, extended);
                if color == BladeColor::Unstable {
                    self.sequencer.start_flicker(animator, scene, blade, parts.rng_mut());
                }
            }
        }
    }

    fn dispose_blade<R: Rng>(&mut self, stage: &mut Stage<R>) {
        if let Some(blade) = self.blade.take() {
            self.sequencer.reset(&mut stage.animator);
            stage.animator.stop_target(blade);
            stage.scene.dispose(blade);
            log::debug!("Disposed blade {:?}", blade);
        }
    }

    /// Dispose and rebuild only the part for `kind` from `config`. Rebuilding the emitter
    /// moves a live blade onto the new emitter's top; rebuilding the blade replaces it and
    /// extends the replacement when `config.blade_on`.
    pub fn rebuild_part<R: Rng>(&mut self, stage: &mut Stage<R>, kind: PartKind, config: &SaberConfiguration) {
        log::debug!("Rebuilding {} as '{}'", kind, config.type_name(kind));
        match kind {
            PartKind::Pommel => {
                stage.scene.dispose(self.pommel);
                self.pommel = stage
                    .parts
                    .build_pommel(config.pommel_type, config.color(ColorSlot::Pommel))
                    .spawn(&mut stage.scene, Transform::from_y(POMMEL_Y), Some(self.root));
            }
            PartKind::Grip => {
                stage.scene.dispose(self.grip);
                self.grip = stage
                    .parts
                    .build_grip(config.grip_type, config.color(ColorSlot::Grip))
                    .spawn(&mut stage.scene, Transform::from_y(GRIP_Y), Some(self.root));
            }
            PartKind::Emitter => {
                stage.scene.dispose(self.emitter);
                let emitter = stage.parts.build_emitter(config.emitter_type, config.color(ColorSlot::Emitter));
                self.emitter_top_offset = emitter.top_offset;
                self.emitter = emitter.shape.spawn(&mut stage.scene, Transform::from_y(EMITTER_Y), Some(self.root));
                self.reposition_blade(stage);
            }
            PartKind::Blade => {
                self.dispose_blade(stage);
                self.blade_color = config.blade_color;
                if config.blade_on {
                    self.spawn_blade(stage, config.blade_color, BladeStart::Animated);
                }
            }
        }
    }

    /// Rebuild the colored part for `slot`.
    pub fn recolor<R: Rng>(&mut self, stage: &mut Stage<R>, slot: ColorSlot, config: &SaberConfiguration) {
        self.rebuild_part(stage, slot.kind(), config);
    }

    /// Keep the blade seated on the emitter after the emitter changed height.
    fn reposition_blade<R: Rng>(&mut self, stage: &mut Stage<R>) {
        let Some(blade) = self.blade else {
            return;
        };
        let (retracted, extended) = (self.blade_retracted_y(), self.blade_extended_y());
        match self.sequencer.state() {
            BladeState::Extended => {
                if let Some(t) = stage.scene.transform_mut(blade) {
                    t.position.y = extended;
                }
            }
            BladeState::Extending => self.sequencer.extend(&mut stage.animator, &mut stage.scene, blade, retracted, extended),
            BladeState::Retracting => self.sequencer.retract(&mut stage.animator, &mut stage.scene, blade, retracted),
            BladeState::Off => {}
        }
    }

    /// Turn the blade on or off. Off retracts and disposes the blade when the retraction
    /// finishes; turning on mid-retraction reverses the running retraction.
    pub fn set_blade_power<R: Rng>(&mut self, stage: &mut Stage<R>, config: &SaberConfiguration, on: bool) {
        let (retracted, extended) = (self.blade_retracted_y(), self.blade_extended_y());
        match (on, self.blade) {
            (true, None) => self.spawn_blade(stage, config.blade_color, BladeStart::Animated),
            (true, Some(blade)) => {
                if self.sequencer.state() == BladeState::Retracting {
                    self.sequencer.extend(&mut stage.animator, &mut stage.scene, blade, retracted, extended);
                }
            }
            (false, Some(blade)) => {
                if self.sequencer.state() != BladeState::Retracting {
                    self.sequencer.retract(&mut stage.animator, &mut stage.scene, blade, retracted);
                }
            }
            (false, None) => {}
        }
    }

    /// Feed finished animations from [`Stage::update`]. Starts the flicker of a freshly
    /// extended unstable blade and disposes a fully retracted blade.
    pub fn handle_completed<R: Rng>(&mut self, stage: &mut Stage<R>, completed: &[AnimationId]) -> Vec<SequenceEvent> {
        let mut events = Vec::new();
        for &id in completed {
            let (Some(blade), Some(event)) = (self.blade, self.sequencer.on_completed(id)) else {
                continue;
            };
            match event {
                SequenceEvent::Extended if self.blade_color == BladeColor::Unstable => {
                    let Stage { scene, animator, parts } = &mut *stage;
                    self.sequencer.start_flicker(animator, scene, blade, parts.rng_mut());
                }
                SequenceEvent::Extended => {}
                SequenceEvent::Retracted => self.dispose_blade(stage),
            }
            events.push(event);
        }
        events
    }

    /// Advance the stage and react to finished blade sequences.
    pub fn update<R: Rng>(&mut self, stage: &mut Stage<R>, dt: f32) -> Vec<SequenceEvent> {
        let completed = stage.update(dt);
        self.handle_completed(stage, &completed)
    }

    /// Destroy the whole saber.
    pub fn dispose<R: Rng>(mut self, stage: &mut Stage<R>) -> usize {
        self.dispose_blade(stage);
        stage.scene.dispose(self.root)
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn part(&self, kind: PartKind) -> Option<Entity> {
        match kind {
            PartKind::Pommel => Some(self.pommel),
            PartKind::Grip => Some(self.grip),
            PartKind::Emitter => Some(self.emitter),
            PartKind::Blade => self.blade,
        }
    }

    pub fn blade(&self) -> Option<Entity> {
        self.blade
    }

    pub fn blade_color(&self) -> BladeColor {
        self.blade_color
    }

    pub fn blade_state(&self) -> BladeState {
        self.sequencer.state()
    }

    pub fn is_flickering(&self) -> bool {
        self.sequencer.is_flickering()
    }

    pub fn emitter_top_offset(&self) -> f32 {
        self.emitter_top_offset
    }

    pub fn blade_retracted_y(&self) -> f32 {
        EMITTER_Y + self.emitter_top_offset
    }

    pub fn blade_extended_y(&self) -> f32 {
        self.blade_retracted_y() + BLADE_TRAVEL
    }

    /// Local position of a part relative to the saber root.
    pub fn part_position(&self, scene: &Scene, kind: PartKind) -> Option<Vec3> {
        self.part(kind).and_then(|e| scene.transform(e)).map(|t| t.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Color3;
    use procgen::EmitterType;

    fn default_saber(stage: &mut Stage) -> (SaberConfiguration, SaberInstance) {
        let config = SaberConfiguration::create_default();
        let saber = SaberInstance::assemble(stage, &config, Transform::default(), None, BladeStart::Animated);
        (config, saber)
    }

    fn y(stage: &Stage, saber: &SaberInstance, kind: PartKind) -> f32 {
        saber.part_position(&stage.scene, kind).unwrap().y
    }

    #[test]
    fn default_saber_stacks_parts_and_extends_blade() {
        let mut stage = Stage::new(1);
        let (_, mut saber) = default_saber(&mut stage);
        assert_eq!(y(&stage, &saber, PartKind::Pommel), -1.7);
        assert_eq!(y(&stage, &saber, PartKind::Grip), -0.5);
        assert_eq!(y(&stage, &saber, PartKind::Emitter), 1.0);
        assert_eq!(saber.emitter_top_offset(), 0.5);
        assert_eq!(y(&stage, &saber, PartKind::Blade), 1.5);
        assert_eq!(saber.blade_state(), BladeState::Extending);

        let events = saber.update(&mut stage, 0.6);
        assert_eq!(events, vec![SequenceEvent::Extended]);
        assert_eq!(y(&stage, &saber, PartKind::Blade), 4.25);
        assert_eq!(stage.scene.glow_layer().len(), 2);
    }

    #[test]
    fn shroud_emitter_raises_the_blade() {
        let mut stage = Stage::new(2);
        let config = SaberConfiguration::create_default().apply_part_change(PartKind::Emitter, "shroud");
        let mut saber = SaberInstance::assemble(&mut stage, &config, Transform::default(), None, BladeStart::Animated);
        saber.update(&mut stage, 1.0);
        assert!((y(&stage, &saber, PartKind::Blade) - 4.85).abs() < 1e-5);
    }

    #[test]
    fn pommel_change_leaves_other_parts_alone() {
        let mut stage = Stage::new(3);
        let (config, mut saber) = default_saber(&mut stage);
        saber.update(&mut stage, 1.0);
        let before: Vec<_> = [PartKind::Grip, PartKind::Emitter, PartKind::Blade]
            .into_iter()
            .map(|k| (saber.part(k), saber.part_position(&stage.scene, k)))
            .collect();
        let old_pommel = saber.part(PartKind::Pommel).unwrap();

        let config = config.apply_part_change(PartKind::Pommel, "layered");
        saber.rebuild_part(&mut stage, PartKind::Pommel, &config);

        assert!(!stage.scene.contains(old_pommel));
        assert_eq!(y(&stage, &saber, PartKind::Pommel), -1.7);
        assert_eq!(stage.scene.meshes(saber.part(PartKind::Pommel).unwrap()).len(), 10);
        let after: Vec<_> = [PartKind::Grip, PartKind::Emitter, PartKind::Blade]
            .into_iter()
            .map(|k| (saber.part(k), saber.part_position(&stage.scene, k)))
            .collect();
        assert_eq!(before, after);
        assert_eq!(stage.scene.children(saber.root()).len(), 4);
    }

    #[test]
    fn emitter_rebuild_moves_live_blade() {
        let mut stage = Stage::new(4);
        let (config, mut saber) = default_saber(&mut stage);
        saber.update(&mut stage, 1.0);

        let config = config.apply_part_change(PartKind::Emitter, "complex");
        saber.rebuild_part(&mut stage, PartKind::Emitter, &config);
        assert_eq!(saber.emitter_top_offset(), 1.05);
        assert!((y(&stage, &saber, PartKind::Blade) - 4.8).abs() < 1e-5);

        // Mid-extension the running sequence retargets the new emitter top.
        let config = config.apply_part_change(PartKind::Blade, "green");
        saber.rebuild_part(&mut stage, PartKind::Blade, &config);
        saber.update(&mut stage, 0.1);
        let config = config.apply_part_change(PartKind::Emitter, "layered");
        saber.rebuild_part(&mut stage, PartKind::Emitter, &config);
        saber.update(&mut stage, 1.0);
        assert_eq!(saber.blade_state(), BladeState::Extended);
        assert!((y(&stage, &saber, PartKind::Blade) - (1.0 + 0.2 + 2.75)).abs() < 1e-5);
    }

    #[test]
    fn toggling_off_then_on_restores_the_blade() {
        let mut stage = Stage::new(5);
        let (config, mut saber) = default_saber(&mut stage);
        saber.update(&mut stage, 1.0);
        let nodes = stage.scene.node_count();

        let off = config.toggle_blade();
        saber.set_blade_power(&mut stage, &off, false);
        assert!(saber.blade().is_some(), "blade stays while retracting");
        let events = saber.update(&mut stage, 1.0);
        assert_eq!(events, vec![SequenceEvent::Retracted]);
        assert!(saber.blade().is_none());
        assert!(stage.scene.glow_layer().is_empty());
        assert_eq!(stage.scene.node_count(), nodes - 3);

        let on = off.toggle_blade();
        saber.set_blade_power(&mut stage, &on, true);
        saber.update(&mut stage, 1.0);
        assert_eq!(stage.scene.node_count(), nodes);
        assert_eq!(y(&stage, &saber, PartKind::Blade), 4.25);
        assert_eq!(saber.blade_state(), BladeState::Extended);
    }

    #[test]
    fn overlapping_toggles_reuse_the_retracting_blade() {
        let mut stage = Stage::new(6);
        let (config, mut saber) = default_saber(&mut stage);
        saber.update(&mut stage, 1.0);
        let blade = saber.blade().unwrap();

        saber.set_blade_power(&mut stage, &config.toggle_blade(), false);
        saber.update(&mut stage, 0.2);
        saber.set_blade_power(&mut stage, &config, true);
        assert_eq!(saber.blade(), Some(blade));
        assert_eq!(saber.blade_state(), BladeState::Extending);

        let mut events = Vec::new();
        for _ in 0..60 {
            events.extend(saber.update(&mut stage, 1.0 / 30.0));
        }
        assert_eq!(events, vec![SequenceEvent::Extended]);
        assert!(stage.scene.contains(blade));
    }

    #[test]
    fn retracted_blade_is_disposed_exactly_once() {
        let mut stage = Stage::new(7);
        let (config, mut saber) = default_saber(&mut stage);
        let off = config.toggle_blade();
        saber.set_blade_power(&mut stage, &off, false);
        saber.set_blade_power(&mut stage, &off, false);

        let mut retracted = 0;
        for _ in 0..90 {
            retracted += saber
                .update(&mut stage, 1.0 / 60.0)
                .iter()
                .filter(|e| **e == SequenceEvent::Retracted)
                .count();
        }
        assert_eq!(retracted, 1);
        assert!(saber.blade().is_none());
        assert!(stage.animator.is_empty());
    }

    #[test]
    fn unstable_blade_glows_red_and_flickers_after_extension() {
        let mut stage = Stage::new(8);
        let config = SaberConfiguration::create_default().apply_part_change(PartKind::Blade, "unstable");
        let mut saber = SaberInstance::assemble(&mut stage, &config, Transform::default(), None, BladeStart::Animated);
        let blade = saber.blade().unwrap();
        assert_eq!(stage.scene.meshes(blade).len(), 7);
        for mesh in stage.scene.meshes(blade) {
            assert_eq!(stage.scene.material(mesh).unwrap().emissive, Color3::new(1.0, 0.3, 0.3));
        }
        assert!(!saber.is_flickering());
        saber.update(&mut stage, 0.6);
        assert!(saber.is_flickering());

        let extended = SaberInstance::assemble(&mut stage, &config, Transform::default(), None, BladeStart::Extended);
        assert!(extended.is_flickering());
        assert_eq!(extended.blade_state(), BladeState::Extended);
    }

    #[test]
    fn blade_off_config_builds_no_blade_and_dispose_clears_scene() {
        let mut stage = Stage::new(9);
        let config = SaberConfiguration::create_default().toggle_blade();
        let saber = SaberInstance::assemble(&mut stage, &config, Transform::default(), None, BladeStart::Animated);
        assert!(saber.blade().is_none());
        assert_eq!(saber.blade_state(), BladeState::Off);

        let mut every = config.clone();
        for &emitter in EmitterType::ALL {
            every.emitter_type = emitter;
            let mut other = saber_for(&mut stage, &every);
            other.rebuild_part(&mut stage, PartKind::Blade, &every);
            assert!(other.blade().is_none());
            other.dispose(&mut stage);
        }
        let removed = saber.dispose(&mut stage);
        assert_eq!(removed, 1 + 2 + 2 + 2);
        assert_eq!(stage.scene.node_count(), 0);
    }

    fn saber_for(stage: &mut Stage, config: &SaberConfiguration) -> SaberInstance {
        SaberInstance::assemble(stage, config, Transform::from_position(Vec3::X * 2.0), None, BladeStart::Animated)
    }
}
