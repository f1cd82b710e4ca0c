//! The saber workbench: menu-driven part selection with live rebuilds and auto-save.

use std::f32::consts::FRAC_PI_2;

use engine_core::{Transform, Vec3};
use input::InputState;
use procgen::{ColorSlot, PartColor, PartKind};
use saber::{
    BladeStart, ConfigStore, KeyValueStore, SaberConfiguration, SaberInstance, SequenceEvent, Stage, StoreResult,
};

/// Where the saber stands on the workbench.
pub const SABER_POSITION: Vec3 = Vec3::new(2.0, 0.0, 0.0);
pub const DEFAULT_DRAG_SENSITIVITY: f32 = 0.01;

pub const ZOOM_STEP: f32 = 0.1;
pub const MIN_RADIUS: f32 = 3.0;
pub const MAX_RADIUS: f32 = 20.0;

/// Camera circling the saber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            alpha: FRAC_PI_2,
            beta: FRAC_PI_2,
            radius: 10.0,
            target: SABER_POSITION,
        }
    }
}

impl OrbitCamera {
    pub fn position(&self) -> Vec3 {
        let (sin_b, cos_b) = self.beta.sin_cos();
        let (sin_a, cos_a) = self.alpha.sin_cos();
        self.target + self.radius * Vec3::new(cos_a * sin_b, cos_b, sin_a * sin_b)
    }

    /// Positive notches move closer.
    pub fn zoom(&mut self, notches: f32) {
        self.radius = (self.radius - notches * ZOOM_STEP).clamp(MIN_RADIUS, MAX_RADIUS);
    }
}

/// A menu section as named by the part buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSection {
    Part(PartKind),
    Color(ColorSlot),
}

impl MenuSection {
    /// `pommel`, `grip`, `emitter`, `blade`, or `<part>-color` for the colored parts.
    pub fn parse(section: &str) -> Option<Self> {
        match section.strip_suffix("-color") {
            Some(part) => PartKind::parse(part).and_then(ColorSlot::from_kind).map(Self::Color),
            None => PartKind::parse(section).map(Self::Part),
        }
    }
}

pub struct SaberMaker<S: KeyValueStore> {
    stage: Stage,
    saves: ConfigStore<S>,
    config: SaberConfiguration,
    saber: SaberInstance,
    camera: OrbitCamera,
    /// Accumulated drag rotation of the saber root (pitch, yaw, roll).
    rotation: Vec3,
    drag_sensitivity: f32,
}

impl<S: KeyValueStore> SaberMaker<S> {
    /// Open the workbench with the saved saber, or a random one when nothing is saved.
    pub fn new(mut stage: Stage, store: S) -> Self {
        let saves = ConfigStore::new(store);
        let config = match saves.load() {
            Some(config) => {
                log::info!("Loaded saved saber");
                config
            }
            None => {
                log::info!("No saved saber, generating a random one");
                SaberConfiguration::random(stage.parts.rng_mut())
            }
        };
        let saber = SaberInstance::assemble(
            &mut stage,
            &config,
            Transform::from_position(SABER_POSITION),
            None,
            BladeStart::Animated,
        );
        Self {
            stage,
            saves,
            config,
            saber,
            camera: OrbitCamera::default(),
            rotation: Vec3::ZERO,
            drag_sensitivity: DEFAULT_DRAG_SENSITIVITY,
        }
    }

    pub fn with_drag_sensitivity(mut self, sensitivity: f32) -> Self {
        self.drag_sensitivity = sensitivity;
        self
    }

    /// A button in `section` was clicked. Returns whether the section was recognized.
    pub fn menu_event(&mut self, section: &str, value: &str) -> bool {
        let Some(section) = MenuSection::parse(section) else {
            log::warn!("Ignoring menu event for unknown section '{}'", section);
            return false;
        };
        match section {
            MenuSection::Part(kind) => {
                self.config = self.config.apply_part_change(kind, value);
                self.saber.rebuild_part(&mut self.stage, kind, &self.config);
            }
            MenuSection::Color(slot) => {
                self.config = self.config.apply_color_change(slot, PartColor::parse_or_default(value));
                self.saber.recolor(&mut self.stage, slot, &self.config);
            }
        }
        self.persist();
        true
    }

    pub fn toggle_power(&mut self) {
        self.config = self.config.toggle_blade();
        self.saber.set_blade_power(&mut self.stage, &self.config, self.config.blade_on);
        log::info!("Blade {}", if self.config.blade_on { "on" } else { "off" });
        self.persist();
    }

    /// Replace the saber with a random design.
    pub fn shuffle(&mut self) {
        self.config = SaberConfiguration::random(self.stage.parts.rng_mut());
        self.rebuild_saber();
        self.persist();
    }

    /// Delete the saved saber once `confirm` agrees, then start over with a random design.
    /// Returns whether anything was deleted.
    pub fn reset(&mut self, confirm: impl FnOnce(&SaberConfiguration) -> bool) -> StoreResult<bool> {
        let Some(saved) = self.saves.load() else {
            log::info!("No saved data found");
            return Ok(false);
        };
        if !confirm(&saved) {
            return Ok(false);
        }
        self.saves.clear()?;
        self.config = SaberConfiguration::random(self.stage.parts.rng_mut());
        self.rebuild_saber();
        Ok(true)
    }

    /// Rotate the saber by a pointer drag in pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.rotation.y += dx * self.drag_sensitivity;
        self.rotation.x += dy * self.drag_sensitivity;
        if let Some(t) = self.stage.scene.transform_mut(self.saber.root()) {
            t.set_euler(self.rotation);
        }
    }

    pub fn zoom(&mut self, notches: f32) {
        self.camera.zoom(notches);
    }

    /// Apply this frame's drag and wheel input.
    pub fn handle_input(&mut self, input: &InputState) {
        let drag = input.drag_delta();
        if drag != glam::Vec2::ZERO {
            self.drag(drag.x, drag.y);
        }
        if input.scroll() != 0.0 {
            self.zoom(input.scroll());
        }
    }

    /// Save and hand the saber over to combat.
    pub fn fight(&mut self) -> StoreResult<SaberConfiguration> {
        let stamped = self.saves.save(&self.config)?;
        log::info!("Starting combat with {} blade", stamped.blade_color);
        Ok(stamped)
    }

    pub fn shutdown(&mut self) -> StoreResult<()> {
        self.saves.save(&self.config).map(|_| ())
    }

    pub fn update(&mut self, dt: f32) -> Vec<SequenceEvent> {
        self.saber.update(&mut self.stage, dt)
    }

    pub fn config(&self) -> &SaberConfiguration {
        &self.config
    }

    pub fn saber(&self) -> &SaberInstance {
        &self.saber
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn saves(&self) -> &ConfigStore<S> {
        &self.saves
    }

    fn rebuild_saber(&mut self) {
        self.rotation = Vec3::ZERO;
        let fresh = SaberInstance::assemble(
            &mut self.stage,
            &self.config,
            Transform::from_position(SABER_POSITION),
            None,
            BladeStart::Animated,
        );
        let old = std::mem::replace(&mut self.saber, fresh);
        old.dispose(&mut self.stage);
    }

    fn persist(&mut self) {
        if let Err(e) = self.saves.save(&self.config) {
            log::warn!("Could not save saber: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input::{ElementState, MouseButton};
    use procgen::{BladeColor, EmitterType, GripType};
    use saber::{BladeState, MemoryStore};

    fn maker() -> SaberMaker<MemoryStore> {
        SaberMaker::new(Stage::new(11), MemoryStore::new())
    }

    fn saved_with(config: &SaberConfiguration) -> MemoryStore {
        let mut saves = ConfigStore::new(MemoryStore::new());
        saves.save(config).unwrap();
        saves.into_inner()
    }

    #[test]
    fn menu_sections_parse() {
        assert_eq!(MenuSection::parse("grip"), Some(MenuSection::Part(PartKind::Grip)));
        assert_eq!(MenuSection::parse("blade"), Some(MenuSection::Part(PartKind::Blade)));
        assert_eq!(MenuSection::parse("emitter-color"), Some(MenuSection::Color(ColorSlot::Emitter)));
        assert_eq!(MenuSection::parse("blade-color"), None);
        assert_eq!(MenuSection::parse("hilt"), None);
    }

    #[test]
    fn starts_from_saved_configuration() {
        let saved = SaberConfiguration::create_default().apply_part_change(PartKind::Grip, "wrapped");
        let maker = SaberMaker::new(Stage::new(1), saved_with(&saved));
        assert_eq!(maker.config().grip_type, GripType::Wrapped);
        let root = maker.saber().root();
        assert_eq!(maker.stage().scene.transform(root).unwrap().position, SABER_POSITION);
    }

    #[test]
    fn starts_random_and_powered_without_save() {
        let maker = maker();
        assert!(maker.config().blade_on);
        assert!(!maker.saves().has_saved());
        assert_eq!(maker.saber().blade_state(), BladeState::Extending);
    }

    #[test]
    fn menu_events_rebuild_and_save() {
        let mut maker = maker();
        assert!(maker.menu_event("emitter", "shroud"));
        assert_eq!(maker.config().emitter_type, EmitterType::Shroud);
        assert_eq!(maker.saber().emitter_top_offset(), 1.1);
        assert_eq!(maker.saves().load().unwrap().emitter_type, EmitterType::Shroud);

        assert!(maker.menu_event("grip-color", "gold"));
        assert_eq!(maker.config().part_colors.grip, PartColor::Gold);
        assert_eq!(maker.saves().load().unwrap().part_colors.grip, PartColor::Gold);

        let before = maker.config().clone();
        assert!(!maker.menu_event("saber", "blue"));
        assert_eq!(maker.config(), &before);
    }

    #[test]
    fn power_toggle_retracts_then_restores() {
        let saved = SaberConfiguration::create_default();
        let mut maker = SaberMaker::new(Stage::new(2), saved_with(&saved));
        maker.update(1.0);
        maker.toggle_power();
        assert!(!maker.config().blade_on);
        assert!(!maker.saves().load().unwrap().blade_on);
        assert_eq!(maker.update(1.0), vec![SequenceEvent::Retracted]);
        assert!(maker.saber().blade().is_none());

        maker.menu_event("blade", "purple");
        assert!(maker.saber().blade().is_none(), "color change keeps the blade off");
        maker.toggle_power();
        assert_eq!(maker.update(1.0), vec![SequenceEvent::Extended]);
        assert_eq!(maker.saber().blade_color(), BladeColor::Purple);
    }

    #[test]
    fn shuffle_rebuilds_the_whole_saber() {
        let mut maker = maker();
        let old_root = maker.saber().root();
        maker.drag(40.0, 0.0);
        maker.shuffle();
        assert!(!maker.stage().scene.contains(old_root));
        assert!(maker.config().blade_on);
        assert!(maker.saves().has_saved());
        let root = maker.saber().root();
        assert_eq!(maker.stage().scene.transform(root).unwrap().euler(), Vec3::ZERO);
        assert_eq!(maker.stage().scene.children(root).len(), 4);
    }

    #[test]
    fn reset_needs_a_save_and_confirmation() {
        let mut maker = maker();
        assert!(!maker.reset(|_| panic!("nothing to confirm")).unwrap());

        maker.fight().unwrap();
        assert!(!maker.reset(|_| false).unwrap());
        assert!(maker.saves().has_saved());

        let shown = maker.config().blade_color;
        assert!(maker.reset(|saved| saved.blade_color == shown).unwrap());
        assert!(!maker.saves().has_saved());
        assert!(maker.config().blade_on);
    }

    #[test]
    fn drag_rotates_and_wheel_zooms_within_limits() {
        let mut maker = maker();
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.process_mouse_motion((20.0, -10.0));
        input.process_scroll(5.0);
        input.begin_frame();
        maker.handle_input(&input);

        let euler = maker.stage().scene.transform(maker.saber().root()).unwrap().euler();
        assert!((euler.y - 0.2).abs() < 1e-5);
        assert!((euler.x + 0.1).abs() < 1e-5);
        assert!((maker.camera().radius - 9.5).abs() < 1e-5);

        maker.zoom(-1000.0);
        assert_eq!(maker.camera().radius, MAX_RADIUS);
        maker.zoom(1000.0);
        assert_eq!(maker.camera().radius, MIN_RADIUS);
    }

    #[test]
    fn orbit_camera_starts_in_front_of_the_saber() {
        let position = OrbitCamera::default().position();
        assert!((position - Vec3::new(2.0, 0.0, 10.0)).length() < 1e-5);
    }
}
