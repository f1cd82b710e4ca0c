//! First-person arena: walk around holding the configured saber and swing it.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, TAU};

use engine_core::{
    AnimValue, AnimatedProperty, Animation, AnimationId, Color3, Entity, Material, Primitive, Quat, Transform, Vec3,
};
use input::InputState;
use saber::{BladeStart, SaberConfiguration, SaberInstance, SequenceEvent, Stage};

pub const PLAYER_START: Vec3 = Vec3::new(0.0, 2.0, 0.0);
pub const EYE_HEIGHT: f32 = 1.7;
pub const GROUND_Y: f32 = 2.0;

/// Saber pose relative to the camera.
pub const SABER_OFFSET: Vec3 = Vec3::new(1.2, -1.0, 3.0);
pub const SABER_EULER: Vec3 = Vec3::new(-0.5, 0.3, 0.4);
pub const SABER_SCALE: f32 = 1.5;

pub const SWING_ARC: f32 = FRAC_PI_3;
pub const SWING_FPS: f32 = 60.0;
pub const SWING_OUT_FRAMES: f32 = 30.0;
pub const SWING_BACK_FRAMES: f32 = 20.0;

pub const DEFAULT_MOUSE_SENSITIVITY: f32 = 0.002;

/// Player controller handling movement and look.
#[derive(Debug, Clone)]
pub struct PlayerController {
    pub transform: Transform,
    pub velocity: Vec3,
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    pub jump_force: f32,
    pub gravity: f32,
    pub is_grounded: bool,
    pub yaw: f32,
    /// Camera pitch, clamped to straight up/down.
    pub pitch: f32,
    pub mouse_sensitivity: f32,
}

impl PlayerController {
    pub fn new(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            velocity: Vec3::ZERO,
            move_speed: 6.0,
            sprint_multiplier: 2.0,
            jump_force: 9.0,
            gravity: 36.0,
            is_grounded: true,
            yaw: 0.0,
            pitch: 0.0,
            mouse_sensitivity: DEFAULT_MOUSE_SENSITIVITY,
        }
    }

    /// Mouse right turns right, mouse down looks down.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw = (self.yaw - dx * self.mouse_sensitivity) % TAU;
        self.pitch = (self.pitch - dy * self.mouse_sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
        self.transform.rotation = Quat::from_rotation_y(self.yaw);
    }

    /// Update player state based on input.
    pub fn update(&mut self, input: &InputState, dt: f32) {
        // Mouse look
        if input.is_cursor_locked() {
            let delta = input.mouse_delta();
            self.look(delta.x, delta.y);
        }

        // Movement relative to facing
        let movement = input.get_movement_input();
        let speed = if input.is_sprinting() {
            self.move_speed * self.sprint_multiplier
        } else {
            self.move_speed
        };
        let heading = Quat::from_rotation_y(self.yaw);
        let planar = heading * Vec3::new(movement.x, 0.0, -movement.y);
        self.transform.position += planar * speed * dt;

        // Jump and gravity
        if self.is_grounded && input.is_jump_pressed() {
            self.velocity.y = self.jump_force;
            self.is_grounded = false;
        }
        self.velocity.y -= self.gravity * dt;
        self.transform.position.y += self.velocity.y * dt;

        if self.transform.position.y <= GROUND_Y {
            self.transform.position.y = GROUND_Y;
            self.velocity.y = 0.0;
            self.is_grounded = true;
        }
    }

    pub fn camera_transform(&self) -> Transform {
        Transform::from_position_euler(Vec3::new(0.0, EYE_HEIGHT, 0.0), Vec3::new(self.pitch, 0.0, 0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Swing {
    Out { id: AnimationId, rest_roll: f32 },
    Back { id: AnimationId },
}

pub struct CombatArena {
    stage: Stage,
    config: SaberConfiguration,
    player: PlayerController,
    player_node: Entity,
    camera_node: Entity,
    saber: SaberInstance,
    swing: Option<Swing>,
}

impl CombatArena {
    pub fn new(mut stage: Stage, config: SaberConfiguration) -> Self {
        build_environment(&mut stage);
        let player = PlayerController::new(PLAYER_START);
        let player_node = stage.scene.create_node("player", player.transform, None);
        let camera_node = stage.scene.create_node("camera", player.camera_transform(), Some(player_node));
        let saber_transform =
            Transform::from_position_euler(SABER_OFFSET, SABER_EULER).with_scale(Vec3::splat(SABER_SCALE));
        let saber = SaberInstance::assemble(&mut stage, &config, saber_transform, Some(camera_node), BladeStart::Extended);
        log::info!("Combat ready: {}", hud_status(&config));
        Self {
            stage,
            config,
            player,
            player_node,
            camera_node,
            saber,
            swing: None,
        }
    }

    pub fn with_mouse_sensitivity(mut self, sensitivity: f32) -> Self {
        self.player.mouse_sensitivity = sensitivity;
        self
    }

    /// Run one frame. A click captures the cursor first and swings once captured; Escape
    /// releases it.
    pub fn update(&mut self, input: &mut InputState, dt: f32) -> Vec<SequenceEvent> {
        if input.is_release_pressed() {
            input.set_cursor_locked(false);
        } else if input.is_swing_pressed() {
            if input.is_cursor_locked() {
                self.swing();
            } else {
                input.set_cursor_locked(true);
            }
        }

        self.player.update(input, dt);
        if let Some(t) = self.stage.scene.transform_mut(self.player_node) {
            *t = self.player.transform;
        }
        if let Some(t) = self.stage.scene.transform_mut(self.camera_node) {
            *t = self.player.camera_transform();
        }

        let completed = self.stage.update(dt);
        self.advance_swing(&completed);
        self.saber.handle_completed(&mut self.stage, &completed)
    }

    /// Start a swing. Returns false while one is already in progress.
    pub fn swing(&mut self) -> bool {
        if self.swing.is_some() {
            return false;
        }
        let rest_roll = self.saber_roll();
        let animation = Animation::from_to(
            "saberSwing",
            AnimatedProperty::RotationZ,
            SWING_FPS,
            SWING_OUT_FRAMES,
            AnimValue::Float(rest_roll),
            AnimValue::Float(rest_roll + SWING_ARC),
        );
        let id = self.stage.animator.begin(self.saber.root(), animation, 1.0);
        self.swing = Some(Swing::Out { id, rest_roll });
        log::debug!("Swing started");
        true
    }

    fn advance_swing(&mut self, completed: &[AnimationId]) {
        match self.swing {
            Some(Swing::Out { id, rest_roll }) if completed.contains(&id) => {
                let animation = Animation::from_to(
                    "saberReturn",
                    AnimatedProperty::RotationZ,
                    SWING_FPS,
                    SWING_BACK_FRAMES,
                    AnimValue::Float(self.saber_roll()),
                    AnimValue::Float(rest_roll),
                );
                let id = self.stage.animator.begin(self.saber.root(), animation, 1.0);
                self.swing = Some(Swing::Back { id });
            }
            Some(Swing::Back { id }) if completed.contains(&id) => {
                self.swing = None;
                log::debug!("Swing finished");
            }
            _ => {}
        }
    }

    fn saber_roll(&self) -> f32 {
        self.stage
            .scene
            .transform(self.saber.root())
            .map_or(SABER_EULER.z, |t| t.euler().z)
    }

    pub fn is_swinging(&self) -> bool {
        self.swing.is_some()
    }

    pub fn status(&self) -> String {
        hud_status(&self.config)
    }

    pub fn config(&self) -> &SaberConfiguration {
        &self.config
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn saber(&self) -> &SaberInstance {
        &self.saber
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn camera_node(&self) -> Entity {
        self.camera_node
    }

    pub fn player_node(&self) -> Entity {
        self.player_node
    }
}

/// `"<COLOR> - ON"` while the blade is on, `"OFF"` otherwise.
pub fn hud_status(config: &SaberConfiguration) -> String {
    if config.blade_on {
        format!("{} - ON", config.blade_color.as_str().to_uppercase())
    } else {
        "OFF".to_string()
    }
}

/// Ground, central platform and a ring of pillars.
fn build_environment(stage: &mut Stage) {
    let scene = &mut stage.scene;
    let arena = scene.create_node("arena", Transform::default(), None);
    scene.create_mesh(
        "ground",
        Primitive::cuboid(50.0, 0.02, 50.0),
        Transform::from_y(-0.01),
        Material::new("groundMaterial")
            .with_diffuse(Color3::new(0.2, 0.2, 0.3))
            .with_specular(Color3::gray(0.1)),
        Some(arena),
    );
    scene.create_mesh(
        "platform",
        Primitive::cylinder(0.5, 10.0),
        Transform::from_y(0.25),
        Material::new("platformMaterial").with_diffuse(Color3::new(0.4, 0.4, 0.5)),
        Some(arena),
    );
    for i in 0..8 {
        let angle = i as f32 / 8.0 * TAU;
        scene.create_mesh(
            &format!("pillar{i}"),
            Primitive::cone(8.0, 1.0, 1.5),
            Transform::from_position(Vec3::new(angle.cos() * 15.0, 4.0, angle.sin() * 15.0)),
            Material::new(format!("pillarMaterial{i}")).with_diffuse(Color3::new(0.3, 0.3, 0.4)),
            Some(arena),
        );
    }
}
