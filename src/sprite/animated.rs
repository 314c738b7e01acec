use crate::engine::{BlendMode, Point, Rect, Surface};
use crate::sprite::sheet::SpriteSheet;
use crate::sprite::state::{AdvanceResult, AnimationInstance};
use crate::sprite::AnimationSet;
use crate::time::FixedStep;
use std::rc::Rc;

// never replay more than this many frames in one update
const MAX_FRAMES_PER_UPDATE: u32 = 8;

/// An entity that plays animations out of an [`AnimationSet`] and draws the
/// matching cell of a [`SpriteSheet`].
///
/// AnimatedSprite
/// - update() -> AnimationInstance::advance() at the animation's own rate
/// - draw()   -> one Surface::draw_region() call
/// - play()   -> swap the running animation by name
pub struct AnimatedSprite {
    // templates are shared between every sprite built from them, see Rc
    animations: Rc<AnimationSet>,
    sheet: Rc<SpriteSheet>,
    animation: Option<AnimationInstance>,
    cadence: FixedStep,
    position: Point,
    velocity: Point,
    opacity: f32,
    blend_mode: BlendMode,
    visible: bool,
}

impl AnimatedSprite {
    /// Starts playing the first animation of the set, if there is one
    pub fn new(animations: Rc<AnimationSet>, sheet: Rc<SpriteSheet>, position: Point) -> Self {
        let animation = animations
            .first()
            .map(|sequence| AnimationInstance::new(sequence, true));
        if animation.is_none() {
            log::warn!("{} has no animations, sprite stays blank", animations.name());
        }
        let step = animation.as_ref().map_or(1.0, |a| a.frame_duration());
        AnimatedSprite {
            animations,
            sheet,
            animation,
            cadence: FixedStep::new(step, MAX_FRAMES_PER_UPDATE),
            position,
            velocity: Point::default(),
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: true,
        }
    }

    /// Switch to the animation called `name`.
    ///
    /// Asking for the animation that is already running keeps it going
    /// unless `random` asks for a (possibly different) variant. Unknown names
    /// leave the current animation in place and return false.
    pub fn play(&mut self, name: &str, random: bool) -> bool {
        if !random && self.animation_name() == Some(name) {
            if let Some(animation) = self.animation.as_mut() {
                animation.play();
            }
            return true;
        }
        match self.animations.create_animation(name, random, true) {
            Ok(animation) => {
                self.cadence.set_step(animation.frame_duration());
                self.cadence.reset();
                self.animation = Some(animation);
                true
            }
            Err(err) => {
                log::warn!("{}", err);
                false
            }
        }
    }

    /// Advance the animation as many frames as `dt` covers and move by the
    /// current velocity.
    pub fn update(&mut self, dt: f64) -> AdvanceResult {
        self.position.x += self.velocity.x;
        self.position.y += self.velocity.y;

        let mut result = AdvanceResult::default();
        let Some(animation) = self.animation.as_mut() else {
            return result;
        };
        if !animation.is_playing() {
            return result;
        }
        // the rate can be overridden at any time through animation_mut()
        self.cadence.set_step(animation.frame_duration());
        let step = self.cadence.step();
        for _ in 0..self.cadence.accumulate(dt) {
            let advanced = animation.advance(step);
            result.looped |= advanced.looped;
            result.completed |= advanced.completed;
        }
        result
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        if !self.visible {
            return;
        }
        let source = self.sheet.clip(self.current_frame());
        if source.is_empty() {
            return;
        }
        surface.draw_region(
            self.sheet.image(),
            &source,
            &self.bounding_box(),
            self.opacity,
            self.blend_mode,
        );

        #[cfg(debug_assertions)]
        surface.draw_outline(&self.bounding_box());
    }

    pub fn animation(&self) -> Option<&AnimationInstance> {
        self.animation.as_ref()
    }

    pub fn animation_mut(&mut self) -> Option<&mut AnimationInstance> {
        self.animation.as_mut()
    }

    pub fn animation_name(&self) -> Option<&str> {
        self.animation.as_ref().map(|a| a.sequence().name())
    }

    pub fn current_frame(&self) -> u32 {
        self.animation.as_ref().map_or(0, |a| a.current_frame())
    }

    // Addresses Law of Demeter, callers never reach into the instance or
    // the sheet to place the sprite
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_velocity(&mut self, velocity: Point) {
        self.velocity = velocity;
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }

    pub fn on(&mut self) {
        self.visible = true;
    }

    pub fn off(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.position, self.sheet.frame_size())
    }

    pub fn intersects(&self, other: &AnimatedSprite) -> bool {
        self.bounding_box().intersects(&other.bounding_box())
    }
}
