// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Code Structure vs Photoshop Concepts                │
// ├────────────────┬──────────────────────┬──────────────────────────────────┤
// │   Code File    │   Code Component     │         Photoshop Equivalent     │
// ├────────────────┼──────────────────────┼──────────────────────────────────┤
// │                │ FrameSequence        │ One Timeline (frames + speed)    │
// │   mod.rs       │ PlaybackMode         │ Timeline loop option             │
// │                │ AnimationSet         │ Layer group of Timelines         │
// ├────────────────┼──────────────────────┼──────────────────────────────────┤
// │   state.rs     │ AnimationInstance    │ Play-head of one open Timeline   │
// ├────────────────┼──────────────────────┼──────────────────────────────────┤
// │   sheet.rs     │ SpriteSheet          │ Slices of the master .PSD        │
// ├────────────────┼──────────────────────┼──────────────────────────────────┤
// │   animated.rs  │ AnimatedSprite       │ Placed Smart Object              │
// └────────────────┴──────────────────────┴──────────────────────────────────┘
// - templates (FrameSequence, AnimationSet) are read-only once built and are
//   shared through Rc, every running instance owns its own play-head
pub mod animated;
pub mod sheet;
pub mod state;

use crate::error::{StageError, StageResult};
use self::state::AnimationInstance;
use rand::seq::SliceRandom;
use std::rc::Rc;
use std::str::FromStr;

pub const DEFAULT_FPS: f64 = 20.0;

/// How the play-head walks through a [`FrameSequence`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackMode {
    #[default]
    Forward,
    Backward,
    Static,
    PingPong,
}

impl FromStr for PlaybackMode {
    type Err = StageError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.to_ascii_lowercase().as_str() {
            "" | "default" | "forward" => Ok(PlaybackMode::Forward),
            "backward" => Ok(PlaybackMode::Backward),
            "static" => Ok(PlaybackMode::Static),
            "pingpong" | "ping-pong" => Ok(PlaybackMode::PingPong),
            other => Err(StageError::InvalidSequence(format!(
                "unknown playback mode '{}'",
                other
            ))),
        }
    }
}

/// Immutable animation template.
///
/// An empty frame list is allowed, instances playing it stay on frame 0 and
/// never advance.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    name: String,
    frames: Vec<u32>,
    fps: f64,
    loops: u32,
    mode: PlaybackMode,
}

impl FrameSequence {
    /// * `loops` - 0 plays forever
    pub fn new(
        name: &str,
        frames: Vec<u32>,
        fps: f64,
        loops: u32,
        mode: PlaybackMode,
    ) -> StageResult<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(StageError::InvalidSequence(format!(
                "'{}' needs a positive frame rate, got {}",
                name, fps
            )));
        }
        Ok(FrameSequence {
            name: name.to_string(),
            frames,
            fps,
            loops,
            mode,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn loops(&self) -> u32 {
        self.loops
    }

    pub fn is_infinite(&self) -> bool {
        self.loops == 0
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// frame value at `index`, 0 when out of range
    pub fn frame(&self, index: usize) -> u32 {
        self.frames.get(index).copied().unwrap_or(0)
    }

    /// Where a fresh (or stopped) play-head sits
    pub fn start_index(&self) -> usize {
        match self.mode {
            PlaybackMode::Backward => self.count().saturating_sub(1),
            _ => 0,
        }
    }
}

/// Named collection of frame sequences for one sprite image.
///
/// Several sequences may share a name ("idle" variants), `get(name, true)`
/// then picks one of them at random.
#[derive(Debug, Default, Clone)]
pub struct AnimationSet {
    name: String,
    image: String,
    sequences: Vec<Rc<FrameSequence>>,
}

impl AnimationSet {
    pub fn new(name: &str, image: &str) -> Self {
        AnimationSet {
            name: name.to_string(),
            image: image.to_string(),
            sequences: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// name of the image the frames index into
    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn add(&mut self, sequence: FrameSequence) -> &mut Self {
        if sequence.name().trim().is_empty() {
            log::warn!("{}: ignoring a frame sequence without name", self.name);
            return self;
        }
        self.sequences.push(Rc::new(sequence));
        self
    }

    pub fn with(mut self, sequence: FrameSequence) -> Self {
        self.add(sequence);
        self
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn has(&self, name: &str) -> bool {
        !name.is_empty() && self.sequences.iter().any(|s| s.name() == name)
    }

    pub fn get(&self, name: &str, random: bool) -> Option<Rc<FrameSequence>> {
        let matches: Vec<&Rc<FrameSequence>> =
            self.sequences.iter().filter(|s| s.name() == name).collect();
        let picked = if random {
            matches.choose(&mut rand::thread_rng())
        } else {
            matches.first()
        };
        picked.map(|s| Rc::clone(*s))
    }

    pub fn first(&self) -> Option<Rc<FrameSequence>> {
        self.sequences.first().cloned()
    }

    pub fn last(&self) -> Option<Rc<FrameSequence>> {
        self.sequences.last().cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|s| s.name())
    }

    pub fn create_animation(
        &self,
        name: &str,
        random: bool,
        auto_start: bool,
    ) -> StageResult<AnimationInstance> {
        let sequence = self.get(name, random).ok_or_else(|| {
            StageError::InvalidSequence(format!("{} has no animation '{}'", self.name, name))
        })?;
        Ok(AnimationInstance::new(sequence, auto_start))
    }
}
