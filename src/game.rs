use crate::browser;
use crate::config::StageConfig;
use crate::content::{Asset, AssetKind, AssetResolver};
use crate::engine::{BlendMode, Content, Game, Point, Rect, Renderer, Size, Surface};
use crate::error::StageError;
use crate::scene::{Scene, SceneContext, SceneLayer, SceneNode, SceneStack};
use crate::sprite::animated::AnimatedSprite;
use crate::sprite::sheet::SpriteSheet;
use crate::sprite::{AnimationSet, FrameSequence, PlaybackMode};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::join;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// TABLE
/// ┌───────────────────── Showcase Architecture Overview ────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐  update  ┌─────────────┐  update  ┌─────────────┐    │
/// │    │  engine.rs  ├─────────►│   game.rs   ├─────────►│ SceneStack  │    │
/// │    │  GameLoop   │   draw   │  Showcase   │   draw   │  current()  │    │
/// │    └─────────────┘          └─────────────┘          └──────┬──────┘    │
/// │                                                             │           │
/// │         boot ──► title ──(TITLE_SECONDS)──► world ──────────┘           │
/// │                   ▲                           │                         │
/// │                   └───── back_to(title) ──────┘  (WORLD_SECONDS)        │
/// │                                                                         │
/// ├──────────────────────── World Layers ───────────────────────────────────┤
/// │  Background : backdrop image (optional)                                 │
/// │  Main       : walking hero                                              │
/// │  Overlay    : faded hero badge in the top left corner                   │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum Showcase {
    /// Waiting for `initialize`, keeps the frame rate used for animations
    /// that don't name one and the canvas width actors walk across
    Loading { default_fps: f64, width: i32 },

    /// Assets are in, the scene stack drives everything
    Loaded(SceneStack),
}

const TITLE: &str = "title";
const WORLD: &str = "world";
const TITLE_SECONDS: f64 = 2.0;
const WORLD_SECONDS: f64 = 12.0;

impl Showcase {
    const MANIFEST_PATH: &'static str = "hero.json";
    const IMAGE_PATH: &'static str = "hero.png";
    const BACKGROUND_PATH: &'static str = "background.png";

    pub fn new(config: &StageConfig) -> Self {
        Showcase::Loading {
            default_fps: config.default_animation_fps,
            width: config.width as i32,
        }
    }

    async fn load_manifest() -> Result<Manifest> {
        browser::fetch_json::<Manifest>(Self::MANIFEST_PATH)
            .await
            .with_context(|| format!("Failed to load animations from : {}", Self::MANIFEST_PATH))
    }
}

#[async_trait(?Send)]
impl Game for Showcase {
    async fn initialize(&self, content: &mut Content) -> Result<Box<dyn Game>> {
        match self {
            Showcase::Loading { default_fps, width } => {
                // manifest and sprite image are independent, fetch both at once
                let (manifest, image) = join!(
                    Self::load_manifest(),
                    content.load_image(Self::IMAGE_PATH, Self::IMAGE_PATH)
                );
                let manifest = manifest?;
                image.with_context(|| {
                    format!("Failed to load sprite image from : {}", Self::IMAGE_PATH)
                })?;
                // the backdrop is decoration, run without it if it's missing
                if let Err(err) = content
                    .load_image(Self::BACKGROUND_PATH, Self::BACKGROUND_PATH)
                    .await
                {
                    log::warn!("no backdrop : {:#}", err);
                }

                let cast = Cast::resolve(&*content, &manifest, *default_fps, *width)?;
                Ok(Box::new(Showcase::Loaded(cast.stage())))
            }
            Showcase::Loaded(_) => Err(anyhow!("Showcase is already initialized")),
        }
    }

    fn update(&mut self, dt: f64) {
        if let Showcase::Loaded(stack) = self {
            stack.update(dt);
        }
    }

    fn draw(&mut self, renderer: &mut Renderer) {
        if let Showcase::Loaded(stack) = self {
            stack.draw(renderer);
        }
    }
}

// ==================== Manifest ====================
/// `hero.json`, one entry per animation :
/// ```json
/// { "name": "hero", "frame_width": 64, "frame_height": 64,
///   "animations": [ { "name": "run", "frames": [0, 1, 2, 3], "fps": 12 } ] }
/// ```
#[derive(Debug, Deserialize, Serialize, Clone)]
struct Manifest {
    name: String,
    #[serde(default)]
    frame_width: i32,
    #[serde(default)]
    frame_height: i32,
    animations: Vec<ManifestAnimation>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
struct ManifestAnimation {
    name: String,
    frames: Vec<u32>,
    #[serde(default)]
    fps: Option<f64>,
    #[serde(default)]
    loops: u32,
    #[serde(default)]
    mode: String,
}

impl Manifest {
    fn frame_size(&self) -> Size {
        Size {
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    /// Entries that don't make a valid sequence are skipped with a warning
    fn animation_set(&self, image: &str, default_fps: f64) -> AnimationSet {
        let mut set = AnimationSet::new(&self.name, image);
        for entry in &self.animations {
            let sequence = entry.mode.parse::<PlaybackMode>().and_then(|mode| {
                FrameSequence::new(
                    &entry.name,
                    entry.frames.clone(),
                    entry.fps.unwrap_or(default_fps),
                    entry.loops,
                    mode,
                )
            });
            match sequence {
                Ok(sequence) => {
                    set.add(sequence);
                }
                Err(err) => log::warn!("{}: skipping animation : {}", self.name, err),
            }
        }
        set
    }
}

// ==================== Scenes ====================
/// Shared templates every scene builds its sprites from
#[derive(Clone)]
struct Cast {
    animations: Rc<AnimationSet>,
    sheet: Rc<SpriteSheet>,
    backdrop: Option<Rc<SpriteSheet>>,
    viewport_width: i32,
}

impl Cast {
    const RUN: &'static str = "run";
    const IDLE: &'static str = "idle";

    /// Images come out of `assets` by name, only what's already loaded
    /// resolves. A missing backdrop is fine, a missing sprite sheet is not.
    fn resolve(
        assets: &dyn AssetResolver,
        manifest: &Manifest,
        default_fps: f64,
        viewport_width: i32,
    ) -> Result<Cast> {
        let image = assets
            .resolve(Showcase::IMAGE_PATH, AssetKind::Image)
            .ok_or_else(|| anyhow!("sprite image {} is not loaded", Showcase::IMAGE_PATH))?;
        let animations = manifest.animation_set(&image.name, default_fps);
        if animations.is_empty() {
            return Err(anyhow!("{} has no playable animations", Showcase::MANIFEST_PATH));
        }
        let backdrop = assets
            .resolve(Showcase::BACKGROUND_PATH, AssetKind::Image)
            .map(|asset| Rc::new(SpriteSheet::new(asset, Size::default())));
        Ok(Cast {
            animations: Rc::new(animations),
            sheet: Rc::new(SpriteSheet::new(image, manifest.frame_size())),
            backdrop,
            viewport_width,
        })
    }

    fn sprite(&self, position: Point) -> AnimatedSprite {
        AnimatedSprite::new(self.animations.clone(), self.sheet.clone(), position)
    }

    fn stage(self) -> SceneStack {
        let mut stack = SceneStack::default();
        stack.set_diagnostics(Box::new(|err: &StageError| log::error!("scene stack : {}", err)));
        stack.push(SceneNode::new(TITLE, Title::new(self)));
        stack
    }

    fn world(&self) -> SceneNode {
        let mut hero = self.sprite(Point { x: 0, y: 400 });
        if !hero.play(Self::RUN, true) {
            hero.play(Self::IDLE, false);
        }
        hero.set_velocity(Point { x: 3, y: 0 });

        let mut badge = self.sprite(Point { x: 8, y: 8 });
        badge.set_opacity(0.5);
        badge.set_blend_mode(BlendMode::Screen);

        let mut world = SceneNode::new(WORLD, World::default())
            .with_child(SceneNode::new("hero", Actor::walking(hero, self.viewport_width)))
            .with_child(
                SceneNode::new("badge", Actor::still(badge)).with_layer(SceneLayer::Overlay),
            );
        if let Some(sheet) = self.backdrop.as_ref() {
            let backdrop = SceneNode::new("backdrop", Backdrop(sheet.image().clone()))
                .with_layer(SceneLayer::Background)
                .pinned();
            world = world.with_child(backdrop);
        }
        world
    }
}

/// Idle hero in the middle of the screen, hands over to the world after a
/// short while.
struct Title {
    cast: Cast,
    hero: AnimatedSprite,
    elapsed: f64,
}

impl Title {
    fn new(cast: Cast) -> Self {
        let x = (cast.viewport_width - cast.sheet.frame_size().width) / 2;
        let mut hero = cast.sprite(Point { x, y: 268 });
        hero.play(Cast::IDLE, false);
        Title {
            cast,
            hero,
            elapsed: 0.0,
        }
    }
}

impl Scene for Title {
    fn update(&mut self, dt: f64, context: &mut SceneContext) {
        self.hero.update(dt);
        self.elapsed += dt;
        if self.elapsed >= TITLE_SECONDS {
            self.elapsed = 0.0;
            context.push(self.cast.world());
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        self.hero.draw(surface);
    }
}

/// Grouping node, only keeps time and returns to the title
#[derive(Default)]
struct World {
    elapsed: f64,
}

impl Scene for World {
    fn update(&mut self, dt: f64, context: &mut SceneContext) {
        self.elapsed += dt;
        if self.elapsed >= WORLD_SECONDS {
            context.back_to(TITLE);
        }
    }
}

/// A sprite inside a scene node. Walking actors wrap around the viewport.
struct Actor {
    sprite: AnimatedSprite,
    wrap_width: Option<i32>,
}

impl Actor {
    fn walking(sprite: AnimatedSprite, viewport_width: i32) -> Self {
        Actor {
            sprite,
            wrap_width: Some(viewport_width),
        }
    }

    fn still(sprite: AnimatedSprite) -> Self {
        Actor {
            sprite,
            wrap_width: None,
        }
    }
}

impl Scene for Actor {
    fn update(&mut self, dt: f64, _context: &mut SceneContext) {
        let result = self.sprite.update(dt);
        // finite animations fall back to idle once they are done
        if result.completed && self.sprite.animation_name() != Some(Cast::IDLE) {
            self.sprite.play(Cast::IDLE, false);
        }
        let Point { x, y } = self.sprite.position();
        if matches!(self.wrap_width, Some(wrap) if x > wrap) {
            let width = self.sprite.bounding_box().size.width;
            self.sprite.set_position(Point { x: -width, y });
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        self.sprite.draw(surface);
    }
}

/// Full image drawn at the origin
struct Backdrop(Asset);

impl Scene for Backdrop {
    fn draw(&self, surface: &mut dyn Surface) {
        let region = Rect::new(Point::default(), self.0.size);
        surface.draw_region(&self.0, &region, &region, 1.0, BlendMode::Normal);
    }
}
