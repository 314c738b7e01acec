use crate::browser;
use crate::config::StageConfig;
use crate::content::{Asset, AssetKind, AssetResolver};
use crate::time::{FixedStep, GameTime};
use anyhow::{anyhow, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - because we control the closure creation and specify the expected type,
    // in principle this should be generally safe (unsafe) code
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect::new(Point { x, y }, Size { width, height })
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn right(&self) -> i32 {
        self.position.x + self.size.width
    }

    pub fn bottom(&self) -> i32 {
        self.position.y + self.size.height
    }

    pub fn is_empty(&self) -> bool {
        self.size.width <= 0 || self.size.height <= 0
    }

    /// Axis aligned overlap test, touching edges don't count
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x() < other.right()
            && self.right() > other.x()
            && self.y() < other.bottom()
            && self.bottom() > other.y()
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x()
            && point.x < self.right()
            && point.y >= self.y()
            && point.y < self.bottom()
    }
}

// ==================== Drawing ====================
/// Canvas compositing modes a draw call can ask for.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    Color,
    Luminosity,
}

impl BlendMode {
    /// value for `CanvasRenderingContext2d.globalCompositeOperation`
    pub fn composite_operation(&self) -> &'static str {
        match self {
            BlendMode::Normal => "source-over",
            BlendMode::Additive => "lighter",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        }
    }
}

/// Anything that can take sprite draw calls. The core only ever computes
/// rectangles and hands them over, it never touches pixels.
pub trait Surface {
    fn draw_region(
        &mut self,
        asset: &Asset,
        source: &Rect,
        destination: &Rect,
        opacity: f32,
        blend_mode: BlendMode,
    );

    /// debug outlines (bounding boxes), ignored unless the surface cares
    fn draw_outline(&mut self, _rect: &Rect) {}
}

// ==================== Content ====================
/// Browser side image cache. Scenes only see [`Asset`] descriptors through
/// [`AssetResolver`], the [`Renderer`] maps them back to the elements.
#[derive(Default)]
pub struct Content {
    images: HashMap<String, HtmlImageElement>,
}

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `source` and register it under `name`
    pub async fn load_image(&mut self, name: &str, source: &str) -> Result<Asset> {
        let image = load_image(source).await?;
        let asset = Asset::image(name, image_size(&image));
        log::info!("loaded image [{}] from {} ({:?})", name, source, asset.size);
        self.images.insert(name.to_string(), image);
        Ok(asset)
    }

    fn image(&self, name: &str) -> Option<&HtmlImageElement> {
        self.images.get(name)
    }
}

impl AssetResolver for Content {
    fn resolve(&self, name: &str, kind: AssetKind) -> Option<Asset> {
        match kind {
            AssetKind::Image => self
                .image(name)
                .map(|image| Asset::image(name, image_size(image))),
            // audio playback lives outside of this crate
            AssetKind::Audio => None,
        }
    }
}

fn image_size(image: &HtmlImageElement) -> Size {
    Size {
        width: image.natural_width() as i32,
        height: image.natural_height() as i32,
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
    content: Rc<Content>,
    viewport: Rect,
    clear_color: String,
}

impl Renderer {
    pub fn new(
        context: CanvasRenderingContext2d,
        content: Rc<Content>,
        config: &StageConfig,
    ) -> Self {
        Renderer {
            context,
            content,
            viewport: Rect::from_xywh(0, 0, config.width as i32, config.height as i32),
            clear_color: config.clear_color.clone(),
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn clear(&self) {
        let rect = &self.viewport;
        self.context.clear_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
        self.context.set_fill_style_str(&self.clear_color);
        self.context.fill_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }
}

impl Surface for Renderer {
    fn draw_region(
        &mut self,
        asset: &Asset,
        source: &Rect,
        destination: &Rect,
        opacity: f32,
        blend_mode: BlendMode,
    ) {
        let Some(image) = self.content.image(&asset.name) else {
            log::warn!("draw skipped, image [{}] is not loaded", asset.name);
            return;
        };
        self.context.save();
        if let Err(err) = self
            .context
            .set_global_composite_operation(blend_mode.composite_operation())
        {
            log::warn!("unsupported blend mode {:?} : {:#?}", blend_mode, err);
        }
        self.context.set_global_alpha(opacity.clamp(0.0, 1.0).into());
        let result = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                source.x().into(),
                source.y().into(),
                source.size.width.into(),
                source.size.height.into(),
                destination.x().into(),
                destination.y().into(),
                destination.size.width.into(),
                destination.size.height.into(),
            );
        self.context.restore();
        if let Err(err) = result {
            log::error!("drawing [{}] failed : {:#?}", asset.name, err);
        }
    }

    fn draw_outline(&mut self, rect: &Rect) {
        self.context.set_stroke_style_str("#FF0000");
        self.context.stroke_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }
}

// ==================== Loop ====================
#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self, content: &mut Content) -> Result<Box<dyn Game>>;
    fn update(&mut self, dt: f64);
    fn draw(&mut self, renderer: &mut Renderer);
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

/// Remote control of a started [`GameLoop`], clones share the same clock.
///
/// LoopHandle
/// - pause()  -> frames keep drawing, updates stop, paused time is skipped
/// - resume() -> updates pick up where they paused
/// - stop()   -> the loop ends on its next frame, can't be resumed
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    time: Rc<RefCell<GameTime>>,
}

impl LoopHandle {
    pub fn pause(&self) {
        let mut time = self.time.borrow_mut();
        if time.running() {
            time.stop(false);
            log::info!("GameLoop paused at {:.2}s", time.total());
        }
    }

    pub fn resume(&self) {
        let mut time = self.time.borrow_mut();
        if time.paused() {
            time.start(true);
            log::info!("GameLoop resumed");
        }
    }

    pub fn stop(&self) {
        let mut time = self.time.borrow_mut();
        if !time.stopped() {
            log::info!("GameLoop stopped after {:.2}s", time.total());
            time.stop(true);
        }
    }

    pub fn running(&self) -> bool {
        self.time.borrow().running()
    }

    pub fn paused(&self) -> bool {
        self.time.borrow().paused()
    }

    pub fn stopped(&self) -> bool {
        self.time.borrow().stopped()
    }

    /// seconds of running time so far
    pub fn total(&self) -> f64 {
        self.time.borrow().total()
    }
}

pub struct GameLoop {
    handle: LoopHandle,
    steps: FixedStep,
}

impl GameLoop {
    fn new(config: &StageConfig) -> Self {
        let handle = LoopHandle::default();
        handle.time.borrow_mut().start(false);
        GameLoop {
            handle,
            steps: FixedStep::new(config.step_seconds(), config.max_steps_per_frame),
        }
    }

    /// Fixed updates owed for the frame stamped `now` (milliseconds)
    fn updates_due(&mut self, now: f64) -> u32 {
        let dt = self.handle.time.borrow_mut().tick(now);
        if !self.handle.running() {
            self.steps.reset();
            return 0;
        }
        self.steps.accumulate(dt)
    }

    pub async fn start(game: impl Game + 'static, config: StageConfig) -> Result<LoopHandle> {
        let config = config.validate();
        let mut content = Content::new();
        let mut game = game.initialize(&mut content).await?;
        let mut game_loop = GameLoop::new(&config);
        let handle = game_loop.handle.clone();
        // resolve the canvas once, up front, so a bad canvas_id fails start()
        // instead of every frame
        let mut renderer =
            Renderer::new(browser::context(&config.canvas_id)?, Rc::new(content), &config);

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            if game_loop.handle.stopped() {
                // no new frame request, the loop ends here
                return;
            }
            // every update sees the same fixed step, draw runs once per frame
            for _ in 0..game_loop.updates_due(perf) {
                game.update(game_loop.steps.step());
            }
            renderer.clear();
            game.draw(&mut renderer);
            if let Some(closure) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(closure) {
                    log::error!("GameLoop stopped : {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(handle)
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - double unwrap because Result<Result<(), Error>, oneshot::Canceled>
    // - first unwrap yields channel result : Result<(), Error>
    // - second unwrap yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::from_xywh(0, 0, 10, 10);
        let b = Rect::from_xywh(5, 5, 10, 10);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::from_xywh(0, 0, 10, 10);
        let b = Rect::from_xywh(10, 0, 10, 10);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn empty_rects_never_intersect() {
        let a = Rect::from_xywh(0, 0, 0, 10);
        let b = Rect::from_xywh(0, 0, 10, 10);
        assert!(a.is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn contains_is_half_open() {
        let rect = Rect::from_xywh(2, 2, 4, 4);
        assert!(rect.contains(Point { x: 2, y: 2 }));
        assert!(!rect.contains(Point { x: 6, y: 3 }));
    }

    #[test]
    fn paused_loop_runs_no_updates() {
        let config = StageConfig {
            updates_per_second: 4.0,
            ..StageConfig::default()
        };
        let mut game_loop = GameLoop::new(&config);
        let handle = game_loop.handle.clone();
        assert_eq!(game_loop.updates_due(0.0), 0);
        assert_eq!(game_loop.updates_due(500.0), 2);

        handle.pause();
        assert!(handle.paused());
        assert_eq!(game_loop.updates_due(10_000.0), 0);

        // the first frame after resuming only sets the stamp
        handle.resume();
        assert!(handle.running());
        assert_eq!(game_loop.updates_due(20_000.0), 0);
        assert_eq!(game_loop.updates_due(20_250.0), 1);
        assert_relative_eq!(handle.total(), 0.75, epsilon = 1e-9);
    }

    #[test]
    fn stopped_loop_stays_stopped() {
        let mut game_loop = GameLoop::new(&StageConfig::default());
        let handle = game_loop.handle.clone();
        handle.stop();
        handle.resume();
        assert!(handle.stopped());
        assert_eq!(game_loop.updates_due(1000.0), 0);
        assert_relative_eq!(handle.total(), 0.0);
    }

    #[test]
    fn blend_modes_map_to_canvas_names() {
        assert_eq!(BlendMode::default().composite_operation(), "source-over");
        assert_eq!(BlendMode::Additive.composite_operation(), "lighter");
        assert_eq!(BlendMode::Luminosity.composite_operation(), "luminosity");
    }
}
