// ==================== Modules ====================
pub mod browser;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod game;
pub mod scene;
pub mod sprite;
pub mod time;

// ==================== Imports ====================
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

pub use crate::config::StageConfig;
pub use crate::content::{Asset, AssetKind, AssetResolver, ContentCache};
pub use crate::engine::{BlendMode, LoopHandle, Point, Rect, Size, Surface};
pub use crate::error::{Diagnostics, StageError, StageResult};
pub use crate::scene::{Scene, SceneContext, SceneLayer, SceneNode, SceneStack};
pub use crate::sprite::animated::AnimatedSprite;
pub use crate::sprite::sheet::SpriteSheet;
pub use crate::sprite::state::{AdvanceResult, AnimationInstance, LoopPolicy, PlaybackState};
pub use crate::sprite::{AnimationSet, FrameSequence, PlaybackMode};
pub use crate::time::{FixedStep, GameTime};

const CONFIG_PATH: &str = "stage.json";

thread_local! {
    // set once the showcase loop is running, the page drives it through the
    // exported pause/resume/stop functions
    static RUNNING_LOOP: RefCell<Option<LoopHandle>> = RefCell::new(None);
}

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - routes logs and panics to the console
/// - loads `stage.json` (defaults when missing)
/// - starts the showcase game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    browser::init_logging(log::Level::Info);

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        let config = match browser::fetch_json::<StageConfig>(CONFIG_PATH).await {
            Ok(config) => config,
            Err(err) => {
                log::info!("{} not loaded ({:#}), using defaults", CONFIG_PATH, err);
                StageConfig::default()
            }
        }
        .validate();

        let game = game::Showcase::new(&config);
        match engine::GameLoop::start(game, config).await {
            Ok(handle) => RUNNING_LOOP.with(|running| *running.borrow_mut() = Some(handle)),
            Err(err) => log::error!("Could not start game loop : {:#}", err),
        }
    });

    Ok(())
}

fn with_loop(action: impl FnOnce(&LoopHandle)) {
    RUNNING_LOOP.with(|running| match running.borrow().as_ref() {
        Some(handle) => action(handle),
        None => log::warn!("game loop is not running yet"),
    });
}

/// Freeze updates, frames keep drawing
#[wasm_bindgen]
pub fn pause_js() {
    with_loop(LoopHandle::pause);
}

#[wasm_bindgen]
pub fn resume_js() {
    with_loop(LoopHandle::resume);
}

/// Ends the loop for good
#[wasm_bindgen]
pub fn stop_js() {
    with_loop(LoopHandle::stop);
}
