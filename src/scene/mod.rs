//! TABLE
//! ┌───────────────────── Scene Update / Draw Flow ──────────────────────────┐
//! │                                                                         │
//! │    ┌─────────────┐  update  ┌─────────────┐  update  ┌─────────────┐    │
//! │    │  GameLoop   ├─────────►│ SceneStack  ├─────────►│ current()   │    │
//! │    │  (host)     │          │             │          │ SceneNode   │    │
//! │    └─────────────┘          └──────┬──────┘          └──────┬──────┘    │
//! │                                    │ apply                  │ children  │
//! │                              ┌─────┴──────┐            ┌────┴─────┐     │
//! │                              │ SceneCtx   │◄───────────┤ Scene    │     │
//! │                              │ requests   │  push/pop  │ update() │     │
//! │                              └────────────┘            └──────────┘     │
//! │                                                                         │
//! ├──────────────────────── Draw Order (per node) ──────────────────────────┤
//! │  1. Background children  2. own draw()  3. Main children                │
//! │  4. Foreground children  5. Overlay children  6. own draw_overlay()     │
//! └─────────────────────────────────────────────────────────────────────────┘

pub mod stack;

use crate::engine::Surface;
use crate::error::{StageError, StageResult};

pub use self::stack::SceneStack;

/// Host supplied behaviour of a scene. Both hooks default to doing nothing so
/// grouping nodes (a world that only holds layers) need no code at all.
pub trait Scene {
    /// Per frame logic. Children of the node have already been updated when
    /// this runs.
    fn update(&mut self, _dt: f64, _context: &mut SceneContext) {}

    /// main content
    fn draw(&self, _surface: &mut dyn Surface) {}

    /// HUD, drawn after everything else of the node
    fn draw_overlay(&self, _surface: &mut dyn Surface) {}
}

/// Scene with no behaviour (boot node, grouping nodes).
#[derive(Debug, Default)]
pub struct EmptyScene;

impl Scene for EmptyScene {}

/// Where a child node is drawn relative to its parent's own content.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum SceneLayer {
    Background,
    #[default]
    Main,
    Foreground,
    Overlay,
}

/// Navigation requested by a scene while it updates.
pub enum Transition {
    Push(SceneNode),
    Pop,
    BackTo(String),
}

/// Collects the transitions scenes ask for during one update pass. The
/// stack applies them, in order, as soon as the pass returns (before the
/// draw of the same tick). Requests always target the top level stack,
/// whichever node made them.
#[derive(Default)]
pub struct SceneContext {
    requests: Vec<Transition>,
}

impl SceneContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: SceneNode) {
        self.requests.push(Transition::Push(node));
    }

    pub fn pop(&mut self) {
        self.requests.push(Transition::Pop);
    }

    pub fn back_to(&mut self, name: &str) {
        self.requests.push(Transition::BackTo(name.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.requests)
    }
}

/// A named, stackable unit of game state.
///
/// The node only carries bookkeeping (name, pinned flag, layer, children),
/// everything the scene owns lives behind the [`Scene`] trait object.
pub struct SceneNode {
    name: String,
    pinned: bool,
    layer: SceneLayer,
    children: Vec<SceneNode>,
    scene: Box<dyn Scene>,
}

impl std::fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name)
            .field("pinned", &self.pinned)
            .field("layer", &self.layer)
            .field("children", &self.children)
            .finish()
    }
}

impl SceneNode {
    pub fn new(name: &str, scene: impl Scene + 'static) -> Self {
        SceneNode {
            name: name.to_string(),
            pinned: false,
            layer: SceneLayer::default(),
            children: Vec::new(),
            scene: Box::new(scene),
        }
    }

    pub fn empty(name: &str) -> Self {
        SceneNode::new(name, EmptyScene)
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn with_layer(mut self, layer: SceneLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Builder flavour of [`push_child`](Self::push_child), invalid children
    /// are dropped with a warning.
    pub fn with_child(mut self, child: SceneNode) -> Self {
        if let Err(err) = self.push_child(child) {
            log::warn!("{}: {}", self.name, err);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is(&self, name: &str) -> bool {
        !name.is_empty() && self.name == name
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub(crate) fn pin(&mut self) {
        self.pinned = true;
    }

    pub fn layer(&self) -> SceneLayer {
        self.layer
    }

    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> &mut dyn Scene {
        self.scene.as_mut()
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&SceneNode> {
        self.children.iter().find(|c| c.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        self.children.iter_mut().find(|c| c.is(name))
    }

    pub fn push_child(&mut self, child: SceneNode) -> StageResult<()> {
        child.validate()?;
        self.children.push(child);
        Ok(())
    }

    /// Remove the top child unless it is pinned
    pub fn pop_child(&mut self) -> Option<SceneNode> {
        match self.children.last() {
            Some(child) if child.pinned => None,
            Some(_) => self.children.pop(),
            None => None,
        }
    }

    /// A node needs a name, and so does every node below it
    pub fn validate(&self) -> StageResult<()> {
        if self.name.trim().is_empty() {
            return Err(StageError::InvalidNode("scene node without a name".to_string()));
        }
        self.children.iter().try_for_each(|child| child.validate())
    }

    /// Children first so the node sees their post-update state
    pub fn update(&mut self, dt: f64, context: &mut SceneContext) {
        for child in self.children.iter_mut() {
            child.update(dt, context);
        }
        self.scene.update(dt, context);
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        self.draw_children(SceneLayer::Background, surface);
        self.scene.draw(surface);
        self.draw_children(SceneLayer::Main, surface);
        self.draw_children(SceneLayer::Foreground, surface);
        self.draw_children(SceneLayer::Overlay, surface);
        self.scene.draw_overlay(surface);
    }

    fn draw_children(&self, layer: SceneLayer, surface: &mut dyn Surface) {
        self.children
            .iter()
            .filter(|child| child.layer == layer)
            .for_each(|child| child.draw(surface));
    }
}
