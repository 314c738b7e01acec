use crate::engine::Surface;
use crate::error::{Diagnostics, StageError, StageResult};
use crate::scene::{SceneContext, SceneNode, Transition};

pub const BOOT_SCENE: &str = "boot";

/// Ordered stack of scene nodes, the last one is the current scene.
///
/// The boot node is kept apart from the pushed nodes so the stack can never
/// run empty: every pop, `back_to` or `reset` stops at it.
pub struct SceneStack {
    boot: SceneNode,
    stack: Vec<SceneNode>,
    diagnostics: Option<Diagnostics>,
}

impl Default for SceneStack {
    fn default() -> Self {
        SceneStack::new(SceneNode::empty(BOOT_SCENE))
    }
}

impl SceneStack {
    /// `boot` becomes permanent: it is pinned whatever it says
    pub fn new(mut boot: SceneNode) -> Self {
        if let Err(err) = boot.validate() {
            log::warn!("boot {}, using '{}' instead", err, BOOT_SCENE);
            boot = SceneNode::empty(BOOT_SCENE);
        }
        boot.pin();
        SceneStack {
            boot,
            stack: Vec::new(),
            diagnostics: None,
        }
    }

    /// Receive every error a forgiving call (`push`, transitions) swallowed
    pub fn set_diagnostics(&mut self, diagnostics: Diagnostics) {
        self.diagnostics = Some(diagnostics);
    }

    pub fn try_push(&mut self, node: SceneNode) -> StageResult<()> {
        node.validate()?;
        log::debug!("scene push [{}] over [{}]", node.name(), self.current().name());
        self.stack.push(node);
        Ok(())
    }

    /// Push `node`, an invalid node is reported and ignored
    pub fn push(&mut self, node: SceneNode) -> &mut Self {
        if let Err(err) = self.try_push(node) {
            self.report(err);
        }
        self
    }

    /// Remove the current scene and hand it back, unless it is pinned or
    /// the boot node.
    pub fn pop(&mut self) -> Option<SceneNode> {
        match self.stack.last() {
            None => {
                log::debug!("scene pop refused, only the boot scene is left");
                None
            }
            Some(node) if node.is_pinned() => {
                log::debug!("scene pop refused, [{}] is pinned", node.name());
                None
            }
            Some(_) => {
                let node = self.stack.pop();
                if let Some(node) = node.as_ref() {
                    log::debug!("scene pop [{}]", node.name());
                }
                node
            }
        }
    }

    /// Pop and return the new current scene
    pub fn back(&mut self) -> &SceneNode {
        self.pop();
        self.current()
    }

    /// Drop everything above the first scene called `name`. Without a match
    /// only the boot scene is left. Pinned scenes don't survive this one.
    pub fn back_to(&mut self, name: &str) -> &SceneNode {
        let keep = if self.boot.is(name) {
            0
        } else {
            match self.stack.iter().position(|node| node.is(name)) {
                Some(index) => index + 1,
                None => {
                    log::warn!("no scene [{}] to go back to, returning to boot", name);
                    0
                }
            }
        };
        self.stack.truncate(keep);
        self.current()
    }

    /// back to the boot scene
    pub fn reset(&mut self) -> &SceneNode {
        self.stack.clear();
        self.current()
    }

    pub fn current(&self) -> &SceneNode {
        self.stack.last().unwrap_or(&self.boot)
    }

    pub fn current_mut(&mut self) -> &mut SceneNode {
        match self.stack.last_mut() {
            Some(node) => node,
            None => &mut self.boot,
        }
    }

    pub fn boot(&self) -> &SceneNode {
        &self.boot
    }

    pub fn is(&self, name: &str) -> bool {
        self.current().is(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.boot.is(name) || self.stack.iter().any(|node| node.is(name))
    }

    /// number of scenes including boot, never 0
    pub fn len(&self) -> usize {
        self.stack.len() + 1
    }

    /// bottom (boot) to top
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(&self.boot)
            .chain(self.stack.iter())
            .map(|node| node.name())
            .collect()
    }

    /// Update the current scene (and its children), then apply whatever
    /// navigation it asked for. Runs once per tick, before `draw`.
    pub fn update(&mut self, dt: f64) {
        let mut context = SceneContext::new();
        self.current_mut().update(dt, &mut context);
        for transition in context.take() {
            self.apply(transition);
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        self.current().draw(surface);
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Push(node) => {
                self.push(node);
            }
            Transition::Pop => {
                self.pop();
            }
            Transition::BackTo(name) => {
                self.back_to(&name);
            }
        }
    }

    fn report(&mut self, err: StageError) {
        log::warn!("{}", err);
        if let Some(diagnostics) = self.diagnostics.as_mut() {
            diagnostics(&err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Asset;
    use crate::engine::{BlendMode, Rect};
    use crate::scene::Scene;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn names(stack: &SceneStack) -> Vec<String> {
        stack.names().into_iter().map(String::from).collect()
    }

    #[test]
    fn starts_on_boot() {
        let stack = SceneStack::default();
        assert!(stack.is(BOOT_SCENE));
        assert!(stack.boot().is_pinned());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn back_to_is_inclusive() {
        let mut stack = SceneStack::default();
        stack
            .push(SceneNode::empty("Title"))
            .push(SceneNode::empty("World"));
        let current = stack.back_to("Title").name().to_string();
        assert_eq!(current, "Title");
        assert_eq!(names(&stack), vec!["boot", "Title"]);
    }

    #[test]
    fn back_to_first_match() {
        let mut stack = SceneStack::default();
        stack
            .push(SceneNode::empty("Menu"))
            .push(SceneNode::empty("World"))
            .push(SceneNode::empty("Menu"));
        stack.back_to("Menu");
        assert_eq!(names(&stack), vec!["boot", "Menu"]);
    }

    #[test]
    fn back_to_unknown_returns_to_boot() {
        let mut stack = SceneStack::default();
        stack.push(SceneNode::empty("Title").pinned());
        assert!(stack.back_to("Credits").is(BOOT_SCENE));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn boot_is_never_popped() {
        let mut stack = SceneStack::default();
        assert!(stack.pop().is_none());
        assert!(stack.back().is(BOOT_SCENE));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn pinned_scene_stays() {
        let mut stack = SceneStack::default();
        stack.push(SceneNode::empty("Hud").pinned());
        assert!(stack.pop().is_none());
        assert_eq!(names(&stack), vec!["boot", "Hud"]);
    }

    #[test]
    fn pop_hands_back_the_node() {
        let mut stack = SceneStack::default();
        stack.push(SceneNode::empty("Title"));
        let popped = stack.pop();
        assert_eq!(popped.map(|n| n.name().to_string()), Some("Title".to_string()));
        assert!(stack.is(BOOT_SCENE));
    }

    #[test]
    fn invalid_push_is_reported() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut stack = SceneStack::default();
        stack.set_diagnostics(Box::new(move |err: &StageError| {
            sink.borrow_mut().push(err.clone())
        }));
        stack.push(SceneNode::empty(""));
        assert_eq!(stack.len(), 1);
        assert!(matches!(seen.borrow().as_slice(), [StageError::InvalidNode(_)]));
        assert!(stack.try_push(SceneNode::empty(" ")).is_err());
    }

    #[test]
    fn unnamed_boot_is_replaced() {
        let stack = SceneStack::new(SceneNode::empty(""));
        assert!(stack.boot().is(BOOT_SCENE));
    }

    #[test]
    fn reset_keeps_boot() {
        let mut stack = SceneStack::new(SceneNode::empty("Splash"));
        stack.push(SceneNode::empty("A")).push(SceneNode::empty("B"));
        assert!(stack.reset().is("Splash"));
        assert!(stack.contains("Splash"));
        assert!(!stack.contains("A"));
    }

    // a scene that pushes "Next" on its first update and counts draws
    struct Launcher {
        launched: bool,
    }

    impl Scene for Launcher {
        fn update(&mut self, _dt: f64, context: &mut crate::scene::SceneContext) {
            if !self.launched {
                self.launched = true;
                context.push(SceneNode::new("Next", Marker));
            }
        }
    }

    struct Marker;

    impl Scene for Marker {
        fn draw(&self, surface: &mut dyn Surface) {
            let rect = Rect::from_xywh(0, 0, 1, 1);
            surface.draw_region(&Asset::audio("marker"), &rect, &rect, 1.0, BlendMode::Normal);
        }
    }

    #[derive(Default)]
    struct Counter {
        regions: Vec<String>,
    }

    impl Surface for Counter {
        fn draw_region(&mut self, asset: &Asset, _: &Rect, _: &Rect, _: f32, _: BlendMode) {
            self.regions.push(asset.name.clone());
        }
    }

    #[test]
    fn transitions_apply_before_draw() {
        let mut stack = SceneStack::default();
        stack.push(SceneNode::new("Title", Launcher { launched: false }));
        stack.update(0.016);
        assert!(stack.is("Next"));
        let mut surface = Counter::default();
        stack.draw(&mut surface);
        assert_eq!(surface.regions, vec!["marker"]);
    }

    struct Quitter;

    impl Scene for Quitter {
        fn update(&mut self, _dt: f64, context: &mut crate::scene::SceneContext) {
            context.pop();
            context.pop();
            context.back_to("Title");
        }
    }

    #[test]
    fn transitions_apply_in_order() {
        let mut stack = SceneStack::default();
        stack
            .push(SceneNode::empty("Title"))
            .push(SceneNode::empty("World"))
            .push(SceneNode::new("Quit", Quitter));
        stack.update(0.016);
        // two pops land on Title, back_to keeps it
        assert_eq!(names(&stack), vec!["boot", "Title"]);
    }

    #[test]
    fn child_requests_reach_the_stack() {
        let mut stack = SceneStack::default();
        let door = SceneNode::new("Door", Launcher { launched: false });
        stack.push(SceneNode::empty("World").with_child(door));
        stack.update(0.016);
        assert!(stack.is("Next"));
    }

    #[test]
    fn only_the_current_scene_updates() {
        let mut stack = SceneStack::default();
        stack
            .push(SceneNode::new("Below", Launcher { launched: false }))
            .push(SceneNode::empty("Top"));
        stack.update(0.016);
        assert!(stack.is("Top"));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn current_survives_any_sequence() {
        // small LCG so the walk is reproducible
        let mut seed: u32 = 7;
        let mut next = move || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) % 5
        };
        let mut stack = SceneStack::default();
        for step in 0..500 {
            match next() {
                0 | 1 => {
                    let node = SceneNode::empty(&format!("s{}", step % 4));
                    stack.push(if step % 7 == 0 { node.pinned() } else { node });
                }
                2 => {
                    stack.pop();
                }
                3 => {
                    stack.back_to(&format!("s{}", step % 5));
                }
                _ => {
                    stack.back();
                }
            }
            assert!(!stack.current().name().is_empty());
            assert!(stack.len() >= 1);
            assert_eq!(stack.names()[0], BOOT_SCENE);
        }
    }
}
