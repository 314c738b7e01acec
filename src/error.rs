use thiserror::Error;

/// Recoverable conditions raised by the animation and scene core.
///
/// None of these are fatal: `SceneStack::push` (and the transitions scenes
/// request) turn them into a logged no-op and hand them to the registered
/// [`Diagnostics`] callback, if any.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("invalid frame sequence: {0}")]
    InvalidSequence(String),
    #[error("invalid scene node: {0}")]
    InvalidNode(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Optional sink for swallowed errors.
// boxed FnMut because hosts usually push into their own debug overlay
pub type Diagnostics = Box<dyn FnMut(&StageError)>;
