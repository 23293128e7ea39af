pub mod engine;
pub mod error;
pub mod event;
pub mod machine;
pub mod model;
pub mod picker;

pub use engine::{move_rectangle, new_rectangle, quick_zoom_rect, GeometryOutcome};
pub use error::{SelectionError, SelectionResult};
pub use event::{NudgeDirection, PointerEvent, PointerKind, SelectionTrigger};
pub use machine::{Handled, SelectionEffect};
pub use model::{
    ActiveObject, AxisUse, Corner, Edge, InteractionState, SelectionContext, SelectionPhase,
};
pub use picker::{anchor_for, handle_point, pick_object, DEFAULT_PROXIMITY};
