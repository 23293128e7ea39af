use super::event::SelectionTrigger;
use super::model::SelectionPhase;
use thiserror::Error;

pub type SelectionResult<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("invalid selection transition: from {from:?} using trigger {trigger:?}")]
    InvalidTransition {
        from: SelectionPhase,
        trigger: SelectionTrigger,
    },
}
