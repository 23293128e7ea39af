use super::engine::{move_rectangle, new_rectangle};
use super::error::{SelectionError, SelectionResult};
use super::event::{NudgeDirection, PointerEvent, PointerKind, SelectionTrigger};
use super::model::{
    ActiveObject, AxisUse, InteractionState, SelectionContext, SelectionPhase,
};
use super::picker::{anchor_for, handle_point, pick_object};
use crate::alignment::Axis;
use crate::geometry::{Point, SelectionRect};

/// What the session has to do after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    None,
    /// The in-progress rectangle changed.
    Updated {
        rect: SelectionRect,
        aspect_infeasible: bool,
    },
    /// An object of the defined rectangle was picked and should flash.
    Picked {
        object: ActiveObject,
        rect: SelectionRect,
    },
    /// The rectangle must be pushed onto the crop history.
    Commit(SelectionRect),
    /// Half-size zoom around a point, skipping the drawing phases.
    QuickZoom(Point),
    /// Commit was requested on a zero-sized rectangle.
    EmptySelection,
    Cancelled,
}

pub type Handled = (InteractionState, SelectionEffect);

impl SelectionPhase {
    pub fn next(self, trigger: SelectionTrigger) -> Option<SelectionPhase> {
        use SelectionPhase::*;
        use SelectionTrigger::*;
        match (self, trigger) {
            (Idle, Press) => Some(Drawing),
            (Drawing, Release) => Some(Defined),
            (Drawing, Cancel) => Some(Idle),
            (Defined, Press) => Some(Drawing),
            (Defined, PickHandle) => Some(Editing),
            (Defined, PickAll) => Some(Panning),
            (Editing | Panning, Release) => Some(Defined),
            (Defined | Editing | Panning, Commit) => Some(Committing),
            (Defined | Editing | Panning, Cancel) => Some(Idle),
            (Committing, CommitApplied) => Some(Idle),
            (Committing, CommitRejected) => Some(Defined),
            (Committing, Cancel) => Some(Idle),
            _ => None,
        }
    }
}

impl InteractionState {
    pub fn can_transition(&self, trigger: SelectionTrigger) -> bool {
        self.phase.next(trigger).is_some()
    }

    pub fn transition(mut self, trigger: SelectionTrigger) -> SelectionResult<Self> {
        let from = self.phase;
        let next = from.next(trigger).ok_or_else(|| {
            tracing::warn!(
                from = ?from,
                trigger = ?trigger,
                "invalid selection transition requested"
            );
            SelectionError::InvalidTransition { from, trigger }
        })?;
        tracing::debug!(from = ?from, trigger = ?trigger, to = ?next, "selection transition");
        self.phase = next;
        if next == SelectionPhase::Idle {
            self = Self::idle();
        }
        Ok(self)
    }

    pub fn on_pointer(
        self,
        event: PointerEvent,
        context: &SelectionContext,
    ) -> SelectionResult<Handled> {
        match event.kind {
            PointerKind::Down => self.on_press(event.position, context),
            PointerKind::Move => Ok(self.on_move(event, context)),
            PointerKind::Up => self.on_release(event.position),
            PointerKind::DoubleClick => self.on_double_click(event.position, context),
            PointerKind::SecondaryDown => self.request_commit(),
        }
    }

    fn begin_drawing(mut self, position: Point, context: &SelectionContext) -> Self {
        let alignment = context.alignment;
        self.touch = position;
        self.anchor = position.snapped(alignment.subs_x, alignment.subs_y);
        self.object = ActiveObject::None;
        self.axes = AxisUse::BOTH;
        self.rect = None;
        self.commit_armed = false;
        self
    }

    fn on_press(self, position: Point, context: &SelectionContext) -> SelectionResult<Handled> {
        let state = match self.phase {
            SelectionPhase::Editing | SelectionPhase::Panning => {
                self.transition(SelectionTrigger::Release)?
            }
            _ => self,
        };

        match (state.phase, state.rect) {
            (SelectionPhase::Idle, _) => {
                let drawing = state.transition(SelectionTrigger::Press)?;
                Ok((drawing.begin_drawing(position, context), SelectionEffect::None))
            }
            (SelectionPhase::Defined, Some(rect)) => {
                let object = pick_object(position, rect, context.proximity);
                match object {
                    ActiveObject::None => {
                        let drawing = state.transition(SelectionTrigger::Press)?;
                        Ok((
                            drawing.begin_drawing(position, context),
                            SelectionEffect::Cancelled,
                        ))
                    }
                    ActiveObject::All => {
                        let mut panning = state.transition(SelectionTrigger::PickAll)?;
                        panning.object = object;
                        panning.axes = AxisUse::BOTH;
                        panning.anchor = anchor_for(object, rect);
                        panning.grab_offset =
                            Point::new(position.x - rect.x1, position.y - rect.y1);
                        Ok((panning, SelectionEffect::Picked { object, rect }))
                    }
                    _ => {
                        let mut editing = state.transition(SelectionTrigger::PickHandle)?;
                        editing.object = object;
                        editing.axes = object.axes();
                        editing.anchor = anchor_for(object, rect);
                        Ok((editing, SelectionEffect::Picked { object, rect }))
                    }
                }
            }
            _ => Ok((state, SelectionEffect::None)),
        }
    }

    fn on_move(mut self, event: PointerEvent, context: &SelectionContext) -> Handled {
        match self.phase {
            SelectionPhase::Drawing | SelectionPhase::Editing => {
                let outcome = new_rectangle(
                    event.position,
                    self.anchor,
                    self.rect.unwrap_or_default(),
                    self.axes,
                    context,
                    event.shift_held,
                );
                self.rect = Some(outcome.rect);
                (
                    self,
                    SelectionEffect::Updated {
                        rect: outcome.rect,
                        aspect_infeasible: outcome.aspect_infeasible,
                    },
                )
            }
            SelectionPhase::Panning => {
                let Some(current) = self.rect else {
                    return (self, SelectionEffect::None);
                };
                let rect = move_rectangle(
                    event.position,
                    self.grab_offset,
                    self.anchor,
                    current,
                    context,
                    event.shift_held,
                );
                self.rect = Some(rect);
                (
                    self,
                    SelectionEffect::Updated {
                        rect,
                        aspect_infeasible: false,
                    },
                )
            }
            _ => (self, SelectionEffect::None),
        }
    }

    fn on_release(self, position: Point) -> SelectionResult<Handled> {
        match self.phase {
            SelectionPhase::Drawing => {
                let drew_something = self.rect.is_some_and(|rect| !rect.is_empty());
                if position == self.touch || !drew_something {
                    let idle = self.transition(SelectionTrigger::Cancel)?;
                    return Ok((idle, SelectionEffect::Cancelled));
                }
                let mut defined = self.transition(SelectionTrigger::Release)?;
                defined.commit_armed = true;
                Ok((defined, SelectionEffect::None))
            }
            SelectionPhase::Editing | SelectionPhase::Panning => {
                Ok((self.transition(SelectionTrigger::Release)?, SelectionEffect::None))
            }
            _ => Ok((self, SelectionEffect::None)),
        }
    }

    fn on_double_click(
        self,
        position: Point,
        context: &SelectionContext,
    ) -> SelectionResult<Handled> {
        let inside_selection = matches!(
            self.phase,
            SelectionPhase::Defined | SelectionPhase::Editing | SelectionPhase::Panning
        ) && self.rect.is_some_and(|rect| {
            pick_object(position, rect, context.proximity) != ActiveObject::None
        });
        if inside_selection {
            return self.commit();
        }
        Ok((Self::idle(), SelectionEffect::QuickZoom(position)))
    }

    /// Confirm key or secondary button: commits only once a rectangle has been released.
    pub fn request_commit(self) -> SelectionResult<Handled> {
        if !self.commit_armed || !self.can_transition(SelectionTrigger::Commit) {
            return Ok((self, SelectionEffect::None));
        }
        self.commit()
    }

    fn commit(self) -> SelectionResult<Handled> {
        match self.rect {
            Some(rect) if !rect.is_empty() => {
                let committing = self.transition(SelectionTrigger::Commit)?;
                Ok((committing, SelectionEffect::Commit(rect)))
            }
            _ => Ok((self, SelectionEffect::EmptySelection)),
        }
    }

    /// Leaves `Committing` once the history push succeeded or was rolled back.
    pub fn finish_commit(self, applied: bool) -> SelectionResult<Self> {
        if applied {
            self.transition(SelectionTrigger::CommitApplied)
        } else {
            let mut defined = self.transition(SelectionTrigger::CommitRejected)?;
            defined.commit_armed = true;
            Ok(defined)
        }
    }

    /// Drops the selection from any phase; idle stays idle.
    pub fn cancel(self) -> Self {
        if !self.can_transition(SelectionTrigger::Cancel) {
            return Self::idle();
        }
        self.transition(SelectionTrigger::Cancel)
            .unwrap_or_else(|_| Self::idle())
    }

    /// Moves the selection into another crop's coordinate frame without resizing it.
    pub fn rebase(mut self, dx: i32, dy: i32) -> Self {
        if !self.is_active() {
            return self;
        }
        self.rect = self.rect.map(|rect| rect.translated(dx, dy));
        self.anchor = Point::new(self.anchor.x + dx, self.anchor.y + dy);
        self.touch = Point::new(self.touch.x + dx, self.touch.y + dy);
        self
    }

    /// Keyboard step of the picked object: one subsampling step for the whole
    /// rectangle, one `max(mod, subs)` step for a corner or edge.
    pub fn nudge(mut self, direction: NudgeDirection, context: &SelectionContext) -> Handled {
        let Some(rect) = self.rect else {
            return (self, SelectionEffect::None);
        };
        if self.phase != SelectionPhase::Defined || self.object == ActiveObject::None {
            return (self, SelectionEffect::None);
        }

        let (unit_x, unit_y) = direction.unit();
        let alignment = context.alignment;
        let (step_x, step_y) = if self.object.is_handle() {
            (alignment.edit_step(Axis::X), alignment.edit_step(Axis::Y))
        } else {
            (alignment.subs(Axis::X), alignment.subs(Axis::Y))
        };
        let delta_x = unit_x * i32::try_from(step_x).unwrap_or(1);
        let delta_y = unit_y * i32::try_from(step_y).unwrap_or(1);
        let from = handle_point(self.object, rect);
        let target = Point::new(from.x + delta_x, from.y + delta_y);

        let (moved, aspect_infeasible) = if self.object == ActiveObject::All {
            let anchor = rect.top_left();
            let moved = move_rectangle(target, Point::default(), anchor, rect, context, false);
            (moved, false)
        } else {
            let outcome = new_rectangle(
                target,
                anchor_for(self.object, rect),
                rect,
                self.object.axes(),
                context,
                false,
            );
            (outcome.rect, outcome.aspect_infeasible)
        };

        self.rect = Some(moved);
        self.anchor = anchor_for(self.object, moved);
        (
            self,
            SelectionEffect::Updated {
                rect: moved,
                aspect_infeasible,
            },
        )
    }
}
