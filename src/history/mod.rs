//! Stack of committed crops in absolute source coordinates.

use std::fmt;

use crate::geometry::{Point, SelectionRect};
use crate::source::{CropTarget, SourceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRecord {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
}

impl CropRecord {
    pub const fn new(width: u32, height: u32, left: u32, top: u32) -> Self {
        Self {
            width,
            height,
            left,
            top,
        }
    }

    pub const fn full_frame(width: u32, height: u32) -> Self {
        Self::new(width, height, 0, 0)
    }

    /// Composes a display-space selection with the offset of the crop it was drawn on.
    pub fn from_selection(rect: SelectionRect, offset: (u32, u32)) -> Self {
        let (left, top) = offset;
        Self::new(
            u32::try_from(rect.width()).unwrap_or(0),
            u32::try_from(rect.height()).unwrap_or(0),
            left.saturating_add_signed(rect.x1),
            top.saturating_add_signed(rect.y1),
        )
    }
}

impl fmt::Display for CropRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.left, self.top
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryChange {
    Pushed(CropRecord),
    Popped { removed: CropRecord, top: CropRecord },
    Reset(CropRecord),
    Unchanged,
}

/// Never empty: the bottom record always covers the full original frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropHistory {
    records: Vec<CropRecord>,
}

impl CropHistory {
    pub fn new(orig_width: u32, orig_height: u32) -> Self {
        Self {
            records: vec![CropRecord::full_frame(orig_width, orig_height)],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_zoomed(&self) -> bool {
        self.records.len() > 1
    }

    pub fn base(&self) -> CropRecord {
        self.records[0]
    }

    pub fn top(&self) -> CropRecord {
        self.records[self.records.len() - 1]
    }

    /// Record that would become the top after a `pop`.
    pub fn previous(&self) -> Option<CropRecord> {
        self.records.len().checked_sub(2).map(|index| self.records[index])
    }

    pub fn records(&self) -> &[CropRecord] {
        &self.records
    }

    pub fn current_offset(&self) -> (u32, u32) {
        let top = self.top();
        (top.left, top.top)
    }

    /// Display-space point to absolute source coordinates.
    pub fn absolute(&self, point: Point) -> (i64, i64) {
        let (left, top) = self.current_offset();
        (
            i64::from(left) + i64::from(point.x),
            i64::from(top) + i64::from(point.y),
        )
    }

    pub fn push<T: CropTarget + ?Sized>(
        &mut self,
        record: CropRecord,
        target: &mut T,
    ) -> SourceResult<HistoryChange> {
        apply_to_all(target, record, self.top())?;
        self.records.push(record);
        tracing::info!(record = %record, depth = self.records.len(), "crop pushed");
        Ok(HistoryChange::Pushed(record))
    }

    pub fn pop<T: CropTarget + ?Sized>(&mut self, target: &mut T) -> SourceResult<HistoryChange> {
        let Some(previous) = self.previous() else {
            return Ok(HistoryChange::Unchanged);
        };
        let removed = self.top();
        apply_to_all(target, previous, removed)?;
        self.records.pop();
        tracing::info!(record = %previous, depth = self.records.len(), "crop popped");
        Ok(HistoryChange::Popped {
            removed,
            top: previous,
        })
    }

    pub fn reset<T: CropTarget + ?Sized>(
        &mut self,
        target: &mut T,
    ) -> SourceResult<HistoryChange> {
        let base = self.base();
        apply_to_all(target, base, self.top())?;
        self.records.truncate(1);
        tracing::info!(record = %base, "crop history reset");
        Ok(HistoryChange::Reset(base))
    }
}

/// Applies `record` to every source, re-applying `current` to the ones already changed
/// when a later source fails.
fn apply_to_all<T: CropTarget + ?Sized>(
    target: &mut T,
    record: CropRecord,
    current: CropRecord,
) -> SourceResult<()> {
    for index in 0..target.source_count() {
        if let Err(err) = target.apply_crop(index, record) {
            tracing::warn!(%err, record = %record, "crop application failed; rolling back");
            for applied in 0..index {
                if let Err(rollback_err) = target.apply_crop(applied, current) {
                    tracing::warn!(%rollback_err, clip = applied + 1, "rollback failed");
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;

    #[derive(Default)]
    struct RecordingTarget {
        applied: Vec<CropRecord>,
        fail_on: Option<(usize, CropRecord)>,
    }

    impl RecordingTarget {
        fn with_sources(count: usize) -> Self {
            Self {
                applied: vec![CropRecord::full_frame(100, 100); count],
                fail_on: None,
            }
        }
    }

    impl CropTarget for RecordingTarget {
        fn source_count(&self) -> usize {
            self.applied.len()
        }

        fn apply_crop(&mut self, index: usize, record: CropRecord) -> SourceResult<()> {
            if self.fail_on == Some((index, record)) {
                return Err(SourceError::crop_apply(index, record, "unavailable"));
            }
            self.applied[index] = record;
            Ok(())
        }
    }

    #[test]
    fn pop_on_single_record_is_noop() {
        let mut history = CropHistory::new(100, 100);
        let mut target = RecordingTarget::with_sources(2);
        let change = history.pop(&mut target).expect("pop should not fail");
        assert_eq!(change, HistoryChange::Unchanged);
        assert_eq!(history.len(), 1);
        assert_eq!(history.top(), CropRecord::full_frame(100, 100));
    }

    #[test]
    fn push_then_pop_restores_previous_top_exactly() {
        let mut history = CropHistory::new(100, 100);
        let mut target = RecordingTarget::with_sources(2);
        history
            .push(CropRecord::new(40, 62, 10, 10), &mut target)
            .expect("first push should apply");
        let before = history.top();

        history
            .push(CropRecord::new(20, 30, 12, 14), &mut target)
            .expect("second push should apply");
        assert_eq!(history.current_offset(), (12, 14));

        history.pop(&mut target).expect("pop should apply");
        assert_eq!(history.top(), before);
        assert_eq!(target.applied, vec![before, before]);
    }

    #[test]
    fn failed_push_rolls_back_applied_sources_and_stack() {
        let mut history = CropHistory::new(100, 100);
        let record = CropRecord::new(50, 50, 2, 2);
        let mut target = RecordingTarget::with_sources(3);
        target.fail_on = Some((2, record));

        let err = history
            .push(record, &mut target)
            .expect_err("third source should reject crop");
        assert!(matches!(err, SourceError::CropApply { clip: 3, .. }));
        assert_eq!(history.len(), 1);
        assert_eq!(target.applied, vec![CropRecord::full_frame(100, 100); 3]);
    }

    #[test]
    fn failed_pop_keeps_current_top() {
        let mut history = CropHistory::new(100, 100);
        let mut target = RecordingTarget::with_sources(1);
        let zoomed = CropRecord::new(50, 50, 0, 0);
        history.push(zoomed, &mut target).expect("push should apply");
        target.fail_on = Some((0, CropRecord::full_frame(100, 100)));

        history
            .pop(&mut target)
            .expect_err("pop should surface the failure");
        assert_eq!(history.top(), zoomed);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn reset_truncates_to_base() {
        let mut history = CropHistory::new(200, 100);
        let mut target = RecordingTarget::with_sources(1);
        history
            .push(CropRecord::new(100, 50, 30, 0), &mut target)
            .expect("push should apply");
        history
            .push(CropRecord::new(50, 24, 40, 10), &mut target)
            .expect("push should apply");

        let change = history.reset(&mut target).expect("reset should apply");
        assert_eq!(change, HistoryChange::Reset(CropRecord::full_frame(200, 100)));
        assert_eq!(history.len(), 1);
        assert_eq!(target.applied[0], CropRecord::full_frame(200, 100));
    }

    #[test]
    fn selection_composes_with_current_offset() {
        let record = CropRecord::from_selection(SelectionRect::new(4, 6, 24, 16), (10, 20));
        assert_eq!(record, CropRecord::new(20, 10, 14, 26));
    }
}
