// ============================================================================
// DRAG/POSITION CONTROLLER — pointer gesture → absolute position updates
// ============================================================================
//
// Pure state machine, no egui types: the view layer feeds it pointer
// coordinates (already converted to card space) and applies the positions it
// emits back to the layout model. Keeping it headless makes the gesture
// logic replayable in tests and portable to any input backend.
//
//   Idle ──press on image layer──▶ DraggingBackground ──release──▶ Idle
//   Idle ──press on text layer───▶ DraggingText ────────release──▶ Idle
//
// Positions are computed against the snapshot taken at drag-start
// (`start_value + (pointer − start_pointer)`), so skipped or batched move
// events can never cause drift.

use crate::visual::Position;

/// Which layer a gesture captured. Exactly one target per gesture; the view
/// layer hit-tests text before background where they overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragTarget {
    Background,
    Text,
}

#[derive(Clone, Copy, Debug)]
struct DragSession {
    target: DragTarget,
    start_pointer: Position,
    start_value: Position,
}

#[derive(Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a gesture. `current_value` is snapshotted, not referenced.
    /// Ignored while another gesture is active — the first captured target
    /// keeps receiving updates until release (covers simultaneous touch
    /// points; there is no multi-pointer drag).
    pub fn begin(&mut self, target: DragTarget, pointer: Position, current_value: Position) {
        if self.session.is_some() {
            return;
        }
        self.session = Some(DragSession {
            target,
            start_pointer: pointer,
            start_value: current_value,
        });
    }

    /// Resolve a pointer move into the absolute position for the captured
    /// target. Returns `None` when idle. No snapping, no bounds clamping.
    pub fn update(&self, pointer: Position) -> Option<(DragTarget, Position)> {
        let session = self.session?;
        let new_pos = session.start_value + (pointer - session.start_pointer);
        Some((session.target, new_pos))
    }

    /// Release anywhere ends the gesture at the last computed position.
    pub fn end(&mut self) {
        self.session = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn target(&self) -> Option<DragTarget> {
        self.session.map(|s| s.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(x: f32, y: f32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn replay_is_idempotent_over_intermediate_moves() {
        // Replaying every move event and replaying only the last one must
        // land on the same final position.
        let moves = [
            pos(101.0, 99.0),
            pos(105.5, 92.0),
            pos(130.0, 80.0),
            pos(118.0, 140.0),
        ];

        let mut dense = DragController::new();
        dense.begin(DragTarget::Background, pos(100.0, 100.0), pos(10.0, -20.0));
        let mut last = None;
        for m in moves {
            last = dense.update(m);
        }

        let mut sparse = DragController::new();
        sparse.begin(DragTarget::Background, pos(100.0, 100.0), pos(10.0, -20.0));
        let only_last = sparse.update(*moves.last().unwrap());

        assert_eq!(last, only_last);
        assert_eq!(
            last,
            Some((DragTarget::Background, pos(10.0 + 18.0, -20.0 + 40.0)))
        );
    }

    #[test]
    fn delta_is_final_minus_start_pointer() {
        let mut ctl = DragController::new();
        ctl.begin(DragTarget::Text, pos(50.0, 60.0), pos(0.0, 0.0));
        let (target, p) = ctl.update(pos(47.5, 72.0)).unwrap();
        assert_eq!(target, DragTarget::Text);
        assert_eq!(p, pos(-2.5, 12.0));
    }

    #[test]
    fn first_captured_target_wins() {
        let mut ctl = DragController::new();
        ctl.begin(DragTarget::Text, pos(0.0, 0.0), pos(5.0, 5.0));
        // A second press (e.g. another touch point) must not steal the drag.
        ctl.begin(DragTarget::Background, pos(500.0, 500.0), pos(0.0, 0.0));
        assert_eq!(ctl.target(), Some(DragTarget::Text));
        let (target, p) = ctl.update(pos(1.0, 1.0)).unwrap();
        assert_eq!(target, DragTarget::Text);
        assert_eq!(p, pos(6.0, 6.0));
    }

    #[test]
    fn release_stops_updates_and_allows_new_gesture() {
        let mut ctl = DragController::new();
        ctl.begin(DragTarget::Background, pos(0.0, 0.0), pos(0.0, 0.0));
        assert!(ctl.is_dragging());
        ctl.end();
        assert!(!ctl.is_dragging());
        assert_eq!(ctl.update(pos(10.0, 10.0)), None);

        // Repeated drags re-arm cleanly (no leaked session state).
        ctl.begin(DragTarget::Text, pos(2.0, 2.0), pos(1.0, 1.0));
        assert_eq!(
            ctl.update(pos(4.0, 2.0)),
            Some((DragTarget::Text, pos(3.0, 1.0)))
        );
    }
}
