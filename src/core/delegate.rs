use super::context::ContextClaim;
use crate::view::SurfaceSize;

/// The engine seam - the simulation/rendering core the controller schedules
///
/// The controller decides *when* these run; the delegate decides *what* gets
/// drawn. All three callbacks arrive serialized on the thread holding the
/// context claim.
pub trait RenderDelegate {
    /// Establish GPU resources sized to `size`; called once per (re)attachment
    /// before any draw. Returning false leaves the controller un-prepared and
    /// drawing stays a no-op.
    fn prepare(&mut self, size: SurfaceSize, claim: &ContextClaim) -> bool;

    /// Produce one frame. Called once per display tick while running.
    fn draw(&mut self, size: SurfaceSize, claim: &ContextClaim);

    /// Release the resources bound by `prepare`.
    fn clear(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingDelegate {
        calls: Vec<&'static str>,
    }

    impl RenderDelegate for RecordingDelegate {
        fn prepare(&mut self, _size: SurfaceSize, _claim: &ContextClaim) -> bool {
            self.calls.push("prepare");
            true
        }

        fn draw(&mut self, _size: SurfaceSize, _claim: &ContextClaim) {
            self.calls.push("draw");
        }

        fn clear(&mut self) {
            self.calls.push("clear");
        }
    }

    #[test]
    fn delegate_callbacks_record_in_order() {
        let mut delegate = RecordingDelegate { calls: Vec::new() };
        let claim = ContextClaim::new();
        let size = SurfaceSize::new(64, 64);

        assert!(delegate.prepare(size, &claim));
        delegate.draw(size, &claim);
        delegate.draw(size, &claim);
        delegate.clear();

        assert_eq!(delegate.calls, vec!["prepare", "draw", "draw", "clear"]);
    }
}
