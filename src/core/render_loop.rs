use std::sync::mpsc::Receiver;

use super::controller::ViewController;
use super::delegate::RenderDelegate;
use super::display_link::Tick;
use crate::view::SurfaceSize;

/// Tick scheduler tying a display link to a view controller
///
/// Serializes all draw calls for the controller and observes the latest pause
/// state before each one. Multiple pending ticks coalesce into a single draw -
/// a stalled frame is dropped, never replayed. `clear()` through the loop is
/// the de-scheduling point: once cleared, no draw presents until the next
/// prepare, even with ticks still queued.
pub struct RenderLoop<D: RenderDelegate> {
    controller: ViewController<D>,
    ticks: Receiver<Tick>,
}

impl<D: RenderDelegate> RenderLoop<D> {
    pub fn new(controller: ViewController<D>, ticks: Receiver<Tick>) -> Self {
        Self { controller, ticks }
    }

    pub fn controller(&self) -> &ViewController<D> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewController<D> {
        &mut self.controller
    }

    /// Drain pending ticks and draw at most once; returns true when a draw
    /// was attempted this pump
    ///
    /// Intended for hosts that pump the loop from their own event loop (the
    /// winit main thread in the demo).
    pub fn pump(&mut self, size: SurfaceSize) -> bool {
        let mut ticked = false;
        while self.ticks.try_recv().is_ok() {
            ticked = true;
        }
        if !ticked {
            return false;
        }
        if self.controller.is_paused() {
            return false;
        }

        self.controller.draw(size);
        true
    }

    /// Blocking variant for a dedicated render thread; draws on every tick
    /// until the display link goes away, then hands the controller back
    pub fn run<F>(mut self, size_source: F) -> ViewController<D>
    where
        F: Fn() -> SurfaceSize,
    {
        while let Ok(_tick) = self.ticks.recv() {
            // Coalesce any backlog before drawing
            while self.ticks.try_recv().is_ok() {}

            if self.controller.is_paused() {
                continue;
            }
            self.controller.draw(size_source());
        }
        log::debug!("display link closed; render loop exiting");
        self.controller
    }

    /// Tear down into the controller and the remaining tick receiver
    pub fn into_parts(self) -> (ViewController<D>, Receiver<Tick>) {
        (self.controller, self.ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ContextClaim;
    use crate::core::delegate::RenderDelegate;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    struct CountingDelegate {
        draws: usize,
    }

    impl RenderDelegate for CountingDelegate {
        fn prepare(&mut self, _size: SurfaceSize, _claim: &ContextClaim) -> bool {
            true
        }
        fn draw(&mut self, _size: SurfaceSize, _claim: &ContextClaim) {
            self.draws += 1;
        }
        fn clear(&mut self) {}
    }

    struct CountingSurface {
        presented: usize,
    }

    impl crate::view::RenderSurface for CountingSurface {
        fn size(&self) -> SurfaceSize {
            SurfaceSize::new(320, 240)
        }
        fn present(&mut self) -> bool {
            self.presented += 1;
            true
        }
    }

    type TestLoop = (
        RenderLoop<CountingDelegate>,
        mpsc::Sender<Tick>,
        Arc<Mutex<CountingSurface>>,
    );

    fn prepared_loop() -> TestLoop {
        let mut controller = ViewController::new(false, CountingDelegate { draws: 0 });
        controller.install_claim(Arc::new(ContextClaim::new()));
        let surface = Arc::new(Mutex::new(CountingSurface { presented: 0 }));
        controller.attach_view(&surface);
        controller.prepare(SurfaceSize::new(320, 240));

        let (tx, rx) = mpsc::channel();
        (RenderLoop::new(controller, rx), tx, surface)
    }

    #[test]
    fn pump_without_ticks_does_nothing() {
        let (mut render_loop, _tx, _surface) = prepared_loop();
        assert!(!render_loop.pump(SurfaceSize::new(320, 240)));
        assert_eq!(render_loop.controller().delegate().draws, 0);
    }

    #[test]
    fn pump_coalesces_tick_backlog() {
        let (mut render_loop, tx, surface) = prepared_loop();
        for _ in 0..5 {
            tx.send(Tick::now()).unwrap();
        }
        assert!(render_loop.pump(SurfaceSize::new(320, 240)));
        assert_eq!(render_loop.controller().delegate().draws, 1);
        assert_eq!(surface.lock().unwrap().presented, 1);
    }

    #[test]
    fn pump_observes_pause_before_drawing() {
        let (mut render_loop, tx, _surface) = prepared_loop();
        render_loop.controller().set_paused(true);

        tx.send(Tick::now()).unwrap();
        assert!(!render_loop.pump(SurfaceSize::new(320, 240)));
        assert_eq!(render_loop.controller().delegate().draws, 0);

        // Resuming draws at the next tick, not immediately
        render_loop.controller().set_paused(false);
        assert!(!render_loop.pump(SurfaceSize::new(320, 240)));

        tx.send(Tick::now()).unwrap();
        assert!(render_loop.pump(SurfaceSize::new(320, 240)));
        assert_eq!(render_loop.controller().delegate().draws, 1);
    }

    #[test]
    fn into_parts_returns_controller() {
        let (render_loop, _tx, _surface) = prepared_loop();
        let (controller, _rx) = render_loop.into_parts();
        assert_eq!(controller.delegate().draws, 0);
    }
}
