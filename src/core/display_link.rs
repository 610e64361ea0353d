use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Hard ceiling for the advisory frame-rate request
pub const MAX_FPS: u32 = 240;

/// One display-refresh tick
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub at: Instant,
}

impl Tick {
    pub fn now() -> Self {
        Self { at: Instant::now() }
    }
}

/// A physical display the link can be bound to
#[derive(Debug, Clone)]
pub struct Screen {
    pub name: String,
    /// Maximum refresh rate the display supports
    pub max_fps: u32,
}

impl Screen {
    pub fn new(name: impl Into<String>, max_fps: u32) -> Self {
        Self {
            name: name.into(),
            max_fps: max_fps.max(1),
        }
    }
}

/// Refresh-synchronized tick source
///
/// A background thread delivers `Tick`s over a channel at the effective rate
/// `min(preferred, screen cap)`. The preferred rate is advisory; the bound
/// screen clamps it. Stops when dropped or when the receiver goes away.
pub struct DisplayLink {
    preferred_fps: Arc<AtomicU32>,
    screen_cap: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DisplayLink {
    /// Start ticking at the given preferred rate; returns the link and the
    /// receiving end the scheduler drains
    pub fn new(preferred_fps: u32) -> (Self, Receiver<Tick>) {
        let preferred = Arc::new(AtomicU32::new(clamp_fps(preferred_fps)));
        let cap = Arc::new(AtomicU32::new(MAX_FPS));
        let running = Arc::new(AtomicBool::new(true));

        let (tx, rx) = mpsc::channel();
        let handle = Self::spawn_ticker(
            Arc::clone(&preferred),
            Arc::clone(&cap),
            Arc::clone(&running),
            tx,
        );

        (
            Self {
                preferred_fps: preferred,
                screen_cap: cap,
                running,
                handle: Some(handle),
            },
            rx,
        )
    }

    /// Advisory tick-rate request; clamped to 1..=MAX_FPS and further by the
    /// bound screen
    pub fn set_preferred_fps(&self, fps: u32) {
        let clamped = clamp_fps(fps);
        self.preferred_fps.store(clamped, Ordering::Release);
        log::debug!("display link preferred rate set to {} fps", clamped);
    }

    /// Rebind the link to a physical display, capping the tick rate at its
    /// refresh rate
    pub fn set_screen(&self, screen: &Screen) {
        let cap = clamp_fps(screen.max_fps);
        self.screen_cap.store(cap, Ordering::Release);
        log::info!(
            "display link bound to screen '{}' ({} fps cap)",
            screen.name,
            cap
        );
    }

    /// The rate ticks are currently delivered at
    pub fn effective_fps(&self) -> u32 {
        self.preferred_fps
            .load(Ordering::Acquire)
            .min(self.screen_cap.load(Ordering::Acquire))
    }

    fn spawn_ticker(
        preferred: Arc<AtomicU32>,
        cap: Arc<AtomicU32>,
        running: Arc<AtomicBool>,
        tx: Sender<Tick>,
    ) -> JoinHandle<()> {
        std::thread::spawn(move || {
            while running.load(Ordering::Acquire) {
                let fps = preferred
                    .load(Ordering::Acquire)
                    .min(cap.load(Ordering::Acquire))
                    .max(1);
                std::thread::sleep(Duration::from_secs_f64(1.0 / f64::from(fps)));

                if !running.load(Ordering::Acquire) {
                    break;
                }
                if tx.send(Tick::now()).is_err() {
                    // Receiver gone; the scheduler was torn down
                    break;
                }
            }
        })
    }
}

impl Drop for DisplayLink {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn clamp_fps(fps: u32) -> u32 {
    fps.clamp(1, MAX_FPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_fps(0), 1);
        assert_eq!(clamp_fps(60), 60);
        assert_eq!(clamp_fps(100_000), MAX_FPS);
    }

    #[test]
    fn screen_refresh_rate_never_zero() {
        let screen = Screen::new("internal", 0);
        assert_eq!(screen.max_fps, 1);
    }

    #[test]
    fn link_delivers_ticks() {
        let (_link, rx) = DisplayLink::new(120);
        // A couple of ticks should arrive well within a second at 120 fps
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn screen_caps_preferred_rate() {
        let (link, _rx) = DisplayLink::new(120);
        assert_eq!(link.effective_fps(), 120);

        link.set_screen(&Screen::new("external", 60));
        assert_eq!(link.effective_fps(), 60);

        // Raising the preference cannot exceed the screen
        link.set_preferred_fps(144);
        assert_eq!(link.effective_fps(), 60);

        // Lowering it still applies
        link.set_preferred_fps(30);
        assert_eq!(link.effective_fps(), 30);
    }

    #[test]
    fn link_stops_on_drop() {
        let (link, rx) = DisplayLink::new(240);
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        drop(link);

        // Drain whatever was in flight; afterwards the channel must close
        while rx.recv_timeout(Duration::from_millis(100)).is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
