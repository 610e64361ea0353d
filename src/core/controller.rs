use std::sync::{Arc, Mutex, Weak};

use super::activity::{ActivityRouter, PauseState, SubscriptionId};
use super::context::ContextClaim;
use super::delegate::RenderDelegate;
use super::display_link::{DisplayLink, Screen};
use crate::view::{RenderSurface, SurfaceSize};

/// Controller lifecycle phase
///
/// `Uninitialized -> Prepared -> Cleared -> Prepared -> ...`; pause is
/// orthogonal and lives in the shared [`PauseState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Prepared,
    Cleared,
}

/// Asynchronous render-loop view controller
///
/// Owns the scheduling decision of when the delegate draws into an attached
/// surface: prepare once per attachment, draw once per display tick while
/// running, clear on detach. Missing context, missing view, wrong thread and
/// pause all turn `draw` into a silent no-op; the next tick simply tries
/// again.
///
/// Lifecycle methods take `&mut self`, so calls for one controller are
/// serialized by construction; only the pause state may be written from other
/// threads.
pub struct ViewController<D: RenderDelegate> {
    delegate: D,
    msaa_enabled: bool,
    phase: Phase,
    pause: Arc<PauseState>,
    claim: Option<Arc<ContextClaim>>,
    view: Option<Weak<Mutex<dyn RenderSurface + Send>>>,
    link: Option<DisplayLink>,
    frames_presented: u64,
}

impl<D: RenderDelegate> ViewController<D> {
    /// Construct with the antialiasing choice fixed for the controller's
    /// lifetime; nothing draws until a view is attached and prepared
    pub fn new(msaa_enabled: bool, delegate: D) -> Self {
        Self {
            delegate,
            msaa_enabled,
            phase: Phase::Uninitialized,
            pause: Arc::new(PauseState::new()),
            claim: None,
            view: None,
            link: None,
            frames_presented: 0,
        }
    }

    pub fn msaa_enabled(&self) -> bool {
        self.msaa_enabled
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    // --- pause property -------------------------------------------------

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Setting true stops draws before the next tick; setting false resumes
    /// at the next natural tick with no forced draw
    pub fn set_paused(&self, paused: bool) {
        self.pause.set_paused(paused);
    }

    pub fn pause_on_will_resign_active(&self) -> bool {
        self.pause.pause_on_will_resign_active()
    }

    pub fn set_pause_on_will_resign_active(&self, enabled: bool) {
        self.pause.set_pause_on_will_resign_active(enabled);
    }

    pub fn resume_on_did_become_active(&self) -> bool {
        self.pause.resume_on_did_become_active()
    }

    pub fn set_resume_on_did_become_active(&self, enabled: bool) {
        self.pause.set_resume_on_did_become_active(enabled);
    }

    /// Shared pause state, for schedulers observing it cross-thread
    pub fn pause_state(&self) -> Arc<PauseState> {
        Arc::clone(&self.pause)
    }

    // --- wiring ---------------------------------------------------------

    /// Install the render-context claim shared with the GPU surface
    pub fn install_claim(&mut self, claim: Arc<ContextClaim>) {
        self.claim = Some(claim);
    }

    /// Attach a drawable surface; the controller keeps only a weak back
    /// reference and never owns the backing store
    pub fn attach_view<S>(&mut self, view: &Arc<Mutex<S>>)
    where
        S: RenderSurface + Send + 'static,
    {
        let dyn_view: Arc<Mutex<dyn RenderSurface + Send>> = view.clone();
        self.view = Some(Arc::downgrade(&dyn_view));
    }

    pub fn detach_view(&mut self) {
        self.view = None;
    }

    pub fn has_view(&self) -> bool {
        self.view
            .as_ref()
            .map(|v| v.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Register this controller's activity handling with the host's router;
    /// the host unsubscribes with the returned id at detach
    pub fn bind_activity(&self, router: &mut ActivityRouter) -> SubscriptionId {
        let pause = Arc::clone(&self.pause);
        router.subscribe(move |event| pause.apply(event))
    }

    /// Hand the controller its display link so rate requests can be forwarded
    pub fn attach_display_link(&mut self, link: DisplayLink) {
        self.link = Some(link);
    }

    /// Advisory tick-rate request; the platform may clamp it
    pub fn set_preferred_frames_per_second(&self, fps: u32) {
        if let Some(link) = &self.link {
            link.set_preferred_fps(fps);
        }
    }

    /// Rebind the display link to another physical display
    pub fn set_screen(&self, screen: &Screen) {
        if let Some(link) = &self.link {
            link.set_screen(screen);
        }
    }

    // --- lifecycle ------------------------------------------------------

    /// Bind the render context to the calling thread; returns false when no
    /// context is installed
    pub fn make_render_context_current(&self) -> bool {
        match &self.claim {
            Some(claim) => {
                claim.make_current();
                true
            }
            None => false,
        }
    }

    /// Establish delegate resources sized to `size`; called once per
    /// (re)attachment. Silently no-ops without a render context.
    pub fn prepare(&mut self, size: SurfaceSize) {
        let Some(claim) = &self.claim else {
            log::trace!("prepare skipped: no render context");
            return;
        };
        claim.make_current();

        if self.delegate.prepare(size, claim) {
            self.phase = Phase::Prepared;
            log::debug!("prepared for {}x{}", size.width, size.height);
        } else {
            self.phase = Phase::Uninitialized;
            log::warn!("delegate failed to prepare; drawing stays disabled");
        }
    }

    /// Produce and present one frame
    ///
    /// A no-op, never an error, when paused, unprepared, cleared, detached,
    /// or when the calling thread does not hold the context claim.
    pub fn draw(&mut self, size: SurfaceSize) {
        if self.phase != Phase::Prepared {
            return;
        }
        if self.pause.is_paused() {
            return;
        }
        let Some(claim) = &self.claim else {
            return;
        };
        if !claim.is_current() {
            log::trace!("draw skipped: context current on another thread");
            return;
        }
        let Some(view) = self.view.as_ref().and_then(Weak::upgrade) else {
            return;
        };

        self.delegate.draw(size, claim);

        let Ok(mut view) = view.lock() else {
            return;
        };
        if view.present() {
            self.frames_presented += 1;
        }
    }

    /// Release delegate resources; idempotent. After this no draw presents
    /// until the next `prepare`.
    pub fn clear(&mut self) {
        if self.phase != Phase::Prepared {
            return;
        }
        self.delegate.clear();
        self.phase = Phase::Cleared;
        log::debug!("cleared render resources");
    }

    /// Frames actually presented so far (diagnostics)
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl<D: RenderDelegate> Drop for ViewController<D> {
    fn drop(&mut self) {
        // Release the context binding; the surface itself is not ours to free
        if let Some(claim) = &self.claim {
            if claim.is_current() {
                claim.release();
            }
        }
    }
}
