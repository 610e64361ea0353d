/// Drawable surface size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero (minimized window, detached backing store)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Byte length of an RGBA pixel buffer covering this size
    pub fn rgba_len(&self) -> usize {
        (self.width * self.height * 4) as usize
    }
}

/// Drawable surface abstraction - the controller schedules when to draw into it,
/// it never owns the backing store
pub trait RenderSurface {
    /// Current size in physical pixels
    fn size(&self) -> SurfaceSize;

    /// Present the most recently drawn frame
    ///
    /// Returns false when no frame could be acquired (surface lost, empty size);
    /// the caller skips this tick and tries again on the next one.
    fn present(&mut self) -> bool;

    /// Ask the host windowing system for another redraw
    fn request_redraw(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_size_new() {
        let size = SurfaceSize::new(1920, 1080);
        assert_eq!(size.width, 1920);
        assert_eq!(size.height, 1080);
    }

    #[test]
    fn test_surface_size_empty() {
        assert!(SurfaceSize::new(0, 600).is_empty());
        assert!(SurfaceSize::new(800, 0).is_empty());
        assert!(!SurfaceSize::new(800, 600).is_empty());
    }

    #[test]
    fn test_rgba_len() {
        let size = SurfaceSize::new(100, 100);
        assert_eq!(size.rgba_len(), 40000);
    }

    #[test]
    fn test_surface_size_equality() {
        assert_eq!(SurfaceSize::new(640, 480), SurfaceSize::new(640, 480));
        assert_ne!(SurfaceSize::new(640, 480), SurfaceSize::new(640, 481));
    }

    // Mock surface for testing trait implementation
    struct MockSurface {
        size: SurfaceSize,
        presented: usize,
        redraws: std::cell::RefCell<usize>,
    }

    impl RenderSurface for MockSurface {
        fn size(&self) -> SurfaceSize {
            self.size
        }

        fn present(&mut self) -> bool {
            self.presented += 1;
            true
        }

        fn request_redraw(&self) {
            *self.redraws.borrow_mut() += 1;
        }
    }

    #[test]
    fn test_mock_surface_presents() {
        let mut surface = MockSurface {
            size: SurfaceSize::new(320, 240),
            presented: 0,
            redraws: std::cell::RefCell::new(0),
        };

        assert!(surface.present());
        assert!(surface.present());
        assert_eq!(surface.presented, 2);

        surface.request_redraw();
        assert_eq!(*surface.redraws.borrow(), 1);
    }
}
