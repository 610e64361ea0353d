use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Context as _;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use astroview::cli::Cli;
use astroview::config::ViewConfig;
use astroview::core::{
    ActivityEvent, ActivityRouter, ContextClaim, DisplayLink, RenderDelegate, RenderLoop, Screen,
    SkySurface, SubscriptionId, ViewController,
};
use astroview::view::SurfaceSize;

// === Constants ===

const STAR_COUNT: usize = 900;
const FPS_LOG_INTERVAL: f32 = 1.0;
const INITIAL_WINDOW_WIDTH: u32 = 1024;
const INITIAL_WINDOW_HEIGHT: u32 = 768;

// === Demo delegate ===

/// One star in normalized surface coordinates
struct Star {
    x: f32,
    y: f32,
    brightness: f32,
    phase: f32,
}

/// CPU starfield renderer standing in for a real simulation engine
///
/// Renders a twinkling night sky into the surface's source texture each draw.
struct StarfieldDelegate {
    surface: Arc<Mutex<SkySurface>>,
    stars: Vec<Star>,
    pixels: Vec<u8>,
    current_size: SurfaceSize,
    started: Instant,
}

impl StarfieldDelegate {
    fn new(surface: Arc<Mutex<SkySurface>>) -> Self {
        Self {
            surface,
            stars: Vec::new(),
            pixels: Vec::new(),
            current_size: SurfaceSize::new(0, 0),
            started: Instant::now(),
        }
    }

    /// Deterministic hash-based scatter, no RNG dependency needed
    fn scatter_stars(count: usize) -> Vec<Star> {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hash, Hasher};

        let hasher_builder = RandomState::new();
        (0..count)
            .map(|i| {
                let mut hasher = hasher_builder.build_hasher();
                i.hash(&mut hasher);
                let hash = hasher.finish();

                Star {
                    x: (hash % 10_000) as f32 / 10_000.0,
                    y: ((hash >> 16) % 10_000) as f32 / 10_000.0,
                    brightness: 0.3 + ((hash >> 32) % 100) as f32 / 100.0 * 0.7,
                    phase: ((hash >> 40) % 628) as f32 / 100.0,
                }
            })
            .collect()
    }

    fn paint(&mut self, size: SurfaceSize) {
        let (width, height) = (size.width as usize, size.height as usize);
        let t = self.started.elapsed().as_secs_f32();

        // Night-sky gradient, darker toward the top
        for y in 0..height {
            let shade = 8 + (y * 18 / height.max(1)) as u8;
            for x in 0..width {
                let idx = (y * width + x) * 4;
                self.pixels[idx] = shade / 3;
                self.pixels[idx + 1] = shade / 3;
                self.pixels[idx + 2] = shade;
                self.pixels[idx + 3] = 255;
            }
        }

        for star in &self.stars {
            let x = (star.x * (size.width - 1) as f32) as usize;
            let y = (star.y * (size.height - 1) as f32) as usize;
            let twinkle = 0.75 + 0.25 * (t * 1.7 + star.phase).sin();
            let level = (star.brightness * twinkle * 255.0) as u8;

            let idx = (y * width + x) * 4;
            self.pixels[idx] = level;
            self.pixels[idx + 1] = level;
            self.pixels[idx + 2] = level.saturating_add(20);
        }
    }
}

impl RenderDelegate for StarfieldDelegate {
    fn prepare(&mut self, size: SurfaceSize, _claim: &ContextClaim) -> bool {
        if size.is_empty() {
            return false;
        }
        self.stars = Self::scatter_stars(STAR_COUNT);
        self.pixels = vec![0; size.rgba_len()];
        self.current_size = size;
        log::info!(
            "starfield prepared: {} stars at {}x{}",
            self.stars.len(),
            size.width,
            size.height
        );
        true
    }

    fn draw(&mut self, size: SurfaceSize, _claim: &ContextClaim) {
        if size.is_empty() {
            return;
        }
        if size != self.current_size {
            self.current_size = size;
            self.pixels = vec![0; size.rgba_len()];
            log::debug!("starfield resized to {}x{}", size.width, size.height);
        }

        self.paint(size);

        if let Ok(surface) = self.surface.lock() {
            if let Err(e) = surface.upload_pixels(&self.pixels) {
                log::warn!("pixel upload failed: {}", e);
            }
        }
    }

    fn clear(&mut self) {
        self.stars.clear();
        self.pixels.clear();
        self.current_size = SurfaceSize::new(0, 0);
        log::info!("starfield cleared");
    }
}

// === Application ===

struct App {
    config: ViewConfig,
    window: Option<Arc<Window>>,
    surface: Option<Arc<Mutex<SkySurface>>>,
    render_loop: Option<RenderLoop<StarfieldDelegate>>,
    router: ActivityRouter,
    activity_sub: Option<SubscriptionId>,
    frame_count: u32,
    fps_timer: Instant,
}

impl App {
    fn new(config: ViewConfig) -> Self {
        Self {
            config,
            window: None,
            surface: None,
            render_loop: None,
            router: ActivityRouter::new(),
            activity_sub: None,
            frame_count: 0,
            fps_timer: Instant::now(),
        }
    }

    fn surface_size(&self) -> SurfaceSize {
        match &self.window {
            Some(window) => {
                let size = window.inner_size();
                SurfaceSize::new(size.width, size.height)
            }
            None => SurfaceSize::new(0, 0),
        }
    }

    fn log_fps(&mut self) {
        self.frame_count += 1;
        let elapsed = self.fps_timer.elapsed().as_secs_f32();
        if elapsed >= FPS_LOG_INTERVAL {
            log::info!("{:.1} fps", self.frame_count as f32 / elapsed);
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }
    }

    fn teardown(&mut self) {
        if let Some(id) = self.activity_sub.take() {
            self.router.unsubscribe(id);
        }
        if let Some(mut render_loop) = self.render_loop.take() {
            render_loop.controller_mut().clear();
        }
        self.surface = None;
        self.window = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Astroview")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let surface = match SkySurface::new(window.clone(), self.config.msaa) {
            Ok(s) => Arc::new(Mutex::new(s)),
            Err(e) => {
                log::error!("failed to initialize surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        let claim = match surface.lock() {
            Ok(s) => s.gpu().claim(),
            Err(_) => {
                event_loop.exit();
                return;
            }
        };

        let delegate = StarfieldDelegate::new(surface.clone());
        let mut controller = ViewController::new(self.config.msaa, delegate);
        controller.install_claim(claim);
        controller.attach_view(&surface);
        controller.set_pause_on_will_resign_active(self.config.pause_on_will_resign_active);
        controller.set_resume_on_did_become_active(self.config.resume_on_did_become_active);

        let (link, ticks) = DisplayLink::new(self.config.preferred_fps);
        controller.attach_display_link(link);
        if let Some(monitor) = window.current_monitor() {
            let name = monitor.name().unwrap_or_else(|| "primary".to_string());
            let refresh = monitor
                .refresh_rate_millihertz()
                .map(|mhz| mhz / 1000)
                .unwrap_or(60);
            controller.set_screen(&Screen::new(name, refresh));
        }

        self.activity_sub = Some(controller.bind_activity(&mut self.router));

        controller.make_render_context_current();
        let size = SurfaceSize::new(
            window.inner_size().width,
            window.inner_size().height,
        );
        controller.prepare(size);

        self.window = Some(window);
        self.surface = Some(surface);
        self.render_loop = Some(RenderLoop::new(controller, ticks));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::Focused(focused) => {
                self.router.post(if focused {
                    ActivityEvent::DidBecomeActive
                } else {
                    ActivityEvent::WillResignActive
                });
            }
            WindowEvent::Occluded(occluded) => {
                // Fully covered windows stop drawing until revealed
                if let Some(render_loop) = &self.render_loop {
                    render_loop.controller().set_paused(occluded);
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(surface) = &self.surface {
                    if let Ok(mut surface) = surface.lock() {
                        surface.resize(new_size.width, new_size.height);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let size = self.surface_size();
                if let Some(render_loop) = &mut self.render_loop {
                    if render_loop.pump(size) {
                        self.log_fps();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ViewConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewConfig::load(path)?,
        None => ViewConfig::default(),
    };
    if cli.no_msaa {
        config.msaa = false;
    }
    if let Some(fps) = cli.fps {
        config.preferred_fps = fps;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    log::info!(
        "starting with msaa={} preferred_fps={}",
        config.msaa,
        config.preferred_fps
    );

    let event_loop = EventLoop::new().context("creating event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("running event loop")?;

    Ok(())
}
