pub mod cli;
pub mod config;
pub mod core;
pub mod localize;
pub mod view;

// Re-export the controller surface most hosts need
pub use crate::core::{
    ActivityEvent, ActivityRouter, ContextClaim, DisplayLink, GpuContext, RenderDelegate,
    RenderLoop, Screen, SkySurface, Tick, ViewController,
};
pub use crate::view::{RenderSurface, SurfaceSize};
