pub mod activity;
pub mod context;
pub mod controller;
pub mod delegate;
pub mod display_link;
pub mod render_loop;
pub mod surface;

pub use activity::*;
pub use context::*;
pub use controller::*;
pub use delegate::*;
pub use display_link::*;
pub use render_loop::*;
pub use surface::*;
