pub mod app;
pub use app::run;

pub mod config;
pub mod events;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod reconciler;
pub mod scheduler;
pub mod settings;
pub mod source;
pub mod utils;
pub mod worker;

// Platform abstraction layer
pub mod platform;

pub mod ui {
    pub mod icon;
    pub mod menu;

    #[cfg(any(target_os = "macos", target_os = "windows"))]
    pub mod tray;
}
