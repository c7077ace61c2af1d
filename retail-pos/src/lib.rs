mod app;
pub mod commands;
pub mod events;
pub mod input;
pub mod logging;
pub mod state;

pub use app::App;
