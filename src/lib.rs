pub mod browser;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fpl;
pub mod league;
pub mod logging;
pub mod output;
pub mod stderr_buffer;
pub mod tui;
