pub mod android;
pub mod assets;
pub mod bridge;
pub mod cmdline;
pub mod config;
pub mod console;
pub mod error;
pub mod launch;
pub mod loader;
pub mod logging;
pub mod menu;
pub mod profiles;
pub mod workdir;

pub use bridge::{Bridge, LaunchRequest, LineSink, LoadReport};
pub use error::BridgeError;
