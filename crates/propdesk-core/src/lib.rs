pub mod access_gate;
pub mod actions;
pub mod camera;
pub mod config;
pub mod content;
pub mod desktop;
pub mod error;
pub mod login;
pub mod modal;
pub mod persona;
pub mod reducer;
pub mod sound;
pub mod state;

pub use actions::*;
pub use reducer::*;
pub use state::*;

pub use config::Config;
pub use error::ShellInitError;
pub use persona::PersonaId;
pub use persona::PersonaTable;
