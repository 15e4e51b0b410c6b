pub mod cues;
pub mod shell;
pub mod timers;

pub use cues::*;
pub use shell::*;
pub use timers::*;
