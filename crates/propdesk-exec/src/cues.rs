use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use propdesk_core::sound::Cue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error("no audio output available")]
    Unavailable,
    #[error("failed to emit cue: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound port for feedback sounds. Callers treat every failure as
/// non-fatal.
pub trait CuePort {
    fn play(&mut self, cue: Cue, volume: u8) -> Result<(), CueError>;
}

impl<P: CuePort + ?Sized> CuePort for Box<P> {
    fn play(&mut self, cue: Cue, volume: u8) -> Result<(), CueError> {
        (**self).play(cue, volume)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCues;

impl CuePort for SilentCues {
    fn play(&mut self, _cue: Cue, _volume: u8) -> Result<(), CueError> {
        Ok(())
    }
}

/// Rings the terminal bell for cues that carry meaning. Clicks and window
/// opens would ring on nearly every key press, so they stay silent.
pub struct BellCues<W: Write> {
    out: W,
}

impl<W: Write> BellCues<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CuePort for BellCues<W> {
    fn play(&mut self, cue: Cue, volume: u8) -> Result<(), CueError> {
        if volume == 0 || matches!(cue, Cue::Click | Cue::Enable) {
            return Ok(());
        }
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps every request; clones share one log.
#[derive(Debug, Default, Clone)]
pub struct RecordingCues {
    played: Rc<RefCell<Vec<(Cue, u8)>>>,
    fail: bool,
}

impl RecordingCues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the request, then reports the output as unavailable.
    pub fn failing() -> Self {
        Self {
            played: Rc::default(),
            fail: true,
        }
    }

    pub fn played(&self) -> Vec<(Cue, u8)> {
        self.played.borrow().clone()
    }
}

impl CuePort for RecordingCues {
    fn play(&mut self, cue: Cue, volume: u8) -> Result<(), CueError> {
        self.played.borrow_mut().push((cue, volume));
        if self.fail {
            return Err(CueError::Unavailable);
        }
        Ok(())
    }
}
