//! Process-wide serving mode shared by the content and admin listeners.
//!
//! The mode is a single bit, so an `AtomicBool` with acquire/release ordering
//! is enough: `toggle` is one `fetch_xor`, which makes concurrent toggles
//! compose (two toggles always cancel out) and a reader can never see a
//! half-applied value. Requests that read the mode before a toggle complete
//! with the old mode.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::content::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Joke,
    Proverb,
}

impl Mode {
    pub fn category(self) -> Category {
        match self {
            Mode::Joke => Category::Joke,
            Mode::Proverb => Category::Proverb,
        }
    }

    pub fn toggled(self) -> Mode {
        match self {
            Mode::Joke => Mode::Proverb,
            Mode::Proverb => Mode::Joke,
        }
    }

    fn from_bit(proverb: bool) -> Mode {
        if proverb {
            Mode::Proverb
        } else {
            Mode::Joke
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category().as_str())
    }
}

#[derive(Debug, Default)]
pub struct ModeController {
    proverb: AtomicBool,
}

impl ModeController {
    pub fn new(initial: Mode) -> Self {
        Self {
            proverb: AtomicBool::new(initial == Mode::Proverb),
        }
    }

    pub fn current(&self) -> Mode {
        Mode::from_bit(self.proverb.load(Ordering::Acquire))
    }

    /// Flip the mode and return the mode now in effect.
    pub fn toggle(&self) -> Mode {
        let previous = self.proverb.fetch_xor(true, Ordering::AcqRel);
        Mode::from_bit(!previous)
    }
}
