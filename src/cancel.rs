use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

/// Shared cancellation flag. The interrupt handler stores `true` once;
/// the playback loop polls it between packets and after each rendered
/// frame. Stores are idempotent, reads never block, so a plain atomic is
/// all the synchronization required.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Installs the Ctrl-C handler for the video path. The still path never
/// registers one: it has no loop to interrupt. The handler only flips the
/// flag; a repeated interrupt flips it again to no further effect.
pub fn install_interrupt_handler(flag: &CancelFlag) -> Result<()> {
    let flag = flag.clone();
    ctrlc::set_handler(move || flag.cancel()).context("failed to install interrupt handler")
}
