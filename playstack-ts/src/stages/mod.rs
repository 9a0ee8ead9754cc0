//! Pipeline stages backed by external tools
//!
//! - **Transcriber** (`transcribe`): audio → MIDI via basic-pitch
//! - **Score renderer** (`engrave`): MIDI → LilyPond source → PDF
//! - **Audio renderer** (`synthesize`): MIDI + soundfont → WAV via FluidSynth
//!
//! Input acquisition lives in `playstack_common::acquire`, shared with the
//! vocal remover.

pub mod engrave;
pub mod synthesize;
pub mod transcribe;

pub use engrave::{EngraveError, ScoreOutput, ScoreRenderer};
pub use synthesize::{AudioRenderer, SynthError};
pub use transcribe::{TranscribeError, Transcriber};

use std::path::Path;

/// True when `path` is a regular file with content
pub(crate) async fn is_nonempty_file(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}
