//! MIDI → LilyPond notation source
//!
//! Minimal cleanup for renderability, not a general notation engine:
//!
//! - **Reader** (`midi_reader`): flatten tracks into timed notes, pick up
//!   tempo and time signature
//! - **Quantizer** (`quantize`): snap to a grid, split treble/bass at middle
//!   C, collapse overlaps into chords, fill gaps with rests
//! - **Writer** (`lilypond`): note values, ties across bar lines, the
//!   two-staff score wrapper
//!
//! Output is a pure function of the MIDI bytes and options, so the same MIDI
//! always yields the same `.ly` file.

pub mod lilypond;
pub mod midi_reader;
pub mod quantize;

use lilypond::{render_score, DurationTable, ScoreHeader, StaffSource};
use quantize::{padded_length, quantize, split_staves, voice_staff};
use thiserror::Error;

/// Notation conversion errors
#[derive(Debug, Error)]
pub enum NotationError {
    /// File is not a readable Standard MIDI File
    #[error("Malformed MIDI: {0}")]
    Parse(#[from] midly::Error),

    /// Header timing cannot be converted to note values
    #[error("Malformed MIDI: {0}")]
    InvalidTiming(String),

    /// Quantization grid not representable as note values
    #[error("Unsupported quantization grid: {0} steps per quarter note")]
    InvalidGrid(u32),
}

/// Conversion settings
#[derive(Debug, Clone)]
pub struct NotationOptions {
    /// Grid resolution; 4 = sixteenth notes
    pub steps_per_quarter: u32,
    pub title: String,
}

impl Default for NotationOptions {
    fn default() -> Self {
        Self {
            steps_per_quarter: 4,
            title: "Transcription".to_string(),
        }
    }
}

/// Statistics about a conversion, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotationStats {
    pub notes: usize,
    pub bars: u32,
}

/// Convert MIDI bytes to a LilyPond score
pub fn midi_to_lilypond(
    bytes: &[u8],
    options: &NotationOptions,
) -> Result<(String, NotationStats), NotationError> {
    let table = DurationTable::new(options.steps_per_quarter)?;
    let summary = midi_reader::read_midi(bytes)?;

    let whole = 4 * options.steps_per_quarter;
    let (mut num, mut den) = summary.time_signature;
    // Meters whose bar is not a whole number of grid steps fall back to 4/4
    if (u32::from(num) * whole) % u32::from(den) != 0 {
        num = 4;
        den = 4;
    }
    let bar_len = u32::from(num) * whole / u32::from(den);

    let notes = quantize(&summary.notes, options.steps_per_quarter);
    let total_len = padded_length(&notes, bar_len);
    let (treble, bass) = split_staves(&notes);
    let upper = voice_staff(&treble, total_len);
    let lower = voice_staff(&bass, total_len);

    let source = render_score(
        &ScoreHeader {
            title: &options.title,
            tempo_bpm: summary.tempo_bpm,
            time_signature: (num, den),
            bar_len,
        },
        &[
            StaffSource {
                name: "upper",
                clef: "treble",
                events: &upper,
            },
            StaffSource {
                name: "lower",
                clef: "bass",
                events: &lower,
            },
        ],
        &table,
    );

    Ok((
        source,
        NotationStats {
            notes: notes.len(),
            bars: total_len / bar_len,
        },
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Fps, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

    /// Description of a single-track test file (ticks are absolute)
    #[derive(Debug, Clone)]
    pub struct MidiSpec {
        pub ppq: u16,
        pub tempo_us: Option<u32>,
        /// (numerator, denominator power of two)
        pub time_signature: Option<(u8, u8)>,
        /// (key, start tick, end tick)
        pub notes: Vec<(u8, u32, u32)>,
        /// Same as `notes`, on the percussion channel
        pub percussion: Vec<(u8, u32, u32)>,
    }

    impl Default for MidiSpec {
        fn default() -> Self {
            Self {
                ppq: 480,
                tempo_us: None,
                time_signature: None,
                notes: Vec::new(),
                percussion: Vec::new(),
            }
        }
    }

    pub fn build_midi(desc: &MidiSpec) -> Vec<u8> {
        // (tick, order, kind); note-offs sort before note-ons on the same tick
        let mut events: Vec<(u32, u8, TrackEventKind<'static>)> = Vec::new();
        if let Some(us) = desc.tempo_us {
            events.push((0, 0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(us)))));
        }
        if let Some((num, den_pow)) = desc.time_signature {
            events.push((
                0,
                0,
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, den_pow, 24, 8)),
            ));
        }
        let channels = [(0u8, &desc.notes), (9u8, &desc.percussion)];
        for (channel, notes) in channels {
            for &(key, start, end) in notes.iter() {
                events.push((
                    start,
                    2,
                    TrackEventKind::Midi {
                        channel: u4::new(channel),
                        message: MidiMessage::NoteOn {
                            key: u7::new(key),
                            vel: u7::new(90),
                        },
                    },
                ));
                events.push((
                    end,
                    1,
                    TrackEventKind::Midi {
                        channel: u4::new(channel),
                        message: MidiMessage::NoteOff {
                            key: u7::new(key),
                            vel: u7::new(0),
                        },
                    },
                ));
            }
        }
        events.sort_by_key(|(tick, order, _)| (*tick, *order));

        let mut track = Vec::new();
        let mut last = 0;
        for (tick, _, kind) in events {
            track.push(TrackEvent {
                delta: u28::new(tick - last),
                kind,
            });
            last = tick;
        }
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(desc.ppq))),
            tracks: vec![track],
        };
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).unwrap();
        bytes
    }

    fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOn {
                    key: u7::new(key),
                    vel: u7::new(vel),
                },
            },
        }
    }

    /// 25 fps x 40 subframes = 1000 ticks per second. Key 60 is closed by a
    /// velocity-0 note-on; key 64 is still sounding at end of track.
    pub fn timecode_midi() -> Vec<u8> {
        let track = vec![
            note_on(0, 60, 90),
            note_on(500, 60, 0),
            note_on(0, 64, 90),
            TrackEvent {
                delta: u28::new(1000),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            },
        ];
        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Timecode(Fps::Fps25, 40)),
            tracks: vec![track],
        };
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).unwrap();
        bytes
    }
}
