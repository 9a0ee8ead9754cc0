//! MIDI → timed notes
//!
//! Flattens every track of a Standard MIDI File into notes measured in
//! quarter notes from the start of the piece, plus the first tempo and
//! time signature found.

use super::NotationError;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;

/// General MIDI percussion channel (channel 10, zero-based 9)
const PERCUSSION_CHANNEL: u8 = 9;

const DEFAULT_TEMPO_US_PER_QUARTER: u32 = 500_000;

/// A note with start/end in quarter notes
#[derive(Debug, Clone, PartialEq)]
pub struct TimedNote {
    pub key: u8,
    pub start: f64,
    pub end: f64,
    pub velocity: u8,
}

/// Everything the score renderer needs from a MIDI file
#[derive(Debug, Clone, PartialEq)]
pub struct MidiSummary {
    pub notes: Vec<TimedNote>,
    pub tempo_bpm: f64,
    /// (numerator, denominator)
    pub time_signature: (u8, u8),
}

/// Parse `bytes` and collect its pitched notes
pub fn read_midi(bytes: &[u8]) -> Result<MidiSummary, NotationError> {
    let smf = Smf::parse(bytes)?;

    let mut tempo: Option<(u64, u32)> = None;
    let mut time_signature: Option<(u64, (u8, u8))> = None;

    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += u64::from(event.delta.as_int());
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us)) => {
                    if tempo.map_or(true, |(t, _)| tick < t) {
                        tempo = Some((tick, us.as_int()));
                    }
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, den_pow, _, _)) => {
                    if time_signature.map_or(true, |(t, _)| tick < t) {
                        if let Some(den) = 1u8.checked_shl(u32::from(den_pow)) {
                            if num > 0 {
                                time_signature = Some((tick, (num, den)));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    let us_per_quarter = tempo
        .map(|(_, us)| us)
        .filter(|us| *us > 0)
        .unwrap_or(DEFAULT_TEMPO_US_PER_QUARTER);

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(ppq) => {
            let ppq = ppq.as_int();
            if ppq == 0 {
                return Err(NotationError::InvalidTiming(
                    "ticks per quarter note is 0".to_string(),
                ));
            }
            f64::from(ppq)
        }
        Timing::Timecode(fps, subframes) => {
            let ticks_per_second = f64::from(fps.as_f32()) * f64::from(subframes);
            if ticks_per_second <= 0.0 {
                return Err(NotationError::InvalidTiming(
                    "timecode resolution is 0".to_string(),
                ));
            }
            ticks_per_second * f64::from(us_per_quarter) / 1_000_000.0
        }
    };

    let mut notes = Vec::new();
    for track in &smf.tracks {
        collect_track_notes(track, ticks_per_quarter, &mut notes);
    }
    notes.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then(a.key.cmp(&b.key))
            .then(a.end.total_cmp(&b.end))
    });

    Ok(MidiSummary {
        notes,
        tempo_bpm: 60_000_000.0 / f64::from(us_per_quarter),
        time_signature: time_signature.map(|(_, ts)| ts).unwrap_or((4, 4)),
    })
}

/// Pair note-on/note-off events of one track
///
/// A note-off (or note-on with velocity 0) closes the most recent open note
/// for that channel and key. Notes left open end at the track's last tick.
fn collect_track_notes(track: &[midly::TrackEvent], ticks_per_quarter: f64, out: &mut Vec<TimedNote>) {
    let mut open: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();
    let mut tick: u64 = 0;
    let to_quarters = |t: u64| t as f64 / ticks_per_quarter;

    for event in track {
        tick += u64::from(event.delta.as_int());
        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        let channel = channel.as_int();
        if channel == PERCUSSION_CHANNEL {
            continue;
        }
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                open.entry((channel, key.as_int()))
                    .or_default()
                    .push((tick, vel.as_int()));
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                if let Some((start, velocity)) =
                    open.get_mut(&(channel, key)).and_then(Vec::pop)
                {
                    out.push(TimedNote {
                        key,
                        start: to_quarters(start),
                        end: to_quarters(tick),
                        velocity,
                    });
                }
            }
            _ => {}
        }
    }

    for ((_, key), starts) in open {
        for (start, velocity) in starts {
            out.push(TimedNote {
                key,
                start: to_quarters(start),
                end: to_quarters(tick),
                velocity,
            });
        }
    }
}
