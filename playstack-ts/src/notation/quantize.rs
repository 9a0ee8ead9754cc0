//! Grid quantization and staff voicing
//!
//! Transcribed MIDI has free timing; the engraver needs note values. Notes
//! snap to a fixed grid, split into treble/bass at middle C, and each staff
//! becomes a single sequence of chords and rests.

use super::midi_reader::TimedNote;
use std::collections::BTreeMap;

/// Middle C; keys at or above go to the treble staff
pub const SPLIT_KEY: u8 = 60;

/// Latest grid step a note may start or end on; later material is clamped
pub const MAX_STEP: u32 = 1 << 20;

/// A note on the grid (`start`/`len` in grid steps)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedNote {
    pub key: u8,
    pub start: u32,
    pub len: u32,
}

impl QuantizedNote {
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.len)
    }
}

/// A chord (or rest when `keys` is empty) occupying `len` steps from `start`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffEvent {
    pub start: u32,
    pub len: u32,
    pub keys: Vec<u8>,
}

impl StaffEvent {
    pub fn is_rest(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Snap notes to `steps_per_quarter` and drop exact duplicates
///
/// Onset and offset round to the nearest step; every note keeps at least
/// one step. Positions past [`MAX_STEP`] clamp to it. When the same key
/// starts twice on one step, the longer note wins.
pub fn quantize(notes: &[TimedNote], steps_per_quarter: u32) -> Vec<QuantizedNote> {
    let steps = f64::from(steps_per_quarter);
    let snap = |q: f64| (q.max(0.0) * steps).round().min(f64::from(MAX_STEP)) as u32;

    let mut by_onset: BTreeMap<(u32, u8), u32> = BTreeMap::new();
    for note in notes {
        let start = snap(note.start);
        let end = snap(note.end);
        let len = end.saturating_sub(start).max(1);
        let entry = by_onset.entry((start, note.key)).or_insert(len);
        *entry = (*entry).max(len);
    }

    by_onset
        .into_iter()
        .map(|((start, key), len)| QuantizedNote { key, start, len })
        .collect()
}

/// Notes for one staff
pub fn split_staves(notes: &[QuantizedNote]) -> (Vec<QuantizedNote>, Vec<QuantizedNote>) {
    notes.iter().partition(|n| n.key >= SPLIT_KEY)
}

/// Turn overlapping notes into one voice of chords and rests
///
/// Notes sharing an onset form a chord lasting as long as its longest note,
/// cut short by the next onset. Gaps (and the tail up to `total_len`)
/// become rests.
pub fn voice_staff(notes: &[QuantizedNote], total_len: u32) -> Vec<StaffEvent> {
    let mut chords: BTreeMap<u32, (u32, Vec<u8>)> = BTreeMap::new();
    for note in notes {
        let chord = chords.entry(note.start).or_insert((0, Vec::new()));
        chord.0 = chord.0.max(note.len);
        if !chord.1.contains(&note.key) {
            chord.1.push(note.key);
        }
    }

    let onsets: Vec<u32> = chords.keys().copied().collect();
    let mut events = Vec::new();
    let mut cursor = 0;

    for (i, (start, (len, mut keys))) in chords.into_iter().enumerate() {
        if start > cursor {
            events.push(StaffEvent {
                start: cursor,
                len: start - cursor,
                keys: Vec::new(),
            });
        }
        let limit = onsets.get(i + 1).copied().unwrap_or(u32::MAX);
        let end = start.saturating_add(len).min(limit);
        keys.sort_unstable();
        events.push(StaffEvent {
            start,
            len: end - start,
            keys,
        });
        cursor = end;
    }

    if total_len > cursor {
        events.push(StaffEvent {
            start: cursor,
            len: total_len - cursor,
            keys: Vec::new(),
        });
    }
    events
}

/// Length of the piece rounded up to whole bars (at least one bar)
pub fn padded_length(notes: &[QuantizedNote], bar_len: u32) -> u32 {
    let end = notes.iter().map(QuantizedNote::end).max().unwrap_or(0);
    let bars = end.div_ceil(bar_len).max(1);
    bars * bar_len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(key: u8, start: f64, end: f64) -> TimedNote {
        TimedNote {
            key,
            start,
            end,
            velocity: 80,
        }
    }

    #[test]
    fn far_future_notes_clamp_to_horizon() {
        // A huge delta at low resolution lands billions of quarters in
        let notes = [timed(60, 0.0, 1.0), timed(64, 4.0e9, 4.0e9 + 2.0)];
        let q = quantize(&notes, 4);
        assert_eq!(q[1].start, MAX_STEP);
        assert_eq!(q[1].len, 1);
        assert_eq!(q[1].end(), MAX_STEP + 1);

        let total = padded_length(&q, 16);
        assert_eq!(total % 16, 0);
        assert!(total > MAX_STEP);
        let events = voice_staff(&q, total);
        assert_eq!(events.last().unwrap().start + events.last().unwrap().len, total);
    }

    #[test]
    fn snaps_to_nearest_sixteenth() {
        let notes = [timed(60, 0.02, 0.98), timed(62, 1.13, 1.15)];
        let q = quantize(&notes, 4);
        assert_eq!(
            q,
            vec![
                QuantizedNote { key: 60, start: 0, len: 4 },
                // Shorter than a step still lasts one step
                QuantizedNote { key: 62, start: 5, len: 1 },
            ]
        );
    }

    #[test]
    fn duplicate_onsets_keep_longest() {
        let notes = [timed(67, 0.0, 0.5), timed(67, 0.01, 2.0)];
        assert_eq!(quantize(&notes, 4), vec![QuantizedNote { key: 67, start: 0, len: 8 }]);
    }

    #[test]
    fn splits_at_middle_c() {
        let notes = [
            QuantizedNote { key: 59, start: 0, len: 4 },
            QuantizedNote { key: 60, start: 0, len: 4 },
        ];
        let (treble, bass) = split_staves(&notes);
        assert_eq!(treble[0].key, 60);
        assert_eq!(bass[0].key, 59);
    }

    #[test]
    fn overlapping_notes_become_chords_and_rests() {
        let notes = [
            QuantizedNote { key: 64, start: 0, len: 4 },
            QuantizedNote { key: 60, start: 0, len: 2 },
            // Starts while the chord above still sounds; cuts it at step 3
            QuantizedNote { key: 67, start: 3, len: 2 },
            QuantizedNote { key: 72, start: 8, len: 4 },
        ];
        let events = voice_staff(&notes, 16);
        assert_eq!(
            events,
            vec![
                StaffEvent { start: 0, len: 3, keys: vec![60, 64] },
                StaffEvent { start: 3, len: 2, keys: vec![67] },
                StaffEvent { start: 5, len: 3, keys: vec![] },
                StaffEvent { start: 8, len: 4, keys: vec![72] },
                StaffEvent { start: 12, len: 4, keys: vec![] },
            ]
        );
    }

    #[test]
    fn empty_staff_is_one_rest() {
        let events = voice_staff(&[], 16);
        assert_eq!(events, vec![StaffEvent { start: 0, len: 16, keys: vec![] }]);
        assert!(events[0].is_rest());
    }

    #[test]
    fn length_rounds_up_to_bars() {
        let notes = [QuantizedNote { key: 60, start: 14, len: 4 }];
        assert_eq!(padded_length(&notes, 16), 32);
        assert_eq!(padded_length(&[], 12), 12);
    }
}
