//! LilyPond source emission
//!
//! Writes a two-staff piano score in absolute octave mode. Durations are
//! expressed as sums of plain and dotted note values, split at bar lines
//! and tied across them.

use super::quantize::StaffEvent;
use super::NotationError;

/// LilyPond language version written at the top of every file
pub const LILYPOND_VERSION: &str = "2.24.0";

const PITCH_NAMES: [&str; 12] = [
    "c", "cis", "d", "dis", "e", "f", "fis", "g", "gis", "a", "ais", "b",
];

/// Absolute pitch, `c'` = middle C (MIDI 60)
pub fn pitch_name(key: u8) -> String {
    let name = PITCH_NAMES[usize::from(key % 12)];
    let marks = i32::from(key / 12) - 4;
    let octave = if marks >= 0 {
        "'".repeat(marks as usize)
    } else {
        ",".repeat(marks.unsigned_abs() as usize)
    };
    format!("{}{}", name, octave)
}

/// Note values available at a grid resolution, longest first
///
/// Each entry is (length in grid steps, LilyPond duration token).
#[derive(Debug, Clone)]
pub struct DurationTable {
    values: Vec<(u32, String)>,
}

impl DurationTable {
    /// `steps_per_quarter` must be a power of two between 1 and 8
    pub fn new(steps_per_quarter: u32) -> Result<Self, NotationError> {
        if !steps_per_quarter.is_power_of_two() || steps_per_quarter > 8 {
            return Err(NotationError::InvalidGrid(steps_per_quarter));
        }
        let whole = 4 * steps_per_quarter;
        let mut values = Vec::new();
        for base in [1u32, 2, 4, 8, 16, 32] {
            if whole % base != 0 {
                break;
            }
            let steps = whole / base;
            if steps % 2 == 0 && base < 32 {
                values.push((steps + steps / 2, format!("{}.", base)));
            }
            values.push((steps, base.to_string()));
        }
        values.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(Self { values })
    }

    /// Greedy decomposition of `len` steps into note values
    pub fn decompose(&self, mut len: u32) -> Vec<&str> {
        let mut tokens = Vec::new();
        while len > 0 {
            match self.values.iter().find(|(steps, _)| *steps <= len) {
                Some((steps, token)) => {
                    tokens.push(token.as_str());
                    len -= steps;
                }
                None => break,
            }
        }
        tokens
    }
}

/// Staff definition passed to [`render_score`]
pub struct StaffSource<'a> {
    pub name: &'a str,
    pub clef: &'a str,
    pub events: &'a [StaffEvent],
}

/// Score-wide settings
pub struct ScoreHeader<'a> {
    pub title: &'a str,
    pub tempo_bpm: f64,
    pub time_signature: (u8, u8),
    /// Bar length in grid steps
    pub bar_len: u32,
}

fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Music expression for one staff
pub fn render_staff(events: &[StaffEvent], bar_len: u32, table: &DurationTable) -> String {
    let mut out = String::new();
    let mut position: u32 = 0;

    for event in events {
        let head = match event.keys.as_slice() {
            [] => "r".to_string(),
            [key] => pitch_name(*key),
            keys => format!(
                "<{}>",
                keys.iter().map(|k| pitch_name(*k)).collect::<Vec<_>>().join(" ")
            ),
        };

        let mut remaining = event.len;
        while remaining > 0 {
            let room = bar_len - position % bar_len;
            let chunk = remaining.min(room);
            let tokens = table.decompose(chunk);
            for (i, token) in tokens.iter().enumerate() {
                out.push_str(&head);
                out.push_str(token);
                let last_piece = remaining == chunk && i + 1 == tokens.len();
                if !event.is_rest() && !last_piece {
                    out.push('~');
                }
                out.push(' ');
            }
            position += chunk;
            remaining -= chunk;
            if position % bar_len == 0 {
                out.push_str("|\n    ");
            }
        }
    }
    out.trim_end().to_string()
}

/// Complete `.ly` file
pub fn render_score(header: &ScoreHeader<'_>, staves: &[StaffSource<'_>], table: &DurationTable) -> String {
    let (num, den) = header.time_signature;
    let tempo = header.tempo_bpm.round().clamp(1.0, 999.0) as u32;

    let mut lines = vec![
        format!("\\version \"{}\"", LILYPOND_VERSION),
        String::new(),
        "\\header {".to_string(),
        format!("  title = \"{}\"", escape_string(header.title)),
        "  tagline = ##f".to_string(),
        "}".to_string(),
        String::new(),
    ];

    for (i, staff) in staves.iter().enumerate() {
        lines.push(format!("{} = {{", staff.name));
        lines.push(format!("    \\clef {}", staff.clef));
        lines.push(format!("    \\time {}/{}", num, den));
        if i == 0 {
            lines.push(format!("    \\tempo 4 = {}", tempo));
        }
        lines.push(format!("    {}", render_staff(staff.events, header.bar_len, table)));
        lines.push("    \\bar \"|.\"".to_string());
        lines.push("}".to_string());
        lines.push(String::new());
    }

    lines.push("\\score {".to_string());
    lines.push("  \\new PianoStaff <<".to_string());
    for staff in staves {
        lines.push(format!("    \\new Staff = \"{0}\" \\{0}", staff.name));
    }
    lines.push("  >>".to_string());
    lines.push("  \\layout { }".to_string());
    lines.push("}".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(start: u32, len: u32, keys: &[u8]) -> StaffEvent {
        StaffEvent {
            start,
            len,
            keys: keys.to_vec(),
        }
    }

    #[test]
    fn pitch_names_in_absolute_mode() {
        assert_eq!(pitch_name(60), "c'");
        assert_eq!(pitch_name(61), "cis'");
        assert_eq!(pitch_name(69), "a'");
        assert_eq!(pitch_name(72), "c''");
        assert_eq!(pitch_name(48), "c");
        assert_eq!(pitch_name(47), "b,");
        assert_eq!(pitch_name(21), "a,,,");
    }

    #[test]
    fn sixteenth_grid_durations() {
        let table = DurationTable::new(4).unwrap();
        assert_eq!(table.decompose(16), vec!["1"]);
        assert_eq!(table.decompose(12), vec!["2."]);
        assert_eq!(table.decompose(7), vec!["4.", "16"]);
        assert_eq!(table.decompose(5), vec!["4", "16"]);
        assert_eq!(table.decompose(1), vec!["16"]);
        assert!(DurationTable::new(3).is_err());
    }

    #[test]
    fn notes_tie_across_bar_lines() {
        let table = DurationTable::new(4).unwrap();
        let events = [ev(0, 12, &[]), ev(12, 8, &[60]), ev(20, 12, &[])];
        let staff = render_staff(&events, 16, &table);
        assert_eq!(staff, "r2. c'4~ |\n    c'4 r2. |");
    }

    #[test]
    fn chords_render_in_angle_brackets() {
        let table = DurationTable::new(4).unwrap();
        let events = [ev(0, 5, &[60, 64, 67]), ev(5, 11, &[])];
        let staff = render_staff(&events, 16, &table);
        assert_eq!(staff, "<c' e' g'>4~ <c' e' g'>16 r2 r8. |");
    }

    #[test]
    fn score_wraps_staves() {
        let table = DurationTable::new(4).unwrap();
        let upper = [ev(0, 16, &[72])];
        let lower = [ev(0, 16, &[])];
        let ly = render_score(
            &ScoreHeader {
                title: "My \"Song\"",
                tempo_bpm: 119.6,
                time_signature: (4, 4),
                bar_len: 16,
            },
            &[
                StaffSource { name: "upper", clef: "treble", events: &upper },
                StaffSource { name: "lower", clef: "bass", events: &lower },
            ],
            &table,
        );
        assert!(ly.starts_with("\\version \"2.24.0\""));
        assert!(ly.contains("title = \"My \\\"Song\\\"\""));
        assert!(ly.contains("\\tempo 4 = 120"));
        assert!(ly.contains("c''1 |"));
        assert!(ly.contains("\\new Staff = \"upper\" \\upper"));
        assert!(ly.contains("\\new Staff = \"lower\" \\lower"));
        assert_eq!(ly.matches("\\tempo").count(), 1);
        assert!(ly.contains("\\header {\n  title"));
        assert!(ly.contains("upper = {\n    \\clef treble\n    \\time 4/4\n"));
        assert!(ly.ends_with("  >>\n  \\layout { }\n}\n"));
    }
}
