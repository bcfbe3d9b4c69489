//! Songcraft: turns a line of text into a tiny single-track MIDI file.
//!
//! The output is fully determined by `(text, mood)`: the mood label is hashed
//! with 32-bit FNV-1a (stable across processes and platforms) and the hash
//! seeds a ChaCha8 generator. Each of the first [`MAX_NOTES`] characters
//! becomes one note whose pitch comes from the character itself and whose
//! velocity, length and following gap come from the generator.
//!
//! ```text
//! MThd 00000006 0000 0001 01E0          header: format 0, 1 track, 480 tpq
//! MTrk <len>                            track chunk
//!   00 FF 51 03 07 A1 20                tempo 500 000 µs / quarter
//!   <Δ> 90 pp vv   <dur> 80 pp 00       note on / note off, per character
//!   00 FF 2F 00                         end of track
//! ```

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::Result;

/// Ticks per quarter note written in the header.
pub const TICKS_PER_QUARTER: u16 = 480;
/// Only this many leading characters are turned into notes.
pub const MAX_NOTES: usize = 64;
/// Middle C; pitches span the octave above it.
pub const BASE_PITCH: u8 = 60;
/// Tempo meta-event payload (120 bpm).
pub const TEMPO_MICROS_PER_QUARTER: u32 = 500_000;

const FNV_OFFSET: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;
const META: u8 = 0xFF;
const META_TEMPO: u8 = 0x51;
const META_END_OF_TRACK: u8 = 0x2F;

/// One note of the sketch, in track-relative ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Ticks since the previous note-off (0 for the first note).
    pub delta: u32,
    /// MIDI key number.
    pub pitch: u8,
    /// Note-on velocity.
    pub velocity: u8,
    /// Ticks between note-on and note-off.
    pub duration: u32,
}

/// Stable seed derived from a mood label (32-bit FNV-1a over UTF-8 bytes).
#[must_use]
pub fn mood_seed(mood: &str) -> u64 {
    let hash = mood
        .as_bytes()
        .iter()
        .fold(FNV_OFFSET, |hash, &byte| (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME));
    u64::from(hash)
}

/// Derive the note sequence for `text` under `mood`.
#[must_use]
pub fn compose(text: &str, mood: &str) -> Vec<NoteEvent> {
    let mut rng = ChaCha8Rng::seed_from_u64(mood_seed(mood));
    let mut delta = 0;

    text.chars()
        .take(MAX_NOTES)
        .map(|ch| {
            // `% 12` keeps the offset below 12, so the cast cannot truncate.
            #[allow(clippy::cast_possible_truncation)]
            let pitch = BASE_PITCH + (u32::from(ch) % 12) as u8;
            let velocity = 64 + rng.gen_range(0..32u8);
            let duration = 120 + rng.gen_range(0..240u32);
            let note = NoteEvent {
                delta,
                pitch,
                velocity,
                duration,
            };
            delta = rng.gen_range(30..120u32);
            note
        })
        .collect()
}

/// Encode `text` under `mood` as a complete Standard MIDI File.
#[must_use]
pub fn encode(text: &str, mood: &str) -> Vec<u8> {
    encode_notes(&compose(text, mood))
}

/// Encode an arbitrary note sequence as a format-0 MIDI file.
#[must_use]
pub fn encode_notes(notes: &[NoteEvent]) -> Vec<u8> {
    let mut track = Vec::with_capacity(16 + notes.len() * 8);

    write_vlq(&mut track, 0);
    let tempo = TEMPO_MICROS_PER_QUARTER.to_be_bytes();
    track.extend_from_slice(&[META, META_TEMPO, 0x03, tempo[1], tempo[2], tempo[3]]);

    for note in notes {
        write_vlq(&mut track, note.delta);
        track.extend_from_slice(&[NOTE_ON, note.pitch, note.velocity]);
        write_vlq(&mut track, note.duration);
        track.extend_from_slice(&[NOTE_OFF, note.pitch, 0]);
    }

    write_vlq(&mut track, 0);
    track.extend_from_slice(&[META, META_END_OF_TRACK, 0x00]);

    let mut out = Vec::with_capacity(22 + track.len());
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&TICKS_PER_QUARTER.to_be_bytes());

    out.extend_from_slice(b"MTrk");
    // A track holds at most MAX_NOTES notes, far below u32::MAX bytes.
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(track.len() as u32).to_be_bytes());
    out.extend_from_slice(&track);
    out
}

/// Append `value` as a MIDI variable-length quantity.
///
/// Seven bits per byte, most significant group first, every byte but the
/// last with the high bit set.
pub fn write_vlq(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = value;
    loop {
        // Masked to 7 bits.
        #[allow(clippy::cast_possible_truncation)]
        let group = (rest & 0x7F) as u8;
        groups[len] = group;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        out.push(groups[i] | continuation);
    }
}

/// Compose and write the sketch for `text` to `path`.
///
/// # Errors
///
/// Returns [`crate::NunuError::Io`] if the file or its directory cannot be
/// written.
pub fn write_midi<P: AsRef<Path>>(path: P, text: &str, mood: &str) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode(text, mood);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    debug!(path = %path.display(), mood, bytes = bytes.len(), "Wrote MIDI sketch");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_vlq(&mut out, value);
        out
    }

    fn declared_track_len(bytes: &[u8]) -> usize {
        u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize
    }

    #[test]
    fn vlq_matches_reference_vectors() {
        assert_eq!(vlq(0), vec![0x00]);
        assert_eq!(vlq(0x40), vec![0x40]);
        assert_eq!(vlq(0x7F), vec![0x7F]);
        assert_eq!(vlq(0x80), vec![0x81, 0x00]);
        assert_eq!(vlq(0x2000), vec![0xC0, 0x00]);
        assert_eq!(vlq(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(vlq(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(vlq(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn header_is_format_zero_single_track() {
        let bytes = encode("Every note is a tether", "serene");
        assert_eq!(
            &bytes[..14],
            &[b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0]
        );
        assert_eq!(&bytes[14..18], b"MTrk");
    }

    #[test]
    fn track_length_matches_payload() {
        for (text, mood) in [("", "neutral"), ("WAH!", "coy"), ("a much longer lyric line", "void")] {
            let bytes = encode(text, mood);
            assert_eq!(declared_track_len(&bytes), bytes.len() - 22, "{text:?}/{mood:?}");
        }
    }

    #[test]
    fn track_starts_with_tempo_and_ends_with_end_of_track() {
        let bytes = encode("la la", "happy");
        assert_eq!(&bytes[22..29], &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        assert_eq!(&bytes[bytes.len() - 4..], &[0x00, 0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn empty_text_has_no_notes() {
        assert!(compose("", "neutral").is_empty());
        assert_eq!(encode("", "neutral").len(), 22 + 7 + 4);
    }

    #[test]
    fn same_input_is_byte_identical() {
        assert_eq!(encode("Soul Weeper", "fierce"), encode("Soul Weeper", "fierce"));
    }

    #[test]
    fn different_moods_change_the_performance_not_the_melody() {
        let a = compose("Every note is a tether, every soul a string", "happy");
        let b = compose("Every note is a tether, every soul a string", "sad");
        assert_ne!(a, b);
        let pitches = |notes: &[NoteEvent]| notes.iter().map(|n| n.pitch).collect::<Vec<_>>();
        assert_eq!(pitches(&a), pitches(&b));
    }

    #[test]
    fn note_parameters_stay_in_range() {
        let text: String = (0..200u8).map(|i| char::from(b' ' + (i % 90))).collect();
        let notes = compose(&text, "fierce");
        assert_eq!(notes.len(), MAX_NOTES);
        assert_eq!(notes[0].delta, 0);
        for note in &notes {
            assert!((60..72).contains(&note.pitch));
            assert!((64..96).contains(&note.velocity));
            assert!((120..360).contains(&note.duration));
        }
        for note in &notes[1..] {
            assert!((30..120).contains(&note.delta));
        }
    }

    #[test]
    fn pitch_follows_character_code() {
        // 'A' = 65 → 65 % 12 = 5; 'M' = 77 → 5; 'B' = 66 → 6.
        let notes = compose("AMB", "neutral");
        assert_eq!(notes.iter().map(|n| n.pitch).collect::<Vec<_>>(), vec![65, 65, 66]);
    }

    #[test]
    fn non_ascii_characters_count_as_one_note() {
        let notes = compose("ララフェル", "coy");
        assert_eq!(notes.len(), 5);
    }

    #[test]
    fn fnv_seed_is_stable() {
        // FNV-1a 32 reference values.
        assert_eq!(mood_seed(""), 0x811C_9DC5);
        assert_eq!(mood_seed("a"), 0xE40C_292C);
        assert_eq!(mood_seed("foobar"), 0xBF9C_F968);
    }

    #[test]
    fn write_midi_creates_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("songs").join("nunu_1.mid");
        write_midi(&path, "tiny melody", "neutral").expect("write");
        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(bytes, encode("tiny melody", "neutral"));
    }
}
