//! Fuzzing tests for the MIDI input parser
//!
//! Feeds random and malformed byte sequences through the classifier and the
//! recording ingest to make sure garbage input is rejected cleanly and never
//! lands on a track.

use mymusic_sequencer::{EventKind, MidiMessage, Sequencer, SequencerError};
use rand::Rng;

/// Fuzz the parser with random byte sequences
#[test]
fn fuzz_midi_parser_random_bytes() {
    let mut rng = rand::thread_rng();

    for _ in 0..1000 {
        let length = rng.gen_range(0..=16);
        let random_bytes: Vec<u8> = (0..length).map(|_| rng.gen_range(0..=255)).collect();

        match MidiMessage::from_bytes(&random_bytes) {
            Ok(message) => {
                let status = random_bytes[0];
                assert!((0x80..0xF0).contains(&status));
                assert_eq!(message.channel, status & 0x0F);
                assert!(message.data1 <= 127 && message.data2 <= 127);
            }
            Err(SequencerError::MalformedMessage(_)) => {
                assert!(random_bytes.first().is_none_or(|&s| s < 0x80 || s >= 0xF0));
            }
            Err(other) => panic!("Unexpected error: {}", other),
        }
    }
}

/// Fuzz with specific MIDI message patterns
#[test]
fn fuzz_midi_parser_patterns() {
    let mut rng = rand::thread_rng();

    let system_bytes = [
        0xF0, 0xF1, 0xF2, 0xF3, 0xF6, 0xF7, // System common
        0xF8, 0xFA, 0xFB, 0xFC, 0xFE, 0xFF, // System real-time
    ];

    for _ in 0..500 {
        let channel = rng.gen_range(0..=15u8);
        let (bytes, expected) = match rng.gen_range(0..=4) {
            0 => {
                // Note On, possibly with velocity 0
                let velocity = rng.gen_range(0..=127u8);
                let kind = if velocity > 0 {
                    EventKind::NoteOn
                } else {
                    EventKind::NoteOff
                };
                (vec![0x90 | channel, rng.gen_range(0..=127), velocity], Some(kind))
            }
            1 => {
                // Note Off with release velocity
                (
                    vec![0x80 | channel, rng.gen_range(0..=127), rng.gen_range(0..=127)],
                    Some(EventKind::NoteOff),
                )
            }
            2 => {
                // Truncated Note On
                (vec![0x90 | channel, rng.gen_range(0..=127)], Some(EventKind::NoteOff))
            }
            3 => {
                // Pitch Bend
                (
                    vec![0xE0 | channel, rng.gen_range(0..=127), rng.gen_range(0..=127)],
                    Some(EventKind::PitchBend),
                )
            }
            _ => {
                let status = system_bytes[rng.gen_range(0..system_bytes.len())];
                (vec![status], None)
            }
        };

        let parsed = MidiMessage::from_bytes(&bytes);
        match expected {
            Some(kind) => {
                let message = parsed.unwrap();
                assert_eq!(message.kind, kind, "bytes {:02X?}", bytes);
                assert_eq!(message.channel, channel);
            }
            None => assert!(parsed.is_err(), "bytes {:02X?}", bytes),
        }
    }
}

/// Random input through the recording path only ever appends valid events
#[test]
fn fuzz_recording_ingest() {
    let mut rng = rand::thread_rng();
    let sequencer = Sequencer::default();
    let track = sequencer.add_track("Fuzz");
    sequencer.select_track(track).unwrap();
    sequencer.start_recording();

    let ingest = sequencer.recording_ingest();
    let mut accepted = 0;
    for _ in 0..2000 {
        let length = rng.gen_range(0..=3);
        let bytes: Vec<u8> = (0..length).map(|_| rng.gen_range(0..=255)).collect();
        if let Ok(Some(_)) = ingest.on_message(&bytes) {
            accepted += 1;
        }
    }

    let recorded = sequencer.track(track).unwrap();
    assert_eq!(recorded.len(), accepted);
    for event in recorded.events() {
        assert!(event.channel() <= 15);
        assert!(event.pitch() <= 127);
        assert!(event.velocity() <= 127);
        assert_eq!(event.tick(), 0.0);
    }
}
