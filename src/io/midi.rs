//! Raw MIDI channel messages and their translation into [`SynthMessage`]s.

use crate::synth::message::SynthMessage;

/// Controller number of "All Notes Off".
pub const CC_ALL_NOTES_OFF: u8 = 123;

const PITCH_BEND_CENTRE: i16 = 8192;
const PITCH_BEND_MAX: f32 = 16_383.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Signed wheel offset, -8192..=8191, 0 is centre.
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode one channel message. System and running-status bytes are not
    /// handled and yield `None`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        let byte = |i: usize| data.get(i).map(|b| b & 0x7F);

        let event = match status & 0xF0 {
            0x80 => MidiEvent::NoteOff {
                channel,
                key: byte(0)?,
                velocity: byte(1)?,
            },
            0x90 => {
                let key = byte(0)?;
                let velocity = byte(1)?;
                // Note on with zero velocity is a note off.
                if velocity == 0 {
                    MidiEvent::NoteOff {
                        channel,
                        key,
                        velocity: 0,
                    }
                } else {
                    MidiEvent::NoteOn {
                        channel,
                        key,
                        velocity,
                    }
                }
            }
            0xB0 => MidiEvent::ControlChange {
                channel,
                controller: byte(0)?,
                value: byte(1)?,
            },
            0xC0 => MidiEvent::ProgramChange {
                channel,
                program: byte(0)?,
            },
            0xE0 => {
                let lsb = byte(0)? as i16;
                let msb = byte(1)? as i16;
                MidiEvent::PitchBend {
                    channel,
                    value: ((msb << 7) | lsb) - PITCH_BEND_CENTRE,
                }
            }
            _ => return None,
        };
        Some(event)
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::ProgramChange { channel, .. } => channel,
        }
    }
}

/// Map a signed 14-bit bend to the [0, 1] wheel range, centre 0.5.
#[inline]
pub fn pitch_bend_to_unit(value: i16) -> f32 {
    ((value as f32 + PITCH_BEND_CENTRE as f32) / PITCH_BEND_MAX).clamp(0.0, 1.0)
}

/// Translate an event addressed to `channel_filter`.
///
/// Program changes and controllers other than All Notes Off have no synth
/// counterpart and are dropped.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    if midi.channel() != channel_filter {
        return None;
    }
    match midi {
        MidiEvent::NoteOn { key, velocity, .. } => Some(SynthMessage::NoteOn {
            note: key,
            velocity,
        }),
        MidiEvent::NoteOff { key, velocity, .. } => Some(SynthMessage::NoteOff {
            note: key,
            velocity,
        }),
        MidiEvent::PitchBend { value, .. } => Some(SynthMessage::PitchBend {
            value: pitch_bend_to_unit(value),
        }),
        MidiEvent::ControlChange {
            controller: CC_ALL_NOTES_OFF,
            ..
        } => Some(SynthMessage::AllNotesOff),
        MidiEvent::ControlChange { .. } | MidiEvent::ProgramChange { .. } => None,
    }
}

/// Parse raw bytes and translate them in one go.
pub fn bytes_to_synth(bytes: &[u8], channel_filter: u8) -> Option<SynthMessage> {
    MidiEvent::parse(bytes).and_then(|event| midi_to_synth(event, channel_filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_notes_and_masks_channel() {
        assert_eq!(
            MidiEvent::parse(&[0x93, 60, 100]),
            Some(MidiEvent::NoteOn {
                channel: 3,
                key: 60,
                velocity: 100
            })
        );
        assert_eq!(
            MidiEvent::parse(&[0x80, 60, 64]),
            Some(MidiEvent::NoteOff {
                channel: 0,
                key: 60,
                velocity: 64
            })
        );
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        assert!(matches!(
            MidiEvent::parse(&[0x90, 60, 0]),
            Some(MidiEvent::NoteOff { key: 60, .. })
        ));
    }

    #[test]
    fn truncated_and_system_messages_are_rejected() {
        assert_eq!(MidiEvent::parse(&[]), None);
        assert_eq!(MidiEvent::parse(&[0x90, 60]), None);
        assert_eq!(MidiEvent::parse(&[0xF8]), None);
    }

    #[test]
    fn pitch_bend_spans_unit_range() {
        let bend = |lsb, msb| match bytes_to_synth(&[0xE0, lsb, msb], 0) {
            Some(SynthMessage::PitchBend { value }) => value,
            other => panic!("expected bend, got {:?}", other),
        };
        assert_eq!(bend(0, 0), 0.0);
        assert_eq!(bend(0x7F, 0x7F), 1.0);
        let centre = bend(0x00, 0x40);
        assert!((centre - 0.5).abs() < 1e-3, "centre {}", centre);
    }

    #[test]
    fn all_notes_off_controller() {
        assert_eq!(
            bytes_to_synth(&[0xB0, CC_ALL_NOTES_OFF, 0], 0),
            Some(SynthMessage::AllNotesOff)
        );
        assert_eq!(bytes_to_synth(&[0xB0, 7, 100], 0), None);
        assert_eq!(bytes_to_synth(&[0xC0, 5], 0), None);
    }

    #[test]
    fn other_channels_are_filtered() {
        assert_eq!(bytes_to_synth(&[0x91, 60, 100], 0), None);
        assert_eq!(
            bytes_to_synth(&[0x91, 60, 100], 1),
            Some(SynthMessage::NoteOn {
                note: 60,
                velocity: 100
            })
        );
    }
}
