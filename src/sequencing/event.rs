/// Event type codes as they appear in the song stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// `param1` note, `param2` velocity 0-127. Velocity 0 releases the note.
    NoteOn,
    /// `param1` note.
    NoteOff,
    /// `param2` 14-bit wheel position, 8192 is centre.
    PitchBend,
    /// Accepted and ignored.
    ControlCode,
    /// `param1` parameter id, `param2` 16-bit value.
    ParameterChange,
    /// `param2` ticks per quarter note.
    Division,
    /// `param2` tempo in BPM × 100.
    Tempo,
    AllNotesOff,
    /// `param1` duration in ticks × 256 + parameter id, `param2` 16-bit target.
    StartEnvelope,
}

impl EventKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::NoteOn),
            1 => Some(Self::NoteOff),
            2 => Some(Self::PitchBend),
            3 => Some(Self::ControlCode),
            4 => Some(Self::ParameterChange),
            5 => Some(Self::Division),
            6 => Some(Self::Tempo),
            7 => Some(Self::AllNotesOff),
            8 => Some(Self::StartEnvelope),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// One entry of the song event stream.
///
/// `delta_ticks` is relative to the previous event. `kind` stays a raw code so
/// that streams containing unknown events can still be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SongEvent {
    pub delta_ticks: i32,
    pub kind: i32,
    /// Target track index.
    pub channel: i32,
    pub param1: i32,
    pub param2: i32,
}

impl SongEvent {
    pub fn new(delta_ticks: i32, kind: EventKind, channel: i32, param1: i32, param2: i32) -> Self {
        Self {
            delta_ticks,
            kind: kind.code(),
            channel,
            param1,
            param2,
        }
    }

    pub fn note_on(delta_ticks: i32, channel: i32, note: i32, velocity: i32) -> Self {
        Self::new(delta_ticks, EventKind::NoteOn, channel, note, velocity)
    }

    pub fn note_off(delta_ticks: i32, channel: i32, note: i32) -> Self {
        Self::new(delta_ticks, EventKind::NoteOff, channel, note, 0)
    }

    pub fn parameter(delta_ticks: i32, channel: i32, id: u16, value: u16) -> Self {
        Self::new(
            delta_ticks,
            EventKind::ParameterChange,
            channel,
            id as i32,
            value as i32,
        )
    }

    pub fn tempo(delta_ticks: i32, bpm: f32) -> Self {
        Self::new(delta_ticks, EventKind::Tempo, 0, 0, (bpm * 100.0).round() as i32)
    }

    /// Linear automation of `id` on `channel` to `target` over `duration_ticks`.
    pub fn start_envelope(
        delta_ticks: i32,
        channel: i32,
        id: u8,
        duration_ticks: i32,
        target: u16,
    ) -> Self {
        Self::new(
            delta_ticks,
            EventKind::StartEnvelope,
            channel,
            duration_ticks * 256 + id as i32,
            target as i32,
        )
    }

    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_code(self.kind)
    }

    /// Decode a flat stream of `(delta, kind, channel, p1, p2)` quintuples.
    ///
    /// A trailing partial quintuple is dropped.
    pub fn from_flat(data: &[i32]) -> Vec<SongEvent> {
        data.chunks_exact(5)
            .map(|q| SongEvent {
                delta_ticks: q[0],
                kind: q[1],
                channel: q[2],
                param1: q[3],
                param2: q[4],
            })
            .collect()
    }

    pub fn to_flat(events: &[SongEvent]) -> Vec<i32> {
        events
            .iter()
            .flat_map(|e| [e.delta_ticks, e.kind, e.channel, e.param1, e.param2])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_stream_format() {
        assert_eq!(EventKind::NoteOn.code(), 0);
        assert_eq!(EventKind::ParameterChange.code(), 4);
        assert_eq!(EventKind::StartEnvelope.code(), 8);
        assert_eq!(EventKind::from_code(6), Some(EventKind::Tempo));
        assert_eq!(EventKind::from_code(42), None);
    }

    #[test]
    fn envelope_packs_duration_and_id() {
        let event = SongEvent::start_envelope(0, 3, 127, 96, 65_535);
        assert_eq!(event.param1 / 256, 96);
        assert_eq!(event.param1 % 256, 127);
    }

    #[test]
    fn flat_stream_drops_partial_tail() {
        let data = [0, 0, 0, 60, 100, 48, 1, 0, 60, 0, 7, 7];
        let events = SongEvent::from_flat(&data);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], SongEvent::note_off(48, 0, 60));
        assert_eq!(SongEvent::to_flat(&events), data[..10]);
    }

    #[test]
    fn tempo_is_scaled_by_hundred() {
        assert_eq!(SongEvent::tempo(0, 123.45).param2, 12_345);
    }
}
