use crate::error::{normalize_param, Result};
use crate::io::samples::SampleBanks;
use crate::synth::message::{MessageReceiver, SynthMessage};
use crate::synth::params::{GlideType, PolyMode, SynthParam};
use crate::synth::voice::Voice;
use crate::NUM_VOICES;

/// Routes notes to a fixed pool of voices and pans their sum.
///
/// Poly mode gives each note its own voice. Mono and legato play everything
/// on voice 0 and keep a short history of held keys, so releasing the newest
/// key falls back to the one held before it.
#[derive(Debug, Clone)]
pub struct PolyHandler {
    voices: Vec<Voice>,
    // Poly: note held by each voice. Mono/legato: the held-key history.
    notes: [i32; NUM_VOICES],
    mode: PolyMode,
    num_active_notes: i32,
    newest_note_index: i32,
    glide_type: GlideType,
    prev_note: i32,
    pan: f32,
}

impl PolyHandler {
    pub fn new() -> Self {
        Self {
            voices: (0..NUM_VOICES).map(|_| Voice::new()).collect(),
            notes: [-1; NUM_VOICES],
            mode: PolyMode::Poly,
            num_active_notes: 0,
            newest_note_index: -1,
            glide_type: GlideType::Off,
            prev_note: -1,
            pan: 0.5,
        }
    }

    /// Load a patch of 16-bit parameter values, id = position.
    pub fn init(&mut self, params: &[u16]) -> Result<()> {
        self.notes = [-1; NUM_VOICES];
        for (id, &raw) in params.iter().enumerate() {
            self.set_parameter_u16(id as u16, raw)?;
        }
        Ok(())
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn mode(&self) -> PolyMode {
        self.mode
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Any key currently held.
    pub fn is_active(&self) -> bool {
        self.num_active_notes > 0
    }

    /// Any voice still sounding, held or releasing.
    pub fn is_sounding(&self) -> bool {
        self.voices.iter().any(Voice::is_active)
    }

    pub fn note_on(&mut self, note: i32, velocity: f32) {
        match self.mode {
            PolyMode::Poly => self.poly_note_on(note, velocity),
            PolyMode::Mono | PolyMode::Legato => self.mono_note_on(note, velocity),
        }
        self.prev_note = note;
    }

    fn poly_note_on(&mut self, note: i32, velocity: f32) {
        let prev = self.prev_note;

        if let Some(i) = self.notes.iter().position(|&n| n == note) {
            self.voices[i].note_on(note, prev, velocity);
            return;
        }

        if let Some(i) = self.voices.iter().position(|v| !v.is_active()) {
            self.voices[i].note_on(note, prev, velocity);
            self.notes[i] = note;
            self.num_active_notes += 1;
            return;
        }

        // Steal the first voice playing a lower note, else voice 0.
        let i = self
            .voices
            .iter()
            .position(|v| v.note() < note)
            .unwrap_or(0);
        log::trace!("stealing voice {} for note {}", i, note);
        self.voices[i].note_on(note, prev, velocity);
        self.notes[i] = note;
    }

    fn mono_note_on(&mut self, note: i32, velocity: f32) {
        if self.mode == PolyMode::Legato
            && self.num_active_notes == 0
            && self.glide_type != GlideType::Off
        {
            self.prev_note = -1;
        }

        let velocity = if self.num_active_notes == 0 || self.mode == PolyMode::Mono {
            velocity
        } else {
            -1.0
        };
        self.voices[0].note_on(note, self.prev_note, velocity);

        self.newest_note_index += 1;
        if self.newest_note_index < NUM_VOICES as i32 {
            self.num_active_notes += 1;
        } else {
            self.newest_note_index = 0;
        }
        self.notes[self.newest_note_index as usize] = note;
    }

    pub fn note_off(&mut self, note: i32) {
        self.num_active_notes = (self.num_active_notes - 1).max(0);

        if self.mode == PolyMode::Poly {
            if let Some(i) = self.notes.iter().position(|&n| n == note) {
                self.voices[i].note_off(false);
                self.notes[i] = -1;
            }
            return;
        }

        if self.num_active_notes == 0 {
            self.voices[0].note_off(false);
            self.newest_note_index = -1;
            return;
        }

        let newest = self.newest_note_index.max(0) as usize;
        if self.notes[newest] == note {
            // Fall back to the most recent key still held.
            self.notes[newest] = -1;
            if let Some(i) = (0..=newest).rev().find(|&i| self.notes[i] != -1) {
                self.newest_note_index = i as i32;
            }
            let fallback = self.notes[self.newest_note_index.max(0) as usize];
            self.voices[0].note_on(fallback, note, -1.0);
            self.prev_note = fallback;
        } else if let Some(i) = (0..=newest).rev().find(|&i| self.notes[i] == note) {
            self.notes[i] = -1;
        }
    }

    /// Quick-release every voice and forget all held keys.
    pub fn all_notes_off(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.note_off(true);
        }
        self.notes = [-1; NUM_VOICES];
        self.num_active_notes = 0;
        self.newest_note_index = -1;
    }

    fn set_poly_mode(&mut self, value: f32) {
        self.all_notes_off();
        self.mode = PolyMode::from_normalized(value);
    }

    /// Set parameter `id`. Pan, poly mode and glide type are handled here;
    /// every id is also forwarded to the voices.
    pub fn set_parameter(&mut self, id: u16, value: f32) -> Result<()> {
        let Some(param) = SynthParam::from_id(id) else {
            log::trace!("instrument ignores parameter {}", id);
            return Ok(());
        };

        let value = if param.is_unbounded() {
            value
        } else {
            normalize_param(id, value)?
        };

        match param {
            SynthParam::Pan => self.pan = value,
            SynthParam::PolyMode => self.set_poly_mode(value),
            SynthParam::GlideType => self.glide_type = GlideType::from_normalized(value),
            _ => {}
        }

        for voice in self.voices.iter_mut() {
            voice.set_parameter(param, value);
        }
        Ok(())
    }

    /// Set a parameter from its 16-bit stored form.
    pub fn set_parameter_u16(&mut self, id: u16, raw: u16) -> Result<()> {
        self.set_parameter(id, raw as f32 / 65_535.0)
    }

    /// Drain pending live messages.
    pub fn process_messages<R: MessageReceiver + ?Sized>(&mut self, rx: &mut R) -> Result<()> {
        while let Some(msg) = rx.pop() {
            match msg {
                SynthMessage::NoteOn { note, velocity } if velocity > 0 => {
                    self.note_on(note as i32, velocity as f32 / 127.0)
                }
                SynthMessage::NoteOn { note, .. } | SynthMessage::NoteOff { note, .. } => {
                    self.note_off(note as i32)
                }
                SynthMessage::PitchBend { value } => {
                    self.set_parameter(SynthParam::PitchBend.id(), value)?
                }
                SynthMessage::SetParameter { id, value } => self.set_parameter(id, value)?,
                SynthMessage::AllNotesOff => self.all_notes_off(),
            }
        }
        Ok(())
    }

    /// Sum of all sounding voices, equal-power panned.
    pub fn next_sample(&mut self, banks: &SampleBanks) -> (f32, f32) {
        let sum: f32 = self
            .voices
            .iter_mut()
            .filter(|v| v.is_active())
            .map(|v| v.next_sample(banks))
            .sum();
        (sum * (1.0 - self.pan).sqrt(), sum * self.pan.sqrt())
    }

    /// Fill an interleaved stereo buffer.
    pub fn render_block(&mut self, out: &mut [f32], banks: &SampleBanks) {
        for frame in out.chunks_exact_mut(2) {
            let (left, right) = self.next_sample(banks);
            frame[0] = left;
            frame[1] = right;
        }
    }
}

impl Default for PolyHandler {
    fn default() -> Self {
        Self::new()
    }
}
