//! # foot_midi
//!
//! Real-time MIDI for the green screen: a small owned [`MidiPlayer`] that
//! sends note, program and all-notes-off messages to an output port, and a
//! [`FootTrigger`] that plays a note whenever a foot marker appears and
//! releases it when the marker disappears.
//!
//! ## Output selection
//!
//! [`open_output`] picks the first MIDI output port, preferring a software
//! synthesiser if one is visible.  With no ports (or no MIDI subsystem at all)
//! it falls back to [`NullSink`] so the rest of the application runs silently.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use foot_midi::{open_output, MidiPlayer, Note};
//!
//! let mut player = MidiPlayer::new(open_output("foot_midi"));
//! player.select_instrument(0);
//! player.play_note(Note::C, 5);
//! player.stop_note(Note::C, 5);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use matte_core::{FootMarkers, FOOT_MARKER_COUNT};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI init failed: {0}")]
    Init(String),
    #[error("no MIDI output ports")]
    NoPorts,
    #[error("could not connect to MIDI port {port}: {reason}")]
    Connect { port: String, reason: String },
    #[error("MIDI send failed: {0}")]
    Send(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Notes
// ════════════════════════════════════════════════════════════════════════════

/// The twelve pitch classes, C = 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Note {
    C  = 0,
    Cs = 1,
    D  = 2,
    Ds = 3,
    E  = 4,
    F  = 5,
    Fs = 6,
    G  = 7,
    Gs = 8,
    A  = 9,
    As = 10,
    B  = 11,
}

impl Note {
    pub fn name(self) -> &'static str {
        match self {
            Note::C  => "C",
            Note::Cs => "C#",
            Note::D  => "D",
            Note::Ds => "D#",
            Note::E  => "E",
            Note::F  => "F",
            Note::Fs => "F#",
            Note::G  => "G",
            Note::Gs => "G#",
            Note::A  => "A",
            Note::As => "A#",
            Note::B  => "B",
        }
    }
}

/// MIDI note number for `note` in `octave` (octave 5 holds middle C, 60).
///
/// Wraps modulo 127 so out-of-range octaves still yield a valid data byte.
pub fn note_number(note: Note, octave: u8) -> u8 {
    ((12 * octave as u32 + note as u32) % 127) as u8
}

// ════════════════════════════════════════════════════════════════════════════
// Short messages
// ════════════════════════════════════════════════════════════════════════════

pub const NOTE_OFF:       u8 = 0x80;
pub const NOTE_ON:        u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
/// Controller number for "all notes off".
pub const ALL_NOTES_OFF:  u8 = 0x7B;

pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

pub fn note_off(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [NOTE_OFF | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

pub fn all_notes_off(channel: u8) -> [u8; 3] {
    [CONTROL_CHANGE | (channel & 0x0F), ALL_NOTES_OFF, 0]
}

pub fn program_change(channel: u8, program: u8) -> [u8; 2] {
    [PROGRAM_CHANGE | (channel & 0x0F), program & 0x7F]
}

// ════════════════════════════════════════════════════════════════════════════
// Sinks
// ════════════════════════════════════════════════════════════════════════════

/// Somewhere to send raw MIDI bytes.
pub trait MidiSink {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError>;

    /// Human-readable port name for status output.
    fn name(&self) -> &str;
}

pub struct MidirSink {
    conn: midir::MidiOutputConnection,
    name: String,
}

impl MidiSink for MidirSink {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
        self.conn.send(message).map_err(|e| MidiError::Send(e.to_string()))
    }

    fn name(&self) -> &str { &self.name }
}

/// Swallows everything; used when no MIDI port is available.
#[derive(Debug, Default)]
pub struct NullSink;

impl MidiSink for NullSink {
    fn send(&mut self, _message: &[u8]) -> Result<(), MidiError> { Ok(()) }
    fn name(&self) -> &str { "null" }
}

/// Records every message; clones share one log.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    log: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl MemorySink {
    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl MidiSink for MemorySink {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
        self.log.borrow_mut().push(message.to_vec());
        Ok(())
    }

    fn name(&self) -> &str { "memory" }
}

/// Connect to the first MIDI output port, preferring a soft synth.
pub fn connect_first_port(client_name: &str) -> Result<MidirSink, MidiError> {
    let midi_out = midir::MidiOutput::new(client_name).map_err(|e| MidiError::Init(e.to_string()))?;

    let ports = midi_out.ports();
    if ports.is_empty() {
        return Err(MidiError::NoPorts);
    }

    let port_idx = ports.iter()
        .position(|p| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("gs wavetable") ||
                n.contains("synth")
            }).unwrap_or(false)
        })
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
    info!("opening MIDI port: {name}");

    let conn = midi_out
        .connect(port, "foot-midi-out")
        .map_err(|e| MidiError::Connect { port: name.clone(), reason: e.to_string() })?;
    Ok(MidirSink { conn, name })
}

/// [`connect_first_port`], falling back to [`NullSink`] with a warning.
pub fn open_output(client_name: &str) -> Box<dyn MidiSink> {
    match connect_first_port(client_name) {
        Ok(sink) => Box::new(sink),
        Err(MidiError::NoPorts) => {
            warn!("no MIDI output ports found, notes will be silent");
            warn!("install a synthesiser such as `fluidsynth` or `timidity -iA` (Linux), or use the built-in GS Wavetable Synth (Windows)");
            Box::new(NullSink)
        }
        Err(e) => {
            warn!("{e}; notes will be silent");
            Box::new(NullSink)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiPlayer
// ════════════════════════════════════════════════════════════════════════════

/// Owned MIDI output.  Sends "all notes off" when dropped.
pub struct MidiPlayer {
    sink:     Box<dyn MidiSink>,
    channel:  u8,
    velocity: u8,
}

impl MidiPlayer {
    pub fn new(sink: Box<dyn MidiSink>) -> Self {
        debug!("MIDI player on '{}'", sink.name());
        MidiPlayer { sink, channel: 0, velocity: 127 }
    }

    pub fn sink_name(&self) -> &str { self.sink.name() }

    pub fn play_note(&mut self, note: Note, octave: u8) {
        let msg = note_on(self.channel, note_number(note, octave), self.velocity);
        self.send(&msg);
    }

    pub fn stop_note(&mut self, note: Note, octave: u8) {
        let msg = note_off(self.channel, note_number(note, octave), self.velocity);
        self.send(&msg);
    }

    pub fn stop_all(&mut self) {
        let msg = all_notes_off(self.channel);
        self.send(&msg);
    }

    pub fn select_instrument(&mut self, program: u8) {
        let msg = program_change(self.channel, program);
        self.send(&msg);
    }

    // A dropped note is not worth interrupting the frame loop for.
    fn send(&mut self, msg: &[u8]) {
        if let Err(e) = self.sink.send(msg) {
            warn!("{e}");
        }
    }
}

impl Drop for MidiPlayer {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FootTrigger
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    On  { slot: usize, note: Note, octave: u8 },
    Off { slot: usize, note: Note, octave: u8 },
}

/// One note per foot-marker slot, sounded while the marker is present.
#[derive(Clone, Debug)]
pub struct FootTrigger {
    notes:   [(Note, u8); FOOT_MARKER_COUNT],
    present: [bool; FOOT_MARKER_COUNT],
}

impl Default for FootTrigger {
    /// A major triad plus the octave: C5, E5, G5, C6.
    fn default() -> Self {
        FootTrigger::new([(Note::C, 5), (Note::E, 5), (Note::G, 5), (Note::C, 6)])
    }
}

impl FootTrigger {
    pub fn new(notes: [(Note, u8); FOOT_MARKER_COUNT]) -> Self {
        FootTrigger { notes, present: [false; FOOT_MARKER_COUNT] }
    }

    /// Compare with the previous markers and return the edges.
    pub fn update(&mut self, markers: &FootMarkers) -> Vec<TriggerEvent> {
        let now = markers.presence();
        let mut events = Vec::new();
        for slot in 0..FOOT_MARKER_COUNT {
            let (note, octave) = self.notes[slot];
            match (self.present[slot], now[slot]) {
                (false, true) => events.push(TriggerEvent::On  { slot, note, octave }),
                (true, false) => events.push(TriggerEvent::Off { slot, note, octave }),
                _ => {}
            }
        }
        self.present = now;
        events
    }

    /// [`update`](Self::update) and send the edges to `player`.
    pub fn fire(&mut self, markers: &FootMarkers, player: &mut MidiPlayer) {
        for event in self.update(markers) {
            match event {
                TriggerEvent::On { slot, note, octave } => {
                    debug!("foot slot {slot} down → {}{octave} on", note.name());
                    player.play_note(note, octave);
                }
                TriggerEvent::Off { slot, note, octave } => {
                    debug!("foot slot {slot} up → {}{octave} off", note.name());
                    player.stop_note(note, octave);
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
