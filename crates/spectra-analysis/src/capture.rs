//! Capture overlays: hold, average and freeze lines.
//!
//! Each slot cycles through a small state machine:
//!
//! ```text
//!            Activate            Release             Clear
//!   Idle ─────────────▶ Capturing ───────▶ Displaying ──────▶ Idle
//! ```
//!
//! While capturing, every frame's per-bin dB values are merged into the
//! slot's snapshot:
//!
//! - [`CaptureMode::Latch`]: per-bin maximum (hold slot)
//! - [`CaptureMode::Average`]: exponential moving average of linear power
//!   (hold slot); the first frame seeds the average directly
//! - [`CaptureMode::Freeze`]: per-bin maximum, one independent line per
//!   freeze slot
//!
//! Displaying snapshots stop updating but stay available for rendering.

use spectra_core::math::{db_to_power, power_to_db};
use spectra_core::{Error, Result};

/// Number of independent freeze lines.
pub const FREEZE_SLOTS: usize = 4;

/// Allowed averaging window in seconds.
pub const AVERAGE_WINDOW_RANGE: (f32, f32) = (1.0, 15.0);

const SLOT_COUNT: usize = 1 + FREEZE_SLOTS;

/// Addressable capture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum SlotId {
    /// The hold slot, in latch or average mode.
    Hold,
    /// Freeze line `0..FREEZE_SLOTS`.
    Freeze(usize),
}

impl SlotId {
    fn index(self) -> Result<usize> {
        match self {
            SlotId::Hold => Ok(0),
            SlotId::Freeze(n) if n < FREEZE_SLOTS => Ok(1 + n),
            SlotId::Freeze(n) => Err(Error::InvalidInput(format!(
                "freeze slot {} out of range (0-{})",
                n,
                FREEZE_SLOTS - 1
            ))),
        }
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => SlotId::Hold,
            n => SlotId::Freeze(n - 1),
        }
    }

    fn accepts(self, mode: CaptureMode) -> bool {
        matches!(
            (self, mode),
            (SlotId::Hold, CaptureMode::Latch | CaptureMode::Average)
                | (SlotId::Freeze(_), CaptureMode::Freeze)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum CaptureMode {
    Latch,
    Average,
    Freeze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Activate(CaptureMode),
    Release,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTransition {
    None,
    Started,
    Restarted,
    Released,
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum SlotPhase {
    Idle,
    Capturing,
    Displaying,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CaptureConfig {
    /// Assumed analysis frame rate, used to turn the averaging window into a
    /// per-frame coefficient.
    pub frame_rate: f32,
    pub average_window_secs: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            average_window_secs: 5.0,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "frame_rate {} must be positive",
                self.frame_rate
            )));
        }
        let (min, max) = AVERAGE_WINDOW_RANGE;
        if !(min..=max).contains(&self.average_window_secs) {
            return Err(Error::InvalidConfig(format!(
                "average_window_secs {} out of range ({}-{} s)",
                self.average_window_secs, min, max
            )));
        }
        Ok(())
    }

    /// Per-frame EMA coefficient for the averaging window.
    pub fn alpha(&self) -> f32 {
        1.0 - (-1.0 / (self.average_window_secs * self.frame_rate)).exp()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SnapshotData {
    /// Per-channel, per-bin dB maxima.
    Peak(Vec<Vec<f32>>),
    /// Per-channel, per-bin linear power.
    Average { power: Vec<Vec<f32>>, alpha: f32 },
}

/// Retained per-bin values of one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    mode: CaptureMode,
    data: SnapshotData,
    frames: u64,
}

impl Snapshot {
    fn new(mode: CaptureMode, channels: usize, bin_count: usize, alpha: f32) -> Self {
        let data = match mode {
            CaptureMode::Latch | CaptureMode::Freeze => {
                SnapshotData::Peak(vec![vec![f32::NEG_INFINITY; bin_count]; channels])
            }
            CaptureMode::Average => SnapshotData::Average {
                power: vec![vec![0.0; bin_count]; channels],
                alpha,
            },
        };
        Self {
            mode,
            data,
            frames: 0,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Frames merged since the snapshot was (re)seeded.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn channels(&self) -> usize {
        match &self.data {
            SnapshotData::Peak(db) => db.len(),
            SnapshotData::Average { power, .. } => power.len(),
        }
    }

    /// Per-bin dB values of one channel. Unseen bins read `-inf`.
    pub fn channel_db(&self, channel: usize) -> Option<Vec<f32>> {
        match &self.data {
            SnapshotData::Peak(db) => db.get(channel).cloned(),
            SnapshotData::Average { power, .. } => power
                .get(channel)
                .map(|p| p.iter().map(|&v| power_to_db(v)).collect()),
        }
    }

    fn merge(&mut self, live: &[&[f32]]) {
        match &mut self.data {
            SnapshotData::Peak(held) => {
                for (held, live) in held.iter_mut().zip(live) {
                    for (h, &v) in held.iter_mut().zip(live.iter()) {
                        if v > *h {
                            *h = v;
                        }
                    }
                }
            }
            SnapshotData::Average { power, alpha } => {
                let seed = self.frames == 0;
                for (avg, live) in power.iter_mut().zip(live) {
                    for (a, &v) in avg.iter_mut().zip(live.iter()) {
                        let p = if v.is_nan() { 0.0 } else { db_to_power(v) };
                        *a = if seed {
                            p
                        } else {
                            *alpha * p + (1.0 - *alpha) * *a
                        };
                    }
                }
            }
        }
        self.frames += 1;
    }

    fn reseed(&mut self, new_alpha: f32) {
        if let SnapshotData::Average { alpha, .. } = &mut self.data {
            *alpha = new_alpha;
        }
        self.frames = 0;
    }
}

/// Per-slot state. Snapshots exist only while capturing or displaying.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SlotState {
    #[default]
    Idle,
    Capturing(Snapshot),
    Displaying(Snapshot),
}

impl SlotState {
    pub fn phase(&self) -> SlotPhase {
        match self {
            SlotState::Idle => SlotPhase::Idle,
            SlotState::Capturing(_) => SlotPhase::Capturing,
            SlotState::Displaying(_) => SlotPhase::Displaying,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            SlotState::Idle => None,
            SlotState::Capturing(s) | SlotState::Displaying(s) => Some(s),
        }
    }
}

/// The hold slot plus [`FREEZE_SLOTS`] freeze slots for one session.
#[derive(Debug, Clone)]
pub struct CaptureBank {
    config: CaptureConfig,
    channels: usize,
    bin_count: usize,
    slots: [SlotState; SLOT_COUNT],
}

impl CaptureBank {
    pub fn new(config: CaptureConfig, channels: usize, bin_count: usize) -> Result<Self> {
        config.validate()?;
        if channels == 0 || channels > 2 {
            return Err(Error::InvalidInput(format!(
                "capture supports 1 or 2 channels, got {}",
                channels
            )));
        }
        Ok(Self {
            config,
            channels,
            bin_count,
            slots: std::array::from_fn(|_| SlotState::Idle),
        })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn slot(&self, slot: SlotId) -> Result<&SlotState> {
        Ok(&self.slots[slot.index()?])
    }

    pub fn phase(&self, slot: SlotId) -> Result<SlotPhase> {
        Ok(self.slot(slot)?.phase())
    }

    pub fn snapshot(&self, slot: SlotId) -> Result<Option<&Snapshot>> {
        Ok(self.slot(slot)?.snapshot())
    }

    /// Slots with a snapshot (capturing or displaying), in slot order.
    pub fn active(&self) -> impl Iterator<Item = (SlotId, SlotPhase, &Snapshot)> {
        self.slots.iter().enumerate().filter_map(|(i, state)| {
            state
                .snapshot()
                .map(|snap| (SlotId::from_index(i), state.phase(), snap))
        })
    }

    /// Slots whose snapshot is frozen for display.
    pub fn displaying(&self) -> impl Iterator<Item = (SlotId, &Snapshot)> {
        self.active()
            .filter(|(_, phase, _)| *phase == SlotPhase::Displaying)
            .map(|(id, _, snap)| (id, snap))
    }

    pub fn transition(&mut self, slot: SlotId, command: CaptureCommand) -> Result<CaptureTransition> {
        let index = slot.index()?;
        let state = &mut self.slots[index];

        let result = match command {
            CaptureCommand::Activate(mode) => {
                if !slot.accepts(mode) {
                    return Err(Error::InvalidInput(format!(
                        "{:?} slot does not support {:?} capture",
                        slot, mode
                    )));
                }
                let fresh = Snapshot::new(mode, self.channels, self.bin_count, self.config.alpha());
                match state {
                    SlotState::Idle => {
                        *state = SlotState::Capturing(fresh);
                        CaptureTransition::Started
                    }
                    SlotState::Capturing(snap) if snap.mode == mode => CaptureTransition::None,
                    SlotState::Capturing(_) | SlotState::Displaying(_) => {
                        *state = SlotState::Capturing(fresh);
                        CaptureTransition::Restarted
                    }
                }
            }

            CaptureCommand::Release => match core::mem::take(state) {
                SlotState::Capturing(snap) => {
                    *state = SlotState::Displaying(snap);
                    CaptureTransition::Released
                }
                other => {
                    *state = other;
                    CaptureTransition::None
                }
            },

            CaptureCommand::Clear => match state {
                SlotState::Idle => CaptureTransition::None,
                _ => {
                    *state = SlotState::Idle;
                    CaptureTransition::Cleared
                }
            },
        };

        if result != CaptureTransition::None {
            tracing::debug!("Capture {:?}: {:?} -> {:?}", slot, command, result);
        }
        Ok(result)
    }

    /// Merges one frame of per-bin dB values (one slice per channel) into
    /// every capturing slot.
    pub fn merge_frame(&mut self, live: &[&[f32]]) -> Result<()> {
        Error::check_lengths(self.channels, live.len())?;
        for channel in live {
            Error::check_lengths(self.bin_count, channel.len())?;
        }

        for state in &mut self.slots {
            if let SlotState::Capturing(snap) = state {
                snap.merge(live);
            }
        }
        Ok(())
    }

    /// Changes the averaging window. An average capture in progress is
    /// restarted so two time constants never mix.
    pub fn set_average_window(&mut self, secs: f32) -> Result<()> {
        let config = CaptureConfig {
            average_window_secs: secs,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;

        let alpha = self.config.alpha();
        if let SlotState::Capturing(snap) = &mut self.slots[0] {
            if snap.mode == CaptureMode::Average {
                tracing::debug!("Average window -> {} s, reseeding hold average", secs);
                snap.reseed(alpha);
            }
        }
        Ok(())
    }

    /// Starts every capturing slot over in its current mode. Displaying
    /// snapshots are kept. Returns the number of slots restarted.
    pub fn restart_capturing(&mut self) -> usize {
        let mut restarted = 0;
        for state in &mut self.slots {
            if let SlotState::Capturing(snap) = state {
                *snap = Snapshot::new(snap.mode, self.channels, self.bin_count, self.config.alpha());
                restarted += 1;
            }
        }
        restarted
    }

    /// Drops every snapshot.
    pub fn reset(&mut self) {
        for state in &mut self.slots {
            *state = SlotState::Idle;
        }
    }
}
