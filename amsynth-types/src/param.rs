use serde::{Deserialize, Serialize};

/// Number of parameters every preset carries, in fixed id order.
pub const PARAMETER_COUNT: usize = 41;

/// Stable index of a parameter within a preset (`0..PARAMETER_COUNT`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "usize", into = "usize")]
pub struct ParamId(usize);

impl ParamId {
    /// Look up a parameter by its file-format name.
    pub fn from_name(name: &str) -> Option<Self> {
        PARAMETER_SPECS
            .iter()
            .position(|spec| spec.name == name)
            .map(ParamId)
    }

    /// All parameter ids in order.
    pub fn all() -> impl Iterator<Item = ParamId> {
        (0..PARAMETER_COUNT).map(ParamId)
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn spec(self) -> &'static ParamSpec {
        &PARAMETER_SPECS[self.0]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl std::fmt::Display for ParamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for ParamId {
    type Error = ParamOutOfRange;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        if index < PARAMETER_COUNT {
            Ok(ParamId(index))
        } else {
            Err(ParamOutOfRange(index))
        }
    }
}

impl From<ParamId> for usize {
    fn from(id: ParamId) -> usize {
        id.0
    }
}

/// A parameter index outside `0..PARAMETER_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamOutOfRange(pub usize);

impl std::fmt::Display for ParamOutOfRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parameter index {} out of range (0..{})",
            self.0, PARAMETER_COUNT
        )
    }
}

impl std::error::Error for ParamOutOfRange {}

/// Static description of one parameter: name, bounds, step and factory default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    /// Grid spacing for discrete parameters; 0 means continuous.
    pub step: f32,
    pub default: f32,
}

impl ParamSpec {
    const fn continuous(name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self { name, min, max, step: 0.0, default }
    }

    const fn stepped(name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self { name, min, max, step: 1.0, default }
    }

    /// Clamp to bounds and snap to the step grid.
    pub fn constrain(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            let snapped = self.min + ((clamped - self.min) / self.step).round() * self.step;
            snapped.min(self.max)
        } else {
            clamped
        }
    }

    /// Number of discrete positions, or 0 for a continuous parameter.
    pub fn step_count(&self) -> u32 {
        if self.step > 0.0 {
            ((self.max - self.min) / self.step).round() as u32 + 1
        } else {
            0
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.step <= 0.0
    }

    pub fn is_boolean(&self) -> bool {
        self.step_count() == 2
    }

    /// Map a value in `[0, 1]` linearly onto the parameter range.
    pub fn denormalise(&self, normalised: f32) -> f32 {
        self.min + normalised.clamp(0.0, 1.0) * (self.max - self.min)
    }

    pub fn normalise(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range <= 0.0 {
            0.0
        } else {
            (value - self.min) / range
        }
    }
}

pub static PARAMETER_SPECS: [ParamSpec; PARAMETER_COUNT] = [
    ParamSpec::continuous("amp_attack", 0.0, 2.5, 0.0),
    ParamSpec::continuous("amp_decay", 0.0, 2.5, 0.0),
    ParamSpec::continuous("amp_sustain", 0.0, 1.0, 1.0),
    ParamSpec::continuous("amp_release", 0.0, 2.5, 0.0),
    ParamSpec::stepped("osc1_waveform", 0.0, 4.0, 2.0),
    ParamSpec::continuous("filter_attack", 0.0, 2.5, 0.0),
    ParamSpec::continuous("filter_decay", 0.0, 2.5, 0.0),
    ParamSpec::continuous("filter_sustain", 0.0, 1.0, 1.0),
    ParamSpec::continuous("filter_release", 0.0, 2.5, 0.0),
    ParamSpec::continuous("filter_resonance", 0.0, 0.97, 0.0),
    ParamSpec::continuous("filter_env_amount", -16.0, 16.0, 0.0),
    ParamSpec::continuous("filter_cutoff", -0.5, 1.5, 1.5),
    ParamSpec::continuous("osc2_detune", -1.0, 1.0, 0.0),
    ParamSpec::stepped("osc2_waveform", 0.0, 4.0, 2.0),
    ParamSpec::continuous("master_vol", 0.0, 1.0, 0.67),
    ParamSpec::continuous("lfo_freq", 0.0, 7.5, 0.0),
    ParamSpec::stepped("lfo_waveform", 0.0, 6.0, 0.0),
    ParamSpec::stepped("osc2_range", -3.0, 4.0, 0.0),
    ParamSpec::continuous("osc_mix", -1.0, 1.0, 0.0),
    ParamSpec::continuous("freq_mod_amount", 0.0, 1.259_921, 0.0),
    ParamSpec::continuous("filter_mod_amount", -1.0, 1.0, -1.0),
    ParamSpec::continuous("amp_mod_amount", -1.0, 1.0, -1.0),
    ParamSpec::stepped("osc_mix_mode", 0.0, 1.0, 0.0),
    ParamSpec::continuous("osc1_pulsewidth", 0.0, 1.0, 1.0),
    ParamSpec::continuous("osc2_pulsewidth", 0.0, 1.0, 1.0),
    ParamSpec::continuous("reverb_roomsize", 0.0, 1.0, 0.0),
    ParamSpec::continuous("reverb_damp", 0.0, 1.0, 0.0),
    ParamSpec::continuous("reverb_wet", 0.0, 1.0, 0.0),
    ParamSpec::continuous("reverb_width", 0.0, 1.0, 1.0),
    ParamSpec::continuous("distortion_crunch", 0.0, 0.9, 0.0),
    ParamSpec::stepped("osc2_sync", 0.0, 1.0, 0.0),
    ParamSpec::continuous("portamento_time", 0.0, 1.0, 0.0),
    ParamSpec::stepped("keyboard_mode", 0.0, 2.0, 0.0),
    ParamSpec::stepped("osc2_pitch", -12.0, 12.0, 0.0),
    ParamSpec::stepped("filter_type", 0.0, 4.0, 0.0),
    ParamSpec::stepped("filter_slope", 0.0, 1.0, 1.0),
    ParamSpec::stepped("freq_mod_osc", 0.0, 2.0, 0.0),
    ParamSpec::continuous("filter_kbd_track", 0.0, 1.0, 1.0),
    ParamSpec::continuous("filter_vel_sens", 0.0, 1.0, 1.0),
    ParamSpec::continuous("amp_vel_sens", 0.0, 1.0, 1.0),
    ParamSpec::stepped("portamento_mode", 0.0, 1.0, 0.0),
];
