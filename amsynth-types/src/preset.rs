use std::sync::Arc;

use rand::Rng;

use crate::observer::Subscription;
use crate::param::{ParamId, PARAMETER_COUNT};
use crate::parameter::{Parameter, ParameterObserver, ValueHandle};
use crate::text::{self, Line};

/// Name carried by bank slots that hold no preset.
pub const UNUSED_PRESET_NAME: &str = "unused";

/// A named set of all `PARAMETER_COUNT` parameters in id order.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    name: String,
    parameters: Vec<Parameter>,
}

impl Preset {
    /// A preset with every parameter at its factory default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: ParamId::all().map(Parameter::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_unused(&self) -> bool {
        self.name == UNUSED_PRESET_NAME
    }

    pub fn parameter(&self, id: ParamId) -> &Parameter {
        &self.parameters[id.get()]
    }

    pub fn parameter_named(&self, name: &str) -> Option<&Parameter> {
        ParamId::from_name(name).map(|id| self.parameter(id))
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn values(&self) -> [f32; PARAMETER_COUNT] {
        std::array::from_fn(|i| self.parameters[i].value())
    }

    /// Lock-free readers for every parameter, in id order.
    pub fn value_handles(&self) -> Vec<ValueHandle> {
        self.parameters.iter().map(Parameter::value_handle).collect()
    }

    /// Compare parameter values only, ignoring the name.
    pub fn values_equal(&self, other: &Preset) -> bool {
        self.parameters == other.parameters
    }

    /// Copy name and values from `other` into this preset's existing
    /// parameters. Observers stay attached and hear about every value that
    /// changes; outstanding value handles keep reading the same storage.
    pub fn assign_from(&mut self, other: &Preset) {
        self.name.clone_from(&other.name);
        for (ours, theirs) in self.parameters.iter().zip(&other.parameters) {
            ours.set_value(theirs.value());
        }
    }

    /// Randomise every parameter for which `is_locked` returns false.
    pub fn randomise<R: Rng>(&self, rng: &mut R, is_locked: impl Fn(ParamId) -> bool) {
        for parameter in &self.parameters {
            if !is_locked(parameter.id()) {
                parameter.randomise(rng);
            }
        }
    }

    /// Subscribe `observer` to every parameter. With `notify_now`, the
    /// observer immediately receives the current value of each one.
    #[must_use = "dropping the subscription unregisters the observer"]
    pub fn subscribe(
        &self,
        observer: Arc<dyn ParameterObserver>,
        notify_now: bool,
    ) -> PresetSubscription {
        let subscriptions = self
            .parameters
            .iter()
            .map(|parameter| {
                let subscription = parameter.subscribe(Arc::clone(&observer));
                if notify_now {
                    observer.on_value_changed(parameter);
                }
                subscription
            })
            .collect();
        PresetSubscription { subscriptions }
    }

    /// Apply one `<parameter>` line's tokens. Unknown names and unparseable
    /// values are ignored; returns whether a value was applied.
    pub fn apply_parameter(&self, name: &str, value: &str) -> bool {
        let Some(parameter) = self.parameter_named(name) else {
            log::debug!(target: "preset", "ignoring unknown parameter {:?}", name);
            return false;
        };
        match text::parse_value(value) {
            Some(v) => {
                parameter.set_value(v);
                true
            }
            None => {
                log::warn!(target: "preset", "ignoring bad value {:?} for {}", value, name);
                false
            }
        }
    }

    /// Export form: a header line followed by the preset's lines.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(text::PRESET_HEADER);
        out.push('\n');
        text::write_preset(&mut out, self);
        out
    }

    /// Parse the export form. Parameters the text does not mention keep
    /// their factory defaults.
    pub fn from_text(input: &str) -> Result<Preset, PresetTextError> {
        let mut lines = input.lines();
        match lines.next() {
            Some(first) if first.trim() == text::PRESET_HEADER => {}
            _ => return Err(PresetTextError::MissingHeader),
        }
        let mut preset = Preset::new(String::new());
        let mut seen_preset = false;
        for line in lines {
            match text::parse_line(line.as_bytes()) {
                Line::Preset(name) => {
                    if seen_preset {
                        break;
                    }
                    preset.set_name(name);
                    seen_preset = true;
                }
                Line::Parameter { name, value } => {
                    preset.apply_parameter(name, value);
                }
                Line::Other => {}
            }
        }
        if seen_preset {
            Ok(preset)
        } else {
            Err(PresetTextError::MissingName)
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset::new(UNUSED_PRESET_NAME)
    }
}

/// Per-parameter subscriptions for one observer; dropping it unsubscribes
/// from all of them.
#[derive(Debug)]
pub struct PresetSubscription {
    subscriptions: Vec<Subscription>,
}

impl PresetSubscription {
    pub fn for_parameter(&self, id: ParamId) -> &Subscription {
        &self.subscriptions[id.get()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetTextError {
    MissingHeader,
    MissingName,
}

impl std::fmt::Display for PresetTextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "missing {} header", text::PRESET_HEADER),
            Self::MissingName => write!(f, "no <preset> line found"),
        }
    }
}

impl std::error::Error for PresetTextError {}
