//! # amsynth-types
//!
//! Data types shared by the preset layer and its consumers: the static
//! parameter table, lock-free [`Parameter`] values with scoped observers,
//! [`Preset`] and the fixed-size [`PresetBank`].
//!
//! The render thread only ever touches [`ValueHandle`]s; everything else is
//! control-thread state.

mod bank;
pub mod observer;
mod param;
mod parameter;
mod preset;
pub mod text;

pub use bank::{PresetBank, NUM_PRESETS};
pub use observer::{ObserverList, Subscription};
pub use param::{ParamId, ParamOutOfRange, ParamSpec, PARAMETER_COUNT, PARAMETER_SPECS};
pub use parameter::{Parameter, ParameterObserver, ValueHandle};
pub use preset::{Preset, PresetSubscription, PresetTextError, UNUSED_PRESET_NAME};
