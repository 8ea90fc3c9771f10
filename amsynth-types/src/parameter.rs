use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rand::Rng;

use crate::observer::{ObserverList, Subscription};
use crate::param::{ParamId, ParamSpec};

/// Receives edit gestures and value changes for a parameter.
///
/// Implemented by the MIDI bridge, host automation adapters and UI controls.
pub trait ParameterObserver: Send + Sync {
    fn on_begin_edit(&self, _parameter: &Parameter) {}
    fn on_value_changed(&self, parameter: &Parameter);
    fn on_end_edit(&self, _parameter: &Parameter) {}
}

/// A single `f32` stored as bits in an atomic, readable without locking.
#[derive(Debug)]
struct AtomicValue(AtomicU32);

impl AtomicValue {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// Read-only view of a parameter's value for the render thread.
///
/// Reading never blocks or allocates. The handle stays valid for as long as
/// the owning parameter lives; whole-preset replacement writes new values
/// into the same storage rather than swapping it out.
#[derive(Debug, Clone)]
pub struct ValueHandle {
    id: ParamId,
    value: Arc<AtomicValue>,
}

impl ValueHandle {
    pub fn id(&self) -> ParamId {
        self.id
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load()
    }
}

/// A named, bounded, optionally stepped value with observer notification.
pub struct Parameter {
    id: ParamId,
    value: Arc<AtomicValue>,
    observers: ObserverList<dyn ParameterObserver>,
}

impl Parameter {
    /// A parameter at its factory default.
    pub fn new(id: ParamId) -> Self {
        Self {
            id,
            value: Arc::new(AtomicValue::new(id.spec().default)),
            observers: ObserverList::new(),
        }
    }

    pub fn id(&self) -> ParamId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn spec(&self) -> &'static ParamSpec {
        self.id.spec()
    }

    pub fn min(&self) -> f32 {
        self.spec().min
    }

    pub fn max(&self) -> f32 {
        self.spec().max
    }

    pub fn default_value(&self) -> f32 {
        self.spec().default
    }

    pub fn step_count(&self) -> u32 {
        self.spec().step_count()
    }

    pub fn is_boolean(&self) -> bool {
        self.spec().is_boolean()
    }

    pub fn value(&self) -> f32 {
        self.value.load()
    }

    pub fn normalised_value(&self) -> f32 {
        self.spec().normalise(self.value())
    }

    pub fn value_handle(&self) -> ValueHandle {
        ValueHandle {
            id: self.id,
            value: Arc::clone(&self.value),
        }
    }

    /// Set the value, clamped and snapped. Observers are notified only if the
    /// stored value actually changes.
    pub fn set_value(&self, value: f32) {
        self.store_and_notify(value, None);
    }

    /// Set the value without echoing the change back to `origin`.
    pub fn set_value_from(&self, value: f32, origin: &Subscription) {
        self.store_and_notify(value, Some(origin));
    }

    pub fn set_normalised_value(&self, normalised: f32) {
        self.set_value(self.spec().denormalise(normalised));
    }

    pub fn reset(&self) {
        self.set_value(self.default_value());
    }

    /// Pick a value uniformly from the parameter's range.
    pub fn randomise<R: Rng>(&self, rng: &mut R) {
        self.set_normalised_value(rng.gen::<f32>());
    }

    fn store_and_notify(&self, value: f32, origin: Option<&Subscription>) {
        if value.is_nan() {
            log::warn!(target: "parameter", "ignoring NaN for {}", self.name());
            return;
        }
        let value = self.spec().constrain(value);
        if value == self.value() {
            return;
        }
        self.value.store(value);
        self.observers
            .notify_except(origin, |observer| observer.on_value_changed(self));
    }

    pub fn begin_edit(&self) {
        self.observers.notify(|observer| observer.on_begin_edit(self));
    }

    pub fn end_edit(&self) {
        self.observers.notify(|observer| observer.on_end_edit(self));
    }

    #[must_use = "dropping the subscription unregisters the observer"]
    pub fn subscribe(&self, observer: Arc<dyn ParameterObserver>) -> Subscription {
        self.observers.subscribe(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

/// Copies the value only; the clone starts with no observers and its own storage.
impl Clone for Parameter {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::new(AtomicValue::new(self.value())),
            observers: ObserverList::new(),
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.value() == other.value()
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name())
            .field("value", &self.value())
            .finish()
    }
}
