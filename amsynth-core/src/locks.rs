//! Parameters exempt from randomisation.
//!
//! Lock state is not part of a preset or a bank and is not undoable. It is
//! persisted as a name list in the user configuration.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use amsynth_types::ParamId;

/// Shared set of locked parameter ids. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct ParameterLocks {
    locked: Arc<RwLock<BTreeSet<ParamId>>>,
}

impl ParameterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a stored name list.
    pub fn from_names(names: &str) -> Self {
        let locks = Self::new();
        locks.set_names(names);
        locks
    }

    pub fn is_locked(&self, id: ParamId) -> bool {
        self.locked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    pub fn set_locked(&self, id: ParamId, locked: bool) {
        let mut set = self.locked.write().unwrap_or_else(PoisonError::into_inner);
        if locked {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    pub fn locked(&self) -> Vec<ParamId> {
        self.locked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    /// Space-separated parameter names in id order.
    pub fn names(&self) -> String {
        self.locked()
            .into_iter()
            .map(ParamId::name)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace the set from a comma- and/or whitespace-separated name list.
    /// Unknown names are ignored.
    pub fn set_names(&self, names: &str) {
        let parsed: BTreeSet<ParamId> = names
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|name| !name.is_empty())
            .filter_map(|name| {
                let id = ParamId::from_name(name);
                if id.is_none() {
                    log::warn!(target: "locks", "ignoring unknown parameter {:?}", name);
                }
                id
            })
            .collect();
        *self.locked.write().unwrap_or_else(PoisonError::into_inner) = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ParamId {
        ParamId::from_name(name).unwrap()
    }

    #[test]
    fn lock_and_unlock() {
        let locks = ParameterLocks::new();
        assert!(!locks.is_locked(id("master_vol")));
        locks.set_locked(id("master_vol"), true);
        assert!(locks.is_locked(id("master_vol")));
        locks.set_locked(id("master_vol"), false);
        assert!(!locks.is_locked(id("master_vol")));
    }

    #[test]
    fn clones_share_state() {
        let locks = ParameterLocks::new();
        let other = locks.clone();
        other.set_locked(id("osc_mix"), true);
        assert!(locks.is_locked(id("osc_mix")));
    }

    #[test]
    fn names_are_in_id_order() {
        let locks = ParameterLocks::new();
        locks.set_locked(id("master_vol"), true);
        locks.set_locked(id("amp_attack"), true);
        assert_eq!(locks.names(), "amp_attack master_vol");
    }

    #[test]
    fn set_names_accepts_commas_and_spaces() {
        let locks = ParameterLocks::from_names("master_vol, osc_mix  bogus,,filter_cutoff");
        assert_eq!(
            locks.locked(),
            vec![id("filter_cutoff"), id("master_vol"), id("osc_mix")]
        );

        locks.set_names("");
        assert!(locks.locked().is_empty());
    }

    #[test]
    fn names_round_trip() {
        let locks = ParameterLocks::from_names("reverb_wet lfo_freq");
        let restored = ParameterLocks::from_names(&locks.names());
        assert_eq!(restored.locked(), locks.locked());
    }
}
