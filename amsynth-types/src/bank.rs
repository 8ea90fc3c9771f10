use crate::preset::Preset;

/// Number of preset slots in a bank.
pub const NUM_PRESETS: usize = 128;

/// The fixed `NUM_PRESETS` slots of one bank.
///
/// Slots that hold nothing are default presets named `"unused"`.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetBank {
    slots: Box<[Preset]>,
}

impl PresetBank {
    pub fn new() -> Self {
        Self {
            slots: (0..NUM_PRESETS).map(|_| Preset::default()).collect(),
        }
    }

    /// Build a bank from up to `NUM_PRESETS` presets, padding the remaining
    /// slots with defaults. Returns `None` if there are too many.
    pub fn from_presets(presets: Vec<Preset>) -> Option<Self> {
        if presets.len() > NUM_PRESETS {
            return None;
        }
        let mut slots = presets;
        slots.resize_with(NUM_PRESETS, Preset::default);
        Some(Self {
            slots: slots.into_boxed_slice(),
        })
    }

    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Preset> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.slots.iter()
    }

    /// Slots that hold a real preset, with their indices.
    pub fn used(&self) -> impl Iterator<Item = (usize, &Preset)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, preset)| !preset.is_unused())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.slots.iter().any(|preset| preset.name() == name)
    }
}

impl Default for PresetBank {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for PresetBank {
    type Output = Preset;

    fn index(&self, index: usize) -> &Preset {
        &self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bank_is_all_unused() {
        let bank = PresetBank::new();
        assert_eq!(bank.iter().count(), NUM_PRESETS);
        assert_eq!(bank.used().count(), 0);
        assert!(bank.get(NUM_PRESETS).is_none());
    }

    #[test]
    fn from_presets_pads_and_limits() {
        let bank = PresetBank::from_presets(vec![Preset::new("a"), Preset::new("b")]).unwrap();
        assert_eq!(bank[0].name(), "a");
        assert_eq!(bank[1].name(), "b");
        assert!(bank[2].is_unused());
        assert_eq!(bank.iter().count(), NUM_PRESETS);
        assert!(bank.contains_name("b"));

        let too_many = (0..=NUM_PRESETS).map(|i| Preset::new(i.to_string())).collect();
        assert!(PresetBank::from_presets(too_many).is_none());
    }
}
