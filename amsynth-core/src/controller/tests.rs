use std::fs::{self, File};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use amsynth_types::{ParamId, PARAMETER_COUNT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use super::*;
use crate::bank::BankDirectory;

fn id(name: &str) -> ParamId {
    ParamId::from_name(name).unwrap()
}

fn bank_of(presets: Vec<Preset>) -> PresetBank {
    PresetBank::from_presets(presets).unwrap()
}

fn touch(path: &Path, secs_ahead: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(secs_ahead))
        .unwrap();
}

/// A user directory holding `default` (two presets) and a read-only
/// factory directory holding `factory.bank`.
struct Fixture {
    user: TempDir,
    factory: TempDir,
    registry: Arc<BankRegistry>,
}

impl Fixture {
    fn new() -> Self {
        let user = tempfile::tempdir().unwrap();
        let factory = tempfile::tempdir().unwrap();

        let lead = Preset::new("Lead");
        lead.parameter(id("osc_mix")).set_value(0.25);
        let pad = Preset::new("Pad");
        pad.parameter(id("osc_mix")).set_value(0.5);
        pad.parameter(id("reverb_wet")).set_value(0.75);
        codec::write_bank_file(&user.path().join("default"), &bank_of(vec![lead, pad])).unwrap();
        codec::write_bank_file(
            &factory.path().join("factory.bank"),
            &bank_of(vec![Preset::new("Factory Init")]),
        )
        .unwrap();

        let registry = Arc::new(BankRegistry::new(vec![
            BankDirectory::writable(user.path()),
            BankDirectory::read_only(factory.path()),
        ]));
        Self { user, factory, registry }
    }

    fn controller(&self) -> PresetController {
        PresetController::new(Arc::clone(&self.registry), ParameterLocks::new())
    }

    fn default_path(&self) -> PathBuf {
        self.user.path().join("default")
    }

    fn factory_path(&self) -> PathBuf {
        self.factory.path().join("factory.bank")
    }
}

#[derive(Default)]
struct NameLog(Mutex<Vec<String>>);

impl PresetListener for NameLog {
    fn on_preset_changed(&self, preset: &Preset) {
        self.0.lock().unwrap().push(preset.name().to_string());
    }
}

#[test]
fn starts_on_first_writable_bank() {
    let fx = Fixture::new();
    let controller = fx.controller();
    assert_eq!(controller.bank_path(), Some(fx.default_path().as_path()));
    assert_eq!(controller.current_bank_index(), Some(0));
    assert_eq!(controller.current_preset_index(), 0);
    assert_eq!(controller.current_preset().name(), "Lead");
    assert!(controller.contains_preset_named("Pad"));
    assert!(!controller.contains_preset_named("Factory Init"));
}

#[test]
fn starts_empty_without_banks() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(BankRegistry::new(vec![BankDirectory::writable(dir.path())]));
    let mut controller = PresetController::new(registry, ParameterLocks::new());

    assert!(controller.bank_path().is_none());
    assert!(controller.current_preset().is_unused());
    assert!(matches!(
        controller.save_current_preset(),
        Err(BankError::NoBankLoaded)
    ));
    assert!(matches!(
        controller.load_presets(None),
        Err(BankError::NoBankLoaded)
    ));
}

#[test]
fn select_preset_copies_slot_and_rejects_out_of_range() {
    let fx = Fixture::new();
    let mut controller = fx.controller();

    controller.select_preset(1).unwrap();
    assert_eq!(controller.current_preset().name(), "Pad");
    assert_eq!(controller.current_preset().parameter(id("reverb_wet")).value(), 0.75);

    let err = controller.select_preset(NUM_PRESETS).unwrap_err();
    assert!(matches!(err, BankError::PresetOutOfRange(n) if n == NUM_PRESETS));
    assert!(err.is_range_error());
    assert_eq!(controller.current_preset_index(), 1);
    assert_eq!(controller.current_preset().name(), "Pad");
}

#[test]
fn select_preset_resets_history() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let mix = id("osc_mix");

    for value in [0.1, 0.2, 0.3] {
        controller.begin_edit(mix);
        controller.set_parameter(mix, value);
        controller.end_edit(mix);
    }
    controller.randomise_with(&mut StdRng::seed_from_u64(7));
    controller.undo_change();
    assert!(controller.can_undo() && controller.can_redo());

    controller.select_preset(1).unwrap();
    assert!(!controller.can_undo());
    assert!(!controller.can_redo());
}

#[test]
fn undo_and_redo_are_symmetric() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let before = controller.current_preset().clone();

    let edits = [
        (id("osc_mix"), -0.5),
        (id("filter_resonance"), 0.5),
        (id("osc_mix"), 0.75),
        (id("lfo_freq"), 3.0),
    ];
    for (param, value) in edits {
        controller.begin_edit(param);
        controller.set_parameter(param, value);
        controller.end_edit(param);
    }
    let after = controller.current_preset().clone();
    assert_ne!(before, after);

    for _ in 0..edits.len() {
        assert!(controller.undo_change());
    }
    assert_eq!(*controller.current_preset(), before);
    assert!(!controller.undo_change());

    for _ in 0..edits.len() {
        assert!(controller.redo_change());
    }
    assert_eq!(*controller.current_preset(), after);
    assert!(!controller.redo_change());
}

#[test]
fn new_edit_discards_redo() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let mix = id("osc_mix");

    controller.begin_edit(mix);
    controller.set_parameter(mix, 0.9);
    controller.undo_change();
    assert!(controller.can_redo());

    controller.begin_edit(mix);
    assert!(!controller.can_redo());
}

#[test]
fn randomise_respects_locks_and_undoes_in_one_step() {
    let fx = Fixture::new();
    let locks = ParameterLocks::new();
    let locked = [id("master_vol"), id("osc_mix"), id("filter_cutoff")];
    for param in locked {
        locks.set_locked(param, true);
    }
    let mut controller = PresetController::new(Arc::clone(&fx.registry), locks);
    let before = controller.current_preset().clone();

    controller.randomise_with(&mut StdRng::seed_from_u64(42));
    let current = controller.current_preset();
    for param in locked {
        assert_eq!(current.parameter(param).value(), before.parameter(param).value());
    }
    let changed = ParamId::all()
        .filter(|p| current.parameter(*p).value() != before.parameter(*p).value())
        .count();
    assert!(changed > PARAMETER_COUNT / 2, "only {} parameters changed", changed);

    assert!(controller.undo_change());
    assert_eq!(*controller.current_preset(), before);
    assert!(!controller.can_undo());
}

#[test]
fn load_is_cached_until_the_file_changes() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let path = fx.default_path();

    // the catalogue's scan-time mtime is still current
    assert_eq!(controller.load_presets(Some(&path)).unwrap(), LoadOutcome::Cached);
    assert_eq!(controller.load_presets(None).unwrap(), LoadOutcome::Cached);

    touch(&path, 10);
    assert_eq!(controller.load_presets(None).unwrap(), LoadOutcome::Loaded);
    assert_eq!(controller.load_presets(None).unwrap(), LoadOutcome::Cached);
}

#[test]
fn cached_load_keeps_uncommitted_slot_edits() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    controller.rename_current_preset("Renamed");
    controller.commit_preset();

    assert_eq!(controller.load_presets(None).unwrap(), LoadOutcome::Cached);
    assert_eq!(controller.preset(0).unwrap().name(), "Renamed");

    touch(&fx.default_path(), 10);
    controller.load_presets(None).unwrap();
    assert_eq!(controller.preset(0).unwrap().name(), "Lead");
}

#[test]
fn malformed_file_leaves_state_untouched() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let bad = fx.user.path().join("broken");
    fs::write(&bad, "not a bank at all\n").unwrap();
    let presets = controller.presets().clone();

    let err = controller.load_presets(Some(&bad)).unwrap_err();
    assert!(matches!(
        err,
        BankError::Format { source: FormatError::MissingHeader, .. }
    ));
    assert_eq!(controller.bank_path(), Some(fx.default_path().as_path()));
    assert_eq!(controller.current_bank_index(), Some(0));
    assert_eq!(*controller.presets(), presets);
}

#[test]
fn loading_an_uncatalogued_file_clears_bank_index() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let elsewhere = tempfile::tempdir().unwrap();
    let path = elsewhere.path().join("loose.bank");
    codec::write_bank_file(&path, &bank_of(vec![Preset::new("Loose")])).unwrap();

    assert_eq!(controller.load_presets(Some(&path)).unwrap(), LoadOutcome::Loaded);
    assert_eq!(controller.current_bank_index(), None);
    assert_eq!(controller.preset(0).unwrap().name(), "Loose");
}

#[test]
fn save_current_preset_writes_slot() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    controller.select_preset(1).unwrap();
    controller.set_parameter(id("reverb_wet"), 0.25);
    controller.rename_current_preset("Pad 2");
    controller.save_current_preset().unwrap();

    let on_disk = codec::read_bank_file(&fx.default_path()).unwrap();
    assert_eq!(on_disk[0].name(), "Lead");
    assert_eq!(on_disk[1].name(), "Pad 2");
    assert_eq!(on_disk[1].parameter(id("reverb_wet")).value(), 0.25);

    // our own write does not count as an external change
    assert_eq!(controller.load_presets(None).unwrap(), LoadOutcome::Cached);
}

#[test]
fn factory_banks_are_read_only() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let factory = fx.registry.index_of(&fx.factory_path()).unwrap();

    controller.select_bank(factory).unwrap();
    controller.select_preset(0).unwrap();
    assert_eq!(controller.current_preset().name(), "Factory Init");
    assert!(matches!(
        controller.save_current_preset(),
        Err(BankError::ReadOnly(_))
    ));
    assert!(matches!(controller.clear_preset(), Err(BankError::ReadOnly(_))));

    // saving a copy into the user directory is fine
    let copy = fx.user.path().join("copy.bank");
    controller.save_presets_to(&copy).unwrap();
    assert_eq!(controller.bank_path(), Some(copy.as_path()));
    assert_eq!(codec::read_bank_file(&copy).unwrap()[0].name(), "Factory Init");
}

#[test]
fn select_bank_out_of_range() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    assert!(matches!(
        controller.select_bank(99),
        Err(BankError::BankOutOfRange(99))
    ));
    assert_eq!(controller.current_bank_index(), Some(0));
}

#[test]
fn clear_preset_blanks_the_slot() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    controller.begin_edit(id("osc_mix"));
    controller.set_parameter(id("osc_mix"), 0.9);

    controller.clear_preset().unwrap();
    assert!(controller.current_preset().is_unused());
    assert!(!controller.can_undo());

    let on_disk = codec::read_bank_file(&fx.default_path()).unwrap();
    // the cleared slot is not written, so "Pad" moves up
    assert_eq!(on_disk[0].name(), "Pad");
    assert!(on_disk[1].is_unused());
}

#[test]
fn import_prefixes_name_and_resets_history() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let source = Preset::new("Bells");
    source.parameter(id("lfo_freq")).set_value(5.0);

    controller.begin_edit(id("osc_mix"));
    controller.import_preset(&source.to_text()).unwrap();

    let current = controller.current_preset();
    assert_eq!(current.name(), "Imported: Bells");
    assert_eq!(current.parameter(id("lfo_freq")).value(), 5.0);
    // Lead's own value is gone
    assert_eq!(current.parameter(id("osc_mix")).value(), 0.0);
    assert!(!controller.can_undo());
}

#[test]
fn import_failure_changes_nothing() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    controller.begin_edit(id("osc_mix"));
    let before = controller.current_preset().clone();

    let err = controller.import_preset("<preset> <name> No header\n").unwrap_err();
    assert!(matches!(
        err,
        BankError::Format { path: None, source: FormatError::Preset(_) }
    ));
    assert_eq!(*controller.current_preset(), before);
    assert!(controller.can_undo());
}

#[test]
fn export_then_import_file() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    controller.select_preset(1).unwrap();
    let path = fx.user.path().join("pad.amSynthPreset");
    controller.export_preset(&path).unwrap();

    controller.select_preset(0).unwrap();
    controller.import_preset_file(&path).unwrap();
    assert_eq!(controller.current_preset().name(), "Imported: Pad");
    assert_eq!(controller.current_preset().parameter(id("reverb_wet")).value(), 0.75);

    let missing = fx.user.path().join("missing");
    assert!(matches!(
        controller.import_preset_file(&missing),
        Err(BankError::Io { .. })
    ));
}

#[test]
fn listeners_hear_wholesale_changes() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let log = Arc::new(NameLog::default());
    let subscription = controller.subscribe(log.clone());

    controller.select_preset(1).unwrap();
    controller.rename_current_preset("Pad!");
    drop(subscription);
    controller.select_preset(0).unwrap();

    assert_eq!(*log.0.lock().unwrap(), vec!["Pad".to_string(), "Pad!".to_string()]);
}

#[test]
fn value_handles_follow_preset_changes_across_threads() {
    let fx = Fixture::new();
    let mut controller = fx.controller();
    let handles = controller.current_preset().value_handles();
    let mix = handles[id("osc_mix").get()].clone();
    assert_eq!(mix.get(), 0.25);

    controller.select_preset(1).unwrap();
    let read = std::thread::spawn(move || mix.get()).join().unwrap();
    assert_eq!(read, 0.5);

    controller.randomise_with(&mut StdRng::seed_from_u64(1));
    controller.undo_change();
    assert_eq!(handles[id("reverb_wet").get()].get(), 0.75);
}
