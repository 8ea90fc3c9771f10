use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use amsynth_core::config::Config;
use amsynth_core::{paths, BankError, BankRegistry, PresetController};
use amsynth_types::{ParamId, PARAMETER_SPECS};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

pub const USAGE: &str = "\
usage: amsynth-banks [--verbose] [--json] [--seed N] <command>

commands:
  banks                         list banks in scan order
  presets <bank>                list the used slots of a bank
  show <bank> <slot>            print a preset in export form
  create <name>                 create an empty bank in the user directory
  export <bank> <slot> <file>   write a preset to a file
  import <bank> <slot> <file>   read a preset file into a slot and save
  randomise <bank> <slot>       randomise unlocked parameters and save
  clear <bank> <slot>           reset a slot and save
  rename <bank> <slot> <name>   rename a preset and save
  params                        list parameters with their ranges
  locks                         list locked parameters
  lock <param>...               exempt parameters from randomisation
  unlock <param>...";

#[derive(Debug)]
pub enum CliError {
    Usage(String),
    Bank(BankError),
    Config(io::Error),
    Output(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{}", msg),
            Self::Bank(e) => write!(f, "{}", e),
            Self::Config(e) => write!(f, "could not save config: {}", e),
            Self::Output(e) => write!(f, "{}", e),
            Self::Json(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<BankError> for CliError {
    fn from(e: BankError) -> Self {
        Self::Bank(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::Output(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

fn usage(msg: impl Into<String>) -> CliError {
    CliError::Usage(msg.into())
}

/// A slot within a catalogued bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub bank: usize,
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Banks,
    Presets { bank: usize },
    Show(Location),
    Create { name: String },
    Export(Location, PathBuf),
    Import(Location, PathBuf),
    Randomise(Location),
    Clear(Location),
    Rename(Location, String),
    Params,
    Locks,
    Lock(Vec<String>),
    Unlock(Vec<String>),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, CliError> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        let command = match (name.as_str(), rest) {
            ("help", []) => Command::Help,
            ("banks", []) => Command::Banks,
            ("presets", [bank]) => Command::Presets {
                bank: parse_index("bank", bank)?,
            },
            ("show", [bank, slot]) => Command::Show(location(bank, slot)?),
            ("create", [name]) => Command::Create { name: name.clone() },
            ("export", [bank, slot, file]) => {
                Command::Export(location(bank, slot)?, PathBuf::from(file))
            }
            ("import", [bank, slot, file]) => {
                Command::Import(location(bank, slot)?, PathBuf::from(file))
            }
            ("randomise" | "randomize", [bank, slot]) => Command::Randomise(location(bank, slot)?),
            ("clear", [bank, slot]) => Command::Clear(location(bank, slot)?),
            ("rename", [bank, slot, name]) => Command::Rename(location(bank, slot)?, name.clone()),
            ("params", []) => Command::Params,
            ("locks", []) => Command::Locks,
            ("lock", names) if !names.is_empty() => Command::Lock(names.to_vec()),
            ("unlock", names) if !names.is_empty() => Command::Unlock(names.to_vec()),
            _ => return Err(usage(format!("unrecognised command: {}", args.join(" ")))),
        };
        Ok(command)
    }
}

fn parse_index(what: &str, arg: &str) -> Result<usize, CliError> {
    arg.parse()
        .map_err(|_| usage(format!("{} must be a number, got {:?}", what, arg)))
}

fn location(bank: &str, slot: &str) -> Result<Location, CliError> {
    Ok(Location {
        bank: parse_index("bank", bank)?,
        slot: parse_index("slot", slot)?,
    })
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub verbose: bool,
    pub json: bool,
    pub seed: Option<u64>,
    pub command: Command,
}

impl Invocation {
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut verbose = false;
        let mut json = false;
        let mut seed = None;
        let mut positional = Vec::new();

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--verbose" | "-v" => verbose = true,
                "--json" => json = true,
                "--seed" => {
                    let value = iter.next().ok_or_else(|| usage("--seed needs a value"))?;
                    seed = Some(
                        value
                            .parse()
                            .map_err(|_| usage(format!("bad seed {:?}", value)))?,
                    );
                }
                flag if flag.starts_with("--") => {
                    return Err(usage(format!("unknown option {}", flag)))
                }
                _ => positional.push(arg.clone()),
            }
        }

        Ok(Self {
            verbose,
            json,
            seed,
            command: Command::parse(&positional)?,
        })
    }

    pub fn run(&self, context: &mut Context, out: &mut impl Write) -> Result<(), CliError> {
        match &self.command {
            Command::Help => writeln!(out, "{}", USAGE)?,
            Command::Banks => self.list_banks(context, out)?,
            Command::Presets { bank } => self.list_presets(context, *bank, out)?,
            Command::Show(at) => {
                let controller = context.controller_at(*at)?;
                write!(out, "{}", controller.current_preset().to_text())?;
            }
            Command::Create { name } => {
                let dir = paths::user_banks_dir(&context.config);
                std::fs::create_dir_all(&dir).map_err(|e| BankError::Io {
                    path: dir.clone(),
                    source: e,
                })?;
                let path = context.registry.create_bank(name)?;
                context.registry.rescan();
                writeln!(out, "{}", path.display())?;
            }
            Command::Export(at, file) => {
                context.controller_at(*at)?.export_preset(file)?;
            }
            Command::Import(at, file) => {
                let mut controller = context.controller_at(*at)?;
                controller.import_preset_file(file)?;
                controller.save_current_preset()?;
                writeln!(out, "{}: {}", at.slot, controller.current_preset().name())?;
            }
            Command::Randomise(at) => {
                let mut controller = context.controller_at(*at)?;
                match self.seed {
                    Some(seed) => controller.randomise_with(&mut StdRng::seed_from_u64(seed)),
                    None => controller.randomise_current_preset(),
                }
                controller.save_current_preset()?;
            }
            Command::Clear(at) => {
                context.controller_at(*at)?.clear_preset()?;
            }
            Command::Rename(at, name) => {
                let mut controller = context.controller_at(*at)?;
                controller.rename_current_preset(name.as_str());
                controller.save_current_preset()?;
            }
            Command::Params => self.list_params(out)?,
            Command::Locks => {
                for id in context.config.parameter_locks().locked() {
                    writeln!(out, "{}", id.name())?;
                }
            }
            Command::Lock(names) => context.set_locks(names, true)?,
            Command::Unlock(names) => context.set_locks(names, false)?,
        }
        Ok(())
    }

    fn list_banks(&self, context: &Context, out: &mut impl Write) -> Result<(), CliError> {
        let banks = context.registry.banks();
        if self.json {
            serde_json::to_writer_pretty(&mut *out, &*banks)?;
            writeln!(out)?;
            return Ok(());
        }
        for (index, bank) in banks.iter().enumerate() {
            let flag = if bank.read_only { " (read-only)" } else { "" };
            writeln!(
                out,
                "{:>3}  {}{}  {}",
                index,
                bank.name,
                flag,
                bank.file_path.display()
            )?;
        }
        Ok(())
    }

    fn list_presets(
        &self,
        context: &Context,
        bank: usize,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        #[derive(Serialize)]
        struct Row<'a> {
            slot: usize,
            name: &'a str,
        }

        let info = context
            .registry
            .get(bank)
            .ok_or(BankError::BankOutOfRange(bank))?;
        let rows: Vec<Row> = info
            .presets
            .used()
            .map(|(slot, preset)| Row { slot, name: preset.name() })
            .collect();
        if self.json {
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            writeln!(out)?;
        } else {
            for row in rows {
                writeln!(out, "{:>3}  {}", row.slot, row.name)?;
            }
        }
        Ok(())
    }

    fn list_params(&self, out: &mut impl Write) -> Result<(), CliError> {
        if self.json {
            serde_json::to_writer_pretty(&mut *out, &PARAMETER_SPECS[..])?;
            writeln!(out)?;
            return Ok(());
        }
        for (index, spec) in PARAMETER_SPECS.iter().enumerate() {
            let kind = match spec.step_count() {
                0 => "continuous".to_string(),
                n => format!("{} steps", n),
            };
            writeln!(
                out,
                "{:>2}  {:<24} {:>8} .. {:<8} default {:<8} {}",
                index, spec.name, spec.min, spec.max, spec.default, kind
            )?;
        }
        Ok(())
    }
}

/// Configuration and the bank catalogue it points at.
pub struct Context {
    config: Config,
    registry: Arc<BankRegistry>,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(BankRegistry::with_label(
            paths::bank_directories(&config),
            config.user_bank_label(),
        ));
        Self { config, registry }
    }

    fn controller_at(&self, at: Location) -> Result<PresetController, CliError> {
        let mut controller =
            PresetController::new(Arc::clone(&self.registry), self.config.parameter_locks());
        controller.select_bank(at.bank)?;
        controller.select_preset(at.slot)?;
        Ok(controller)
    }

    fn set_locks(&mut self, names: &[String], locked: bool) -> Result<(), CliError> {
        let locks = self.config.parameter_locks();
        for name in names {
            let id = ParamId::from_name(name)
                .ok_or_else(|| usage(format!("unknown parameter {:?}", name)))?;
            locks.set_locked(id, locked);
        }
        self.config.store_locks(&locks);
        self.config.save().map_err(CliError::Config)
    }
}
