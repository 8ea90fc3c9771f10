//! Bank files: the on-disk format and the catalogue of banks found on disk.

pub mod codec;
pub mod registry;

pub use registry::{
    create_empty_bank, display_name, scan, BankDirectory, BankInfo, BankRegistry, BANK_EXTENSION,
    DEFAULT_USER_BANK_LABEL,
};
