//! # qPPE Core Library
//!
//! Non-visual core of the qPPE grade-notification dialogs. The desktop front
//! end and the CLI are thin layers over the same operations.
//!
//! ## Architecture
//!
//! - **Duration codec**: `"1d 2h 3m 4s"` text to seconds and back, plus the
//!   live input filter used by interval fields
//! - **Settings**: dialog sessions that establish defaults, track edits and
//!   report a change bitmask on accept
//! - **Storage**: SQLite preference groups, account table and activity log,
//!   and TOML-based configuration
//! - **Accounts**: add/edit/select monitored accounts through a credential
//!   checker
//!
//! ## Key Components
//!
//! - [`IntervalInput`]: bounded seconds input
//! - [`SettingsSession`]: one settings dialog, finalized into a [`ChangeMask`]
//! - [`Database`]: preference, account and log persistence
//! - [`Config`]: application configuration management
//! - [`CredentialChecker`]: seam to the grade-checking client

pub mod accounts;
pub mod duration;
pub mod error;
pub mod settings;
pub mod storage;

pub use accounts::{
    add_account, edit_account, Account, AccountSelection, AddOutcome, CheckError,
    CredentialChecker, EditOutcome, FormatChecker,
};
pub use duration::{decode, encode, validate_partial, IntervalInput, Validation, MAX_INTERVAL_SECS};
pub use error::{AccountError, ConfigError, CoreError, StoreError};
pub use settings::{
    coerce_bool, coerce_int, read_or_default, ChangeMask, Preference, SessionValue,
    SettingsSession, SETTINGS_GROUP,
};
pub use storage::{Config, Database, MemoryStore, PreferenceStore, StoredValue};
