//! Settings dialog session and change tracking.
//!
//! A [`SettingsSession`] is opened against the preference store, edited, and
//! either finalized (writing what changed and returning a [`ChangeMask`]) or
//! dropped without touching the store.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

use crate::duration::IntervalInput;
use crate::error::StoreError;
use crate::storage::{Defaults, PreferenceStore, StoredValue};

/// Store group holding the dialog preferences.
pub const SETTINGS_GROUP: &str = "Settings Dialog";

/// A preference tracked by the settings dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    Interval,
    Autotry,
    HandlePpe,
    SendEmails,
    ContinueRunning,
    ViewAccounts,
}

impl Preference {
    /// Every tracked preference, in the order edits are applied.
    pub const ALL: [Preference; 6] = [
        Preference::Interval,
        Preference::Autotry,
        Preference::HandlePpe,
        Preference::SendEmails,
        Preference::ContinueRunning,
        Preference::ViewAccounts,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Preference::Interval => "interval",
            Preference::Autotry => "autotry",
            Preference::HandlePpe => "handle_ppe",
            Preference::SendEmails => "send_emails",
            Preference::ContinueRunning => "continue_running",
            Preference::ViewAccounts => "view_accounts",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    pub fn flag(self) -> ChangeMask {
        match self {
            Preference::Interval => ChangeMask::INTERVAL,
            Preference::Autotry => ChangeMask::AUTOTRY,
            Preference::HandlePpe => ChangeMask::HANDLE,
            Preference::SendEmails => ChangeMask::EMAIL,
            Preference::ContinueRunning => ChangeMask::CONTINUE,
            Preference::ViewAccounts => ChangeMask::ACCOUNTS,
        }
    }

    pub fn is_interval(self) -> bool {
        matches!(self, Preference::Interval | Preference::Autotry)
    }

    fn default_value(self, defaults: &Defaults) -> StoredValue {
        match self {
            Preference::Interval => defaults.interval.into(),
            Preference::Autotry => defaults.autotry.into(),
            Preference::HandlePpe => defaults.handle_ppe.into(),
            Preference::SendEmails => defaults.send_emails.into(),
            Preference::ContinueRunning => defaults.continue_running.into(),
            Preference::ViewAccounts => defaults.view_accounts.into(),
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Bit set of preferences changed by one accepted session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChangeMask(u32);

impl ChangeMask {
    pub const NONE: ChangeMask = ChangeMask(0);
    pub const INTERVAL: ChangeMask = ChangeMask(0x01);
    pub const AUTOTRY: ChangeMask = ChangeMask(0x02);
    pub const HANDLE: ChangeMask = ChangeMask(0x04);
    pub const EMAIL: ChangeMask = ChangeMask(0x08);
    pub const CONTINUE: ChangeMask = ChangeMask(0x10);
    pub const ACCOUNTS: ChangeMask = ChangeMask(0x20);

    pub fn from_bits(bits: u32) -> Self {
        ChangeMask(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// All bits of `other` are set.
    pub fn contains(self, other: ChangeMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any bit of `other` is set.
    pub fn intersects(self, other: ChangeMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether the check timers need rescheduling.
    pub fn needs_reschedule(self) -> bool {
        self.intersects(ChangeMask::INTERVAL | ChangeMask::AUTOTRY)
    }

    /// Changed preferences in flag order.
    pub fn iter(self) -> impl Iterator<Item = Preference> {
        Preference::ALL
            .into_iter()
            .filter(move |p| self.contains(p.flag()))
    }
}

impl BitOr for ChangeMask {
    type Output = ChangeMask;

    fn bitor(self, rhs: ChangeMask) -> ChangeMask {
        ChangeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeMask {
    fn bitor_assign(&mut self, rhs: ChangeMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ChangeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(Preference::key).collect();
        f.write_str(&names.join(", "))
    }
}

/// Interpret a stored value as a boolean.
///
/// True unless absent, the exact string `"false"`, empty, integer zero or a
/// native false. Booleans round-trip through the store as strings, so this is
/// the only place that decides what they mean.
pub fn coerce_bool(value: Option<&StoredValue>) -> bool {
    match value {
        None => false,
        Some(StoredValue::Bool(b)) => *b,
        Some(StoredValue::Int(n)) => *n != 0,
        Some(StoredValue::Text(s)) => !s.is_empty() && s != "false",
    }
}

/// Interpret a stored value as a seconds count.
pub fn coerce_int(value: Option<&StoredValue>) -> Option<u64> {
    match value? {
        StoredValue::Int(n) => u64::try_from(*n).ok(),
        StoredValue::Text(s) => s.trim().parse().ok(),
        StoredValue::Bool(_) => None,
    }
}

/// Read `key`, writing `default` first if the store has no entry.
///
/// The write is pending until the store is synced.
pub fn read_or_default<S: PreferenceStore + ?Sized>(
    store: &mut S,
    key: &str,
    default: StoredValue,
) -> Result<StoredValue, StoreError> {
    if let Some(existing) = store.get(key)? {
        return Ok(existing);
    }
    tracing::debug!(key, default = %default, "establishing default preference");
    store.set(key, default.clone())?;
    Ok(default)
}

/// Current value of one preference inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SessionValue {
    Seconds(u64),
    Flag(bool),
}

impl From<SessionValue> for StoredValue {
    fn from(value: SessionValue) -> Self {
        match value {
            SessionValue::Seconds(secs) => secs.into(),
            SessionValue::Flag(b) => b.into(),
        }
    }
}

/// Editable state of one settings dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSession {
    interval: IntervalInput,
    autotry: IntervalInput,
    handle_ppe: bool,
    send_emails: bool,
    continue_running: bool,
    view_accounts: bool,
}

impl SettingsSession {
    /// Load every preference, establishing defaults for missing ones.
    ///
    /// The store is synced before returning and is not held by the session.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written.
    pub fn open<S: PreferenceStore + ?Sized>(
        store: &mut S,
        defaults: &Defaults,
    ) -> Result<Self, StoreError> {
        let mut load =
            |pref: Preference| read_or_default(&mut *store, pref.key(), pref.default_value(defaults));

        let interval = coerce_int(Some(&load(Preference::Interval)?)).unwrap_or(defaults.interval);
        let autotry = coerce_int(Some(&load(Preference::Autotry)?)).unwrap_or(defaults.autotry);
        let handle_ppe = coerce_bool(Some(&load(Preference::HandlePpe)?));
        let send_emails = coerce_bool(Some(&load(Preference::SendEmails)?));
        let continue_running = coerce_bool(Some(&load(Preference::ContinueRunning)?));
        let view_accounts = coerce_bool(Some(&load(Preference::ViewAccounts)?));

        store.sync()?;

        Ok(Self {
            interval: IntervalInput::new(interval),
            autotry: IntervalInput::new(autotry),
            handle_ppe,
            send_emails,
            continue_running,
            view_accounts,
        })
    }

    pub fn interval(&self) -> &IntervalInput {
        &self.interval
    }

    pub fn interval_mut(&mut self) -> &mut IntervalInput {
        &mut self.interval
    }

    pub fn autotry(&self) -> &IntervalInput {
        &self.autotry
    }

    pub fn autotry_mut(&mut self) -> &mut IntervalInput {
        &mut self.autotry
    }

    pub fn value(&self, pref: Preference) -> SessionValue {
        match pref {
            Preference::Interval => SessionValue::Seconds(self.interval.value()),
            Preference::Autotry => SessionValue::Seconds(self.autotry.value()),
            Preference::HandlePpe => SessionValue::Flag(self.handle_ppe),
            Preference::SendEmails => SessionValue::Flag(self.send_emails),
            Preference::ContinueRunning => SessionValue::Flag(self.continue_running),
            Preference::ViewAccounts => SessionValue::Flag(self.view_accounts),
        }
    }

    /// Whether the field for `pref` accepts edits.
    ///
    /// Email and keep-running options only apply while the app handles
    /// scheduling itself.
    pub fn is_editable(&self, pref: Preference) -> bool {
        match pref {
            Preference::SendEmails | Preference::ContinueRunning => self.handle_ppe,
            _ => true,
        }
    }

    /// Set a boolean preference. Returns false if the field is not editable
    /// or is an interval.
    pub fn set_flag(&mut self, pref: Preference, on: bool) -> bool {
        if !self.is_editable(pref) {
            return false;
        }
        let slot = match pref {
            Preference::HandlePpe => &mut self.handle_ppe,
            Preference::SendEmails => &mut self.send_emails,
            Preference::ContinueRunning => &mut self.continue_running,
            Preference::ViewAccounts => &mut self.view_accounts,
            Preference::Interval | Preference::Autotry => return false,
        };
        *slot = on;
        true
    }

    /// Write every changed preference and report which ones changed.
    ///
    /// Values are compared against what the store holds now, which is what
    /// [`SettingsSession::open`] read or established. Writes are synced
    /// before returning; an interruption part way through may leave some of
    /// them applied.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written.
    pub fn finalize<S: PreferenceStore + ?Sized>(self, store: &mut S) -> Result<ChangeMask, StoreError> {
        let mut changes = ChangeMask::NONE;

        for pref in Preference::ALL {
            let stored = store.get(pref.key())?;
            let current = self.value(pref);
            let changed = match current {
                SessionValue::Seconds(secs) => coerce_int(stored.as_ref()) != Some(secs),
                SessionValue::Flag(on) => coerce_bool(stored.as_ref()) != on,
            };
            if changed {
                tracing::debug!(preference = pref.key(), value = ?current, "preference changed");
                store.set(pref.key(), current.into())?;
                changes |= pref.flag();
            }
        }

        store.sync()?;
        tracing::info!(changes = %changes, bits = changes.bits(), "settings accepted");
        Ok(changes)
    }

    /// Discard the session without writing anything.
    pub fn cancel(self) {
        tracing::debug!("settings dialog cancelled");
    }
}
