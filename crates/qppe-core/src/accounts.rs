//! Monitored accounts: add, edit and select.
//!
//! Credentials are validated by a [`CredentialChecker`]; the grade-checking
//! client implements it, and [`FormatChecker`] stands in when working offline.

use serde::{Deserialize, Serialize};

use crate::error::AccountError;
use crate::storage::Database;

/// A checkable account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Failure reported by a credential checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// Credentials were rejected; the user may try again.
    InvalidCredentials,
    /// Anything else (network, parsing, ...).
    Other(String),
}

/// Validates credentials and builds an account record.
pub trait CredentialChecker {
    fn check(&self, username: &str, password: &str, email: &str) -> Result<Account, CheckError>;
}

/// Offline checker that only rejects obviously unusable credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatChecker;

impl CredentialChecker for FormatChecker {
    fn check(&self, username: &str, password: &str, email: &str) -> Result<Account, CheckError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(CheckError::InvalidCredentials);
        }
        if !email.is_empty() && !email.contains('@') {
            return Err(CheckError::InvalidCredentials);
        }
        Ok(Account {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        })
    }
}

fn run_check<C: CredentialChecker + ?Sized>(
    checker: &C,
    username: &str,
    password: &str,
    email: &str,
) -> Result<Account, AccountError> {
    checker
        .check(username, password, email)
        .map_err(|e| match e {
            CheckError::InvalidCredentials => {
                tracing::warn!(username, "credentials rejected");
                AccountError::InvalidCredentials {
                    username: username.to_string(),
                }
            }
            CheckError::Other(message) => AccountError::CheckFailed {
                username: username.to_string(),
                message,
            },
        })
}

/// What `add_account` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Overwritten,
    /// The account existed and the overwrite was declined.
    Kept,
}

/// Validate and store a new account.
///
/// If the username is already stored, `confirm_overwrite` decides whether to
/// replace it.
///
/// # Errors
/// [`AccountError::InvalidCredentials`] when the checker rejects the
/// credentials (nothing is written), or a store error.
pub fn add_account<C, F>(
    db: &Database,
    checker: &C,
    username: &str,
    password: &str,
    email: &str,
    confirm_overwrite: F,
) -> Result<AddOutcome, AccountError>
where
    C: CredentialChecker + ?Sized,
    F: FnOnce(&str) -> bool,
{
    let account = run_check(checker, username, password, email)?;

    let exists = db.account(username)?.is_some();
    if exists && !confirm_overwrite(username) {
        return Ok(AddOutcome::Kept);
    }

    db.put_account(&account)?;
    db.append_log(&format!("{username} added to database."))?;
    tracing::info!(username, overwritten = exists, "account added");

    Ok(if exists {
        AddOutcome::Overwritten
    } else {
        AddOutcome::Added
    })
}

/// Result of an edit, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub changed: bool,
    pub message: String,
}

/// Apply password and email edits to a stored account.
///
/// A changed password is revalidated; an email-only change is stored
/// directly.
///
/// # Errors
/// [`AccountError::Unknown`] if the account is not stored,
/// [`AccountError::InvalidCredentials`] if a new password is rejected, or a
/// store error.
pub fn edit_account<C>(
    db: &Database,
    checker: &C,
    username: &str,
    password: &str,
    email: &str,
) -> Result<EditOutcome, AccountError>
where
    C: CredentialChecker + ?Sized,
{
    let current = db
        .account(username)?
        .ok_or_else(|| AccountError::Unknown(username.to_string()))?;
    let email_changed = email != current.email;

    let message = if password != current.password {
        let account = run_check(checker, username, password, email)?;
        db.put_account(&account)?;
        if email_changed {
            format!("{username}'s password and email changed.")
        } else {
            format!("{username}'s password changed.")
        }
    } else if email_changed {
        let account = Account {
            email: email.to_string(),
            ..current
        };
        db.put_account(&account)?;
        format!("{username}'s email changed")
    } else {
        return Ok(EditOutcome {
            changed: false,
            message: format!("No edits made on {username}"),
        });
    };

    db.append_log(&message)?;
    tracing::info!(username, "{message}");
    Ok(EditOutcome {
        changed: true,
        message,
    })
}

/// Ordered account names with a current row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSelection {
    names: Vec<String>,
    current: Option<usize>,
}

impl AccountSelection {
    /// Build a selection with the first account current, if any.
    pub fn new(names: Vec<String>) -> Self {
        let current = if names.is_empty() { None } else { Some(0) };
        Self { names, current }
    }

    pub fn from_accounts(accounts: &[Account]) -> Self {
        Self::new(accounts.iter().map(|a| a.username.clone()).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&str> {
        self.current.map(|i| self.names[i].as_str())
    }

    /// Make row `index` current.
    ///
    /// # Errors
    /// [`AccountError::OutOfBounds`] if there is no such row.
    pub fn select(&mut self, index: usize) -> Result<&str, AccountError> {
        if index >= self.names.len() {
            return Err(AccountError::OutOfBounds {
                index,
                len: self.names.len(),
            });
        }
        self.current = Some(index);
        Ok(&self.names[index])
    }

    /// Make the row named `username` current.
    ///
    /// # Errors
    /// [`AccountError::Unknown`] if no row has that name.
    pub fn select_name(&mut self, username: &str) -> Result<usize, AccountError> {
        let index = self
            .names
            .iter()
            .position(|n| n == username)
            .ok_or_else(|| AccountError::Unknown(username.to_string()))?;
        self.current = Some(index);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts a single known password.
    struct PortalStub {
        password: &'static str,
    }

    impl CredentialChecker for PortalStub {
        fn check(&self, username: &str, password: &str, email: &str) -> Result<Account, CheckError> {
            if password == "offline" {
                return Err(CheckError::Other("portal unreachable".into()));
            }
            if password != self.password {
                return Err(CheckError::InvalidCredentials);
            }
            Ok(Account {
                username: username.into(),
                password: password.into(),
                email: email.into(),
            })
        }
    }

    const STUB: PortalStub = PortalStub { password: "hunter2" };

    #[test]
    fn add_new_account_logs_activity() {
        let db = Database::open_memory().unwrap();
        let outcome = add_account(&db, &STUB, "alice", "hunter2", "a@x.org", |_| unreachable!()).unwrap();
        assert_eq!(outcome, AddOutcome::Added);
        assert_eq!(db.accounts().unwrap().len(), 1);
        assert_eq!(db.recent_log(1).unwrap()[0].message, "alice added to database.");
    }

    #[test]
    fn add_with_bad_password_is_retryable() {
        let db = Database::open_memory().unwrap();
        let err = add_account(&db, &STUB, "alice", "wrong", "", |_| true).unwrap_err();
        assert!(err.is_retryable());
        assert!(db.accounts().unwrap().is_empty());
        assert!(db.recent_log(1).unwrap().is_empty());
    }

    #[test]
    fn checker_failure_is_not_retryable() {
        let db = Database::open_memory().unwrap();
        let err = add_account(&db, &STUB, "alice", "offline", "", |_| true).unwrap_err();
        assert!(matches!(err, AccountError::CheckFailed { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn overwrite_requires_confirmation() {
        let db = Database::open_memory().unwrap();
        add_account(&db, &STUB, "alice", "hunter2", "old@x.org", |_| true).unwrap();

        let kept = add_account(&db, &STUB, "alice", "hunter2", "new@x.org", |_| false).unwrap();
        assert_eq!(kept, AddOutcome::Kept);
        assert_eq!(db.account("alice").unwrap().unwrap().email, "old@x.org");

        let mut asked = None;
        let replaced = add_account(&db, &STUB, "alice", "hunter2", "new@x.org", |name| {
            asked = Some(name.to_string());
            true
        })
        .unwrap();
        assert_eq!(replaced, AddOutcome::Overwritten);
        assert_eq!(asked.as_deref(), Some("alice"));
        assert_eq!(db.account("alice").unwrap().unwrap().email, "new@x.org");
    }

    #[test]
    fn edit_email_only() {
        let db = Database::open_memory().unwrap();
        add_account(&db, &STUB, "bob", "hunter2", "b@x.org", |_| true).unwrap();

        let outcome = edit_account(&db, &STUB, "bob", "hunter2", "bob@x.org").unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.message, "bob's email changed");
        assert_eq!(db.account("bob").unwrap().unwrap().email, "bob@x.org");
    }

    #[test]
    fn edit_password_revalidates() {
        let db = Database::open_memory().unwrap();
        db.put_account(&Account {
            username: "carol".into(),
            password: "old".into(),
            email: "c@x.org".into(),
        })
        .unwrap();

        let err = edit_account(&db, &STUB, "carol", "bad", "c@x.org").unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(db.account("carol").unwrap().unwrap().password, "old");

        let outcome = edit_account(&db, &STUB, "carol", "hunter2", "carol@x.org").unwrap();
        assert_eq!(outcome.message, "carol's password and email changed.");
        let stored = db.account("carol").unwrap().unwrap();
        assert_eq!(stored.password, "hunter2");
        assert_eq!(stored.email, "carol@x.org");
    }

    #[test]
    fn edit_without_changes_writes_nothing() {
        let db = Database::open_memory().unwrap();
        add_account(&db, &STUB, "dave", "hunter2", "", |_| true).unwrap();
        let outcome = edit_account(&db, &STUB, "dave", "hunter2", "").unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.message, "No edits made on dave");
        assert_eq!(db.recent_log(10).unwrap().len(), 1);
    }

    #[test]
    fn edit_unknown_account() {
        let db = Database::open_memory().unwrap();
        let err = edit_account(&db, &STUB, "nobody", "x", "").unwrap_err();
        assert!(matches!(err, AccountError::Unknown(_)));
    }

    #[test]
    fn format_checker_rules() {
        assert!(FormatChecker.check("alice", "pw", "a@x.org").is_ok());
        assert!(FormatChecker.check("alice", "pw", "").is_ok());
        assert_eq!(
            FormatChecker.check("", "pw", "").unwrap_err(),
            CheckError::InvalidCredentials
        );
        assert_eq!(
            FormatChecker.check("alice", "", "").unwrap_err(),
            CheckError::InvalidCredentials
        );
        assert_eq!(
            FormatChecker.check("alice", "pw", "not-an-email").unwrap_err(),
            CheckError::InvalidCredentials
        );
    }

    #[test]
    fn selection_moves_current_row() {
        let mut selection = AccountSelection::new(vec!["alice".into(), "bob".into()]);
        assert_eq!(selection.current(), Some("alice"));
        assert_eq!(selection.select(1).unwrap(), "bob");
        assert_eq!(selection.current_index(), Some(1));
        assert!(matches!(
            selection.select(2),
            Err(AccountError::OutOfBounds { index: 2, len: 2 })
        ));
        assert_eq!(selection.current(), Some("bob"));
        assert_eq!(selection.select_name("alice").unwrap(), 0);
        assert!(AccountSelection::default().current().is_none());
    }
}
