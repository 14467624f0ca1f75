use clap::Subcommand;
use qppe_core::{
    add_account, edit_account, AccountError, AccountSelection, AddOutcome, Database, FormatChecker,
    PreferenceStore, StoredValue,
};

/// Preference group remembering the main window state.
const WINDOW_GROUP: &str = "Main Window";
const CURRENT_ACCOUNT_KEY: &str = "current_account";

#[derive(Subcommand)]
pub enum AccountAction {
    /// List monitored accounts (current one marked with *)
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an account after validating its credentials
    Add {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Overwrite an existing account without asking
        #[arg(long)]
        yes: bool,
    },
    /// Change an account's password and/or email
    Edit {
        username: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Make an account current, by name or list position
    Select { account: String },
    /// Show the activity log
    Log {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn load_selection(db: &Database) -> Result<AccountSelection, Box<dyn std::error::Error>> {
    let mut selection = AccountSelection::from_accounts(&db.accounts()?);
    if let Some(StoredValue::Text(name)) = db.group(WINDOW_GROUP).get(CURRENT_ACCOUNT_KEY)? {
        // A stale name (account since replaced) keeps the default row.
        let _ = selection.select_name(&name);
    }
    Ok(selection)
}

pub fn run(action: AccountAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        AccountAction::List { json } => {
            let selection = load_selection(&db)?;
            if json {
                let out = serde_json::json!({
                    "accounts": selection.names(),
                    "current": selection.current(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if selection.names().is_empty() {
                println!("no accounts");
            } else {
                for (i, name) in selection.names().iter().enumerate() {
                    let marker = if selection.current_index() == Some(i) { "*" } else { " " };
                    println!("{marker} {i}: {name}");
                }
            }
        }
        AccountAction::Add {
            username,
            password,
            email,
            yes,
        } => {
            let outcome = add_account(&db, &FormatChecker, &username, &password, &email, |_| yes);
            match outcome {
                Ok(AddOutcome::Added) => println!("{username} added"),
                Ok(AddOutcome::Overwritten) => println!("{username} overwritten"),
                Ok(AddOutcome::Kept) => {
                    println!("{username} already exists; pass --yes to overwrite")
                }
                Err(e @ AccountError::InvalidCredentials { .. }) => {
                    return Err(format!("{e}; check the password and try again").into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        AccountAction::Edit {
            username,
            password,
            email,
        } => {
            let current = db
                .account(&username)?
                .ok_or_else(|| AccountError::Unknown(username.clone()))?;
            let password = password.unwrap_or(current.password);
            let email = email.unwrap_or(current.email);
            let outcome = edit_account(&db, &FormatChecker, &username, &password, &email)?;
            println!("{}", outcome.message);
        }
        AccountAction::Select { account } => {
            let mut selection = load_selection(&db)?;
            let name = match account.parse::<usize>() {
                Ok(index) => selection.select(index)?.to_string(),
                Err(_) => {
                    selection.select_name(&account)?;
                    account
                }
            };
            let mut group = db.group(WINDOW_GROUP);
            group.set(CURRENT_ACCOUNT_KEY, StoredValue::Text(name.clone()))?;
            group.sync()?;
            println!("selected {name}");
        }
        AccountAction::Log { limit } => {
            for entry in db.recent_log(limit)? {
                println!("{entry}");
            }
        }
    }
    Ok(())
}
