use clap::Subcommand;
use qppe_core::{
    encode, validate_partial, Config, Database, IntervalInput, MemoryStore, Preference, SessionValue,
    SettingsSession, Validation, SETTINGS_GROUP,
};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the current settings (missing ones are initialised)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit settings and report which ones changed
    Edit {
        /// Check interval (e.g. "15m", "1h 30m")
        #[arg(long)]
        interval: Option<String>,
        /// Autotry interval
        #[arg(long)]
        autotry: Option<String>,
        /// Automatically handle scheduling checks
        #[arg(long)]
        handle_ppe: Option<bool>,
        /// Send email notifications (requires handle-ppe)
        #[arg(long)]
        send_emails: Option<bool>,
        /// Keep checking after close (requires handle-ppe)
        #[arg(long)]
        continue_running: Option<bool>,
        /// Show account choices on the main window
        #[arg(long)]
        view_accounts: Option<bool>,
        /// Report changes without saving them
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn set_interval(input: &mut IntervalInput, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (state, _) = validate_partial(text, text.chars().count());
    if state != Validation::Acceptable {
        return Err(format!("invalid interval '{text}' (expected e.g. \"1h 30m\")").into());
    }
    input.set_text(text);
    Ok(())
}

fn describe(session: &SettingsSession, pref: Preference) -> serde_json::Value {
    let value = session.value(pref);
    let mut entry = serde_json::json!({
        "key": pref.key(),
        "value": value,
        "editable": session.is_editable(pref),
    });
    if let SessionValue::Seconds(secs) = value {
        entry["text"] = serde_json::Value::String(encode(secs));
    }
    entry
}

pub fn run(action: SettingsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut session = {
        let mut group = db.group(SETTINGS_GROUP);
        SettingsSession::open(&mut group, &config.defaults)?
    };

    match action {
        SettingsAction::Show { json } => {
            if json {
                let entries: Vec<_> = Preference::ALL.iter().map(|p| describe(&session, *p)).collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for pref in Preference::ALL {
                    let shown = match session.value(pref) {
                        SessionValue::Seconds(secs) => encode(secs),
                        SessionValue::Flag(on) => on.to_string(),
                    };
                    let note = if session.is_editable(pref) { "" } else { " (disabled)" };
                    println!("{:<18} {shown}{note}", pref.key());
                }
            }
            session.cancel();
        }
        SettingsAction::Edit {
            interval,
            autotry,
            handle_ppe,
            send_emails,
            continue_running,
            view_accounts,
            dry_run,
            json,
        } => {
            if let Some(text) = interval {
                set_interval(session.interval_mut(), &text)?;
            }
            if let Some(text) = autotry {
                set_interval(session.autotry_mut(), &text)?;
            }

            // handle_ppe first so the fields depending on it see the new value.
            let flags = [
                (Preference::HandlePpe, handle_ppe),
                (Preference::SendEmails, send_emails),
                (Preference::ContinueRunning, continue_running),
                (Preference::ViewAccounts, view_accounts),
            ];
            for (pref, requested) in flags {
                if let Some(on) = requested {
                    if !session.set_flag(pref, on) {
                        tracing::warn!(preference = pref.key(), "field disabled, edit ignored");
                        eprintln!("warning: {} is disabled while handle_ppe is off", pref.key());
                    }
                }
            }

            let changes = if dry_run {
                let keys: Vec<&str> = Preference::ALL.iter().map(|p| p.key()).collect();
                let mut preview = MemoryStore::snapshot(&db.group(SETTINGS_GROUP), &keys)?;
                session.finalize(&mut preview)?
            } else {
                let mut group = db.group(SETTINGS_GROUP);
                session.finalize(&mut group)?
            };

            if json {
                let changed: Vec<&str> = changes.iter().map(Preference::key).collect();
                let out = serde_json::json!({
                    "bits": changes.bits(),
                    "changed": changed,
                    "reschedule": changes.needs_reschedule(),
                    "saved": !dry_run,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let verb = if dry_run { "would change" } else { "changed" };
                println!("{verb}: {changes} (0x{:02x})", changes.bits());
                if changes.needs_reschedule() {
                    println!("check timers need rescheduling");
                }
            }
        }
    }
    Ok(())
}
