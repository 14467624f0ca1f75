use clap::Subcommand;
use qppe_core::{decode, encode, validate_partial, Validation, MAX_INTERVAL_SECS};

#[derive(Subcommand)]
pub enum DurationAction {
    /// Render seconds as interval text
    Encode {
        /// Number of seconds
        seconds: u64,
    },
    /// Parse interval text (e.g. "1d 2h") into seconds
    Decode {
        text: String,
        /// Clamp to the interval input maximum (just under 7 days)
        #[arg(long)]
        clamp: bool,
    },
    /// Run the input filter over partially typed text
    Check { text: String },
}

pub fn run(action: DurationAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DurationAction::Encode { seconds } => println!("{}", encode(seconds)),
        DurationAction::Decode { text, clamp } => {
            let secs = decode(&text);
            let secs = if clamp { secs.min(MAX_INTERVAL_SECS) } else { secs };
            println!("{secs}");
        }
        DurationAction::Check { text } => {
            let (state, _) = validate_partial(&text, text.chars().count());
            let label = match state {
                Validation::Acceptable => "acceptable",
                Validation::Intermediate => "intermediate",
                Validation::Invalid => "invalid",
            };
            println!("{label}");
            if !state.is_accepted() {
                std::process::exit(2);
            }
        }
    }
    Ok(())
}
