//! Id command: generate and convert snowflake IDs

use anyhow::{Context, Result};
use forum_core::id::{decode, encode};
use forum_core::{IdParts, Snowflake};

use crate::cli::{GlobalArgs, IdArgs, IdCommands};
use crate::commands::common::load_config;

/// Execute the id command
pub(crate) async fn execute(args: &IdArgs, global: &GlobalArgs) -> Result<()> {
    match &args.command {
        IdCommands::New { count } => {
            let config = load_config(global)?;
            let generator = Snowflake::from_config(&config.snowflake)
                .context("Invalid snowflake configuration")?;
            for _ in 0..*count {
                let id = generator.next();
                println!("{}\t{}", id, encode(id));
            }
        }
        IdCommands::Encode { id } => println!("{}", encode(*id)),
        IdCommands::Decode { value } => {
            let id = decode(value).with_context(|| format!("Cannot decode '{}'", value))?;
            println!("{}\t{}", id, describe(id));
        }
    }
    Ok(())
}

/// `+<seconds>s seq <n> instance <n>`
pub(crate) fn describe(id: i64) -> String {
    let parts = IdParts::of(id);
    format!(
        "+{}s seq {} instance {}",
        parts.seconds, parts.sequence, parts.instance
    )
}

#[cfg(test)]
#[path = "id_test.rs"]
mod tests;
