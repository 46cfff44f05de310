//! Schema migration command
//!
//! Usage: vulnstore migrate [--db PATH | --config FILE]

use super::StoreArgs;
use clap::Args;
use vulnstore_store::{db, migrations};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn execute(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (store, _) = args.store.open(false)?;

    let conn = db::connect(store.config())?;
    for id in migrations::applied_migrations(&conn)? {
        println!("{}", id);
    }
    Ok(())
}
