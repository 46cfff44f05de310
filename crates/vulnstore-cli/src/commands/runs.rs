//! Run ledger command
//!
//! Usage: vulnstore runs --updater NAME [--latest]

use super::StoreArgs;
use clap::Args;

#[derive(Debug, Args)]
pub struct RunsArgs {
    /// Updater (data source) name
    #[arg(long)]
    pub updater: String,

    /// Only the latest committed run
    #[arg(long)]
    pub latest: bool,

    /// Also print each run's record count
    #[arg(long)]
    pub counts: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn execute(args: RunsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (store, _) = args.store.open(false)?;

    let runs = if args.latest {
        store.latest_run(&args.updater)?.into_iter().collect()
    } else {
        store.list_runs(&args.updater)?
    };

    for run in runs {
        let mut value = serde_json::to_value(&run)?;
        if args.counts {
            value["records"] = store.run_record_count(&run.run_ref)?.into();
        }
        println!("{}", value);
    }
    Ok(())
}
