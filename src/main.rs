use anyhow::Result;
use codebench::cli::{
    handle_compare_command, handle_history_command, handle_plugins_command, parse_args,
    CompareArgs, Commands,
};
use codebench::observability::init_tracing;

fn main() -> Result<()> {
    let cli = parse_args();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compare {
            a,
            b,
            weights,
            skip,
            export,
            confidence,
            timeout,
            jobs,
            reference,
            config,
            store,
            no_store,
        } => handle_compare_command(CompareArgs {
            a,
            b,
            weights,
            skip,
            export,
            confidence,
            timeout,
            jobs,
            reference,
            config,
            store,
            no_store,
        }),
        Commands::History {
            codebase,
            limit,
            store,
        } => handle_history_command(codebase, limit, store),
        Commands::Plugins { config } => handle_plugins_command(config.as_deref()),
    }
}
