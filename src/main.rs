use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;
use treesum::cli::{Cli, Commands, normalize_legacy_args};
use treesum::errors::{ExitCode, exit_code_for};
use treesum::output::{self, Verbosity};
use treesum::{TreesumContext, commands};

fn main() {
    let cli = match Cli::try_parse_from(normalize_legacy_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            ErrorKind::InvalidSubcommand => {
                let _ = e.print();
                process::exit(ExitCode::UnknownCommand.code());
            }
            _ => {
                let _ = e.print();
                process::exit(ExitCode::Usage.code());
            }
        },
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        output::error(&format!("Error: {e:#}"));
        process::exit(exit_code_for(&e).code());
    }
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "treesum=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    match cli.command {
        Commands::List {
            root,
            strict,
            threads,
            follow_symlinks,
            no_progress,
        } => {
            let mut ctx = TreesumContext::new(cli.config.as_deref())?;
            let scan = &mut ctx.config.scan;
            scan.strict |= strict;
            scan.follow_symlinks |= follow_symlinks;
            if let Some(threads) = threads {
                scan.threads = threads;
            }
            if no_progress {
                ctx.config.output.progress = false;
            }
            ctx.config.validate()?;
            commands::list::execute(&ctx, root.as_deref())?;
        }
        Commands::Compare {
            left,
            right,
            missing_only,
        } => {
            let ctx = TreesumContext::new(cli.config.as_deref())?;
            commands::compare::execute(&ctx, left.as_deref(), right.as_deref(), missing_only)?;
        }
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
        }
    }

    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
