mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_from(wild::args_os());

    match cli.command {
        Commands::List(args) => commands::list(args)?,
        Commands::Export(args) => commands::export(args)?,
        Commands::Entities(args) => commands::entities(args)?,
        Commands::Insert(args) => commands::insert(args)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        let cli = Cli::parse_from(["voidrsc", "ls", "base/game1.index", "--type", "entities"]);
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.archive.archive, std::path::PathBuf::from("base/game1.index"));
                assert_eq!(args.kind.as_deref(), Some("entities"));
                assert!(!args.archive.exact);
            }
            other => panic!("unexpected {:?}", other),
        }

        let cli = Cli::parse_from([
            "voidrsc", "x", "--exact", "-n", "-o", "out", "game1_002.index", "maps", "decls",
        ]);
        match cli.command {
            Commands::Export(args) => {
                assert!(args.archive.exact);
                assert!(args.dry_run);
                assert_eq!(args.output, std::path::PathBuf::from("out"));
                assert_eq!(args.filters, vec!["maps", "decls"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
