use voidrsc_format::{ExportOptions, ExportStats, ExportStatus};

use crate::cli::ExportArgs;
use crate::error::{Error, Result};
use crate::util::{format_size, matches_any, open_container};

pub fn run(args: ExportArgs) -> Result<()> {
    let container = open_container(&args.archive)?;

    if !args.dry_run {
        std::fs::create_dir_all(&args.output).map_err(|source| Error::CreateDirectory {
            path: args.output.clone(),
            source,
        })?;
    }

    let options = ExportOptions {
        dry_run: args.dry_run,
    };
    let mut stats = ExportStats::default();

    for entry in container
        .entries()
        .iter()
        .filter(|e| matches_any(e, &args.filters))
    {
        let status = container
            .export_with_options(entry, &args.output, options)
            .map_err(|source| Error::Export {
                destination: entry.destination.clone(),
                source,
            })?;

        if !args.quiet {
            match status {
                ExportStatus::Written { bytes } => {
                    println!("{:>12}  {}", format_size(bytes), entry.destination)
                }
                ExportStatus::DryRun { bytes } => {
                    println!("{:>12}  {} (dry run)", format_size(bytes), entry.destination)
                }
                ExportStatus::Exists => println!("{:>12}  {}", "exists", entry.destination),
                ExportStatus::Empty => {}
            }
        }

        stats.record(status);
    }

    tracing::debug!(?stats, "export finished");

    if !args.quiet {
        let verb = if args.dry_run { "Checked" } else { "Exported" };
        println!(
            "{} {} files ({}), skipped {}",
            verb,
            stats.files_written,
            format_size(stats.bytes_written),
            stats.files_skipped
        );
    }

    Ok(())
}
