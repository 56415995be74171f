use clap::{Parser, Subcommand};
use nestpack::archive::{create_archive, extract_archive, list_archive};
use nestpack::format::DEFAULT_MAX_DEPTH;
use nestpack::{is_archive, ExtractOptions, PackOptions};
use std::path::PathBuf;

/// Largest accepted `--chunk-size`, in KiB (1 GiB).
const MAX_CHUNK_KIB: u32 = 1024 * 1024;

#[derive(Parser)]
#[command(name = "nestpack", about = "Flat directory archiver with attached-archive extraction")]
struct Cli {
    /// Log every packed/extracted record
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a directory into <DEST_DIR>/<basename of SOURCE>
    Archive {
        source:   PathBuf,
        dest_dir: PathBuf,
        /// Copy buffer size in KiB (1 to 1048576)
        #[arg(long, default_value = "64", value_parser = chunk_kib())]
        chunk_size: u32,
    },
    /// Extract an archive into <DEST_DIR>/<basename of ARCHIVE>
    Extract {
        archive:  PathBuf,
        dest_dir: PathBuf,
        /// Unpack files that are archives themselves, then remove the
        /// top-level container directory
        #[arg(short, long)]
        attached: bool,
        /// Deepest attached-archive nesting followed
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
        /// Copy buffer size in KiB (1 to 1048576)
        #[arg(long, default_value = "64", value_parser = chunk_kib())]
        chunk_size: u32,
    },
    /// List archive records without extracting
    List {
        archive: PathBuf,
    },
    /// Exit 0 if PATH is an archive, 1 otherwise
    Check {
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {

        // ── Archive ──────────────────────────────────────────────────────────
        Commands::Archive { source, dest_dir, chunk_size } => {
            let opts = PackOptions {
                chunk_size: kib(chunk_size),
                ..PackOptions::default()
            };
            let output = create_archive(&source, &dest_dir, &opts)?;
            println!("Created: {}", output.display());
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { archive, dest_dir, attached, max_depth, chunk_size } => {
            let opts = ExtractOptions {
                attached,
                chunk_size: kib(chunk_size),
                max_depth,
            };
            let stats = extract_archive(&archive, &dest_dir, &opts)?;
            println!("Extracted {} file(s) to: {}", stats.files, dest_dir.display());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { archive } => {
            println!("Archive: {}", archive.display());
            println!("{:>12}  Path", "Size");
            for entry in list_archive(&archive)? {
                println!("{:>12}  {}", entry.size, entry.display_path());
            }
        }

        // ── Check ────────────────────────────────────────────────────────────
        Commands::Check { path } => {
            if !is_archive(&path) {
                println!("{}: not an archive", path.display());
                std::process::exit(1);
            }
            println!("{}: archive", path.display());
        }
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("NESTPACK_LOG", default))
        .format_timestamp(None)
        .init();
}

fn chunk_kib() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=MAX_CHUNK_KIB as i64)
}

fn kib(n: u32) -> usize {
    n as usize * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chunk_size_is_bounded() {
        let parse = |kib: &str| {
            Cli::try_parse_from(["nestpack", "archive", "src", "dst", "--chunk-size", kib])
        };
        assert!(parse("0").is_err());
        assert!(parse("1048577").is_err());
        assert!(parse("99999999999999999999").is_err());
        assert!(parse("1048576").is_ok());

        let huge = Cli::try_parse_from([
            "nestpack", "extract", "a", "d", "--chunk-size", "18014398509481984",
        ]);
        assert!(huge.is_err());
    }

    #[test]
    fn kib_scales_to_bytes() {
        assert_eq!(kib(64), 65536);
        assert_eq!(kib(MAX_CHUNK_KIB), 1 << 30);
    }
}
