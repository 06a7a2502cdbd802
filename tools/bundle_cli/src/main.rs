use clap::{Parser, Subcommand};
use provenance_core::disclosure::writer::verify_bundle_dir;
use provenance_core::manifest::files::{
    generate_manifest, generate_manifest_for_dir, verify_manifest_report, FileManifest,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Generate and verify integrity manifests for disclosure bundles.
#[derive(Debug, Parser)]
#[command(name = "bundle-cli", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Hash the given files (or every file under --dir) into a flat manifest.
    Generate {
        manifest_path: PathBuf,
        files: Vec<PathBuf>,
        /// Hash every file under this directory, recording root-relative paths.
        #[arg(long, conflicts_with = "files")]
        dir: Option<PathBuf>,
    },
    /// Re-hash every manifest entry relative to ROOT_DIR.
    Verify {
        manifest_path: PathBuf,
        root_dir: PathBuf,
    },
    /// Verify a written disclosure bundle directory using only its own files.
    VerifyBundle { bundle_dir: PathBuf },
}

const EXIT_MISMATCH: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            manifest_path,
            files,
            dir,
        } => {
            let manifest = match &dir {
                Some(root) => generate_manifest_for_dir(root),
                None if files.is_empty() => {
                    eprintln!("generate: pass at least one file or --dir");
                    return ExitCode::from(EXIT_ERROR);
                }
                None => generate_manifest(&files),
            };
            let manifest = match manifest {
                Ok(m) => m,
                Err(e) => {
                    error!("generate failed: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            if let Err(e) = manifest.save(&manifest_path) {
                error!("cannot write {}: {}", manifest_path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            info!(
                files = manifest.files.len(),
                manifest = %manifest_path.display(),
                "manifest written"
            );
            ExitCode::SUCCESS
        }
        Command::Verify {
            manifest_path,
            root_dir,
        } => {
            let manifest = match FileManifest::load(&manifest_path) {
                Ok(m) => m,
                Err(e) => {
                    error!("cannot read {}: {}", manifest_path.display(), e);
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            let report = verify_manifest_report(&root_dir, &manifest);
            for m in &report.mismatches {
                println!("MISMATCH {}", m);
            }
            if report.is_ok() {
                println!("OK {} files verified", report.checked);
                ExitCode::SUCCESS
            } else {
                println!(
                    "FAIL {} of {} files failed verification",
                    report.mismatches.len(),
                    report.checked
                );
                ExitCode::from(EXIT_MISMATCH)
            }
        }
        Command::VerifyBundle { bundle_dir } => {
            let result = verify_bundle_dir(&bundle_dir);
            match serde_json::to_string_pretty(&result) {
                Ok(s) => println!("{}", s),
                Err(e) => {
                    error!("cannot render verification result: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
            }
            if result.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_MISMATCH)
            }
        }
    }
}
