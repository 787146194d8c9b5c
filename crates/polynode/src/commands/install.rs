use std::io::Write as _;

use polynode_core::{HttpInstaller, PolynodeConfig};
use polynode_model::{InstallPhase, InstallProgress, Installer, Version};
use tokio::sync::mpsc;

use crate::error::Result;

fn phase_label(phase: InstallPhase) -> &'static str {
    match phase {
        InstallPhase::Resolving => "Resolving version",
        InstallPhase::Downloading => "Downloading",
        InstallPhase::Extracting => "Extracting",
        InstallPhase::Finalizing => "Finalizing",
    }
}

fn format_bytes(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    format!("{}.{} MiB", bytes / MIB, (bytes % MIB) * 10 / MIB)
}

pub(crate) fn format_download(downloaded: u64, total: u64) -> String {
    if total == 0 {
        format_bytes(downloaded)
    } else {
        let percent = downloaded.saturating_mul(100) / total;
        format!(
            "{percent:>3}% ({} of {})",
            format_bytes(downloaded),
            format_bytes(total)
        )
    }
}

async fn report_progress(mut rx: mpsc::Receiver<InstallProgress>) -> Option<Version> {
    let mut downloading = false;
    let mut installed = None;
    while let Some(event) = rx.recv().await {
        match event {
            InstallProgress::Phase(phase) => {
                if downloading {
                    eprintln!();
                    downloading = false;
                }
                eprintln!("{}...", phase_label(phase));
            }
            InstallProgress::Downloaded { downloaded, total } => {
                downloading = true;
                eprint!("\r  {}", format_download(downloaded, total));
                let _ = std::io::stderr().flush();
            }
            InstallProgress::Complete { version, .. } => installed = Some(version),
        }
    }
    if downloading {
        eprintln!();
    }
    installed
}

pub async fn run(config: &PolynodeConfig, request: &str) -> Result<()> {
    let installer = HttpInstaller::new(config);
    let (tx, rx) = mpsc::channel(64);

    let (result, installed) = tokio::join!(installer.install(request, tx), report_progress(rx));
    let path = result?;

    println!("Installed {}", path.display());
    if let Some(version) = installed {
        println!("Run `polynode use {version}` to activate it");
    }
    Ok(())
}
