use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info, warn};
use polynode_model::{InstallError, InstallPhase, InstallProgress, Installer, Version};
use polynode_platform::InstallLayout;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::archive::extract_zip;
use crate::config::PolynodeConfig;
use crate::proxy::ProxyConfig;
use crate::releases::{ReleaseIndex, is_alias};

/// A downloaded archive that is deleted when dropped, whatever the outcome
/// of the install.
struct TransientFile {
    path: PathBuf,
}

impl TransientFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => warn!("Could not remove {}: {error}", self.path.display()),
        }
    }
}

async fn download(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: &mpsc::Sender<InstallProgress>,
) -> Result<(), InstallError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| InstallError::download(url, error))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(InstallError::download(url, "version not found on the mirror"));
    }
    if !status.is_success() {
        return Err(InstallError::download(url, format!("HTTP {status}")));
    }

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let mut file = tokio::fs::File::create(dest).await.map_err(|error| {
        InstallError::io(format!("failed to create {}", dest.display()), error)
    })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| InstallError::download(url, error))?;
        file.write_all(&chunk).await.map_err(|error| {
            InstallError::io(format!("failed to write {}", dest.display()), error)
        })?;
        downloaded += chunk.len() as u64;
        let _ = progress
            .send(InstallProgress::Downloaded { downloaded, total })
            .await;
    }

    file.flush().await.map_err(|error| {
        InstallError::io(format!("failed to flush {}", dest.display()), error)
    })?;

    info!("Downloaded {downloaded} bytes from {url}");
    Ok(())
}

/// Installs releases from a `nodejs.org/dist` style mirror.
pub struct HttpInstaller {
    layout: InstallLayout,
    mirror: String,
}

impl HttpInstaller {
    #[must_use]
    pub fn new(config: &PolynodeConfig) -> Self {
        Self {
            layout: config.layout.clone(),
            mirror: config.node_dist_mirror.clone(),
        }
    }

    #[must_use]
    pub fn download_url(&self, version: &Version) -> String {
        format!(
            "{}/v{version}/{}",
            self.mirror,
            self.layout.archive_name(version)
        )
    }

    /// Build a client honouring `proxy.json`. The file is read on every call
    /// so that a `proxy` command takes effect immediately.
    ///
    /// # Errors
    /// Returns [`InstallError::Proxy`] when `proxy.json` is unreadable or
    /// names an invalid proxy URL.
    pub fn build_client(&self) -> Result<reqwest::Client, InstallError> {
        let proxy = ProxyConfig::load(&self.layout.proxy_file()).map_err(|error| {
            InstallError::Proxy {
                details: error.to_string(),
            }
        })?;

        let mut builder = reqwest::Client::builder()
            .user_agent(format!("polynode/{}", env!("CARGO_PKG_VERSION")));

        if let Some(url) = proxy.http_proxy_url() {
            info!("Using proxy {url}");
            let proxy = reqwest::Proxy::all(url).map_err(|error| InstallError::Proxy {
                details: format!("{url}: {error}"),
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(|error| InstallError::Proxy {
            details: error.to_string(),
        })
    }

    /// Extract `archive` beside the repository and move the version
    /// directory into place once it is complete and marked.
    fn unpack(&self, version: Version, archive: &Path) -> Result<PathBuf, InstallError> {
        let archive_label = archive.display().to_string();
        let scratch = tempfile::Builder::new()
            .prefix(".extract-")
            .tempdir_in(&self.layout.repository)
            .map_err(|error| InstallError::io("failed to create extraction directory", error))?;

        extract_zip(archive, scratch.path())
            .map_err(|error| InstallError::extract(&archive_label, error))?;

        let dir_name = self.layout.version_dir_name(&version);
        let extracted = scratch.path().join(&dir_name);
        if !extracted.is_dir() {
            return Err(InstallError::extract(
                &archive_label,
                format!("archive does not contain {dir_name}/"),
            ));
        }

        std::fs::write(
            extracted.join(self.layout.marker_file_name()),
            version.to_string(),
        )
        .map_err(|error| InstallError::io("failed to write version marker", error))?;

        let target = self.layout.version_dir(&version);
        std::fs::rename(&extracted, &target).map_err(|error| {
            InstallError::io(format!("failed to move {dir_name} into place"), error)
        })?;

        Ok(target)
    }
}

#[async_trait]
impl Installer for HttpInstaller {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn resolve(&self, request: &str) -> Result<Version, InstallError> {
        if !is_alias(request) {
            return Ok(Version::parse_user_input(request)?);
        }

        let client = self.build_client()?;
        let index = ReleaseIndex::fetch(&client, &self.mirror).await?;
        let version = index
            .resolve_alias(request)
            .ok_or_else(|| InstallError::UnknownAlias {
                alias: request.trim().to_string(),
            })?;
        info!("Resolved {} to {version}", request.trim());
        Ok(version)
    }

    async fn install_version(
        &self,
        version: Version,
        progress: mpsc::Sender<InstallProgress>,
    ) -> Result<PathBuf, InstallError> {
        if self.layout.version_dir(&version).is_dir() {
            return Err(InstallError::AlreadyInstalled { version });
        }

        self.layout
            .ensure_dirs()
            .map_err(|error| InstallError::io("failed to create repository", error))?;
        let client = self.build_client()?;

        let url = self.download_url(&version);
        let archive = TransientFile::new(
            self.layout
                .repository
                .join(self.layout.archive_name(&version)),
        );

        let _ = progress
            .send(InstallProgress::Phase(InstallPhase::Downloading))
            .await;
        info!("Downloading {url}");
        download(&client, &url, archive.path(), &progress).await?;

        let _ = progress
            .send(InstallProgress::Phase(InstallPhase::Extracting))
            .await;
        let path = self.unpack(version, archive.path())?;

        let _ = progress
            .send(InstallProgress::Phase(InstallPhase::Finalizing))
            .await;
        drop(archive);

        info!("Installed {version} to {}", path.display());
        let _ = progress
            .send(InstallProgress::Complete {
                version,
                path: path.clone(),
            })
            .await;
        Ok(path)
    }
}
