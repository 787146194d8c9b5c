use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::error::InstallError;
use crate::types::{InstallPhase, InstallProgress, Version};

/// Materializes new installed version directories in the repository.
///
/// Implementations write the version marker into the new directory and never
/// leave a downloaded archive behind, whether the install succeeds or not.
#[async_trait]
pub trait Installer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Turn a user request into a concrete version.
    ///
    /// The default accepts only explicit versions; installers that know a
    /// release index override this to resolve aliases such as `latest`.
    async fn resolve(&self, request: &str) -> Result<Version, InstallError> {
        Ok(Version::parse_user_input(request)?)
    }

    async fn install_version(
        &self,
        version: Version,
        progress: mpsc::Sender<InstallProgress>,
    ) -> Result<PathBuf, InstallError>;

    async fn install(
        &self,
        request: &str,
        progress: mpsc::Sender<InstallProgress>,
    ) -> Result<PathBuf, InstallError> {
        let _ = progress
            .send(InstallProgress::Phase(InstallPhase::Resolving))
            .await;
        let version = self.resolve(request).await?;
        self.install_version(version, progress).await
    }
}
