use polynode_platform::{InstallLayout, LayoutError, Platform};

/// Environment variable overriding the distribution mirror.
pub const MIRROR_ENV: &str = "POLYNODE_NODE_MIRROR";

pub const DEFAULT_NODE_DIST_MIRROR: &str = "https://nodejs.org/dist";

/// Configuration computed once at startup and handed to every component.
#[derive(Debug, Clone)]
pub struct PolynodeConfig {
    pub layout: InstallLayout,
    pub platform: Platform,
    pub node_dist_mirror: String,
}

impl PolynodeConfig {
    #[must_use]
    pub fn new(layout: InstallLayout, platform: Platform) -> Self {
        Self {
            layout,
            platform,
            node_dist_mirror: DEFAULT_NODE_DIST_MIRROR.to_string(),
        }
    }

    /// Read `POLYNODE_PATH` and `POLYNODE_NODE_MIRROR` from the environment.
    ///
    /// # Errors
    /// Returns an error when the install root cannot be determined.
    pub fn from_env() -> Result<Self, LayoutError> {
        let platform = Platform::current();
        let layout = InstallLayout::from_env(&platform)?;
        let config = Self::new(layout, platform);

        Ok(match std::env::var(MIRROR_ENV) {
            Ok(mirror) if !mirror.trim().is_empty() => config.with_node_dist_mirror(mirror),
            _ => config,
        })
    }

    #[must_use]
    pub fn with_node_dist_mirror(mut self, mirror: impl Into<String>) -> Self {
        let mirror: String = mirror.into();
        self.node_dist_mirror = mirror.trim().trim_end_matches('/').to_string();
        self
    }
}
