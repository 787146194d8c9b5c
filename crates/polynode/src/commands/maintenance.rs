use log::warn;
use polynode_core::{PolynodeConfig, ProxyConfig, backup_timestamp, create_backup};

use crate::error::Result;

pub fn backup(config: &PolynodeConfig) -> Result<()> {
    let path = create_backup(&config.layout, &backup_timestamp())?;
    println!("Backup written to {}", path.display());
    Ok(())
}

/// Store `url` as the download proxy. An empty URL removes it. Other keys
/// of an existing `proxy.json` are kept.
pub fn proxy(config: &PolynodeConfig, url: &str) -> Result<()> {
    let path = config.layout.proxy_file();
    let mut proxy = ProxyConfig::load(&path).unwrap_or_else(|error| {
        warn!("Replacing unreadable proxy configuration: {error}");
        ProxyConfig::default()
    });

    let url = url.trim();
    proxy.http_proxy = (!url.is_empty()).then(|| url.to_string());
    proxy.save(&path)?;

    match proxy.http_proxy_url() {
        Some(url) => println!("Downloads will use proxy {url}"),
        None => println!("Proxy removed"),
    }
    Ok(())
}
