use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Size past which the log file is cut down to its newest half.
pub const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Appends to a log file, reopening it if it was deleted while running.
struct ResilientFileWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl ResilientFileWriter {
    fn new(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reopen the file if it no longer exists on disk.
    fn reopen_if_missing(&self, slot: &mut Option<File>) -> io::Result<()> {
        if self.path.exists() && slot.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        *slot = Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?,
        );
        Ok(())
    }
}

impl Write for ResilientFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut slot = self.lock();
        self.reopen_if_missing(&mut slot)?;
        slot.as_mut()
            .ok_or_else(|| io::Error::other("log file not available"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().as_mut().map_or(Ok(()), File::flush)
    }
}

fn trim_log_file_if_oversized(log_path: &Path, max_log_size: u64) {
    if let Ok(metadata) = std::fs::metadata(log_path)
        && metadata.len() > max_log_size
        && let Ok(contents) = std::fs::read(log_path)
    {
        let half = contents.len() / 2;
        let keep_from = contents[half..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(half, |pos| half + pos + 1);
        let _ = std::fs::write(log_path, &contents[keep_from..]);
    }
}

fn terminal_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Warnings (or everything with `--verbose`) go to stderr; the full debug
/// log is appended to `log_path` when it can be opened.
pub fn init_logging(log_path: &Path, verbose: bool) {
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    trim_log_file_if_oversized(log_path, MAX_LOG_SIZE);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("polynode")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level(verbose),
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    match ResilientFileWriter::new(log_path.to_path_buf()) {
        Ok(writer) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer)),
        Err(error) => eprintln!(
            "polynode: not logging to {}: {error}",
            log_path.display()
        ),
    }

    let _ = CombinedLogger::init(loggers);
    log::debug!("polynode {} started", env!("CARGO_PKG_VERSION"));
}
