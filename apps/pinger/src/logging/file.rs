use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::{LogRecord, LogSink, SinkError};

struct ActiveFile {
    /// `None` between a rotation and the next write
    file: Option<File>,
    size: u64,
}

/// Append-only log file with a single backup generation.
///
/// Before a record is written, a file that reached `max_bytes` is moved to
/// the backup slot (replacing any previous backup) and a fresh file is opened.
pub struct RotatingFileSink {
    path: PathBuf,
    backup_path: PathBuf,
    max_bytes: u64,
    active: Mutex<ActiveFile>,
}

async fn open_append(path: &Path) -> std::io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    let size = file.metadata().await?.len();
    Ok((file, size))
}

/// `log.txt` rotates into `log.txt.1`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".1");
    path.with_file_name(name)
}

impl RotatingFileSink {
    pub async fn open(path: impl AsRef<Path>, max_bytes: u64) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let (file, size) = open_append(&path).await?;
        let active = ActiveFile { file: Some(file), size };
        Ok(Self { backup_path: backup_path(&path), path, max_bytes, active: Mutex::new(active) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup(&self) -> &Path {
        &self.backup_path
    }

    /// Current size of the active file as tracked by the sink
    pub async fn size(&self) -> u64 {
        self.active.lock().await.size
    }

    /// Move the active file to the backup slot. The next write reopens `path`.
    ///
    /// An active file removed from disk is not an error, there is simply
    /// nothing to move.
    async fn rotate(&self, active: &mut ActiveFile) -> std::io::Result<()> {
        if let Some(mut file) = active.file.take() {
            file.flush().await?;
        }

        active.size = 0;
        if !fs::try_exists(&self.path).await? {
            return Ok(());
        }

        match fs::remove_file(&self.backup_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        match fs::rename(&self.path, &self.backup_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        debug!(path = %self.path.display(), "Rotated log file");
        Ok(())
    }
}

#[async_trait::async_trait]
impl LogSink for RotatingFileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let mut active = self.active.lock().await;
        if active.size >= self.max_bytes {
            self.rotate(&mut active).await?;
        }

        let mut line = String::with_capacity(record.line.len() + 1);
        line.push_str(&record.line);
        line.push('\n');

        let file = match active.file.take() {
            Some(file) => file,
            None => {
                let (file, size) = open_append(&self.path).await?;
                active.size = size;
                file
            }
        };
        let file = active.file.insert(file);
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        active.size += line.len() as u64;
        Ok(())
    }
}
