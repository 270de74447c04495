use std::{env, fmt, fs, path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to write config {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config directory available (neither XDG_CONFIG_HOME nor HOME is set)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Newline-delimited list of addresses to monitor
    pub settings_path: path::PathBuf,
    pub zeromq: ZeroMQ,
    pub probe: Probe,
    pub schedule: Schedule,
    pub log_file: LogFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroMQ {
    pub endpoint: String,
    /// Connect to a forwarding proxy instead of binding the endpoint
    pub connect: bool,
    pub status_topic: String,
    pub log_topic: String,
    pub send_high_water_mark: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    Icmp,
    Tcp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Probe {
    pub method: ProbeMethod,
    pub timeout_ms: u64,
    /// Port used by the tcp method when an address carries none
    pub tcp_port: u16,
    /// Probes in flight per cycle, 1 probes sequentially
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub probe_interval_secs: u64,
    pub publish_interval_secs: u64,
    /// Consecutive failed status publishes before giving up, 0 never gives up
    pub max_publish_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFile {
    pub path: path::PathBuf,
    pub max_bytes: u64,
    pub source_tag: String,
    /// Also write every published status payload to the log
    pub log_status: bool,
}

impl Default for ZeroMQ {
    fn default() -> Self {
        Self {
            endpoint: "tcp://*:5555".into(),
            connect: false,
            status_topic: "ping".into(),
            log_topic: "logging".into(),
            send_high_water_mark: 1000,
        }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self { method: ProbeMethod::Icmp, timeout_ms: 1000, tcp_port: 80, max_concurrency: 16 }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self { probe_interval_secs: 5, publish_interval_secs: 5, max_publish_failures: 3 }
    }
}

impl Default for LogFile {
    fn default() -> Self {
        Self { path: "log.txt".into(), max_bytes: 1024 * 1024, source_tag: "PINGER".into(), log_status: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: "settings.ini".into(),
            zeromq: ZeroMQ::default(),
            probe: Probe::default(),
            schedule: Schedule::default(),
            log_file: LogFile::default(),
        }
    }
}

impl Probe {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Schedule {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_secs.max(1))
    }
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMethod::Icmp => write!(f, "icmp"),
            ProbeMethod::Tcp => write!(f, "tcp"),
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/uppe/pinger.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("uppe/pinger.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_0 = write_indented(0);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_0(f, "Settings File", &self.settings_path.display())?;
        write_title_1(f, "ZeroMQ")?;
        write_1(f, "Endpoint", &self.zeromq.endpoint)?;
        write_1(f, "Mode", &if self.zeromq.connect { "connect" } else { "bind" })?;
        write_1(f, "Status Topic", &self.zeromq.status_topic)?;
        write_1(f, "Log Topic", &self.zeromq.log_topic)?;
        write_1(f, "Send High Water Mark", &self.zeromq.send_high_water_mark)?;
        write_title_1(f, "Probe")?;
        write_1(f, "Method", &self.probe.method)?;
        write_1(f, "Timeout (ms)", &self.probe.timeout_ms)?;
        write_1(f, "TCP Port", &self.probe.tcp_port)?;
        write_1(f, "Max Concurrency", &self.probe.max_concurrency)?;
        write_title_1(f, "Schedule")?;
        write_1(f, "Probe Interval (s)", &self.schedule.probe_interval_secs)?;
        write_1(f, "Publish Interval (s)", &self.schedule.publish_interval_secs)?;
        write_1(f, "Max Publish Failures", &self.schedule.max_publish_failures)?;
        write_title_1(f, "Log File")?;
        write_1(f, "Path", &self.log_file.path.display())?;
        write_1(f, "Max Bytes", &self.log_file.max_bytes)?;
        write_1(f, "Source Tag", &self.log_file.source_tag)?;
        write_1(f, "Log Status", &self.log_file.log_status)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/uppe/pinger.toml
    ///  or the specified path, with the `.toml` extension, if one does not exist
    ///
    /// ```ignore
    /// let cfg = config::Config::from_config(None::<&path::Path>)?;
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| Error::ReadFailed { path: config_path.clone(), source })?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| Error::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| Error::WriteFailed { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.settings_path, path::PathBuf::from("settings.ini"));
        assert_eq!(config.zeromq.status_topic, "ping");
        assert_eq!(config.probe.method, ProbeMethod::Icmp);
        assert_eq!(config.probe.timeout(), Duration::from_secs(1));
        assert_eq!(config.schedule.probe_interval(), Duration::from_secs(5));
        assert_eq!(config.log_file.max_bytes, 1024 * 1024);
        assert!(config.log_file.log_status);
    }

    #[test]
    fn test_missing_config_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/pinger");

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config, Config::default());
        assert!(dir.path().join("nested/pinger.toml").exists());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pinger.toml");
        fs::write(&path, "settings_path = \"hosts.txt\"\n[probe]\nmethod = \"tcp\"\ntcp_port = 22\n")
            .unwrap();

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config.settings_path, path::PathBuf::from("hosts.txt"));
        assert_eq!(config.probe.method, ProbeMethod::Tcp);
        assert_eq!(config.probe.tcp_port, 22);
        assert_eq!(config.probe.timeout_ms, 1000);
        assert_eq!(config.zeromq, ZeroMQ::default());
    }

    #[test]
    fn test_invalid_config_fails_to_parse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pinger.toml");
        fs::write(&path, "[probe]\nmethod = \"carrier-pigeon\"\n").unwrap();

        assert!(matches!(Config::from_config(Some(&path)), Err(Error::ParseFailed(_))));
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let schedule = Schedule { probe_interval_secs: 0, publish_interval_secs: 0, max_publish_failures: 0 };
        assert_eq!(schedule.probe_interval(), Duration::from_secs(1));
        assert_eq!(schedule.publish_interval(), Duration::from_secs(1));
    }
}
