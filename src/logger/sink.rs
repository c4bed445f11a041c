//! 日志输出端

use parking_lot::Mutex;
use rat_logger::{debug, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::rolling::RollingFileAppender;

use super::{LogEncoding, LogRotation};
use crate::config::LogLevel;
use crate::error::EntryResult;

/// 日志输出端
///
/// 输出失败不会向调用方传播
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, fields: &[(&str, String)]);

    /// 当前编码
    fn encoding(&self) -> LogEncoding {
        LogEncoding::Console
    }

    /// 写入的路径，不写文件的输出端为空
    fn output_paths(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// 以另一种编码输出到同一目标，不支持时返回 None
    fn with_encoding(&self, _encoding: LogEncoding) -> Option<Arc<dyn LogSink>> {
        None
    }
}

/// 按编码格式化一行日志
fn encode_line(
    encoding: LogEncoding,
    with_timestamp: bool,
    level: LogLevel,
    message: &str,
    fields: &[(&str, String)],
) -> String {
    match encoding {
        LogEncoding::Json => {
            let mut map = serde_json::Map::new();
            if with_timestamp {
                map.insert(
                    "ts".to_string(),
                    serde_json::Value::String(chrono::Local::now().to_rfc3339()),
                );
            }
            map.insert("level".to_string(), level.as_str().into());
            map.insert("msg".to_string(), message.into());
            for (key, value) in fields {
                map.insert(key.to_string(), value.as_str().into());
            }
            serde_json::Value::Object(map).to_string()
        }
        LogEncoding::Console => {
            let mut line = String::new();
            if with_timestamp {
                line.push_str(&chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string());
                line.push('\t');
                line.push_str(&level.as_str().to_uppercase());
                line.push('\t');
            }
            line.push_str(message);
            for (key, value) in fields {
                line.push(' ');
                line.push_str(key);
                line.push('=');
                line.push_str(value);
            }
            line
        }
    }
}

/// 转发到 rat_logger 的输出端
///
/// rat_logger 由宿主程序初始化，这里只负责格式化
#[derive(Debug, Clone, Copy, Default)]
pub struct RatLoggerSink {
    encoding: LogEncoding,
}

impl RatLoggerSink {
    pub fn new(encoding: LogEncoding) -> Self {
        Self { encoding }
    }
}

impl LogSink for RatLoggerSink {
    fn log(&self, level: LogLevel, message: &str, fields: &[(&str, String)]) {
        let line = encode_line(self.encoding, false, level, message, fields);
        match level {
            LogLevel::Error => error!("{}", line),
            LogLevel::Warn => warn!("{}", line),
            LogLevel::Info => info!("{}", line),
            LogLevel::Debug | LogLevel::Trace => debug!("{}", line),
        }
    }

    fn encoding(&self) -> LogEncoding {
        self.encoding
    }

    fn with_encoding(&self, encoding: LogEncoding) -> Option<Arc<dyn LogSink>> {
        Some(Arc::new(RatLoggerSink::new(encoding)))
    }
}

enum Target {
    Stdout,
    Stderr,
    File {
        path: PathBuf,
        appender: Mutex<RollingFileAppender>,
    },
}

/// 按周期滚动的文件输出端，`stdout`/`stderr` 为特殊路径
///
/// 文件由 tracing-appender 写入；滚动周期为 [`LogRotation::Never`] 时
/// 文件名与配置的路径一致，否则追加日期后缀
pub struct FileSink {
    encoding: LogEncoding,
    rotation: LogRotation,
    paths: Vec<PathBuf>,
    targets: Vec<Target>,
}

fn open_appender(path: &Path, rotation: LogRotation) -> EntryResult<RollingFileAppender> {
    let (dir, prefix) = match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => (dir, name.to_string_lossy().into_owned()),
        _ => {
            return Err(crate::entry_error!(
                config,
                format!("日志输出路径不是文件: {}", path.display())
            ));
        }
    };

    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(rotation.to_appender())
        .filename_prefix(prefix)
        .build(dir)
        .map_err(|e| {
            crate::entry_error!(config, format!("打开日志文件失败 {}: {}", path.display(), e))
        })
}

impl FileSink {
    /// 打开所有输出路径
    ///
    /// 路径应当已经是绝对路径，见 [`to_abs_path`](crate::utils::to_abs_path)
    pub fn open(encoding: LogEncoding, rotation: LogRotation, paths: &[PathBuf]) -> EntryResult<Self> {
        let mut targets = Vec::with_capacity(paths.len());
        for path in paths {
            let target = match path.to_str() {
                Some("stdout") => Target::Stdout,
                Some("stderr") => Target::Stderr,
                _ => Target::File {
                    path: path.clone(),
                    appender: Mutex::new(open_appender(path, rotation)?),
                },
            };
            targets.push(target);
        }

        Ok(Self {
            encoding,
            rotation,
            paths: paths.to_vec(),
            targets,
        })
    }

    pub fn rotation(&self) -> LogRotation {
        self.rotation
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl LogSink for FileSink {
    fn log(&self, level: LogLevel, message: &str, fields: &[(&str, String)]) {
        let line = encode_line(self.encoding, true, level, message, fields);
        for target in &self.targets {
            let result = match target {
                Target::Stdout => writeln!(std::io::stdout(), "{}", line),
                Target::Stderr => writeln!(std::io::stderr(), "{}", line),
                Target::File { appender, .. } => writeln!(appender.lock(), "{}", line),
            };
            if let Err(e) = result {
                let path = match target {
                    Target::Stdout => Path::new("stdout"),
                    Target::Stderr => Path::new("stderr"),
                    Target::File { path, .. } => path.as_path(),
                };
                warn!("写入日志失败 {}: {}", path.display(), e);
            }
        }
    }

    fn encoding(&self) -> LogEncoding {
        self.encoding
    }

    fn output_paths(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    fn with_encoding(&self, encoding: LogEncoding) -> Option<Arc<dyn LogSink>> {
        match FileSink::open(encoding, self.rotation, &self.paths) {
            Ok(sink) => Some(Arc::new(sink)),
            Err(e) => {
                warn!("重新打开日志输出失败 {:?}: {}", self.paths, e);
                None
            }
        }
    }
}

/// 内存中的一条日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// 查找字段值
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 把日志保存在内存里的输出端，便于诊断与测试
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str, fields: &[(&str, String)]) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
    }
}

/// 具名日志入口
///
/// 启动配置中的 `logger.entry` 按名称引用
#[derive(Clone)]
pub struct LoggerEntry {
    name: String,
    sink: Arc<dyn LogSink>,
}

impl LoggerEntry {
    pub fn new<S: Into<String>>(name: S, sink: Arc<dyn LogSink>) -> Self {
        Self {
            name: name.into(),
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sink(&self) -> Arc<dyn LogSink> {
        self.sink.clone()
    }
}

impl std::fmt::Debug for LoggerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerEntry").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_console() {
        let line = encode_line(
            LogEncoding::Console,
            false,
            LogLevel::Info,
            "Bootstrap SqliteEntry",
            &[("entryName", "user-db".to_string())],
        );
        assert_eq!(line, "Bootstrap SqliteEntry entryName=user-db");
    }

    #[test]
    fn test_encode_json() {
        let line = encode_line(
            LogEncoding::Json,
            true,
            LogLevel::Warn,
            "slow",
            &[("sql", "SELECT 1".to_string())],
        );
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "warn");
        assert_eq!(value["msg"], "slow");
        assert_eq!(value["sql"], "SELECT 1");
        assert!(value["ts"].is_string());
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("db.log");
        let sink = FileSink::open(LogEncoding::Json, LogRotation::Never, &[path.clone()]).unwrap();

        sink.log(LogLevel::Info, "first", &[]);
        sink.log(LogLevel::Error, "second", &[("error", "boom".to_string())]);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"error\":\"boom\""));
        assert_eq!(sink.paths(), &[path.clone()]);
        assert_eq!(sink.output_paths(), vec![path]);
        assert_eq!(sink.encoding(), LogEncoding::Json);
    }

    #[test]
    fn test_file_sink_daily_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.log");
        let sink = FileSink::open(LogEncoding::Console, LogRotation::Daily, &[path.clone()]).unwrap();
        sink.log(LogLevel::Warn, "rotated", &[]);

        // 按天滚动的文件带日期后缀
        let files: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("db.log."));

        let content = std::fs::read_to_string(dir.path().join(&files[0])).unwrap();
        assert!(content.contains("rotated"));
    }

    #[test]
    fn test_file_sink_with_encoding_keeps_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.log");
        let sink = FileSink::open(LogEncoding::Console, LogRotation::Never, &[path.clone()]).unwrap();

        let json = sink.with_encoding(LogEncoding::Json).unwrap();
        assert_eq!(json.encoding(), LogEncoding::Json);
        assert_eq!(json.output_paths(), vec![path.clone()]);

        json.log(LogLevel::Info, "hello", &[]);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"msg\":\"hello\""));
    }

    #[test]
    fn test_rat_logger_sink_encoding() {
        let sink = RatLoggerSink::new(LogEncoding::Console);
        assert!(sink.output_paths().is_empty());
        let json = sink.with_encoding(LogEncoding::Json).unwrap();
        assert_eq!(json.encoding(), LogEncoding::Json);
        assert!(MemorySink::new().with_encoding(LogEncoding::Json).is_none());
    }

    #[test]
    fn test_open_rejects_directory_path() {
        assert!(FileSink::open(LogEncoding::Console, LogRotation::Never, &[PathBuf::from("/")]).is_err());
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.log(LogLevel::Debug, "hello", &[("k", "v".to_string())]);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("k"), Some("v"));
        sink.clear();
        assert!(sink.records().is_empty());
    }
}
