//! 日志管理模块
//!
//! 负责日志系统的初始化和日志文件清理

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

use chrono::{DateTime, Local};
use dirs::data_local_dir;
use env_logger::{Builder, Target};
use log::{info, warn, LevelFilter};

use crate::utils::config::LoggingSettings;

static INIT: Once = Once::new();

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "auto_hibernate_";

/// 日志管理器
#[derive(Debug)]
pub struct LoggerManager {
    /// 日志文件路径
    log_file_path: Option<PathBuf>,
    /// 当前日志级别
    log_level: LevelFilter,
}

impl LoggerManager {
    /// 创建新的日志管理器
    ///
    /// `log_dir` 为 None 时不写日志文件
    pub fn new(log_level: LevelFilter, log_dir: Option<&Path>) -> io::Result<Self> {
        let log_file_path = match log_dir {
            Some(dir) => {
                if !dir.exists() {
                    fs::create_dir_all(dir)?;
                }
                let log_filename = format!("{}{}.log", LOG_FILE_PREFIX, Local::now().format("%Y%m%d"));
                Some(dir.join(log_filename))
            },
            None => None,
        };

        Ok(Self { log_file_path, log_level })
    }

    /// 默认日志目录
    pub fn default_log_dir() -> Option<PathBuf> {
        data_local_dir().map(|dir| dir.join("AutoHibernate").join("logs"))
    }

    /// 初始化日志系统，进程内只生效一次
    ///
    /// `RUST_LOG` 环境变量优先于配置中的级别
    pub fn init(&self) -> io::Result<()> {
        let file = match &self.log_file_path {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };

        let log_level = self.log_level;
        INIT.call_once(move || {
            let mut builder = Builder::new();
            builder.filter_level(log_level);
            builder.parse_default_env();

            builder.format(|buf, record| {
                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                writeln!(
                    buf,
                    "[{}] [{}] [{}:{}] {}",
                    timestamp,
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            });

            match file {
                Some(file) => builder.target(Target::Pipe(Box::new(TeeWriter { file }))),
                None => builder.target(Target::Stdout),
            };

            if let Err(e) = builder.try_init() {
                eprintln!("Logger initialization error: {}", e);
            }
        });

        match &self.log_file_path {
            Some(path) => info!("日志系统初始化完成 - 控制台和文件: {:?}", path),
            None => info!("日志系统初始化完成 - 仅控制台"),
        }
        Ok(())
    }

    /// 获取当前日志级别
    pub fn get_log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// 获取日志文件路径
    pub fn get_log_file_path(&self) -> Option<&Path> {
        self.log_file_path.as_deref()
    }

    /// 清理旧日志文件，返回删除的文件数量
    pub fn cleanup_old_logs(&self, days_to_keep: u32) -> io::Result<usize> {
        let Some(log_dir) = self.log_file_path.as_ref().and_then(|path| path.parent()) else {
            return Ok(0);
        };
        if !log_dir.exists() {
            return Ok(0);
        }

        let cutoff_time = Local::now() - chrono::Duration::days(i64::from(days_to_keep));
        let mut cleaned_count = 0;

        for entry in fs::read_dir(log_dir)? {
            let path = entry?.path();
            if !is_log_file(&path) || Some(path.as_path()) == self.get_log_file_path() {
                continue;
            }

            let modified: DateTime<Local> = fs::metadata(&path)?.modified()?.into();
            if modified < cutoff_time {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        info!("删除旧日志文件: {:?}", path);
                        cleaned_count += 1;
                    },
                    Err(e) => warn!("删除日志文件失败 {:?}: {}", path, e),
                }
            }
        }

        info!("清理完成，删除了 {} 个旧日志文件", cleaned_count);
        Ok(cleaned_count)
    }
}

/// 同时写入标准输出和日志文件
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // 控制台不可用（GUI子系统）时忽略错误
        let _ = io::stdout().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stdout().flush();
        self.file.flush()
    }
}

fn is_log_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().map_or(false, |ext| ext == "log")
        && path
            .file_name()
            .map_or(false, |name| name.to_string_lossy().starts_with(LOG_FILE_PREFIX))
}

/// 从字符串转换为日志级别，无法识别时为 Info
pub fn parse_level(level_str: &str) -> LevelFilter {
    match level_str.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// 按配置初始化日志系统
pub fn init_logger(settings: &LoggingSettings) -> io::Result<LoggerManager> {
    let log_dir = if settings.file_logging {
        LoggerManager::default_log_dir()
    } else {
        None
    };

    let logger = LoggerManager::new(parse_level(&settings.level), log_dir.as_deref())?;
    logger.init()?;
    Ok(logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info"), LevelFilter::Info);
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("invalid"), LevelFilter::Info);
    }

    #[test]
    fn test_logger_manager_without_file() {
        let logger = LoggerManager::new(LevelFilter::Info, None).unwrap();

        assert_eq!(logger.get_log_level(), LevelFilter::Info);
        assert!(logger.get_log_file_path().is_none());
        assert_eq!(logger.cleanup_old_logs(7).unwrap(), 0);
    }

    #[test]
    fn test_log_file_path() {
        let dir = tempdir().unwrap();
        let logger = LoggerManager::new(LevelFilter::Debug, Some(dir.path())).unwrap();

        let path = logger.get_log_file_path().unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with(LOG_FILE_PREFIX));
    }

    #[test]
    fn test_cleanup_old_logs() {
        let dir = tempdir().unwrap();
        let logger = LoggerManager::new(LevelFilter::Info, Some(dir.path())).unwrap();

        let old_log = dir.path().join("auto_hibernate_20200101.log");
        let other_file = dir.path().join("notes.txt");
        fs::write(&old_log, "old").unwrap();
        fs::write(&other_file, "keep").unwrap();

        let old_time = SystemTime::now() - Duration::from_secs(30 * 24 * 3600);
        File::options()
            .write(true)
            .open(&old_log)
            .unwrap()
            .set_modified(old_time)
            .unwrap();

        assert_eq!(logger.cleanup_old_logs(7).unwrap(), 1);
        assert!(!old_log.exists());
        assert!(other_file.exists());
    }

    #[test]
    fn test_init_is_idempotent() {
        let logger = LoggerManager::new(LevelFilter::Debug, None).unwrap();
        assert!(logger.init().is_ok());
        assert!(logger.init().is_ok());
    }
}
