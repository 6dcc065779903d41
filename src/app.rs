//! 应用程序主模块
//!
//! 负责启动流程：加载配置、初始化日志、检测休眠能力，然后启动倒计时窗口

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use log::{info, warn};

use crate::core::capability::CapabilityChecker;
use crate::core::hibernate::HibernationInvoker;
use crate::core::shell::ProcessShell;
use crate::ui::manager::{self, UIFlags};
use crate::utils::config::{AppConfig, ConfigManager};
use crate::utils::logger::{init_logger, parse_level, LoggerManager};
use crate::utils::notification::show_error_dialog;

/// 系统不支持休眠时的提示
const UNSUPPORTED_MESSAGE: &str = "Hibernation is not available on this system. The program will close. \
Please check if your system supports hibernation.";

/// 应用程序主结构体
pub struct App {
    /// 应用配置
    config: AppConfig,
    /// 休眠能力检测器
    capability_checker: CapabilityChecker<ProcessShell>,
}

impl App {
    /// 创建新的应用实例
    pub fn new() -> Result<Self> {
        let config_manager = match ConfigManager::new() {
            Ok(manager) => Some(manager),
            Err(e) => {
                eprintln!("加载配置失败，使用默认配置: {}", e);
                None
            },
        };
        let logging = config_manager
            .as_ref()
            .map(|manager| manager.get_config().logging.clone())
            .unwrap_or_default();

        let logger = match init_logger(&logging) {
            Ok(logger) => logger,
            Err(e) => {
                eprintln!("无法打开日志文件，仅输出到控制台: {}", e);
                let logger = LoggerManager::new(parse_level(&logging.level), None)?;
                logger.init()?;
                logger
            },
        };

        info!(
            "AutoHibernate {} 启动中... (日志级别: {})",
            env!("CARGO_PKG_VERSION"),
            logger.get_log_level()
        );

        let config = match config_manager {
            Some(manager) => {
                info!("使用配置文件: {:?}", manager.get_config_path());
                manager.report_adjustments();
                manager.into_config()
            },
            None => AppConfig::default(),
        };

        if let Err(e) = logger.cleanup_old_logs(config.logging.keep_days) {
            warn!("清理旧日志失败: {}", e);
        }

        Ok(Self {
            config,
            capability_checker: CapabilityChecker::new(ProcessShell),
        })
    }

    /// 运行应用程序
    ///
    /// 不支持休眠时提示用户并以失败状态退出
    pub fn run(self) -> Result<ExitCode> {
        info!("系统兼容性报告:\n{}", self.capability_checker.generate_report());

        if !self.capability_checker.is_hibernation_supported() {
            show_error_dialog("Error", UNSUPPORTED_MESSAGE);
            return Ok(ExitCode::FAILURE);
        }

        let flags = UIFlags {
            countdown: self.config.countdown,
            invoker: HibernationInvoker::new(ProcessShell, self.config.hibernate.dry_run),
        };
        info!("启动用户界面... (演练模式: {})", flags.invoker.is_dry_run());
        manager::run(&self.config.ui, flags).map_err(|e| anyhow!("界面运行失败: {}", e))?;

        info!("程序退出");
        Ok(ExitCode::SUCCESS)
    }
}
