//! 休眠能力检测模块
//!
//! 通过 `powercfg /a` 查询系统可用的睡眠状态，结果在检测器实例内只计算一次
//!
//! 注意：标记短语是英文的，非英文系统语言下 `powercfg` 输出的是翻译后的文本，
//! 此时会被判定为不支持休眠。

use std::sync::OnceLock;

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use thiserror::Error;

use crate::core::shell::SystemShell;

/// 电源配置查询命令
pub const POWERCFG_PROGRAM: &str = "powercfg";
pub const POWERCFG_ARGS: &[&str] = &["/a"];

/// 可用睡眠状态列表之前的标记短语
pub const AVAILABLE_STATES_MARKER: &str = "The following sleep states are available on this system:";

lazy_static! {
    static ref HIBERNATE_ENTRY: Regex = Regex::new(r"\bHibernate\b").unwrap();
    static ref UNAVAILABLE_HEADER: Regex =
        Regex::new(r"(?i)^the following sleep states are not available").unwrap();
}

/// 能力检测失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// 查询命令无法启动
    #[error("无法执行 powercfg: {0}")]
    QueryFailed(String),
    /// 查询命令返回非零退出码
    #[error("powercfg 退出码异常: {0:?}")]
    QueryExit(Option<i32>),
    /// 输出中找不到标记短语
    #[error("powercfg 输出格式无法识别")]
    QueryParseFailure,
    /// 系统不支持休眠
    #[error("系统不支持休眠")]
    CapabilityUnavailable,
}

/// 休眠能力检测器
///
/// 第一次调用时执行查询，之后始终返回缓存的结果，失败也不会重试
#[derive(Debug)]
pub struct CapabilityChecker<S> {
    shell: S,
    cached: OnceLock<Result<(), CapabilityError>>,
}

impl<S: SystemShell> CapabilityChecker<S> {
    /// 创建新的检测器，不会立即执行查询
    pub fn new(shell: S) -> Self {
        Self {
            shell,
            cached: OnceLock::new(),
        }
    }

    /// 系统是否支持休眠
    pub fn is_hibernation_supported(&self) -> bool {
        self.status().is_ok()
    }

    /// 获取缓存的检测结果，首次调用时执行查询
    pub fn status(&self) -> &Result<(), CapabilityError> {
        self.cached.get_or_init(|| {
            let result = self.probe();
            match &result {
                Ok(()) => info!("休眠能力检测完成: 支持"),
                Err(e) => warn!("休眠能力检测完成: 不支持 ({})", e),
            }
            result
        })
    }

    /// 生成检测报告，用于启动日志
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== AutoHibernate 系统兼容性报告 ===\n");
        match self.status() {
            Ok(()) => report.push_str("休眠支持: 是\n"),
            Err(e) => {
                report.push_str("休眠支持: 否\n");
                report.push_str(&format!("原因: {}\n", e));
            },
        }
        report
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        let output = self
            .shell
            .run(POWERCFG_PROGRAM, POWERCFG_ARGS)
            .map_err(|e| CapabilityError::QueryFailed(e.to_string()))?;

        debug!("powercfg /a 输出:\n{}", output.stdout);

        if !output.success() {
            return Err(CapabilityError::QueryExit(output.exit_code));
        }

        parse_available_states(&output.stdout)
    }
}

/// 解析 `powercfg /a` 的输出
///
/// 标记短语之后连续的非空行为可用状态列表，遇到空行或"不可用"标题即结束
pub fn parse_available_states(output: &str) -> Result<(), CapabilityError> {
    let (_, rest) = output
        .split_once(AVAILABLE_STATES_MARKER)
        .ok_or(CapabilityError::QueryParseFailure)?;

    let hibernate_listed = rest
        .lines()
        .skip(1)
        .map(str::trim)
        .take_while(|line| !line.is_empty() && !UNAVAILABLE_HEADER.is_match(line))
        .any(|line| HIBERNATE_ENTRY.is_match(line));

    if hibernate_listed {
        Ok(())
    } else {
        Err(CapabilityError::CapabilityUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shell::fake::FakeShell;
    use std::io;

    const SUPPORTED_OUTPUT: &str = "The following sleep states are available on this system:\r\n    Standby (S3)\r\n    Hibernate\r\n    Fast Startup\r\n\r\nThe following sleep states are not available on this system:\r\n    Standby (S1)\r\n        The system firmware does not support this standby state.\r\n";

    const UNSUPPORTED_OUTPUT: &str = "The following sleep states are available on this system:\n    Standby (S3)\n\nThe following sleep states are not available on this system:\n    Hibernate\n        Hibernation has not been enabled.\n";

    #[test]
    fn test_parse_supported() {
        assert_eq!(parse_available_states(SUPPORTED_OUTPUT), Ok(()));
    }

    #[test]
    fn test_hibernate_in_unavailable_section_is_ignored() {
        assert_eq!(
            parse_available_states(UNSUPPORTED_OUTPUT),
            Err(CapabilityError::CapabilityUnavailable)
        );
    }

    #[test]
    fn test_hibernate_section_without_blank_line() {
        let output = "The following sleep states are available on this system:\n    Standby (S3)\nThe following sleep states are not available on this system:\n    Hibernate\n";
        assert_eq!(parse_available_states(output), Err(CapabilityError::CapabilityUnavailable));
    }

    #[test]
    fn test_missing_marker_is_parse_failure() {
        let output = "Die folgenden Standbymodi sind auf diesem System verfügbar:\n    Ruhezustand\n";
        assert_eq!(parse_available_states(output), Err(CapabilityError::QueryParseFailure));
    }

    #[test]
    fn test_hybrid_sleep_does_not_count() {
        let output = "The following sleep states are available on this system:\n    Hibernated Sleep\n";
        assert_eq!(parse_available_states(output), Err(CapabilityError::CapabilityUnavailable));
    }

    #[test]
    fn test_result_is_cached() {
        let shell = FakeShell::with_output(0, SUPPORTED_OUTPUT);
        let checker = CapabilityChecker::new(&shell);

        assert_eq!(shell.calls(), 0);
        assert!(checker.is_hibernation_supported());
        assert!(checker.is_hibernation_supported());
        assert!(checker.is_hibernation_supported());
        assert_eq!(shell.calls(), 1);
        assert_eq!(shell.last_command().as_deref(), Some("powercfg /a"));
    }

    #[test]
    fn test_missing_marker_caches_false() {
        let shell = FakeShell::with_output(0, "Unexpected output\n");
        let checker = CapabilityChecker::new(&shell);

        assert!(!checker.is_hibernation_supported());
        assert!(!checker.is_hibernation_supported());
        assert_eq!(checker.status(), &Err(CapabilityError::QueryParseFailure));
        assert_eq!(shell.calls(), 1);
    }

    #[test]
    fn test_non_zero_exit_is_unsupported() {
        let shell = FakeShell::with_output(1, SUPPORTED_OUTPUT);
        let checker = CapabilityChecker::new(&shell);

        assert!(!checker.is_hibernation_supported());
        assert_eq!(checker.status(), &Err(CapabilityError::QueryExit(Some(1))));
    }

    #[test]
    fn test_spawn_failure_is_not_retried() {
        let shell = FakeShell::failing(io::ErrorKind::NotFound);
        let checker = CapabilityChecker::new(&shell);

        assert!(!checker.is_hibernation_supported());
        assert!(!checker.is_hibernation_supported());
        assert!(matches!(checker.status(), Err(CapabilityError::QueryFailed(_))));
        assert_eq!(shell.calls(), 1);
    }

    #[test]
    fn test_report_generation() {
        let shell = FakeShell::with_output(0, UNSUPPORTED_OUTPUT);
        let checker = CapabilityChecker::new(&shell);

        let report = checker.generate_report();
        assert!(report.contains("休眠支持: 否"));
        assert!(report.contains("系统不支持休眠"));
        assert_eq!(shell.calls(), 1);
    }
}
