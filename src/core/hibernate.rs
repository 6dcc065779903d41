//! 休眠执行器模块
//!
//! 负责调用 `shutdown /h` 让系统进入休眠，并把结果同步返回给调用方

use log::{error, info, warn};
use thiserror::Error;

use crate::core::shell::SystemShell;

/// 休眠命令
pub const SHUTDOWN_PROGRAM: &str = "shutdown";
pub const HIBERNATE_ARGS: &[&str] = &["/h"];

/// 休眠失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HibernateError {
    /// 命令返回非零退出码
    #[error("系统错误: 退出码 {0}")]
    ExitCode(i32),
    /// 命令被终止，没有退出码
    #[error("休眠命令被意外终止")]
    NoExitCode,
    /// 命令无法启动（找不到程序、权限不足等）
    #[error("无法执行休眠命令: {0}")]
    Spawn(String),
}

/// 休眠执行器
#[derive(Debug)]
pub struct HibernationInvoker<S> {
    shell: S,
    /// 为 true 时不调用系统命令，直接返回成功
    dry_run: bool,
}

impl<S: SystemShell> HibernationInvoker<S> {
    /// 创建新的休眠执行器
    pub fn new(shell: S, dry_run: bool) -> Self {
        if dry_run {
            warn!("休眠执行器处于演练模式，不会真正休眠");
        }
        Self { shell, dry_run }
    }

    /// 是否为演练模式
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// 获取命令执行器
    #[cfg(test)]
    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// 执行休眠
    ///
    /// 阻塞直到命令返回。成功时系统随即进入休眠，调用方应立即结束进程。
    pub fn invoke_hibernate(&self) -> Result<(), HibernateError> {
        if self.dry_run {
            info!("演练模式: 跳过休眠命令");
            return Ok(());
        }

        info!("执行休眠命令: {} {}", SHUTDOWN_PROGRAM, HIBERNATE_ARGS.join(" "));

        let output = self.shell.run(SHUTDOWN_PROGRAM, HIBERNATE_ARGS).map_err(|e| {
            error!("休眠命令启动失败: {}", e);
            HibernateError::Spawn(e.to_string())
        })?;

        match output.exit_code {
            Some(0) => {
                info!("休眠命令执行成功");
                Ok(())
            },
            Some(code) => {
                error!("休眠命令执行失败，退出码 {}: {}", code, output.stderr.trim());
                Err(HibernateError::ExitCode(code))
            },
            None => {
                error!("休眠命令被终止");
                Err(HibernateError::NoExitCode)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shell::fake::FakeShell;
    use std::io;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_hibernate_success() {
        let shell = FakeShell::with_output(0, "");
        let invoker = HibernationInvoker::new(&shell, false);

        assert_ok!(invoker.invoke_hibernate());
        assert_eq!(shell.calls(), 1);
        assert_eq!(shell.last_command().as_deref(), Some("shutdown /h"));
    }

    #[test]
    fn test_hibernate_exit_code_is_reported() {
        let shell = FakeShell::with_output(1, "");
        let invoker = HibernationInvoker::new(&shell, false);

        assert_eq!(invoker.invoke_hibernate(), Err(HibernateError::ExitCode(1)));
    }

    #[test]
    fn test_hibernate_killed() {
        let shell = FakeShell::killed();
        let invoker = HibernationInvoker::new(&shell, false);

        assert_eq!(invoker.invoke_hibernate(), Err(HibernateError::NoExitCode));
    }

    #[test]
    fn test_hibernate_spawn_failure() {
        let shell = FakeShell::failing(io::ErrorKind::PermissionDenied);
        let invoker = HibernationInvoker::new(&shell, false);

        let err = assert_err!(invoker.invoke_hibernate());
        assert!(matches!(err, HibernateError::Spawn(_)));
        assert!(err.to_string().contains("fake shell failure"));
    }

    #[test]
    fn test_dry_run_skips_command() {
        let shell = FakeShell::with_output(1, "");
        let invoker = HibernationInvoker::new(&shell, true);

        assert!(invoker.is_dry_run());
        assert_ok!(invoker.invoke_hibernate());
        assert_eq!(shell.calls(), 0);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(HibernateError::ExitCode(1).to_string(), "系统错误: 退出码 1");
    }
}
