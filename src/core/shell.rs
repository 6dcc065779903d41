//! 系统命令执行抽象
//!
//! 能力检测与休眠执行都通过 [`SystemShell`] 调用外部命令，测试中可以替换为假实现

use std::io;
use std::process::Command;

use log::debug;

/// 外部命令的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// 退出码；进程被信号终止时为 None
    pub exit_code: Option<i32>,
    /// 标准输出（按UTF-8宽松解码）
    pub stdout: String,
    /// 标准错误（按UTF-8宽松解码）
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// 阻塞地执行一个外部命令
pub trait SystemShell {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<ShellOutput>;
}

impl<S: SystemShell + ?Sized> SystemShell for &S {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<ShellOutput> {
        (**self).run(program, args)
    }
}

/// 基于 `std::process::Command` 的真实实现
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessShell;

impl SystemShell for ProcessShell {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<ShellOutput> {
        debug!("执行系统命令: {} {}", program, args.join(" "));

        let output = Command::new(program).args(args).output()?;

        Ok(ShellOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
