//! AutoHibernate - 倒计时自动休眠工具
//!
//! 启动后检测系统是否支持休眠，显示一个倒计时窗口，
//! 倒计时结束时让系统进入休眠。

// Release 版本在 Windows 上不显示控制台窗口
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

use std::process::ExitCode;

mod app;
mod core;
mod ui;
mod utils;

/// 应用程序入口点
fn main() -> anyhow::Result<ExitCode> {
    let app = app::App::new()?;
    app.run()
}
