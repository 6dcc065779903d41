//! 工具模块
//!
//! 配置、日志与用户通知等辅助功能

pub mod config;
pub mod logger;
pub mod notification;
