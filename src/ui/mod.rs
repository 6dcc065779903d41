//! 用户界面模块
//!
//! 倒计时窗口及其主题

pub mod manager;
pub mod theme;
