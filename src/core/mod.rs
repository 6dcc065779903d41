//! 核心业务逻辑模块
//!
//! 休眠能力检测、倒计时驱动与休眠执行

pub mod capability;
pub mod countdown;
pub mod hibernate;
pub mod shell;
pub mod types;
