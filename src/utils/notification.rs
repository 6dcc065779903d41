//! 通知模块
//!
//! 提供阻塞式的错误提示框：Windows 上使用 `MessageBoxW`，其他平台和测试中输出到标准错误

use log::error;

/// 通知消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    /// 标题
    pub title: String,
    /// 内容
    pub content: String,
}

impl NotificationMessage {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// 显示错误提示框，阻塞直到用户关闭
pub fn show_error_dialog(title: &str, content: &str) {
    show_blocking(&NotificationMessage::new(title, content));
}

/// 记录错误日志并显示阻塞式提示框
pub fn show_blocking(message: &NotificationMessage) {
    error!("{}: {}", message.title, message.content);
    platform::message_box(message);
}

#[cfg(all(windows, not(test)))]
mod platform {
    use super::NotificationMessage;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK, MB_TOPMOST};

    fn to_wide(text: &str) -> Vec<u16> {
        OsStr::new(text).encode_wide().chain(std::iter::once(0)).collect()
    }

    pub fn message_box(message: &NotificationMessage) {
        let title = to_wide(&message.title);
        let content = to_wide(&message.content);

        unsafe {
            MessageBoxW(
                HWND::default(),
                PCWSTR(content.as_ptr()),
                PCWSTR(title.as_ptr()),
                MB_OK | MB_TOPMOST | MB_ICONERROR,
            );
        }
    }
}

// 测试中不能弹出需要人工关闭的对话框
#[cfg(any(not(windows), test))]
mod platform {
    use super::NotificationMessage;

    pub fn message_box(message: &NotificationMessage) {
        eprintln!("{}: {}", message.title, message.content);
    }
}
