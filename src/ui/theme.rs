//! UI主题模块
//!
//! 定义倒计时窗口使用的颜色与字号

use iced::widget::container;
use iced::{Background, Border, Color, Shadow, Theme as IcedTheme};

/// 应用主题
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// 颜色配置
    pub colors: ThemeColors,
    /// 字体配置
    pub fonts: ThemeFonts,
}

/// 主题颜色配置
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    /// 窗口背景色
    pub background: [u8; 3],
    /// 主要文本色
    pub text: [u8; 3],
    /// 页脚文本色
    pub footer: [u8; 3],
    /// 边框色
    pub border: [u8; 3],
}

/// 字体配置
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeFonts {
    /// 倒计时文本大小
    pub label_size: f32,
    /// 按钮文本大小
    pub button_size: f32,
    /// 页脚文本大小
    pub footer_size: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light_theme()
    }
}

impl Theme {
    /// 创建浅色主题
    pub fn light_theme() -> Self {
        Self {
            colors: ThemeColors {
                background: [240, 240, 240],
                text: [33, 37, 41],
                footer: [126, 126, 126],
                border: [200, 200, 200],
            },
            fonts: ThemeFonts {
                label_size: 17.0,
                button_size: 13.0,
                footer_size: 10.0,
            },
        }
    }

    fn rgb([r, g, b]: [u8; 3]) -> Color {
        Color::from_rgb8(r, g, b)
    }

    pub fn text_color(&self) -> Color {
        Self::rgb(self.colors.text)
    }

    pub fn footer_color(&self) -> Color {
        Self::rgb(self.colors.footer)
    }

    /// 外框容器样式
    pub fn frame_style(&self) -> impl Fn(&IcedTheme) -> container::Appearance + 'static {
        let background = Self::rgb(self.colors.background);
        let border = Self::rgb(self.colors.border);
        move |_theme: &IcedTheme| container::Appearance {
            text_color: None,
            background: Some(Background::Color(background)),
            border: Border {
                color: border,
                width: 2.0,
                radius: 4.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}
