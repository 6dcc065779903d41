//! UI管理器模块
//!
//! 使用iced框架实现倒计时窗口。倒计时的每一次 tick 都是事件循环上的一个
//! 延时 Command，两次 tick 之间窗口可以正常处理按钮和键盘事件。

use std::time::{Duration, Instant};

use iced::alignment::Horizontal;
use iced::widget::{button, column, container, progress_bar, row, text};
use iced::{
    executor, keyboard, window, Alignment, Application, Command, Element, Font, Length, Settings,
    Subscription, Theme as IcedTheme,
};
use log::{error, info};

use crate::core::countdown::CountdownDriver;
use crate::core::hibernate::{HibernateError, HibernationInvoker};
use crate::core::shell::SystemShell;
use crate::core::types::{CountdownSettings, CountdownTick, TickOutcome};
use crate::ui::theme::Theme;
use crate::utils::config::UISettings;
use crate::utils::notification::show_error_dialog;

/// 窗口标题
pub const WINDOW_TITLE: &str = "Automatic Hibernation";

/// 页脚中的发布日期
pub const RELEASE_DATE: &str = "13.03.2025";

/// 窗口左上角位置
const WINDOW_POSITION: (f32, f32) = (208.0, 208.0);

/// 应用程序消息类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// 倒计时定时器到期
    Tick,
    /// 立即休眠
    HibernateNow,
    /// 关闭程序（按钮或 Escape）
    Close,
}

/// 启动UI所需的参数
#[derive(Debug)]
pub struct UIFlags<S> {
    /// 倒计时参数
    pub countdown: CountdownSettings,
    /// 休眠执行器
    pub invoker: HibernationInvoker<S>,
}

/// UI管理器应用程序状态
#[derive(Debug)]
pub struct UIManager<S> {
    /// 倒计时驱动器
    driver: CountdownDriver,
    /// 休眠执行器
    invoker: HibernationInvoker<S>,
    /// 最近一次休眠失败的原因
    hibernate_error: Option<HibernateError>,
    /// 剩余时间文本
    remaining_label: String,
    /// 进度条数值
    progress: f32,
    /// 已经开始关闭，忽略后续消息
    closing: bool,
    /// 当前主题
    theme: Theme,
}

/// 运行UI应用程序
pub fn run<S: SystemShell + 'static>(ui_settings: &UISettings, flags: UIFlags<S>) -> iced::Result {
    let level = if ui_settings.always_on_top {
        window::Level::AlwaysOnTop
    } else {
        window::Level::Normal
    };

    let settings = Settings {
        id: None,
        window: window::Settings {
            size: iced::Size::new(ui_settings.window_width, ui_settings.window_height),
            position: window::Position::Specific(iced::Point::new(WINDOW_POSITION.0, WINDOW_POSITION.1)),
            min_size: None,
            max_size: None,
            visible: true,
            resizable: false,
            decorations: true,
            transparent: false,
            level,
            icon: None,
            platform_specific: Default::default(),
            exit_on_close_request: true,
        },
        flags,
        fonts: vec![],
        default_font: Font::DEFAULT,
        default_text_size: iced::Pixels(14.0),
        antialiasing: false,
    };
    UIManager::<S>::run(settings)
}

/// 在 `delay` 之后向事件循环投递一次 Tick
fn schedule_tick(delay: Duration) -> Command<Message> {
    Command::perform(async move { tokio::time::sleep(delay).await }, |()| Message::Tick)
}

impl<S: SystemShell> UIManager<S> {
    /// 应用一次 tick 的结果到界面状态
    fn apply_tick(&mut self, tick: &CountdownTick) {
        self.progress = tick.progress as f32;
        if let Some(label) = &tick.label {
            self.remaining_label = label.clone();
        }
    }

    /// 执行休眠并关闭窗口
    ///
    /// 休眠失败时先弹出错误提示，然后同样关闭窗口
    fn hibernate_and_close(&mut self) -> Command<Message> {
        self.closing = true;
        info!("倒计时 [{}]: {}", self.driver.get_id(), self.driver.get_status());

        if let Err(e) = self.invoker.invoke_hibernate() {
            error!("休眠失败: {}", e);
            show_error_dialog(
                "Error",
                &format!("An error occurred while attempting to hibernate: {}", e),
            );
            self.hibernate_error = Some(e);
        }

        info!("关闭窗口");
        window::close(window::Id::MAIN)
    }
}

impl<S: SystemShell + 'static> Application for UIManager<S> {
    type Message = Message;
    type Theme = IcedTheme;
    type Executor = executor::Default;
    type Flags = UIFlags<S>;

    /// 创建应用程序实例并立即开始倒计时
    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>) {
        let mut driver = CountdownDriver::new(flags.countdown);
        driver.start(Instant::now());

        let remaining_label =
            CountdownDriver::format_remaining(flags.countdown.duration(), flags.countdown.show_decimal_seconds);

        let ui_manager = Self {
            driver,
            invoker: flags.invoker,
            hibernate_error: None,
            remaining_label,
            progress: 0.0,
            closing: false,
            theme: Theme::default(),
        };

        (ui_manager, schedule_tick(Duration::ZERO))
    }

    fn title(&self) -> String {
        WINDOW_TITLE.to_string()
    }

    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        if self.closing {
            return Command::none();
        }

        match message {
            Message::Tick => match self.driver.tick(Instant::now()) {
                TickOutcome::Continue { tick, next_delay } => {
                    self.apply_tick(&tick);
                    schedule_tick(next_delay)
                },
                TickOutcome::Completed(tick) => {
                    self.apply_tick(&tick);
                    self.hibernate_and_close()
                },
                TickOutcome::Terminated | TickOutcome::Stopped => Command::none(),
            },
            Message::HibernateNow => {
                info!("用户请求立即休眠");
                self.driver.terminate();
                self.hibernate_and_close()
            },
            Message::Close => {
                info!("用户请求关闭程序");
                self.driver.terminate();
                self.closing = true;
                window::close(window::Id::MAIN)
            },
        }
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        keyboard::on_key_press(|key, _modifiers| match key {
            keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::Close),
            _ => None,
        })
    }

    fn view(&self) -> Element<'_, Self::Message> {
        let fonts = &self.theme.fonts;

        let time_label = text(format!("System will hibernate in\n{} seconds", self.remaining_label))
            .size(fonts.label_size)
            .style(self.theme.text_color())
            .horizontal_alignment(Horizontal::Center);

        let progress = progress_bar(0.0..=100.0, self.progress)
            .width(Length::Fixed(240.0))
            .height(Length::Fixed(20.0));

        let buttons = row![
            button(text("Close Application").size(fonts.button_size))
                .on_press(Message::Close)
                .padding(8),
            button(text("Hibernate Now").size(fonts.button_size))
                .on_press(Message::HibernateNow)
                .padding(8),
        ]
        .spacing(6);

        let frame = container(
            column![time_label, progress, buttons]
                .spacing(10)
                .align_items(Alignment::Center),
        )
        .padding(10)
        .width(Length::Fill)
        .center_x()
        .style(self.theme.frame_style());

        let footer = text(format!(
            "By @Nieznany237 | Version {} released {}",
            env!("CARGO_PKG_VERSION"),
            RELEASE_DATE
        ))
            .size(fonts.footer_size)
            .style(self.theme.footer_color());

        column![
            frame,
            container(footer).width(Length::Fill).align_x(Horizontal::Right),
        ]
        .spacing(4)
        .padding(8)
        .into()
    }

    fn theme(&self) -> Self::Theme {
        IcedTheme::Light
    }
}
