//! The terminal window.
//!
//! All state lives in the [`Controller`].
//! This module only turns widget interactions, timer firings and the
//! window close request into controller calls, and draws the result.

use iced::{
    executor,
    widget::{
        self, button, column, container, pick_list, row,
        scrollable::{self, snap_to, RelativeOffset},
        text, text_input, Column,
    },
    window, Alignment, Application, Command, Element, Event, Length, Settings, Subscription, Theme,
};
use iced_native::subscription;
use tracing::debug;

use crate::{
    config::Config,
    controller::{Controller, Dialog},
    serial::Transport,
};

const PADDING: u16 = 10;
const SPACING: u16 = 10;
const BAUD_INPUT_WIDTH: u16 = 100;

/// What the terminal window needs to start.
pub struct Flags {
    /// Where ports come from.
    pub transport: Box<dyn Transport>,

    /// The configuration to start with.
    pub config: Config,
}

/// Things that can happen in the window.
#[derive(Debug, Clone)]
pub enum Message {
    /// A port was picked in the selector.
    PortSelected(String),

    /// The refresh button was pressed.
    RefreshPorts,

    /// The baud rate field was edited.
    BaudChanged(String),

    /// The connect/disconnect button was pressed.
    ToggleConnection,

    /// The outgoing text was edited.
    EntryChanged(String),

    /// Send button pressed, or enter hit in the outgoing text.
    Send,

    /// The poll timer fired.
    PollTick,

    /// The dialog was acknowledged.
    DismissDialog,

    /// The user wants the window gone.
    CloseRequested,
}

/// The terminal window.
pub struct Terminal {
    controller: Controller,
    log_scroll_id: scrollable::Id,
}

/// Open the terminal window and run until it is closed.
pub fn run(transport: Box<dyn Transport>, config: Config) -> iced::Result {
    let window_size = (config.window.width, config.window.height);

    let mut settings = Settings::with_flags(Flags { transport, config });
    settings.window.size = window_size;
    // We release the serial port before letting the window go.
    settings.exit_on_close_request = false;

    Terminal::run(settings)
}

impl Terminal {
    fn view_dialog<'a>(&self, dialog: &'a Dialog) -> Element<'a, Message> {
        let body = column![
            text(dialog.title()).size(24),
            text(dialog.message()),
            button(text("OK"))
                .padding([5, 20])
                .on_press(Message::DismissDialog),
        ]
        .spacing(SPACING)
        .padding(PADDING);

        if dialog.is_blocking() {
            container(body)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x()
                .center_y()
                .into()
        } else {
            container(body).width(Length::Fill).into()
        }
    }

    fn view_connection_row(&self) -> Element<'_, Message> {
        let ports = pick_list(
            self.controller.ports(),
            self.controller.selected_port().cloned(),
            Message::PortSelected,
        )
        .placeholder("No ports")
        .width(Length::Fill);

        row![
            text("Port:"),
            ports,
            button(text("Refresh")).on_press(Message::RefreshPorts),
            text("Baud:"),
            text_input("", self.controller.baud_input(), Message::BaudChanged)
                .padding(5)
                .width(Length::Units(BAUD_INPUT_WIDTH)),
            button(text(self.controller.connect_label())).on_press(Message::ToggleConnection),
        ]
        .spacing(SPACING)
        .align_items(Alignment::Center)
        .into()
    }

    fn view_log(&self) -> Element<'_, Message> {
        let lines: Vec<Element<'_, Message>> = self
            .controller
            .log()
            .rendered()
            .map(|line| text(line).into())
            .collect();

        container(
            widget::scrollable(Column::with_children(lines).width(Length::Fill))
                .id(self.log_scroll_id.clone())
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(5)
        .into()
    }

    fn view_send_row(&self) -> Element<'_, Message> {
        row![
            text_input("", self.controller.entry(), Message::EntryChanged)
                .on_submit(Message::Send)
                .padding(5)
                .width(Length::Fill),
            button(text("Send")).on_press(Message::Send),
        ]
        .spacing(SPACING)
        .align_items(Alignment::Center)
        .into()
    }
}

impl Application for Terminal {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = Flags;

    fn new(flags: Flags) -> (Self, Command<Message>) {
        let Flags { transport, config } = flags;

        let controller = Controller::new(transport)
            .with_baud(config.baud)
            .with_preferred_port(config.port.as_deref());

        (
            Self {
                controller,
                log_scroll_id: scrollable::Id::unique(),
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        String::from("Serial Terminal")
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        let lines_before = self.controller.log().len();

        match message {
            Message::PortSelected(port) => self.controller.select_port(port),
            Message::RefreshPorts => self.controller.refresh_ports(),
            Message::BaudChanged(baud) => self.controller.set_baud_input(baud),
            Message::ToggleConnection => self.controller.toggle_connection(),
            Message::EntryChanged(entry) => self.controller.set_entry(entry),
            Message::Send => self.controller.send(),
            Message::PollTick => self.controller.poll_tick(),
            Message::DismissDialog => self.controller.dismiss_dialog(),
            Message::CloseRequested => {
                debug!("Close requested");
                self.controller.close();

                return window::close();
            }
        }

        if self.controller.log().len() > lines_before {
            return snap_to(self.log_scroll_id.clone(), RelativeOffset::END);
        }

        Command::none()
    }

    fn view(&self) -> Element<Message> {
        let dialog = self.controller.dialog();

        if let Some(dialog) = dialog.filter(|dialog| dialog.is_blocking()) {
            return self.view_dialog(dialog);
        }

        let mut content = Column::new().spacing(SPACING).padding(PADDING);

        if let Some(dialog) = dialog {
            content = content.push(self.view_dialog(dialog));
        }

        content
            .push(self.view_connection_row())
            .push(self.view_log())
            .push(self.view_send_row())
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let close_requests = subscription::events_with(|event, _status| match event {
            Event::Window(window::Event::CloseRequested) => Some(Message::CloseRequested),
            _ => None,
        });

        let poll_timer = self.controller.poll_timer();

        if poll_timer.is_active() {
            Subscription::batch(vec![
                close_requests,
                iced::time::every(poll_timer.interval()).map(|_| Message::PollTick),
            ])
        } else {
            close_requests
        }
    }
}
