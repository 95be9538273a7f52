use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::prelude::Backend;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;
use ratatui::widgets::Paragraph;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::domain::models::Action;
use crate::domain::models::Author;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::TextArea;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;

fn header_widget<'a>(app_state: &AppState) -> Paragraph<'a> {
    let version = match app_state.conversation.backend_version() {
        Some(version) => version.to_string(),
        None => "not ready".to_string(),
    };

    let mut llm = "internal";
    if app_state.conversation.use_external_llm() {
        llm = "external";
    }

    let mut update = match app_state.last_refreshed {
        Some(time) => format!("Last: {}", time.format("%Y/%m/%d %I:%M %p")),
        None => "Last: never".to_string(),
    };
    if app_state.refreshing {
        update = "Updating may take a while...".to_string();
    }

    let mut lines = vec![Line::from(vec![
        Span::styled(
            "Timothy",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  version {version} | {llm} LLM | {update} | CTRL+T toggle, CTRL+R update"
        )),
    ])];

    if let Some(status) = &app_state.status {
        lines.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    return Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .padding(Padding::new(1, 1, 0, 0)),
    );
}

fn messages_widget<'a>(app_state: &AppState) -> Paragraph<'a> {
    let mut lines: Vec<Line> = vec![];
    for message in app_state.conversation.messages() {
        let mut color = Color::Gray;
        if message.author == Author::User {
            color = Color::White;
        }

        for (idx, line) in app_state.message_lines(message).into_iter().enumerate() {
            let mut style = Style::default().fg(color);
            if idx == 0 {
                style = style.add_modifier(Modifier::BOLD);
            }
            lines.push(Line::from(Span::styled(line, style)));
        }
        lines.push(Line::from(""));
    }

    return Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .padding(Padding::new(1, 1, 0, 0)),
        )
        .scroll((app_state.scroll.position, 0));
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState,
    tx: mpsc::UnboundedSender<Action>,
    events: &mut EventsService,
) -> Result<()> {
    let mut textarea = TextArea::default();
    let mut loading = Loading::default();

    loop {
        terminal.draw(|frame| {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![
                    Constraint::Length(4),
                    Constraint::Min(1),
                    Constraint::Max(4),
                ])
                .split(frame.size());

            if layout[1].width != app_state.last_known_width
                || layout[1].height != app_state.last_known_height
            {
                app_state.set_rect(layout[1]);
            }

            frame.render_widget(header_widget(app_state), layout[0]);
            frame.render_widget(messages_widget(app_state), layout[1]);

            if app_state.waiting_for_backend() {
                frame.render_widget(loading.widget(), layout[2]);
            } else {
                frame.render_widget(textarea.widget(), layout[2]);
            }
        })?;

        match events.next().await? {
            Event::BackendReady(res) => {
                app_state.handle_readiness_response(res);
            }
            Event::BackendTurnResponse(res) => {
                app_state.handle_turn_response(res);
            }
            Event::BackendDataRefreshed(res) => {
                app_state.handle_refresh_response(res);
            }
            Event::KeyboardCTRLC() => {
                break;
            }
            Event::KeyboardCTRLR() => {
                if app_state.begin_refresh() {
                    tx.send(Action::BackendRefreshData())?;
                }
            }
            Event::KeyboardCTRLT() => {
                let use_external = app_state.toggle_external_llm();
                tracing::debug!(use_external, "Toggled external LLM");
            }
            Event::KeyboardEnter() => {
                let input_str = textarea.lines().join("\n");
                if let Some(request) = app_state.submit(&input_str) {
                    textarea = TextArea::default();
                    tx.send(Action::BackendSendTurn(request))?;
                }
            }
            Event::KeyboardCharInput(input) => {
                if !app_state.waiting_for_backend() {
                    textarea.input(input);
                }
            }
            Event::KeyboardPaste(text) => {
                if !app_state.waiting_for_backend() {
                    for char in text.chars() {
                        match char {
                            '\n' => {
                                textarea.insert_newline();
                            }
                            '\r' => (),
                            _ => {
                                textarea.insert_char(char);
                            }
                        }
                    }
                }
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::UITick() => {
                loading.tick();
            }
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut app_state = AppState::new(
        Config::protocol()?,
        Config::context_window()?,
        Config::external_llm()?,
    );
    let mut events = EventsService::new(rx);

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    tx.send(Action::BackendProbeReadiness())?;
    let res = start_loop(&mut terminal, &mut app_state, tx, &mut events).await;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return res;
}
