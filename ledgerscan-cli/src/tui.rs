//! Interactive four-screen UI: key selection, idle, loading, result/error.

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event as TermEvent, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ledgerscan_core::{
    AppState, BalanceDirection, Effect, Event, Screen, Session, Transaction,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use tracing::{error, info};

use crate::output::{self, HEADERS};
use crate::paths::{parse_path_list, stage};
use crate::worker::{ExtractionDone, spawn_extraction};

type Term = Terminal<CrosstermBackend<Stdout>>;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Quit,
    Send(Event),
    Submit,
    Type(char),
    Backspace,
    Export,
    Scroll(isize),
    Nothing,
}

fn map_key(screen: Screen, key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match (screen, key.code) {
        (_, KeyCode::Char('c')) if ctrl => Action::Quit,
        (_, KeyCode::Esc) => Action::Quit,

        (Screen::Gated, KeyCode::Enter | KeyCode::Char('k')) => Action::Send(Event::SelectKeyRequested),
        (Screen::Gated, KeyCode::Char('q')) => Action::Quit,
        (Screen::Gated, _) => Action::Nothing,

        (_, KeyCode::Char('k')) if ctrl => Action::Send(Event::SelectKeyRequested),
        (_, KeyCode::Char('x')) if ctrl => Action::Send(Event::Cleared),
        (_, KeyCode::Char('s')) if ctrl => Action::Export,
        (_, KeyCode::Enter) => Action::Submit,
        (_, KeyCode::Backspace) => Action::Backspace,
        (_, KeyCode::Up) => Action::Scroll(-1),
        (_, KeyCode::Down) => Action::Scroll(1),
        (_, KeyCode::PageUp) => Action::Scroll(-10),
        (_, KeyCode::PageDown) => Action::Scroll(10),
        (_, KeyCode::Char(c)) if !ctrl => Action::Type(c),
        _ => Action::Nothing,
    }
}

struct Ui {
    session: Session,
    handle: tokio::runtime::Handle,
    tx: Sender<ExtractionDone>,
    rx: Receiver<ExtractionDone>,
    input: String,
    notice: Option<String>,
    scroll: usize,
    tick: usize,
    export_dir: PathBuf,
}

/// Blocking entry point; call it from a blocking thread of the runtime.
pub fn run_tui(session: Session, handle: tokio::runtime::Handle, export_dir: PathBuf) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut ui = Ui {
        session,
        handle,
        tx,
        rx,
        input: String::new(),
        notice: None,
        scroll: 0,
        tick: 0,
        export_dir,
    };

    ui.handle.block_on(ui.session.boot());

    let mut terminal = enter()?;
    let res = ui_loop(&mut terminal, &mut ui);
    leave(&mut terminal)?;
    res
}

fn enter() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn leave(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)?;
    terminal.show_cursor()?;
    Ok(())
}

fn ui_loop(terminal: &mut Term, ui: &mut Ui) -> Result<()> {
    loop {
        while let Ok(done) = ui.rx.try_recv() {
            let ev = ui.session.finished(done.run, done.outcome);
            ui.apply(ev, terminal)?;
        }

        terminal.draw(|f| draw(f, ui))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    match map_key(ui.session.state().screen(), key) {
                        Action::Quit => break,
                        Action::Send(ev) => {
                            if ev == Event::Cleared {
                                ui.input.clear();
                                ui.scroll = 0;
                            }
                            ui.notice = None;
                            ui.apply(ev, terminal)?;
                        }
                        Action::Submit => ui.submit(terminal)?,
                        Action::Type(c) => ui.input.push(c),
                        Action::Backspace => {
                            ui.input.pop();
                        }
                        Action::Export => ui.export(),
                        Action::Scroll(d) => {
                            let max = ui.session.state().transactions().len().saturating_sub(1);
                            ui.scroll = ui.scroll.saturating_add_signed(d).min(max);
                        }
                        Action::Nothing => {}
                    }
                }
                TermEvent::Paste(text) => {
                    if ui.session.state().screen() != Screen::Gated {
                        ui.input.push_str(text.trim_end_matches(['\n', '\r']));
                    }
                }
                _ => {}
            }
        }

        ui.tick = ui.tick.wrapping_add(1);
    }
    Ok(())
}

impl Ui {
    fn apply(&mut self, event: Event, terminal: &mut Term) -> Result<()> {
        let Some(effect) = self.session.dispatch(event) else {
            return Ok(());
        };
        match effect {
            Effect::Extract { run, files } => {
                self.scroll = 0;
                spawn_extraction(&self.handle, self.session.extractor(), run, files, self.tx.clone());
            }
            Effect::OpenSelectionDialog => {
                // the dialog reads from the real terminal
                leave(terminal)?;
                println!("\nSelect a Gemini API key (https://ai.google.dev/gemini-api/docs/api-key).");
                let ev = self.handle.block_on(self.session.perform(Effect::OpenSelectionDialog));
                *terminal = enter()?;
                terminal.clear()?;
                self.apply(ev, terminal)?;
            }
            Effect::CheckCredential => {
                let ev = self.handle.block_on(self.session.perform(Effect::CheckCredential));
                self.apply(ev, terminal)?;
            }
        }
        Ok(())
    }

    fn submit(&mut self, terminal: &mut Term) -> Result<()> {
        self.notice = None;
        if self.input.trim().is_empty() {
            return self.apply(Event::ExtractRequested, terminal);
        }

        let files = stage(parse_path_list(&self.input));
        self.apply(Event::FilesSelected(files.clone()), terminal)?;
        if self.session.state().files() == files.as_slice() {
            self.input.clear();
            self.scroll = 0;
        }
        Ok(())
    }

    fn export(&mut self) {
        let rows = self.session.state().transactions();
        if rows.is_empty() {
            self.notice = Some("Nothing to save yet.".to_string());
            return;
        }
        let path = self.export_dir.join(output::export_file_name(chrono::Local::now()));
        self.notice = Some(match output::export_csv(rows, &path) {
            Ok(()) => {
                info!(rows = rows.len(), path = %path.display(), "exported transactions");
                format!("Saved {} row(s) to {}", rows.len(), path.display())
            }
            Err(e) => {
                error!(error = %e, "export failed");
                format!("Export failed: {e:#}")
            }
        });
    }
}

fn draw(f: &mut Frame, ui: &Ui) {
    let state = ui.session.state();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(f.area());

    let header = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            "Bank Statement Analyzer",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Upload bank statement images and let Gemini extract the transactions.",
            Style::default().fg(Color::Gray),
        )),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    if state.screen() == Screen::Gated {
        draw_gate(f, chunks[1], state);
    } else {
        draw_main(f, chunks[1], ui);
    }

    let footer = Paragraph::new(footer_line(ui)).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn error_lines(state: &AppState) -> Vec<Line<'static>> {
    match state.error() {
        Some(e) => vec![
            Line::from(Span::styled(
                "Error",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(e.to_string(), Style::default().fg(Color::Red))),
        ],
        None => Vec::new(),
    }
}

fn draw_gate(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Provide Your Gemini API Key",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw("A Google Gemini API key is required to process bank statements."),
        Line::raw("The key is only used for calls made from this session."),
        Line::raw(""),
        Line::from(Span::styled(
            "Press Enter to select an API key",
            Style::default().fg(Color::Yellow),
        )),
        Line::raw(""),
    ];
    lines.extend(error_lines(state));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Billing: https://ai.google.dev/gemini-api/docs/billing",
        Style::default().fg(Color::DarkGray),
    )));

    let p = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("api key"));
    f.render_widget(p, area);
}

fn draw_main(f: &mut Frame, area: Rect, ui: &Ui) {
    let state = ui.session.state();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(area);

    let input = Paragraph::new(ui.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("statement images: type or drop paths, Enter to select"),
    );
    f.render_widget(input, chunks[0]);

    let selected = match state.files().len() {
        0 => Line::from(Span::styled(
            "PNG, JPG, GIF, WEBP. No files selected.",
            Style::default().fg(Color::DarkGray),
        )),
        n => {
            let names: Vec<String> = state.files().iter().map(|s| s.display_name()).collect();
            Line::from(format!("{n} file(s) selected: {}", names.join(", ")))
        }
    };
    f.render_widget(
        Paragraph::new(selected).block(Block::default().borders(Borders::ALL).title("selection")),
        chunks[1],
    );

    let body = chunks[2];
    match state.screen() {
        Screen::Extracting => {
            let spin = SPINNER[ui.tick % SPINNER.len()];
            let p = Paragraph::new(format!("{spin} Processing..."))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(p, body);
        }
        Screen::Succeeded if !state.transactions().is_empty() => {
            draw_table(f, body, state.transactions(), ui.scroll);
        }
        _ => {
            let mut lines = error_lines(state);
            if state.screen() == Screen::Succeeded {
                lines.push(Line::raw("No transactions were found in the uploaded statement(s)."));
            } else if state.is_ready() {
                lines.push(Line::raw("Ready to process. Press Enter to extract."));
            }
            let p = Paragraph::new(Text::from(lines))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(p, body);
        }
    }
}

fn draw_table(f: &mut Frame, area: Rect, rows: &[Transaction], scroll: usize) {
    let right = |s: String, style: Style| Cell::from(Line::from(s).alignment(Alignment::Right)).style(style);

    let body: Vec<Row> = rows
        .iter()
        .skip(scroll)
        .map(|t| {
            let [date, particulars, payments, receipts, balance] = output::cells(t);
            let balance_style = match t.balance_direction() {
                Some(BalanceDirection::Debit) => Style::default().fg(Color::Red),
                Some(BalanceDirection::Credit) => Style::default().fg(Color::Green),
                None => Style::default(),
            };
            Row::new(vec![
                Cell::from(date),
                Cell::from(particulars),
                right(payments, Style::default().fg(Color::Red)),
                right(receipts, Style::default().fg(Color::Green)),
                right(balance, balance_style),
            ])
        })
        .collect();

    let header = Row::new(HEADERS.iter().enumerate().map(|(i, h)| {
        let line = Line::from(h.to_uppercase());
        Cell::from(if i >= 2 { line.alignment(Alignment::Right) } else { line })
    }))
    .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));

    let table = Table::new(
        body,
        [
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .column_spacing(2)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Extracted Transactions ({})", rows.len())),
    );
    f.render_widget(table, area);
}

fn footer_line(ui: &Ui) -> Line<'static> {
    if let Some(n) = &ui.notice {
        return Line::from(Span::styled(n.clone(), Style::default().fg(Color::Yellow)));
    }

    let state = ui.session.state();
    if state.screen() == Screen::Gated {
        return Line::from(Span::styled(
            "Enter=select key  Esc=quit",
            Style::default().fg(Color::Gray),
        ));
    }

    let enabled = Style::default().fg(Color::Gray);
    let disabled = Style::default().fg(Color::DarkGray);
    let extract_label = if state.in_flight().is_some() { "Processing..." } else { "Enter=extract" };
    Line::from(vec![
        Span::styled(extract_label, if state.can_extract() { enabled } else { disabled }),
        Span::styled("  Ctrl+X=clear  Ctrl+S=save csv  Ctrl+K=change key  Esc=quit", enabled),
    ])
}
