//! Ratatui-based terminal UI.
//!
//! The TUI provides the application form on the left and the staged results
//! (prediction, explanation, advice) on the right. Service calls block the
//! loop; the screen is redrawn with the busy state before each call is sent.

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::domain::{ApplicationInput, InputField, Pipeline, RiskLevel};
use crate::error::AppError;
use crate::io::export::{SessionReport, write_session_bundle};
use crate::report::{bar_len, format_percent, format_weight};
use crate::service::{HttpService, PredictionService};
use crate::workflow::{ApplicationWorkflow, CallKind, Stage};

/// Directory for reports written with `w`.
const REPORT_DIR: &str = "reports";

/// Row index of the pipeline selector (after the twelve fields).
const PIPELINE_ROW: usize = InputField::ALL.len();

/// Start the TUI.
pub fn run(service: HttpService, pipeline: Pipeline) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let api_url = service.base_url().to_string();
    let mut app = App::new(service, pipeline, api_url);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
    Call(CallKind),
}

struct App<S> {
    workflow: ApplicationWorkflow<S>,
    /// Draft application being edited; copied into the workflow on submit.
    form: ApplicationInput,
    pipeline: Pipeline,
    selected_row: usize,
    /// Text buffer while a numeric field is being edited.
    editing: Option<String>,
    status: String,
    api_url: String,
}

impl<S: PredictionService> App<S> {
    fn new(service: S, pipeline: Pipeline, api_url: String) -> Self {
        Self {
            workflow: ApplicationWorkflow::new(service),
            form: ApplicationInput::default(),
            pipeline,
            selected_row: 0,
            editing: None,
            status: "Fill in the application and press s to submit.".to_string(),
            api_url,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                self.redraw(terminal)?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match self.handle_key(key.code) {
                        Action::Quit => break,
                        Action::Call(kind) => self.perform(kind, terminal)?,
                        Action::Continue => {}
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn redraw<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        terminal
            .draw(|f| self.draw(f))
            .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
        Ok(())
    }

    /// Issue a service call, showing the busy state while it is in flight.
    fn perform<B: ratatui::backend::Backend>(
        &mut self,
        kind: CallKind,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let Some(call) = self.workflow.begin(kind) else {
            self.status = match kind {
                CallKind::Prediction => "Submit an application first (s).",
                CallKind::Explanation => "Predict first (p).",
                CallKind::Advice => "Predict (p) and explain (e) first.",
            }
            .to_string();
            return Ok(());
        };

        self.status = busy_label(kind).to_string();
        self.redraw(terminal)?;

        self.workflow.finish(call);
        self.status = match self.workflow.error() {
            Some(_) => format!("{} failed.", capitalize(kind.display_name())),
            None => next_hint(self.workflow.stage()).to_string(),
        };
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Action {
        if self.editing.is_some() {
            self.handle_edit(code);
            return Action::Continue;
        }
        if self.workflow.is_busy() {
            return Action::Continue;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Up => {
                self.selected_row = self.selected_row.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_row < PIPELINE_ROW {
                    self.selected_row += 1;
                }
            }
            KeyCode::Left => self.adjust_row(-1),
            KeyCode::Right => self.adjust_row(1),
            KeyCode::Tab => {
                self.pipeline = self.pipeline.next();
                self.status = format!("pipeline: {}", self.pipeline.display_name());
            }
            KeyCode::Enter => match self.selected_field() {
                Some(field) if field.is_numeric() => {
                    self.editing = Some(self.form.display_value(field));
                    self.status = format!("Editing {}. Enter to apply, Esc to cancel.", field.label());
                }
                _ => self.adjust_row(1),
            },
            KeyCode::Char('s') => {
                self.workflow.submit(self.form.clone(), self.pipeline);
                self.status = format!("Submitted ({}). Press p to predict.", self.pipeline.token());
            }
            KeyCode::Char('p') => return Action::Call(CallKind::Prediction),
            KeyCode::Char('e') => return Action::Call(CallKind::Explanation),
            KeyCode::Char('a') => return Action::Call(CallKind::Advice),
            KeyCode::Char('w') => self.write_report(Path::new(REPORT_DIR)),
            _ => {}
        }
        Action::Continue
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let Some(buffer) = self.editing.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let raw = buffer.clone();
                self.editing = None;
                if let Some(field) = self.selected_field() {
                    self.form.set_numeric(field, &raw);
                    self.status = format!("{} = {}", field.label(), self.form.display_value(field));
                }
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => {
                buffer.push(c);
            }
            _ => {}
        }
    }

    fn selected_field(&self) -> Option<InputField> {
        InputField::ALL.get(self.selected_row).copied()
    }

    fn adjust_row(&mut self, delta: i32) {
        if self.selected_row == PIPELINE_ROW {
            self.pipeline = if delta >= 0 { self.pipeline.next() } else { self.pipeline.prev() };
            self.status = format!("pipeline: {}", self.pipeline.display_name());
            return;
        }
        match self.selected_field() {
            Some(InputField::Reason) => {
                self.form.reason = if delta >= 0 { self.form.reason.next() } else { self.form.reason.prev() };
            }
            Some(InputField::Job) => {
                self.form.job = if delta >= 0 { self.form.job.next() } else { self.form.job.prev() };
            }
            _ => {}
        }
    }

    fn write_report(&mut self, dir: &Path) {
        if self.workflow.stage() == Stage::Idle {
            self.status = "Nothing to write yet.".to_string();
            return;
        }
        let report = SessionReport::from_state(self.workflow.state());
        self.status = match write_session_bundle(dir, &report) {
            Ok(path) => format!("Wrote report: {}", path.display()),
            Err(err) => format!("Report write failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("hmeq", Style::default().fg(Color::Cyan)),
            Span::raw(" | Loan Default Prediction"),
        ]));

        let mut info = format!(
            "service: {} | stage: {} | pipeline: {}",
            self.api_url,
            self.workflow.stage().display_name(),
            self.workflow.pipeline().token(),
        );
        if self.workflow.input().is_some_and(|submitted| *submitted != self.form)
            || (self.workflow.input().is_some() && self.workflow.pipeline() != self.pipeline)
        {
            info.push_str(" | form changed since submit");
        }
        lines.push(Line::from(Span::styled(info, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        self.draw_form(frame, chunks[0]);
        self.draw_results(frame, chunks[1]);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut items: Vec<ListItem> = InputField::ALL
            .iter()
            .enumerate()
            .map(|(idx, &field)| {
                let value = match &self.editing {
                    Some(buffer) if idx == self.selected_row => format!("{buffer}_"),
                    _ => self.form.display_value(field),
                };
                let value = if field.is_numeric() { value } else { format!("< {value} >") };
                ListItem::new(format!("{:<36} {value}", field.label()))
            })
            .collect();
        items.push(ListItem::new(format!(
            "{:<36} < {} >",
            "Model Pipeline",
            self.pipeline.display_name()
        )));

        let highlight = if self.editing.is_some() {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::Black).bg(Color::White)
        };
        let list = List::new(items)
            .block(Block::default().title("Loan Application").borders(Borders::ALL))
            .highlight_style(highlight)
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_row));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_results(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let error_height = if self.workflow.error().is_some() { 3 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(6),
                Constraint::Length(10),
                Constraint::Length(error_height),
            ])
            .split(area);

        self.draw_prediction(frame, chunks[0]);
        self.draw_explanation(frame, chunks[1]);
        self.draw_advice(frame, chunks[2]);
        if error_height > 0 {
            self.draw_error(frame, chunks[3]);
        }
    }

    fn draw_prediction(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Default Prediction").borders(Borders::ALL);
        let Some(p) = self.workflow.probability() else {
            let hint = if self.workflow.stage() == Stage::Idle {
                "Submit an application (s)."
            } else {
                "Press p to predict the default probability."
            };
            frame.render_widget(placeholder(hint).block(block), area);
            return;
        };

        let risk = RiskLevel::from_probability(p);
        let gauge = Gauge::default()
            .block(block.title_bottom(format!("Risk Level: {}", risk.display_name())))
            .gauge_style(Style::default().fg(risk_color(risk)))
            .ratio(p.clamp(0.0, 1.0))
            .label(format!("Probability of Default {}", format_percent(p)));
        frame.render_widget(gauge, area);
    }

    fn draw_explanation(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Explanation (+ raises risk, - lowers it)")
            .borders(Borders::ALL);
        let Some(attribution) = self.workflow.attribution() else {
            let hint = if self.workflow.probability().is_some() {
                "Press e to explain the prediction."
            } else {
                ""
            };
            frame.render_widget(placeholder(hint).block(block), area);
            return;
        };

        let inner_width = area.width.saturating_sub(2) as usize;
        let name_width = attribution
            .pairs()
            .iter()
            .map(|(n, _)| n.chars().count())
            .max()
            .unwrap_or(0)
            .min(inner_width / 2);
        let bar_width = inner_width.saturating_sub(name_width + 11);

        let lines: Vec<Line> = attribution
            .display_order()
            .into_iter()
            .map(|(name, weight)| {
                let color = if weight > 0.0 { Color::Red } else { Color::Green };
                let name: String = name.chars().take(name_width).collect();
                Line::from(vec![
                    Span::raw(format!("{name:<name_width$} ")),
                    Span::styled(format!("{:>8} ", format_weight(weight)), Style::default().fg(color)),
                    Span::styled("█".repeat(bar_len(weight, bar_width)), Style::default().fg(color)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_advice(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("AI Agent Analysis").borders(Borders::ALL);
        let Some(advisory) = self.workflow.advisory() else {
            let hint = if self.workflow.attribution().is_some() {
                "Press a to get advice."
            } else {
                ""
            };
            frame.render_widget(placeholder(hint).block(block), area);
            return;
        };

        let heading = Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(Span::styled("Interpretation", heading))];
        lines.extend(advisory.interpretation.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Financial Advice", heading)));
        lines.extend(advisory.recommendation.lines().map(|l| Line::from(l.to_string())));

        let p = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(p, area);
    }

    fn draw_error(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(err) = self.workflow.error() else {
            return;
        };
        let p = Paragraph::new(Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(err, Style::default().fg(Color::Red)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ change  Enter edit  Tab pipeline  s submit  p predict  e explain  a advice  w write  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn placeholder(hint: &str) -> Paragraph<'_> {
    Paragraph::new(hint).style(Style::default().fg(Color::DarkGray))
}

fn risk_color(risk: RiskLevel) -> Color {
    match risk {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Red,
    }
}

fn busy_label(kind: CallKind) -> &'static str {
    match kind {
        CallKind::Prediction => "Predicting...",
        CallKind::Explanation => "Generating Explanation...",
        CallKind::Advice => "Getting Advice...",
    }
}

fn next_hint(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "Press s to submit.",
        Stage::InputReady => "Press p to predict.",
        Stage::Predicted => "Press e to explain the prediction.",
        Stage::Explained => "Press a to get advice.",
        Stage::Advised => "Done. Press w to write a report.",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
