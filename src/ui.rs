use crate::form::{FormField, FormMode};
use crate::query::{FilterField, SortDirection, SortField};
use crate::repository::StudentRepository;
use crate::session::{Action, Effect, MutationKind, Session};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};

/// Shell state: the session plus purely presentational bits (row cursor,
/// staged toolbar inputs, form focus). All business transitions go
/// through `Session::handle`.
pub struct App {
    pub session: Session,
    pub table_state: TableState,
    filter_field: FilterField,
    keyword_buffer: Option<String>,
    sort_field: SortField,
    sort_direction: SortDirection,
    form_focus: usize,
}

enum KeyResult {
    Continue(Vec<Effect>),
    Quit,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            table_state: TableState::default(),
            filter_field: FilterField::FirstName,
            keyword_buffer: None,
            sort_field: SortField::StudentId,
            sort_direction: SortDirection::Asc,
            form_focus: 0,
        }
    }

    fn selected_record(&self) -> Option<&crate::student::StudentRecord> {
        self.table_state
            .selected()
            .and_then(|i| self.session.list.records.get(i))
    }

    fn next_row(&mut self) {
        let len = self.session.list.records.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    fn previous_row(&mut self) {
        let len = self.session.list.records.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    /// Keep the row cursor inside the (possibly replaced) record list.
    fn sync_cursor(&mut self) {
        let len = self.session.list.records.len();
        if len == 0 {
            self.table_state.select(None);
        } else {
            let i = self.table_state.selected().unwrap_or(0).min(len - 1);
            self.table_state.select(Some(i));
        }
    }

    fn move_form_focus(&mut self, forward: bool) {
        let count = FormField::ALL.len();
        let locked_id = self.session.form.mode() == Some(FormMode::Edit);

        let mut i = self.form_focus;
        loop {
            i = if forward {
                (i + 1) % count
            } else {
                (i + count - 1) % count
            };
            // identifier is the match key in Edit mode, skip it
            if !(locked_id && FormField::ALL[i] == FormField::StudentId) {
                break;
            }
        }
        self.form_focus = i;
    }

    fn handle_key(&mut self, code: KeyCode) -> KeyResult {
        if self.session.form.is_open() {
            return self.handle_form_key(code);
        }
        if self.session.pending_delete.is_some() {
            return self.handle_confirm_key(code);
        }
        if self.session.analytics.open {
            return match code {
                KeyCode::Esc | KeyCode::Char('a') | KeyCode::Enter => {
                    KeyResult::Continue(self.session.handle(Action::CloseAnalytics))
                }
                _ => KeyResult::Continue(Vec::new()),
            };
        }
        if self.keyword_buffer.is_some() {
            return self.handle_keyword_key(code);
        }
        self.handle_table_key(code)
    }

    fn handle_form_key(&mut self, code: KeyCode) -> KeyResult {
        let effects = match code {
            KeyCode::Esc => {
                self.form_focus = 0;
                self.session.handle(Action::CancelForm)
            }
            KeyCode::Enter => self.session.handle(Action::SubmitForm),
            KeyCode::Down | KeyCode::Tab => {
                self.move_form_focus(true);
                Vec::new()
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.move_form_focus(false);
                Vec::new()
            }
            KeyCode::Backspace => {
                let field = FormField::ALL[self.form_focus];
                if let Some(draft) = self.session.form.draft_mut() {
                    draft.field_mut(field).pop();
                }
                Vec::new()
            }
            KeyCode::Char(c) => {
                let field = FormField::ALL[self.form_focus];
                if let Some(draft) = self.session.form.draft_mut() {
                    draft.field_mut(field).push(c);
                }
                Vec::new()
            }
            _ => Vec::new(),
        };
        KeyResult::Continue(effects)
    }

    fn handle_confirm_key(&mut self, code: KeyCode) -> KeyResult {
        let effects = match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.session.handle(Action::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.session.handle(Action::DeclineDelete)
            }
            _ => Vec::new(),
        };
        KeyResult::Continue(effects)
    }

    fn handle_keyword_key(&mut self, code: KeyCode) -> KeyResult {
        let effects = match code {
            KeyCode::Enter => {
                let keyword = self.keyword_buffer.take().unwrap_or_default();
                self.session.handle(Action::Search {
                    field: self.filter_field,
                    keyword,
                })
            }
            KeyCode::Esc => {
                self.keyword_buffer = None;
                Vec::new()
            }
            KeyCode::Tab => {
                self.filter_field = self.filter_field.next();
                Vec::new()
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.keyword_buffer.as_mut() {
                    buffer.pop();
                }
                Vec::new()
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.keyword_buffer.as_mut() {
                    buffer.push(c);
                }
                Vec::new()
            }
            _ => Vec::new(),
        };
        KeyResult::Continue(effects)
    }

    fn handle_table_key(&mut self, code: KeyCode) -> KeyResult {
        let effects = match code {
            KeyCode::Char('q') => return KeyResult::Quit,
            KeyCode::Down | KeyCode::Char('j') => {
                self.next_row();
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.previous_row();
                Vec::new()
            }
            KeyCode::Left | KeyCode::Char('h') => self.session.handle(Action::PrevPage),
            KeyCode::Right | KeyCode::Char('l') => self.session.handle(Action::NextPage),
            KeyCode::Char('/') => {
                self.keyword_buffer = Some(self.session.list.state.keyword.clone());
                Vec::new()
            }
            KeyCode::Char('s') => {
                self.sort_field = self.sort_field.next();
                self.session.handle(Action::ApplySort {
                    field: self.sort_field,
                    direction: self.sort_direction,
                })
            }
            KeyCode::Char('o') => {
                self.sort_direction = self.sort_direction.toggled();
                self.session.handle(Action::ApplySort {
                    field: self.sort_field,
                    direction: self.sort_direction,
                })
            }
            KeyCode::Char('n') => {
                self.form_focus = 0;
                self.session.handle(Action::OpenCreate)
            }
            KeyCode::Char('e') => match self.selected_record().cloned() {
                Some(record) => {
                    // start on the first editable field, id is locked
                    self.form_focus = 1;
                    self.session.handle(Action::OpenEdit(record))
                }
                None => Vec::new(),
            },
            KeyCode::Char('d') => match self.selected_record().map(|r| r.student_id.clone()) {
                Some(id) => self.session.handle(Action::RequestDelete(id)),
                None => Vec::new(),
            },
            KeyCode::Char('a') => self.session.handle(Action::OpenAnalytics),
            KeyCode::Esc => self.session.handle(Action::DismissNotice),
            _ => Vec::new(),
        };
        KeyResult::Continue(effects)
    }
}

/// Run each request effect as a detached task and feed the result back
/// into the event loop as an action.
fn dispatch(repo: &StudentRepository, tx: &UnboundedSender<Action>, effects: Vec<Effect>) {
    for effect in effects {
        let repo = repo.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let action = match effect {
                Effect::FetchList(request) => Action::ListArrived {
                    seq: request.seq,
                    outcome: repo.list(&request).await,
                },
                Effect::FetchAnalysis => Action::AnalysisArrived(repo.analysis().await),
                Effect::Create(record) => Action::MutationDone {
                    kind: MutationKind::Create,
                    outcome: repo.create(&record).await,
                },
                Effect::Update(record) => Action::MutationDone {
                    kind: MutationKind::Update,
                    outcome: repo.update(&record).await,
                },
                Effect::Delete(id) => Action::MutationDone {
                    kind: MutationKind::Delete,
                    outcome: repo.delete(&id).await,
                },
            };
            // receiver gone means the UI is shutting down
            let _ = tx.send(action);
        });
    }
}

pub async fn run_ui(session: Session, repository: StudentRepository) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, App::new(session), repository).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    repository: StudentRepository,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let effects = app.session.start();
    dispatch(&repository, &tx, effects);

    loop {
        // apply completed requests before drawing
        while let Ok(action) = rx.try_recv() {
            let effects = app.session.handle(action);
            app.sync_cursor();
            dispatch(&repository, &tx, effects);
        }

        terminal.draw(|f| ui(f, &mut app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.handle_key(key.code) {
                    KeyResult::Quit => return Ok(()),
                    KeyResult::Continue(effects) => {
                        app.sync_cursor();
                        dispatch(&repository, &tx, effects);
                    }
                }
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with page/filter summary
            Constraint::Min(0),    // Student table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);

    // Overlays, last so they sit on top
    if app.session.form.is_open() {
        render_form(f, app);
    } else if let Some(id) = app.session.pending_delete.clone() {
        render_confirm(f, &id);
    } else if app.session.analytics.open {
        render_analytics(f, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let list = &app.session.list;

    let mut spans = vec![
        Span::styled(
            "Student Records",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Page {}/{}", list.state.page, list.total_pages),
            Style::default().fg(Color::White),
        ),
    ];

    if list.loading {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "loading...",
            Style::default().fg(Color::DarkGray),
        ));
    }

    spans.push(Span::raw("  |  Filter: "));
    let keyword_display = match &app.keyword_buffer {
        Some(buffer) => format!("{} = \"{}\"▏", app.filter_field.label(), buffer),
        None => {
            if list.state.keyword.trim().is_empty() {
                "none".to_string()
            } else {
                format!(
                    "{} = \"{}\"",
                    list.state.filter_field.label(),
                    list.state.keyword
                )
            }
        }
    };
    spans.push(Span::styled(
        keyword_display,
        Style::default().fg(if app.keyword_buffer.is_some() {
            Color::Green
        } else {
            Color::Cyan
        }),
    ));

    spans.push(Span::raw("  |  Sort: "));
    spans.push(Span::styled(
        format!(
            "{} {}",
            app.sort_field.label(),
            if app.sort_direction.is_ascending() {
                "asc"
            } else {
                "desc"
            }
        ),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Full Name", "Email", "Hometown", "Math", "Lit", "Eng"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.session.list.records.iter().map(|record| {
        let cells = vec![
            Cell::from(record.student_id.clone()),
            Cell::from(record.full_name()),
            Cell::from(record.email.clone()),
            Cell::from(record.hometown.clone()),
            Cell::from(format!("{:.1}", record.math_score)),
            Cell::from(format!("{:.1}", record.literature_score)),
            Cell::from(format!("{:.1}", record.english_score)),
        ];
        Row::new(cells).height(1)
    });

    let title = if app.session.list.loading {
        " Students (loading...) "
    } else {
        " Students "
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(24),
            Constraint::Length(28),
            Constraint::Length(16),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let spans = if let Some(notice) = &app.session.notice {
        vec![
            Span::styled(
                format!(" {} ", notice),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("(Esc to dismiss)", Style::default().fg(Color::DarkGray)),
        ]
    } else {
        vec![
            Span::styled(" /", Style::default().fg(Color::Yellow)),
            Span::raw(" Search | "),
            Span::styled("s/o", Style::default().fg(Color::Yellow)),
            Span::raw(" Sort | "),
            Span::styled("←/→", Style::default().fg(Color::Yellow)),
            Span::raw(" Page | "),
            Span::styled("n", Style::default().fg(Color::Yellow)),
            Span::raw(" Add | "),
            Span::styled("e", Style::default().fg(Color::Yellow)),
            Span::raw(" Edit | "),
            Span::styled("d", Style::default().fg(Color::Yellow)),
            Span::raw(" Delete | "),
            Span::styled("a", Style::default().fg(Color::Yellow)),
            Span::raw(" Analytics | "),
            Span::styled("q", Style::default().fg(Color::Red)),
            Span::raw(" Quit"),
        ]
    };

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_form(f: &mut Frame, app: &App) {
    let draft = match app.session.form.draft() {
        Some(draft) => draft,
        None => return,
    };
    let mode = app.session.form.mode().unwrap_or(FormMode::Create);

    let title = match mode {
        FormMode::Create => " Create New Student ",
        FormMode::Edit => " Edit Student ",
    };

    let mut lines = vec![Line::from("")];
    for (i, field) in FormField::ALL.iter().enumerate() {
        let locked = mode == FormMode::Edit && *field == FormField::StudentId;
        let focused = i == app.form_focus && !locked;

        let label_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };

        let value = draft.field(*field);
        let value_display = if focused {
            format!("{}▏", value)
        } else if locked {
            format!("{} (locked)", value)
        } else {
            value.to_string()
        };

        lines.push(Line::from(vec![
            Span::styled(format!("  {:<14}", field.label()), label_style),
            Span::raw(value_display),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Save | "),
        Span::styled("Tab/↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Field | "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" Cancel"),
    ]));

    let area = centered_rect(54, 15, f.size());
    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );

    f.render_widget(Clear, area);
    f.render_widget(form, area);
}

fn render_confirm(f: &mut Frame, student_id: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::raw(format!(
            "  Are you sure you want to delete student {}?",
            student_id
        ))),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                "y",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Delete | "),
            Span::styled(
                "n",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Keep"),
        ]),
    ];

    let area = centered_rect(56, 6, f.size());
    let confirm = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Confirm Delete "),
    );

    f.render_widget(Clear, area);
    f.render_widget(confirm, area);
}

fn render_analytics(f: &mut Frame, app: &App) {
    let distribution = match &app.session.analytics.distribution {
        Some(distribution) => distribution,
        None => return,
    };

    let header_cells = ["", "Math", "Literature", "English"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1);

    let rows = distribution.bucket_rows().into_iter().map(|bucket| {
        Row::new(vec![
            Cell::from(bucket.label),
            Cell::from(format!("{:.1}%", bucket.math)),
            Cell::from(format!("{:.1}%", bucket.literature)),
            Cell::from(format!("{:.1}%", bucket.english)),
        ])
        .height(1)
    });

    let area = centered_rect(60, 14, f.size());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Score Distribution (%) "),
    );

    let mut summary_lines = vec![Line::from("")];
    for (subject, max, min) in distribution.summary_rows() {
        summary_lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<12}", subject),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(format!("max {:.1} / min {:.1}", max, min)),
        ]));
    }
    summary_lines.push(Line::from(""));
    summary_lines.push(Line::from(Span::styled(
        "  Esc to close",
        Style::default().fg(Color::DarkGray),
    )));

    let summary = Paragraph::new(summary_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Max/Min Points "),
    );

    f.render_widget(Clear, area);
    f.render_widget(table, chunks[0]);
    f.render_widget(summary, chunks[1]);
}

/// Fixed-size rect centered in `area`, clipped to it.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
