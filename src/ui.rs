use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use feecalc::{
    format_brl, CalculationRecord, CalculatorSession, GrossResult, Modality, MAX_INSTALLMENTS,
    MIN_INSTALLMENTS,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Calculator,
    History,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Calculator => Page::History,
            Page::History => Page::Calculator,
        }
    }

    pub fn previous(&self) -> Self {
        // two pages: same as next
        self.next()
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Calculator => "Calcular Valor a Cobrar",
            Page::History => "Histórico de Cálculos",
        }
    }
}

/// Form field holding keyboard focus on the calculator page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    Modality,
    Installments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Info(String),
    Error(String),
}

pub struct App {
    pub session: CalculatorSession,
    pub current_page: Page,
    pub focus: Field,
    pub amount_input: String,
    pub modality: Modality,
    /// `None` while the selector is disabled (single-payment modalities)
    pub installments: Option<u32>,
    pub last_result: Option<GrossResult>,
    pub message: Option<Message>,
    pub history_state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(session: CalculatorSession) -> Self {
        let mut history_state = TableState::default();
        if session.history_len() > 0 {
            history_state.select(Some(0));
        }

        Self {
            session,
            current_page: Page::Calculator,
            focus: Field::Amount,
            amount_input: String::new(),
            modality: Modality::DebitNow,
            installments: None,
            last_result: None,
            message: None,
            history_state,
            show_detail: false,
        }
    }

    pub fn installments_enabled(&self) -> bool {
        self.modality.needs_installments()
    }

    pub fn select_modality(&mut self, modality: Modality) {
        self.modality = modality;
        self.installments = if modality.needs_installments() {
            Some(MIN_INSTALLMENTS)
        } else {
            None
        };
    }

    pub fn cycle_modality(&mut self, forward: bool) {
        let all = Modality::ALL;
        let pos = all.iter().position(|m| *m == self.modality).unwrap_or(0);
        let next = if forward {
            (pos + 1) % all.len()
        } else {
            (pos + all.len() - 1) % all.len()
        };
        self.select_modality(all[next]);
    }

    pub fn adjust_installments(&mut self, up: bool) {
        if let Some(n) = self.installments {
            self.installments = Some(if up {
                (n + 1).min(MAX_INSTALLMENTS)
            } else {
                n.saturating_sub(1).max(MIN_INSTALLMENTS)
            });
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            Field::Amount => Field::Modality,
            Field::Modality if self.installments_enabled() => Field::Installments,
            Field::Modality | Field::Installments => Field::Amount,
        };
    }

    pub fn previous_field(&mut self) {
        self.focus = match self.focus {
            Field::Amount if self.installments_enabled() => Field::Installments,
            Field::Amount => Field::Modality,
            Field::Modality => Field::Amount,
            Field::Installments => Field::Modality,
        };
    }

    /// Run the calculation for the current form and record it
    pub fn submit(&mut self) {
        match self
            .session
            .calculate(&self.amount_input, self.modality, self.installments)
        {
            Ok(result) => {
                self.message = Some(Message::Info(format!(
                    "Cálculo registrado: {} em {}",
                    format_brl(result.gross),
                    result.label()
                )));
                self.last_result = Some(result);
                self.history_state.select(Some(0));
            }
            Err(e) => {
                self.last_result = None;
                self.message = Some(Message::Error(e.to_string()));
            }
        }
    }

    pub fn selected_record(&self) -> Option<&CalculationRecord> {
        self.history_state
            .selected()
            .and_then(|i| self.session.history().get(i).copied())
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.session.history_len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.session.history_len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.session.history_len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.history_state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    /// Apply one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return true;
        }

        match key.code {
            KeyCode::BackTab => {
                self.previous_page();
                return false;
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
                return false;
            }
            _ => {}
        }

        match self.current_page {
            Page::Calculator => self.handle_form_key(key),
            Page::History => self.handle_history_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Down => self.next_field(),
            KeyCode::Up => self.previous_field(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('-')
                if self.focus != Field::Amount =>
            {
                let forward = matches!(key.code, KeyCode::Right | KeyCode::Char('+'));
                match self.focus {
                    Field::Modality => self.cycle_modality(forward),
                    Field::Installments => self.adjust_installments(forward),
                    Field::Amount => {}
                }
            }
            KeyCode::Char(c) if self.focus == Field::Amount => {
                if c.is_ascii_digit() || c == ',' || c == '.' || c == '-' {
                    self.amount_input.push(c);
                }
            }
            KeyCode::Backspace if self.focus == Field::Amount => {
                self.amount_input.pop();
            }
            _ => {}
        }
        false
    }

    fn handle_history_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if self.session.history_len() > 0 {
                    self.history_state.select(Some(0));
                }
            }
            KeyCode::End => {
                let len = self.session.history_len();
                if len > 0 {
                    self.history_state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Calculator => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[1]);

            render_form(f, content_chunks[0], app);
            render_result(f, content_chunks[1], app);
        }
        Page::History if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(chunks[1]);

            render_history(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::History => render_history(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Calculator, Page::History].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Registros: {}", app.session.history_len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn field_label(app: &App, field: Field, text: &'static str) -> Span<'static> {
    let style = if app.focus == field {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let marker = if app.focus == field { "→ " } else { "  " };
    Span::styled(format!("{}{}", marker, text), style)
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let installments_text = match app.installments {
        Some(n) => format!("◀ {}x ▶", n),
        None => "(apenas Crédito Parcelado)".to_string(),
    };
    let installments_style = if app.installments_enabled() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let content = vec![
        Line::from(""),
        Line::from(field_label(app, Field::Amount, "Valor Desejado (R$):")),
        Line::from(vec![
            Span::raw("    "),
            Span::styled(
                format!("{}_", app.amount_input),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(field_label(app, Field::Modality, "Modalidade:")),
        Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("◀ {} ▶", app.modality.label()), Style::default().fg(Color::White)),
        ]),
        Line::from(""),
        Line::from(field_label(app, Field::Installments, "Parcelas:")),
        Line::from(vec![Span::raw("    "), Span::styled(installments_text, installments_style)]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Enter",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                " para calcular",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
    ];

    let form = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Calcular Valor a Cobrar "),
    );

    f.render_widget(form, area);
}

fn render_result(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![Line::from("")];

    match &app.last_result {
        Some(result) => {
            content.push(Line::from(vec![
                Span::styled("  Valor a Cobrar: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format_brl(result.gross),
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                ),
            ]));
            content.push(Line::from(""));
            content.push(Line::from(vec![
                Span::styled("  Você Receberá: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("{} (Aprox.)", format_brl(result.net_received)),
                    Style::default().fg(Color::Green),
                ),
            ]));
            content.push(Line::from(""));
            content.push(Line::from(vec![
                Span::styled("  Taxa: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::styled(format_brl(result.fee()), Style::default().fg(Color::Red)),
            ]));
            content.push(Line::from(""));
            let split = if result.is_split() {
                format!(
                    "  📌 {} parcelas de {} (total {})",
                    result.installments,
                    format_brl(result.per_installment),
                    format_brl(result.gross)
                )
            } else {
                format!("  📌 Pagamento à vista de {}", format_brl(result.gross))
            };
            content.push(Line::from(split));
        }
        None => {
            content.push(Line::from(vec![
                Span::styled("  Valor a Cobrar: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(format_brl(0.0)),
            ]));
        }
    }

    content.push(Line::from(""));
    match &app.message {
        Some(Message::Info(text)) => {
            content.push(Line::from(Span::styled(format!("  {}", text), Style::default().fg(Color::Green))));
        }
        Some(Message::Error(text)) => {
            content.push(Line::from(Span::styled(
                format!("  Erro: {}", text),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
        None => {}
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Resultado "),
    );

    f.render_widget(panel, area);
}

fn render_history(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Data", "Desejado (R$)", "Modalidade", "Cobrar (R$)", "Recebido (R$)"]
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

    let rows: Vec<Row> = app
        .session
        .history()
        .into_iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.timestamp_string()),
                Cell::from(format!("{:.2}", record.desired_net)),
                Cell::from(truncate(&record.modality_label, 26)),
                Cell::from(format!("{:.2}", record.gross)).style(Style::default().fg(Color::Blue)),
                Cell::from(format!("{:.2}", record.net_received)).style(Style::default().fg(Color::Green)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(14),
            Constraint::Length(28),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Histórico de Cálculos "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.history_state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Detalhes ");

    let record = match app.selected_record() {
        Some(r) => r,
        None => {
            f.render_widget(Paragraph::new("Nenhum registro selecionado").block(block), area);
            return;
        }
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![label("  Data: "), Span::raw(record.timestamp_string())]),
        Line::from(""),
        Line::from(vec![label("  Modalidade: "), Span::raw(record.modality_label.clone())]),
        Line::from(""),
        Line::from(vec![label("  Desejado: "), Span::raw(format_brl(record.desired_net))]),
        Line::from(""),
        Line::from(vec![
            label("  Cobrar: "),
            Span::styled(format_brl(record.gross), Style::default().fg(Color::Blue)),
        ]),
        Line::from(""),
        Line::from(vec![
            label("  Recebido: "),
            Span::styled(format_brl(record.net_received), Style::default().fg(Color::Green)),
        ]),
        Line::from(""),
        Line::from(vec![
            label("  Taxa: "),
            Span::styled(
                format_brl(record.gross - record.net_received),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Enter para fechar",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |text: &'static str| Span::styled(text, Style::default().fg(Color::Yellow));

    let mut status_spans = vec![];

    match app.current_page {
        Page::Calculator => {
            status_spans.push(key(" ↑/↓"));
            status_spans.push(Span::raw(" Campo | "));
            status_spans.push(key("←/→"));
            status_spans.push(Span::raw(" Opção | "));
            status_spans.push(key("Enter"));
            status_spans.push(Span::raw(" Calcular | "));
        }
        Page::History => {
            let selected = app.history_state.selected().map(|i| i + 1).unwrap_or(0);
            status_spans.push(Span::styled(
                format!(" Linha: {}/{} ", selected, app.session.history_len()),
                Style::default().fg(Color::Cyan),
            ));
            status_spans.push(Span::raw(" | "));
            status_spans.push(key("Enter"));
            status_spans.push(Span::raw(" Detalhes | "));
            status_spans.push(key("PgUp/PgDn"));
            status_spans.push(Span::raw(" Rápido | "));
            status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            status_spans.push(Span::raw(" Sair | "));
        }
    }

    status_spans.push(key("Tab"));
    status_spans.push(Span::raw(" Página | "));
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Sair"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
