use anyhow::Result;
use bank_etl::EnrichedBankRecord;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
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

pub struct App {
    pub table_name: String,
    pub banks: Vec<EnrichedBankRecord>,
    pub state: TableState,
}

impl App {
    pub fn new(table_name: String, banks: Vec<EnrichedBankRecord>) -> Self {
        let mut state = TableState::default();
        if !banks.is_empty() {
            state.select(Some(0));
        }

        Self {
            table_name,
            banks,
            state,
        }
    }

    pub fn average_gbp(&self) -> Option<f64> {
        if self.banks.is_empty() {
            return None;
        }
        let total: f64 = self.banks.iter().map(|b| b.market_cap_gbp).sum();
        Some(total / self.banks.len() as f64)
    }

    pub fn next(&mut self) {
        let len = self.banks.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.banks.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        if self.banks.is_empty() {
            return;
        }
        let i = self.state.selected().unwrap_or(0);
        self.state.select(Some((i + 10).min(self.banks.len() - 1)));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().unwrap_or(0);
        self.state.select(Some(i.saturating_sub(10)));
    }

    pub fn last(&mut self) {
        if !self.banks.is_empty() {
            self.state.select(Some(self.banks.len() - 1));
        }
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
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Bank table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let avg = app
        .average_gbp()
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string());

    let spans = vec![
        Span::styled(
            app.table_name.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Banks: {}", app.banks.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Avg GBP bn: {}", avg),
            Style::default().fg(Color::Green),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Name", "USD bn", "GBP bn", "EUR bn", "INR bn"]
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

    let rows = app.banks.iter().enumerate().map(|(i, bank)| {
        let cells = vec![
            Cell::from((i + 1).to_string()),
            Cell::from(truncate(&bank.name, 40)),
            Cell::from(format!("{:.2}", bank.market_cap_usd)),
            Cell::from(format!("{:.2}", bank.market_cap_gbp)),
            Cell::from(format!("{:.2}", bank.market_cap_eur)),
            Cell::from(format!("{:.2}", bank.market_cap_inr)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(42),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Largest banks by market capitalization "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.banks.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
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
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(n: usize) -> App {
        let banks = (0..n)
            .map(|i| EnrichedBankRecord {
                name: format!("Bank {}", i),
                market_cap_usd: 10.0,
                market_cap_gbp: i as f64,
                market_cap_eur: 9.3,
                market_cap_inr: 829.5,
            })
            .collect();
        App::new("Largest_banks".to_string(), banks)
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app(3);
        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_average_gbp() {
        assert_eq!(app(3).average_gbp(), Some(1.0));
        assert_eq!(app(0).average_gbp(), None);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Banco Santander", 40), "Banco Santander");
        assert_eq!(truncate("Société Générale", 8), "Socié...");
    }

    #[test]
    fn test_truncate_narrow_width() {
        assert_eq!(truncate("Wells Fargo", 2), "...");
        assert_eq!(truncate("Wells Fargo", 0), "...");
    }
}
