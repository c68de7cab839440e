use crate::clock::{Clock, SystemClock};
use crate::controller::{
    AddOutcome, DeleteOutcome, DeletePrompt, DialogError, ListController, NewItemSource,
};
use crate::model::{parse_deadline, TodoItem};
use crate::render::{Row, RowStyle};
use crate::storage::{save_items, DataLocation};
use crate::store::StoreHandle;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::error;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

pub fn run(store: StoreHandle, location: DataLocation, list_height: usize) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(store, location, list_height);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    store: StoreHandle,
    controller: ListController,
    location: DataLocation,
    list_height: usize,
    list_offset: usize,
    last_save: Option<Instant>,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    Creating(ItemForm),
    ContextMenu { row: usize },
    ConfirmDelete(DeletePrompt),
}

struct ItemForm {
    short_description: FieldValue,
    details: FieldValue,
    deadline: FieldValue,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    ShortDescription,
    Details,
    Deadline,
}

#[derive(Clone, Default)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        let end = self.cursor;
        self.move_left();
        self.value.replace_range(self.cursor..end, "");
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl ItemForm {
    fn new(today: chrono::NaiveDate) -> Self {
        ItemForm {
            short_description: FieldValue::default(),
            details: FieldValue::default(),
            deadline: FieldValue::new(&today.format("%Y-%m-%d").to_string()),
            field: FormField::ShortDescription,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::ShortDescription => FormField::Details,
            FormField::Details => FormField::Deadline,
            FormField::Deadline => FormField::ShortDescription,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::ShortDescription => FormField::Deadline,
            FormField::Details => FormField::ShortDescription,
            FormField::Deadline => FormField::Details,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FormField::ShortDescription => &mut self.short_description,
            FormField::Details => &mut self.details,
            FormField::Deadline => &mut self.deadline,
        }
    }
}

impl NewItemSource for ItemForm {
    fn collect_new_item(&mut self) -> Result<Option<TodoItem>, DialogError> {
        let deadline = parse_deadline(&self.deadline.value)?;
        let item = TodoItem::new(
            self.short_description.value.clone(),
            self.details.value.clone(),
            deadline,
        )?;
        Ok(Some(item))
    }
}

impl App {
    fn new(store: StoreHandle, location: DataLocation, list_height: usize) -> Self {
        let status = format!("Loaded items from {}", location.path.display());
        let controller = ListController::new(store.clone(), Box::new(SystemClock));
        App {
            store,
            controller,
            location,
            list_height: list_height.max(1),
            list_offset: 0,
            last_save: None,
            status,
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.controller.sync();
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::Creating(_) => self.handle_form_key(key),
            Mode::ContextMenu { .. } => self.handle_menu_key(key),
            Mode::ConfirmDelete(_) => self.handle_confirm_key(key),
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up | KeyCode::Char('k') => self.controller.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.controller.select_next(),
            KeyCode::Char('n') => {
                self.mode = Mode::Creating(ItemForm::new(SystemClock.today()));
                self.status = "New item".into();
            }
            KeyCode::Delete | KeyCode::Char('d') => match self.controller.begin_delete_selected() {
                Some(prompt) => self.ask_delete(prompt),
                None => self.status = "No item selected to delete".into(),
            },
            KeyCode::Char('m') => {
                let row = self
                    .controller
                    .selected_index()
                    .filter(|&row| self.controller.context_menu_target(row).is_some());
                match row {
                    Some(row) => self.mode = Mode::ContextMenu { row },
                    None => self.status = "No item on this row".into(),
                }
            }
            KeyCode::Char('t') => {
                let filter = self.controller.toggle_filter();
                self.list_offset = 0;
                self.status = format!(
                    "Showing {} items ({})",
                    filter.label(),
                    self.controller.projection().len()
                );
            }
            _ => {}
        }
        false
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        let row = match &self.mode {
            Mode::ContextMenu { row } => *row,
            _ => return,
        };
        match key.code {
            KeyCode::Enter | KeyCode::Char('d') | KeyCode::Delete => {
                self.mode = Mode::Normal;
                match self.controller.begin_context_delete(row) {
                    Some(prompt) => self.ask_delete(prompt),
                    None => self.status = "Item no longer exists".into(),
                }
            }
            KeyCode::Esc | KeyCode::Char('m') | KeyCode::Char('q') => self.mode = Mode::Normal,
            _ => {}
        }
    }

    fn ask_delete(&mut self, prompt: DeletePrompt) {
        self.status = format!("{}? (y to confirm, n/Esc to cancel)", prompt.header);
        self.mode = Mode::ConfirmDelete(prompt);
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let confirmed = match key.code {
            KeyCode::Char('y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Esc => false,
            _ => return,
        };
        let prompt = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::ConfirmDelete(prompt) => prompt,
            other => {
                self.mode = other;
                return;
            }
        };
        match self.controller.finish_delete(&prompt, confirmed) {
            DeleteOutcome::Deleted(item) => {
                self.persist(format!("Deleted \"{}\"", item.short_description))
            }
            DeleteOutcome::Cancelled => self.status = "Delete canceled".into(),
            DeleteOutcome::Missing => self.status = "Item no longer exists".into(),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let close = match &mut mode {
            Mode::Creating(form) => self.process_form_key(form, key),
            _ => true,
        };
        if !close {
            self.mode = mode;
        }
    }

    fn process_form_key(&mut self, form: &mut ItemForm, key: KeyEvent) -> bool {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return true;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Left => form.active_field_mut().move_left(),
            KeyCode::Right => form.active_field_mut().move_right(),
            KeyCode::Enter if control || form.field != FormField::Details => {
                return self.submit(form);
            }
            KeyCode::Enter => form.active_field_mut().insert_char('\n'),
            KeyCode::Char('s') if control => return self.submit(form),
            KeyCode::Backspace => form.active_field_mut().backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.active_field_mut().insert_char(c);
                }
            }
            _ => {}
        }
        false
    }

    fn submit(&mut self, form: &mut ItemForm) -> bool {
        match self.controller.add_item(form) {
            Ok(AddOutcome::Added(_)) => {
                let name = self
                    .controller
                    .selected_item()
                    .map(|item| item.short_description)
                    .unwrap_or_default();
                self.persist(format!("Added \"{}\"", name));
                true
            }
            Ok(AddOutcome::Cancelled) => {
                self.status = "Canceled".into();
                true
            }
            Err(err @ DialogError::ResourceLoad { .. }) => {
                self.status = format!("Couldn't load the dialog: {}", err);
                true
            }
            Err(err) => {
                self.status = format!("Could not create: {}", err);
                false
            }
        }
    }

    fn persist(&mut self, message: String) {
        let saved = save_items(&self.location, &self.store.borrow());
        match saved {
            Ok(()) => {
                self.last_save = Some(Instant::now());
                self.status = message;
            }
            Err(err) => {
                error!("event=save status=error reason={:#}", err);
                self.status = format!("{} (not saved: {:#})", message, err);
            }
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(layout[1]);
        self.draw_list(f, body[0]);
        self.draw_detail(f, body[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Creating(form) => draw_form(f, form),
            Mode::ContextMenu { row } => self.draw_context_menu(f, body[0], *row),
            Mode::ConfirmDelete(prompt) => draw_confirm(f, prompt),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "todolist ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.location.scope.label(),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.path.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                save_label(self.last_save),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("showing {}", self.controller.filter().label()),
                Style::default().fg(Color::Magenta),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_list(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let viewport = area.height.saturating_sub(2) as usize;
        let rows = self.controller.rows(self.list_height.max(viewport));
        let items = rows.iter().map(row_item).collect::<Vec<_>>();

        let mut state = ListState::default();
        if let Some(selected) = self.controller.selected_index() {
            self.list_offset = adjust_offset(
                selected,
                self.list_offset,
                viewport,
                self.controller.projection().len(),
            );
            state.select(Some(selected));
        } else {
            self.list_offset = 0;
        }
        *state.offset_mut() = self.list_offset;

        let title = format!(
            "Items [{}] ({}/{})",
            self.controller.filter().label(),
            self.controller.projection().len(),
            self.store.borrow().len()
        );
        let list = List::new(items)
            .block(
                Block::default()
                    .title(Span::styled(
                        title,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(252, 214, 112))
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_detail(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let detail = self.controller.detail();
        let lines = vec![
            Line::from(Span::styled(
                detail.deadline.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ]
        .into_iter()
        .chain(detail.details.lines().map(|l| Line::from(l.to_string())))
        .collect::<Vec<_>>();
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(paragraph, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help = Line::from(vec![
            Span::styled("↑↓ / j k", Style::default().fg(Color::LightCyan)),
            Span::raw(" select  "),
            Span::styled("n", Style::default().fg(Color::LightMagenta)),
            Span::raw(" new  "),
            Span::styled("Del/d", Style::default().fg(Color::LightRed)),
            Span::raw(" delete  "),
            Span::styled("m", Style::default().fg(Color::LightYellow)),
            Span::raw(" menu  "),
            Span::styled("t", Style::default().fg(Color::LightGreen)),
            Span::raw(" today/all  "),
            Span::styled("q", Style::default().fg(Color::LightRed)),
            Span::raw(" quit"),
        ]);
        let help_bar = Paragraph::new(help).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn draw_context_menu(&self, f: &mut ratatui::Frame<'_>, list_area: Rect, row: usize) {
        let row = row.saturating_sub(self.list_offset) as u16;
        let y = (list_area.y + 2 + row).min(list_area.bottom().saturating_sub(3));
        let area = Rect {
            x: list_area.x + 4,
            y,
            width: 14u16.min(list_area.width.saturating_sub(4)),
            height: 3,
        };
        let menu = Paragraph::new(Line::from(Span::styled(
            "Delete",
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightYellow)),
        );
        f.render_widget(Clear, area);
        f.render_widget(menu, area);
    }
}

fn draw_form(f: &mut ratatui::Frame<'_>, form: &ItemForm) {
    let area = centered_rect(70, 60, f.size());
    let mut fields = Vec::new();
    fields.extend(field_lines(
        "Short description",
        &form.short_description,
        form.field == FormField::ShortDescription,
    ));
    fields.extend(field_lines(
        "Details",
        &form.details,
        form.field == FormField::Details,
    ));
    fields.extend(field_lines(
        "Deadline (YYYY-MM-DD)",
        &form.deadline,
        form.field == FormField::Deadline,
    ));
    fields.push(Line::from(""));
    fields.push(Line::from(Span::styled(
        "Ctrl+Enter / Ctrl+S to save • Esc to cancel • Tab to move • Enter adds newline in Details",
        Style::default().fg(Color::Gray),
    )));
    let dialog = Paragraph::new(fields)
        .block(
            Block::default()
                .title(Span::styled(
                    "Add new Todo item",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn draw_confirm(f: &mut ratatui::Frame<'_>, prompt: &DeletePrompt) {
    let area = centered_rect(50, 30, f.size());
    let body = vec![
        Line::from(Span::styled(
            prompt.header.clone(),
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(prompt.body.clone()),
        Line::from("y / Enter = OK, n / Esc = Cancel"),
    ];
    let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
        Block::default()
            .title(Span::styled(
                prompt.title.clone(),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightRed)),
    );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn row_item(row: &Row) -> ListItem<'static> {
    if row.is_empty() {
        return ListItem::new("");
    }
    let text = row.text.clone().unwrap_or_default();
    ListItem::new(text).style(Style::default().fg(row_color(row.style)))
}

fn row_color(style: RowStyle) -> Color {
    match style {
        RowStyle::Overdue => Color::Red,
        RowStyle::DueTomorrow => Color::Green,
        RowStyle::Default => Color::Reset,
    }
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            let lead = if idx == 0 { prefix.clone() } else { spacer.clone() };
            Line::from(vec![
                Span::styled(lead, label_style),
                Span::styled(line.to_string(), value_style),
            ])
        })
        .collect()
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Keeps `selected` inside a `viewport`-row window starting at the returned
/// offset.
fn adjust_offset(selected: usize, current: usize, viewport: usize, len: usize) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let mut offset = current.min(max_offset);
    if selected < offset {
        offset = selected;
    } else if selected >= offset + viewport {
        offset = selected + 1 - viewport;
    }
    offset.min(max_offset)
}

fn save_label(last: Option<Instant>) -> String {
    match last {
        Some(last) => format!("saved {}", format_elapsed(last.elapsed())),
        None => "not saved yet".into(),
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{load_items, DataScope};
    use crate::store::ItemStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn app_with_items() -> (App, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation {
            path: dir.path().join("items.yml"),
            scope: DataScope::Explicit,
        };
        let items = [("Buy water", 2031, 3, 10), ("Mail card", 2031, 4, 25)]
            .into_iter()
            .map(|(name, y, m, d)| {
                TodoItem::new(name, "", NaiveDate::from_ymd_opt(y, m, d).unwrap()).unwrap()
            });
        let store = ItemStore::with_items(items).into_handle();
        (App::new(store, location, 5), dir)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn declining_the_delete_dialog_keeps_the_store() {
        let (mut app, dir) = app_with_items();
        press(&mut app, KeyCode::Delete);
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));
        press(&mut app, KeyCode::Char('n'));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.store.borrow().len(), 2);
        assert!(app.last_save.is_none());
        assert!(!dir.path().join("items.yml").exists());
    }

    #[test]
    fn context_menu_delete_removes_one_item_and_saves() {
        let (mut app, _dir) = app_with_items();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('m'));
        assert!(matches!(app.mode, Mode::ContextMenu { row: 1 }));
        press(&mut app, KeyCode::Enter);
        match &app.mode {
            Mode::ConfirmDelete(prompt) => assert_eq!(prompt.header, "Delete Item: Mail card"),
            _ => panic!("expected the confirmation dialog"),
        }
        press(&mut app, KeyCode::Char('y'));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.store.borrow().len(), 1);
        assert!(app.last_save.is_some());
        let saved = load_items(&app.location).unwrap();
        let names: Vec<_> = saved
            .items()
            .map(|item| item.short_description.clone())
            .collect();
        assert_eq!(names, vec!["Buy water"]);
    }

    #[test]
    fn context_menu_needs_a_selected_row() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation {
            path: dir.path().join("items.yml"),
            scope: DataScope::Explicit,
        };
        let mut app = App::new(ItemStore::new().into_handle(), location, 5);
        press(&mut app, KeyCode::Char('m'));
        assert!(matches!(app.mode, Mode::Normal));
        press(&mut app, KeyCode::Delete);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn cancelled_form_adds_nothing() {
        let (mut app, _dir) = app_with_items();
        press(&mut app, KeyCode::Down);
        let before = app.controller.selected();
        press(&mut app, KeyCode::Char('n'));
        assert!(matches!(app.mode, Mode::Creating(_)));
        type_text(&mut app, "Half typed");
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.store.borrow().len(), 2);
        assert_eq!(app.controller.selected(), before);
    }

    #[test]
    fn bad_deadline_keeps_the_form_open() {
        let (mut app, _dir) = app_with_items();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Buy bread");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        for _ in 0.."YYYY-MM-DD".len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "tomorrow");
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        match &app.mode {
            Mode::Creating(form) => assert_eq!(form.deadline.value, "tomorrow"),
            _ => panic!("form should stay open"),
        }
        assert_eq!(app.store.borrow().len(), 2);
        assert!(app.status.starts_with("Could not create"));
    }

    #[test]
    fn submitted_form_adds_and_selects_the_item() {
        let (mut app, _dir) = app_with_items();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Buy bread");
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.store.borrow().len(), 3);
        let selected = app.controller.selected_item().unwrap();
        assert_eq!(selected.short_description, "Buy bread");
        assert!(app.location.path.exists());
    }

    #[test]
    fn save_label_before_and_after_a_save() {
        assert_eq!(save_label(None), "not saved yet");
        assert!(save_label(Some(Instant::now())).starts_with("saved "));
        assert_eq!(format_elapsed(Duration::from_secs(42)), "42s ago");
        assert_eq!(format_elapsed(Duration::from_secs(150)), "2m ago");
        assert_eq!(format_elapsed(Duration::from_secs(7200)), "2h ago");
    }

    #[test]
    fn field_editing_respects_char_boundaries() {
        let mut field = FieldValue::new("añb");
        field.move_left();
        field.backspace();
        assert_eq!(field.value, "ab");
        field.insert_char('é');
        assert_eq!(field.value, "aéb");
        field.move_right();
        field.move_right();
        assert_eq!(field.cursor, field.value.len());
        assert_eq!(field.with_caret(), "aéb▌");
    }

    #[test]
    fn form_builds_an_item() {
        let mut form = ItemForm::new(NaiveDate::from_ymd_opt(2022, 4, 25).unwrap());
        for ch in "Buy water".chars() {
            form.active_field_mut().insert_char(ch);
        }
        form.next_field();
        form.active_field_mut().insert_char('x');
        let item = form.collect_new_item().unwrap().unwrap();
        assert_eq!(item.short_description, "Buy water");
        assert_eq!(item.details, "x");
        assert_eq!(item.long_deadline(), "April 25, 2022");
    }

    #[test]
    fn form_without_description_is_rejected() {
        let mut form = ItemForm::new(NaiveDate::from_ymd_opt(2022, 4, 25).unwrap());
        assert!(matches!(
            form.collect_new_item(),
            Err(DialogError::Invalid(_))
        ));
    }

    #[test]
    fn offset_follows_selection() {
        assert_eq!(adjust_offset(0, 0, 5, 20), 0);
        assert_eq!(adjust_offset(7, 0, 5, 20), 3);
        assert_eq!(adjust_offset(2, 3, 5, 20), 2);
        assert_eq!(adjust_offset(19, 0, 5, 20), 15);
        assert_eq!(adjust_offset(1, 9, 5, 3), 0);
    }
}
