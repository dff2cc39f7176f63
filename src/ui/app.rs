use std::collections::HashSet;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{error, info};

use crate::error::LibraryError;
use crate::library::Library;
use crate::models::{Book, BookId, SortCriterion};

use super::forms::Form;
use super::helpers::{book_line, centered_rect, member_line};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Share of the width given to the catalog; members get the rest.
const CATALOG_PERCENT: u16 = 65;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 10;

/// Fine-grained input modes layered over the catalog view.
enum Mode {
    Normal,
    AddingBook(Form),
    AddingMember(Form),
    Issuing(Form),
    Searching(String),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Submits a validated form to the library.
type Submit = fn(&mut App, &Form) -> Result<()>;

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    selected: usize,
    filter: Option<String>,
    sort: Option<SortCriterion>,
    mode: Mode,
    status: Option<StatusMessage>,
    /// Set after the exit save failed, so a second quit leaves anyway.
    quit_armed: bool,
}

impl App {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            selected: 0,
            filter: None,
            sort: None,
            mode: Mode::Normal,
            status: None,
            quit_armed: false,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Process one key press. Returns true when the user asked to leave and
    /// the final save went through (or was explicitly skipped).
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingBook(form) => {
                self.handle_form(code, form, App::submit_book, Mode::AddingBook)
            }
            Mode::AddingMember(form) => {
                self.handle_form(code, form, App::submit_member, Mode::AddingMember)
            }
            Mode::Issuing(form) => self.handle_form(code, form, App::submit_issue, Mode::Issuing),
            Mode::Searching(query) => self.handle_search(code, query),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => *exit = self.request_exit(),
            KeyCode::Esc => {
                if self.filter.is_some() || self.sort.is_some() {
                    self.reset_view();
                } else {
                    *exit = self.request_exit();
                }
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.visible_count().saturating_sub(1),
            KeyCode::Char('b') => {
                self.clear_status();
                return Mode::AddingBook(Form::add_book());
            }
            KeyCode::Char('m') => {
                self.clear_status();
                return Mode::AddingMember(Form::add_member());
            }
            KeyCode::Char('i') => {
                self.clear_status();
                return Mode::Issuing(Form::issue(self.current_book_id()));
            }
            KeyCode::Char('r') => self.return_selected(),
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.clear_status();
                return Mode::Searching(self.filter.clone().unwrap_or_default());
            }
            KeyCode::Char('t') => self.apply_sort(SortCriterion::Title),
            KeyCode::Char('a') => self.apply_sort(SortCriterion::Author),
            KeyCode::Char('c') => self.reset_view(),
            KeyCode::Char('l') => self.reload(),
            KeyCode::Char('s') => match self.library.save() {
                Ok(()) => self.set_status("Saved.", StatusKind::Info),
                Err(err) => self.report_failure(&err),
            },
            _ => {}
        }
        Mode::Normal
    }

    /// Shared key handling for every modal form. `reopen` rebuilds the mode
    /// when the form stays on screen.
    fn handle_form(
        &mut self,
        code: KeyCode,
        mut form: Form,
        submit: Submit,
        reopen: fn(Form) -> Mode,
    ) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", form.title), StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match submit(self, &form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let library_err = err.downcast_ref::<LibraryError>();
                    if let Some(library_err) = library_err {
                        self.report_failure(library_err);
                    } else {
                        self.set_status(err.to_string(), StatusKind::Error);
                    }
                    // Resubmitting cannot fix these, and after a failed
                    // save it would apply the change twice.
                    if library_err.is_some_and(|e| !e.is_recoverable()) {
                        return Mode::Normal;
                    }
                    form.error = Some(err.to_string());
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        reopen(form)
    }

    fn handle_search(&mut self, code: KeyCode, mut query: String) -> Mode {
        match code {
            KeyCode::Esc => {
                self.filter = None;
                self.clamp_selection();
                return Mode::Normal;
            }
            KeyCode::Enter => {
                let shown = self.visible_count();
                self.set_status(format!("{shown} matching book(s)."), StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => query.push(ch),
            _ => {}
        }

        self.filter = if query.is_empty() {
            None
        } else {
            Some(query.clone())
        };
        self.clamp_selection();
        Mode::Searching(query)
    }

    fn submit_book(&mut self, form: &Form) -> Result<()> {
        let (title, author, category) = form.book_inputs()?;
        let book = self.library.add_book(&title, &author, &category)?;
        self.focus_book(book.id);
        self.set_status(
            format!("Book added successfully with ID {}.", book.id),
            StatusKind::Info,
        );
        Ok(())
    }

    fn submit_member(&mut self, form: &Form) -> Result<()> {
        let (name, email) = form.member_inputs()?;
        let member = self.library.add_member(&name, &email)?;
        self.set_status(
            format!("Member added with ID {}.", member.id),
            StatusKind::Info,
        );
        Ok(())
    }

    fn submit_issue(&mut self, form: &Form) -> Result<()> {
        let (book_id, member_id) = form.issue_inputs()?;
        self.library.issue_book(book_id, member_id)?;
        self.focus_book(book_id);
        self.set_status(
            format!("Book {book_id} issued to member {member_id}."),
            StatusKind::Info,
        );
        Ok(())
    }

    /// Take back the highlighted book.
    fn return_selected(&mut self) {
        let Some(book_id) = self.current_book_id() else {
            self.set_status("No book selected to return.", StatusKind::Error);
            return;
        };
        match self.library.return_book(book_id) {
            Ok(()) => {
                self.focus_book(book_id);
                self.set_status(format!("Book {book_id} returned."), StatusKind::Info);
            }
            Err(err) => self.report_failure(&err),
        }
    }

    /// Save once more before leaving. A failed save keeps the session open
    /// until the user quits a second time.
    fn request_exit(&mut self) -> bool {
        if self.quit_armed {
            return true;
        }
        match self.library.save() {
            Ok(()) => {
                info!("saved on exit");
                true
            }
            Err(err) => {
                error!(%err, "save on exit failed");
                self.quit_armed = true;
                self.set_status(
                    format!("{err}. Press q again to quit without saving."),
                    StatusKind::Error,
                );
                false
            }
        }
    }

    fn reload(&mut self) {
        match self.library.load() {
            Ok(()) => {
                self.clamp_selection();
                self.set_status("Reloaded from disk.", StatusKind::Info);
            }
            Err(err) => self.report_failure(&err),
        }
    }

    /// Show a library failure; storage failures are also logged.
    fn report_failure(&mut self, err: &LibraryError) {
        if !err.is_recoverable() {
            error!(%err, "library operation failed");
        }
        self.set_status(err.to_string(), StatusKind::Error);
    }

    /// Catalog rows after applying the current sort and search filter.
    fn visible_books(&self) -> Vec<&Book> {
        match (self.sort, self.filter.as_deref()) {
            (None, None) => self.library.books().collect(),
            (None, Some(query)) => self.library.search_books(query).collect(),
            (Some(criterion), None) => self.library.sort_books(criterion),
            (Some(criterion), Some(query)) => {
                let matching: HashSet<BookId> =
                    self.library.search_books(query).map(|b| b.id).collect();
                self.library
                    .sort_books(criterion)
                    .into_iter()
                    .filter(|b| matching.contains(&b.id))
                    .collect()
            }
        }
    }

    fn visible_count(&self) -> usize {
        self.visible_books().len()
    }

    fn current_book_id(&self) -> Option<BookId> {
        self.visible_books().get(self.selected).map(|b| b.id)
    }

    fn focus_book(&mut self, id: BookId) {
        let position = self.visible_books().iter().position(|b| b.id == id);
        if let Some(idx) = position {
            self.selected = idx;
        }
    }

    fn apply_sort(&mut self, criterion: SortCriterion) {
        let focused = self.current_book_id();
        self.sort = Some(criterion);
        if let Some(id) = focused {
            self.focus_book(id);
        }
        self.set_status(format!("Sorted by {criterion}."), StatusKind::Info);
    }

    fn reset_view(&mut self) {
        self.sort = None;
        self.filter = None;
        self.clamp_selection();
        self.set_status("Showing all books by ID.", StatusKind::Info);
    }

    fn move_selection(&mut self, offset: isize) {
        let count = self.visible_count();
        if count == 0 {
            self.selected = 0;
            return;
        }
        let max = count as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, max) as usize;
    }

    fn clamp_selection(&mut self) {
        let count = self.visible_count();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(CATALOG_PERCENT),
                Constraint::Percentage(100 - CATALOG_PERCENT),
            ])
            .split(content_area);
        self.draw_catalog(frame, columns[0]);
        self.draw_members(frame, columns[1]);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) | Mode::AddingMember(form) | Mode::Issuing(form) => {
                self.draw_form(frame, area, form)
            }
            Mode::Searching(query) => self.draw_search_bar(frame, area, query),
            Mode::Normal => {}
        }
    }

    fn catalog_title(&self) -> String {
        let mut title = String::from("Catalog");
        if let Some(criterion) = self.sort {
            title.push_str(&format!(" - by {criterion}"));
        }
        if let Some(filter) = &self.filter {
            title.push_str(&format!(" - matching \"{filter}\""));
        }
        title
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let books = self.visible_books();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.catalog_title());

        if books.is_empty() {
            let message = if self.filter.is_some() {
                "No books match the search."
            } else {
                "No books yet. Press b to add one."
            };
            let paragraph = Paragraph::new(message)
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = books
            .iter()
            .map(|book| ListItem::new(book_line(book, self.library.holder_of(book.id))))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.selected.min(books.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_members(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .library
            .members()
            .map(|member| ListItem::new(member_line(member)))
            .collect();
        let block = Block::default().borders(Borders::ALL).title("Members");
        if items.is_empty() {
            let paragraph = Paragraph::new("No members yet. Press m to add one.")
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(paragraph, area);
        } else {
            frame.render_widget(List::new(items).block(block), area);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pairs: &[(&str, &str)] = match self.mode {
            Mode::Normal => &[
                ("[b]", " Book  "),
                ("[m]", " Member  "),
                ("[i]", " Issue  "),
                ("[r]", " Return  "),
                ("[/]", " Search  "),
                ("[t/a]", " Sort  "),
                ("[c]", " Clear  "),
                ("[l]", " Reload  "),
                ("[q]", " Quit"),
            ],
            Mode::Searching(_) => &[("[Enter]", " Keep filter  "), ("[Esc]", " Clear")],
            _ => &[
                ("[Tab]", " Next field  "),
                ("[Enter]", " Save  "),
                ("[Esc]", " Cancel"),
            ],
        };

        let spans: Vec<Span<'static>> = pairs
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &Form) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(form.title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|index| form.build_line(index))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save - Tab to switch - Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (offset_x, offset_y) = form.cursor_offset();
        frame.set_cursor_position((inner.x + offset_x, inner.y + offset_y));
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, query: &str) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {query}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }
}
