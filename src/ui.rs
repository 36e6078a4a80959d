use crate::date::{
    add_months, build_threshold_list, is_leap_year, month_label, parse_ymd, start_of_month,
    weeks_in_month, ymd, WeekStart,
};
use crate::model::{
    clamp_rating, parse_categories, EntryDraft, FilterState, Journal, JournalEntry, Source,
};
use crate::storage;
use crate::window::{MonthKeymap, MonthWindow, NavCommand, ScrollMetrics};
use anyhow::{bail, Result};
use chrono::{Datelike, Local, NaiveDate};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use std::collections::BTreeMap;
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

/// Releasing a horizontal drag past this displacement flips the viewer page.
const DRAG_THRESHOLD: i32 = 120;
/// Terminal cells are coarse; one cell of drag counts as this many gesture units.
const DRAG_UNITS_PER_CELL: i32 = 12;

const MONTH_TITLE_ROWS: u16 = 2;
const WEEKDAY_ROWS: u16 = 1;
const DAY_CELL_ROWS: u16 = 4;
const MONTH_GAP_ROWS: u16 = 1;

const SCROLL_STEP: i32 = 3;

pub fn run(journal: Journal, store_path: PathBuf, feed_url: String) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(journal, store_path);
    let remote_rx = spawn_remote_fetch(feed_url);
    let result = app.event_loop(&mut terminal, remote_rx);
    teardown_terminal(&mut terminal)?;
    result
}

/// The one suspension point: the feed fetch runs on a detached worker and
/// delivers over a channel polled by the event loop. Not cancelled on exit.
fn spawn_remote_fetch(url: String) -> Receiver<Vec<JournalEntry>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let entries = storage::fetch_remote_journal(&url);
        tx.send(entries).ok();
    });
    rx
}

struct App {
    journal: Journal,
    store_path: PathBuf,
    filters: FilterState,
    week_start: WeekStart,
    days: BTreeMap<String, Vec<JournalEntry>>,
    anchor: NaiveDate,
    window: MonthWindow,
    keymap: MonthKeymap,
    scroll_top: i32,
    viewport_height: i32,
    needs_anchor_scroll: bool,
    header_label: String,
    hits: HitMap,
    mode: Mode,
    status: String,
    last_save: Instant,
}

enum Mode {
    Normal,
    Creating(EntryForm),
    Editing { entry_id: String, form: EntryForm },
    ConfirmDelete { entry_id: String },
    Viewer(ViewerState),
    Filtering(FilterForm),
}

struct ViewerState {
    date: String,
    index: usize,
    drag: Option<DragState>,
}

struct DragState {
    origin: u16,
    last: u16,
}

/// Frame-local map from screen cells back to days and entry indicators.
#[derive(Default)]
struct HitMap {
    days: Vec<(Rect, String)>,
    entries: Vec<(Rect, String, usize)>,
}

impl App {
    fn new(journal: Journal, store_path: PathBuf) -> Self {
        let today = Local::now().date_naive();
        let anchor = start_of_month(today);
        let days = journal.by_day(&FilterState::default());
        let mut keymap = MonthKeymap::new();
        keymap.attach();
        App {
            journal,
            store_path,
            filters: FilterState::default(),
            week_start: WeekStart::Monday,
            days,
            anchor,
            // The sticky header lives outside the scroll area here, so the
            // window's header band is zero.
            window: MonthWindow::new(0, default_month_rows()),
            keymap,
            scroll_top: 0,
            viewport_height: 0,
            needs_anchor_scroll: true,
            header_label: month_label(anchor),
            hits: HitMap::default(),
            mode: Mode::Normal,
            status: "Loading remote journal…".into(),
            last_save: Instant::now(),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        remote_rx: Receiver<Vec<JournalEntry>>,
    ) -> Result<()> {
        loop {
            if let Ok(remote) = remote_rx.try_recv() {
                let count = remote.len();
                self.journal.set_remote(remote);
                self.refresh();
                self.status = if count == 0 {
                    "No remote entries (feed unavailable or empty)".into()
                } else {
                    format!("Loaded {count} remote entries")
                };
            }
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Rebuilds the derived day map after any journal or filter change.
    fn refresh(&mut self) {
        self.days = self.journal.by_day(&self.filters);
    }

    fn enter_mode(&mut self, mode: Mode) {
        match mode {
            Mode::Normal => self.keymap.attach(),
            _ => self.keymap.detach(),
        }
        self.mode = mode;
    }

    fn persist(&mut self, message: impl Into<String>) -> Result<()> {
        storage::save_local_events(&self.store_path, &self.journal.local)?;
        self.last_save = Instant::now();
        self.refresh();
        self.status = message.into();
        Ok(())
    }

    // ---- input -----------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Creating(_) | Mode::Editing { .. } => self.handle_form_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
            Mode::Viewer(_) => self.handle_viewer_key(key),
            Mode::Filtering(_) => self.handle_filter_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        if let Some(nav) = self.keymap.translate(key.code) {
            // The keymap claims the arrows outright; no fall-through to
            // line scrolling.
            let current = self.window.first_mostly_visible(self.metrics());
            match nav {
                NavCommand::PreviousMonth => self.jump_to(current - 1),
                NavCommand::NextMonth => self.jump_to(current + 1),
            }
            return Ok(false);
        }
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') => self.scroll_by(SCROLL_STEP),
            KeyCode::Char('k') => self.scroll_by(-SCROLL_STEP),
            KeyCode::PageDown => self.scroll_by(self.viewport_height.max(1)),
            KeyCode::PageUp => self.scroll_by(-self.viewport_height.max(1)),
            KeyCode::Char('t') => self.jump_to(0),
            KeyCode::Char('p') => {
                let current = self.window.first_mostly_visible(self.metrics());
                self.jump_to(current - 1);
            }
            KeyCode::Char('n') => {
                let current = self.window.first_mostly_visible(self.metrics());
                self.jump_to(current + 1);
            }
            KeyCode::Char('a') => {
                let today = ymd(Local::now().date_naive());
                self.open_day(today);
            }
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.enter_mode(Mode::Filtering(FilterForm::from_state(&self.filters)));
                self.status = "Editing filters (Enter apply, Esc cancel, Ctrl+L clear)".into();
            }
            KeyCode::Char('c') => {
                self.filters.clear();
                self.refresh();
                self.status = "Filters cleared".into();
            }
            KeyCode::Char('w') => {
                self.week_start = self.week_start.toggle();
                self.status = match self.week_start {
                    WeekStart::Monday => "Weeks start on Monday".into(),
                    WeekStart::Sunday => "Weeks start on Sunday".into(),
                };
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
            Mode::Creating(mut form) => {
                if self.process_form_key(None, &mut form, key)? {
                    self.enter_mode(Mode::Normal);
                } else {
                    self.mode = Mode::Creating(form);
                }
            }
            Mode::Editing { entry_id, mut form } => {
                if key.code == KeyCode::Char('d')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    self.status = format!("Delete {entry_id}? (y to confirm, n/Esc to cancel)");
                    self.mode = Mode::ConfirmDelete { entry_id };
                } else if self.process_form_key(Some(entry_id.clone()), &mut form, key)? {
                    self.enter_mode(Mode::Normal);
                } else {
                    self.mode = Mode::Editing { entry_id, form };
                }
            }
            other => self.mode = other,
        }
        Ok(false)
    }

    /// Returns true when the form should close.
    fn process_form_key(
        &mut self,
        editing: Option<String>,
        form: &mut EntryForm,
        key: KeyEvent,
    ) -> Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return Ok(true);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.active_field_mut().move_left(),
            KeyCode::Right => form.active_field_mut().move_right(),
            KeyCode::Backspace => form.active_field_mut().backspace(),
            KeyCode::Enter => {
                let control = key.modifiers.contains(KeyModifiers::CONTROL);
                if form.field == FormField::Description && !control {
                    form.active_field_mut().insert_char('\n');
                } else {
                    return self.try_submit(editing, form);
                }
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.reset();
                self.status = "Form reset".into();
            }
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
        Ok(false)
    }

    fn try_submit(&mut self, editing: Option<String>, form: &EntryForm) -> Result<bool> {
        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(err) => {
                self.status = format!("Could not save: {err}");
                return Ok(false);
            }
        };
        match editing {
            Some(id) => {
                if let Err(err) = self.journal.update_local(&id, |entry| {
                    entry.date = draft.date.clone();
                    entry.image_url = draft.image_url.clone();
                    entry.rating = draft.rating;
                    entry.categories = draft.categories.clone();
                    entry.description = draft.description.clone();
                }) {
                    self.status = format!("Could not save: {err}");
                    return Ok(false);
                }
                self.persist(format!("Updated {id}"))?;
            }
            None => {
                let id = self.journal.create_local(draft);
                self.persist(format!("Created entry {id}"))?;
            }
        }
        Ok(true)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let entry_id = match &self.mode {
            Mode::ConfirmDelete { entry_id } => entry_id.clone(),
            _ => return Ok(false),
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match self.journal.delete_local(&entry_id) {
                    Ok(()) => self.persist(format!("Deleted {entry_id}"))?,
                    Err(err) => self.status = format!("Delete failed: {err}"),
                }
                self.enter_mode(Mode::Normal);
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.enter_mode(Mode::Normal);
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) -> Result<bool> {
        let (date, index) = match &self.mode {
            Mode::Viewer(viewer) => (viewer.date.clone(), viewer.index),
            _ => return Ok(false),
        };
        let len = self.day_entries(&date).len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.enter_mode(Mode::Normal),
            KeyCode::Left | KeyCode::Char('h') => {
                if let Mode::Viewer(viewer) = &mut self.mode {
                    if viewer.index > 0 {
                        viewer.index -= 1;
                    }
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if let Mode::Viewer(viewer) = &mut self.mode {
                    if viewer.index + 1 < len {
                        viewer.index += 1;
                    }
                }
            }
            KeyCode::Char('e') => {
                let entry = self
                    .day_entries(&date)
                    .get(index.min(len.saturating_sub(1)))
                    .cloned();
                if let Some(entry) = entry {
                    if entry.source == Source::Local {
                        self.open_entry(entry);
                    } else {
                        self.status = "Remote entries are read-only".into();
                    }
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        if let Mode::Filtering(form) = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    self.status = "Filters unchanged".into();
                    close = true;
                }
                KeyCode::Enter => {
                    self.filters = form.to_state();
                    self.refresh();
                    self.status = if self.filters.is_empty() {
                        "Showing everything".into()
                    } else {
                        "Filters applied".into()
                    };
                    close = true;
                }
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Left => form.active_field_mut().move_left(),
                KeyCode::Right => form.active_field_mut().move_right(),
                KeyCode::Backspace => form.active_field_mut().backspace(),
                KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    *form = FilterForm::from_state(&FilterState::default());
                }
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
        }
        if close {
            self.enter_mode(Mode::Normal);
        } else {
            self.mode = mode;
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if matches!(self.mode, Mode::Normal) {
            match mouse.kind {
                MouseEventKind::ScrollDown => self.scroll_by(SCROLL_STEP),
                MouseEventKind::ScrollUp => self.scroll_by(-SCROLL_STEP),
                MouseEventKind::Down(MouseButton::Left) => self.click_at(mouse.column, mouse.row),
                _ => {}
            }
            return;
        }
        let mut released: Option<(String, usize, i32)> = None;
        if let Mode::Viewer(viewer) = &mut self.mode {
            match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    viewer.drag = Some(DragState {
                        origin: mouse.column,
                        last: mouse.column,
                    });
                }
                MouseEventKind::Drag(MouseButton::Left) => {
                    if let Some(drag) = viewer.drag.as_mut() {
                        drag.last = mouse.column;
                    }
                }
                MouseEventKind::Up(MouseButton::Left) => {
                    if let Some(drag) = viewer.drag.take() {
                        let cells = i32::from(drag.last) - i32::from(drag.origin);
                        released = Some((viewer.date.clone(), viewer.index, cells));
                    }
                }
                _ => {}
            }
        }
        if let Some((date, index, cells)) = released {
            let len = self.day_entries(&date).len();
            let target = swipe_target(index, len, cells * DRAG_UNITS_PER_CELL);
            if let Mode::Viewer(viewer) = &mut self.mode {
                viewer.index = target;
            }
        }
    }

    /// Entry indicators win over the day cell underneath them, so a click on
    /// an indicator never also opens the day form.
    fn click_at(&mut self, column: u16, row: u16) {
        let entry_hit = self
            .hits
            .entries
            .iter()
            .find(|(rect, _, _)| rect_contains(*rect, column, row))
            .map(|(_, date, index)| (date.clone(), *index));
        if let Some((date, index)) = entry_hit {
            self.enter_mode(Mode::Viewer(ViewerState {
                date,
                index,
                drag: None,
            }));
            return;
        }
        let day_hit = self
            .hits
            .days
            .iter()
            .find(|(rect, _)| rect_contains(*rect, column, row))
            .map(|(_, date)| date.clone());
        if let Some(date) = day_hit {
            self.open_day(date);
        }
    }

    fn open_day(&mut self, date: String) {
        self.status = format!("New entry for {date}");
        let form = EntryForm::new(date);
        self.enter_mode(Mode::Creating(form));
    }

    fn open_entry(&mut self, entry: JournalEntry) {
        let form = EntryForm::from_entry(&entry, entry.date.clone());
        self.status = format!("Editing {}", entry.id);
        self.enter_mode(Mode::Editing {
            entry_id: entry.id,
            form,
        });
    }

    // ---- scrolling -------------------------------------------------------

    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.scroll_top,
            client_height: self.viewport_height,
            scroll_height: self.window.total_height(),
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        self.scroll_top += delta;
        self.clamp_scroll();
        self.apply_scroll_transition();
    }

    /// Jumps behave like a scroll landing at the target: a jump near the
    /// window edge must extend the range, or month-by-month navigation
    /// dead-ends there.
    fn jump_to(&mut self, offset: i32) {
        let offset = offset.clamp(self.window.start(), self.window.end());
        self.scroll_top = self.window.jump_target(offset);
        self.clamp_scroll();
        self.apply_scroll_transition();
    }

    fn apply_scroll_transition(&mut self) {
        let update = self.window.on_scroll(self.metrics());
        if update.is_noop() {
            return;
        }
        // Keep the content under the viewport stable across prepends and
        // trims. Prepended months are priced at the heights the next draw
        // will measure; the default estimate would let the anchor drift
        // whenever a six-week month enters.
        let adjust = if update.added_before > 0 {
            self.measure_month_heights();
            (self.window.start()..self.window.start() + update.added_before)
                .map(|offset| self.window.height_of(offset))
                .sum()
        } else {
            update.scroll_adjust
        };
        self.scroll_top += adjust;
        self.clamp_scroll();
    }

    fn measure_month_heights(&mut self) {
        for offset in self.window.offsets() {
            let month = add_months(self.anchor, offset);
            let weeks = weeks_in_month(month, self.week_start).len() as u16;
            self.window.record_height(offset, i32::from(month_rows(weeks)));
        }
    }

    fn clamp_scroll(&mut self) {
        let max = (self.window.total_height() - self.viewport_height).max(0);
        self.scroll_top = self.scroll_top.clamp(0, max);
    }

    fn day_entries(&self, date: &str) -> &[JournalEntry] {
        self.days.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    // ---- drawing ---------------------------------------------------------

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(8),
                Constraint::Length(2),
            ])
            .split(f.size());

        self.draw_calendar(f, layout[2]);
        self.draw_header(f, layout[0]);
        self.draw_filter_bar(f, layout[1]);
        self.draw_footer(f, layout[3]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(f, "New Entry", form, false),
            Mode::Editing { form, .. } => self.draw_form(f, "Edit Entry", form, true),
            Mode::ConfirmDelete { entry_id } => self.draw_confirm(f, entry_id),
            Mode::Viewer(viewer) => self.draw_viewer(f, viewer),
            Mode::Filtering(_) | Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "lookback ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.header_label.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled("p", Style::default().fg(Color::LightCyan)),
            Span::raw(" prev  "),
            Span::styled("t", Style::default().fg(Color::LightCyan)),
            Span::raw(" today  "),
            Span::styled("n", Style::default().fg(Color::LightCyan)),
            Span::raw(" next  "),
            Span::raw("•  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(
            Paragraph::new(title).alignment(Alignment::Center).block(block),
            area,
        );
    }

    fn draw_filter_bar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let line = match &self.mode {
            Mode::Filtering(form) => form.render_line(),
            _ => {
                let rating = self
                    .filters
                    .min_rating
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                Line::from(vec![
                    Span::styled("Search: ", Style::default().fg(Color::Gray)),
                    Span::raw(self.filters.text.clone()),
                    Span::styled("  Category: ", Style::default().fg(Color::Gray)),
                    Span::raw(self.filters.category.clone()),
                    Span::styled("  Min rating: ", Style::default().fg(Color::Gray)),
                    Span::raw(rating),
                    Span::styled("   (/ edit, c clear, w week start)", Style::default().fg(Color::DarkGray)),
                ])
            }
        };
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(line).block(block), area);
    }

    fn draw_calendar(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        self.viewport_height = i32::from(area.height);
        self.hits = HitMap::default();
        if area.width < 7 || area.height == 0 {
            return;
        }

        self.measure_month_heights();
        if self.needs_anchor_scroll {
            self.scroll_top = self.window.jump_target(0);
            self.needs_anchor_scroll = false;
        }
        self.clamp_scroll();

        let today = Local::now().date_naive();
        let mut batch: Vec<(i32, f64)> = Vec::new();
        for offset in self.window.offsets() {
            let height = self.window.height_of(offset);
            let top = self.window.month_top(offset) - self.scroll_top;
            let bottom = top + height;
            if bottom <= 0 || top >= self.viewport_height {
                continue;
            }
            let visible = bottom.min(self.viewport_height) - top.max(0);
            let ratio = f64::from(visible) / f64::from(height.max(1));
            batch.push((offset, quantize_ratio(ratio)));
            self.draw_month(f, area, offset, top, today);
        }
        if let Some(current) = self.window.on_visibility_batch(&batch) {
            self.header_label = month_label(add_months(self.anchor, current));
        }
    }

    fn draw_month(
        &mut self,
        f: &mut ratatui::Frame<'_>,
        area: Rect,
        offset: i32,
        top: i32,
        today: NaiveDate,
    ) {
        let month = add_months(self.anchor, offset);
        let weeks = weeks_in_month(month, self.week_start);

        if let Some(rect) = slice(area, top, 1) {
            f.render_widget(
                Paragraph::new(Span::styled(
                    month_label(month),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                rect,
            );
        }
        if month.month() == 2 && is_leap_year(month.year()) {
            if let Some(rect) = slice(area, top + 1, 1) {
                f.render_widget(
                    Paragraph::new(Span::styled(
                        "Leap year",
                        Style::default().fg(Color::DarkGray),
                    )),
                    rect,
                );
            }
        }

        let cell_width = area.width / 7;
        let labels_top = top + i32::from(MONTH_TITLE_ROWS);
        if let Some(rect) = slice(area, labels_top, 1) {
            let mut spans = Vec::with_capacity(7);
            for label in self.week_start.labels() {
                spans.push(Span::styled(
                    format!("{:^width$}", label, width = cell_width as usize),
                    Style::default().fg(Color::Gray),
                ));
            }
            f.render_widget(Paragraph::new(Line::from(spans)), rect);
        }

        let grid_top = labels_top + i32::from(WEEKDAY_ROWS);
        for (row_idx, week) in weeks.iter().enumerate() {
            let week_top = grid_top + row_idx as i32 * i32::from(DAY_CELL_ROWS);
            for (col, day) in week.iter().enumerate() {
                let Some(row_rect) = slice(area, week_top, DAY_CELL_ROWS) else {
                    continue;
                };
                let cell = Rect::new(
                    row_rect.x + col as u16 * cell_width,
                    row_rect.y,
                    cell_width,
                    DAY_CELL_ROWS,
                );
                self.draw_day_cell(f, cell, *day, month, today);
            }
        }
    }

    fn draw_day_cell(
        &mut self,
        f: &mut ratatui::Frame<'_>,
        cell: Rect,
        day: NaiveDate,
        month: NaiveDate,
        today: NaiveDate,
    ) {
        let iso = ymd(day);
        let in_month = day.month() == month.month() && day.year() == month.year();
        let is_today = day == today;
        let entries = self.days.get(&iso).cloned().unwrap_or_default();

        let day_style = if is_today {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if in_month {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mut lines = vec![Line::from(Span::styled(
            format!("{:>2}", day.day()),
            day_style,
        ))];

        let mut markers = Vec::new();
        for entry in entries.iter().take(3) {
            let (glyph, color) = if entry.image_url.is_some() {
                ("▣ ", Color::LightBlue)
            } else {
                ("▤ ", Color::LightMagenta)
            };
            markers.push(Span::styled(glyph, Style::default().fg(color)));
        }
        if entries.len() > 3 {
            markers.push(Span::styled(
                format!("+{}", entries.len() - 3),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(markers));

        if let Some(first) = entries.first() {
            let snippet = truncate_text(&first.description, cell.width.saturating_sub(1) as usize);
            lines.push(Line::from(Span::styled(
                snippet,
                Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            )));
        }

        f.render_widget(Paragraph::new(lines), cell);

        // Indicator cells first, then the whole day; click_at checks in the
        // same order.
        for (i, _) in entries.iter().take(3).enumerate() {
            let x = cell.x + (i as u16) * 2;
            if x + 2 <= cell.x + cell.width {
                self.hits
                    .entries
                    .push((Rect::new(x, cell.y + 1, 2, 1), iso.clone(), i));
            }
        }
        self.hits.days.push((cell, iso));
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let help = match self.mode {
            Mode::Normal => Line::from(vec![
                Span::styled("←↑↓→", Style::default().fg(Color::LightCyan)),
                Span::raw(" month  "),
                Span::styled("j/k wheel", Style::default().fg(Color::LightCyan)),
                Span::raw(" scroll  "),
                Span::styled("click day", Style::default().fg(Color::LightGreen)),
                Span::raw(" add  "),
                Span::styled("click mark", Style::default().fg(Color::LightGreen)),
                Span::raw(" view  "),
                Span::styled("a", Style::default().fg(Color::LightMagenta)),
                Span::raw(" add today  "),
                Span::styled("q", Style::default().fg(Color::LightRed)),
                Span::raw(" quit"),
            ]),
            Mode::Creating(_) | Mode::Editing { .. } => Line::from(vec![
                Span::styled("Tab", Style::default().fg(Color::LightCyan)),
                Span::raw(" field  "),
                Span::styled("Enter", Style::default().fg(Color::LightYellow)),
                Span::raw(" save  "),
                Span::styled("Ctrl+R", Style::default().fg(Color::LightYellow)),
                Span::raw(" reset  "),
                Span::styled("Ctrl+D", Style::default().fg(Color::LightRed)),
                Span::raw(" delete  "),
                Span::styled("Esc", Style::default().fg(Color::LightRed)),
                Span::raw(" cancel"),
            ]),
            Mode::ConfirmDelete { .. } => Line::from(vec![
                Span::styled("y", Style::default().fg(Color::LightRed)),
                Span::raw(" confirm  "),
                Span::styled("n/Esc", Style::default().fg(Color::LightCyan)),
                Span::raw(" cancel"),
            ]),
            Mode::Viewer(_) => Line::from(vec![
                Span::styled("drag / h l", Style::default().fg(Color::LightCyan)),
                Span::raw(" page  "),
                Span::styled("e", Style::default().fg(Color::LightMagenta)),
                Span::raw(" edit  "),
                Span::styled("Esc", Style::default().fg(Color::LightRed)),
                Span::raw(" close"),
            ]),
            Mode::Filtering(_) => Line::from(vec![
                Span::styled("Tab", Style::default().fg(Color::LightCyan)),
                Span::raw(" field  "),
                Span::styled("Enter", Style::default().fg(Color::LightYellow)),
                Span::raw(" apply  "),
                Span::styled("Ctrl+L", Style::default().fg(Color::LightYellow)),
                Span::raw(" clear  "),
                Span::styled("Esc", Style::default().fg(Color::LightRed)),
                Span::raw(" cancel"),
            ]),
        };
        f.render_widget(
            Paragraph::new(help).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            ),
            rows[0],
        );
        f.render_widget(
            Paragraph::new(self.status.clone()).wrap(Wrap { trim: true }),
            rows[1],
        );
    }

    fn draw_form(
        &self,
        f: &mut ratatui::Frame<'_>,
        title: &str,
        form: &EntryForm,
        editing: bool,
    ) {
        let area = centered_rect(70, 60, f.size());
        let mut fields = Vec::new();
        fields.extend(field_lines(
            "Date (YYYY-MM-DD)",
            &form.date,
            form.field == FormField::Date,
        ));
        fields.extend(field_lines(
            "Rating (1-5)",
            &form.rating,
            form.field == FormField::Rating,
        ));
        fields.extend(field_lines(
            "Image URL",
            &form.image_url,
            form.field == FormField::ImageUrl,
        ));
        fields.extend(field_lines(
            "Categories (comma-separated)",
            &form.categories,
            form.field == FormField::Categories,
        ));
        fields.extend(field_lines(
            "Description",
            &form.description,
            form.field == FormField::Description,
        ));
        let mut hint =
            "Enter save • Esc cancel • Tab/Shift-Tab move • Enter adds newline in Description"
                .to_string();
        if editing {
            hint.push_str(" • Ctrl+D delete");
        }
        fields.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, entry_id: &str) {
        let area = centered_rect(50, 30, f.size());
        let date = self
            .journal
            .find(entry_id)
            .map(|e| e.date.clone())
            .unwrap_or_else(|| entry_id.to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete the entry from {date}?"),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
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

    /// Image section on top, details stacked below.
    fn draw_viewer(&self, f: &mut ratatui::Frame<'_>, viewer: &ViewerState) {
        let area = centered_rect(70, 70, f.size());
        let entries = self.day_entries(&viewer.date);
        let mut lines = Vec::new();
        if entries.is_empty() {
            lines.push(Line::from("No entries for this day"));
        } else {
            let index = viewer.index.min(entries.len() - 1);
            let entry = &entries[index];
            lines.push(Line::from(Span::styled(
                format!("{} / {}", index + 1, entries.len()),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::from(""));
            match entry.image_url.as_deref() {
                Some(url) => lines.push(Line::from(vec![
                    Span::styled("▣ ", Style::default().fg(Color::LightBlue)),
                    Span::styled(url.to_string(), Style::default().fg(Color::LightBlue)),
                ])),
                None => lines.push(Line::from(Span::styled(
                    "No image",
                    Style::default().fg(Color::Gray),
                ))),
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                entry.date.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                star_row(entry.rating),
                Style::default().fg(Color::LightYellow),
            )));
            if !entry.categories.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("#{}", entry.categories.join(" #")),
                    Style::default().fg(Color::LightMagenta),
                )));
            }
            lines.push(Line::from(""));
            let description = if entry.description.is_empty() {
                "(no description)".to_string()
            } else {
                entry.description.clone()
            };
            lines.push(Line::from(description));
        }
        let dialog = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(Span::styled(
                        viewer.date.clone(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

// ---- entry form ----------------------------------------------------------

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    Date,
    Rating,
    ImageUrl,
    Categories,
    Description,
}

struct EntryForm {
    default_date: String,
    date: FieldValue,
    rating: FieldValue,
    image_url: FieldValue,
    categories: FieldValue,
    description: FieldValue,
    field: FormField,
}

impl EntryForm {
    fn new(default_date: String) -> Self {
        EntryForm {
            date: FieldValue::new(&default_date),
            rating: FieldValue::new(""),
            image_url: FieldValue::new(""),
            categories: FieldValue::new(""),
            description: FieldValue::new(""),
            field: FormField::Date,
            default_date,
        }
    }

    fn from_entry(entry: &JournalEntry, default_date: String) -> Self {
        EntryForm {
            date: FieldValue::new(&entry.date),
            rating: FieldValue::new(
                &entry.rating.map(|n| n.to_string()).unwrap_or_default(),
            ),
            image_url: FieldValue::new(entry.image_url.as_deref().unwrap_or_default()),
            categories: FieldValue::new(&entry.categories.join(", ")),
            description: FieldValue::new(&entry.description),
            field: FormField::Date,
            default_date,
        }
    }

    /// Back to the defaults for the day the form was opened on, not to the
    /// values being edited.
    fn reset(&mut self) {
        self.date = FieldValue::new(&self.default_date);
        self.rating = FieldValue::new("");
        self.image_url = FieldValue::new("");
        self.categories = FieldValue::new("");
        self.description = FieldValue::new("");
        self.field = FormField::Date;
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Date => FormField::Rating,
            FormField::Rating => FormField::ImageUrl,
            FormField::ImageUrl => FormField::Categories,
            FormField::Categories => FormField::Description,
            FormField::Description => FormField::Date,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Date => FormField::Description,
            FormField::Rating => FormField::Date,
            FormField::ImageUrl => FormField::Rating,
            FormField::Categories => FormField::ImageUrl,
            FormField::Description => FormField::Categories,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FormField::Date => &mut self.date,
            FormField::Rating => &mut self.rating,
            FormField::ImageUrl => &mut self.image_url,
            FormField::Categories => &mut self.categories,
            FormField::Description => &mut self.description,
        }
    }

    fn to_draft(&self) -> Result<EntryDraft> {
        let date = self.date.value.trim();
        if date.is_empty() {
            bail!("date is required");
        }
        if parse_ymd(date).is_none() {
            bail!("invalid date (use YYYY-MM-DD): {date}");
        }
        // Non-numeric ratings are dropped, in-range is enforced by clamping.
        let rating = {
            let raw = self.rating.value.trim();
            if raw.is_empty() {
                None
            } else {
                raw.parse::<i64>().ok().map(clamp_rating)
            }
        };
        let image_url = {
            let raw = self.image_url.value.trim();
            if raw.is_empty() {
                None
            } else {
                Some(raw.to_string())
            }
        };
        Ok(EntryDraft {
            date: date.to_string(),
            image_url,
            rating,
            categories: parse_categories(&self.categories.value),
            description: self.description.value.clone(),
        })
    }
}

// ---- filter form ---------------------------------------------------------

#[derive(Copy, Clone, PartialEq, Eq)]
enum FilterField {
    Text,
    Category,
    MinRating,
}

struct FilterForm {
    text: FieldValue,
    category: FieldValue,
    min_rating: FieldValue,
    field: FilterField,
}

impl FilterForm {
    fn from_state(filters: &FilterState) -> Self {
        FilterForm {
            text: FieldValue::new(&filters.text),
            category: FieldValue::new(&filters.category),
            min_rating: FieldValue::new(
                &filters.min_rating.map(|n| n.to_string()).unwrap_or_default(),
            ),
            field: FilterField::Text,
        }
    }

    fn to_state(&self) -> FilterState {
        FilterState {
            text: self.text.value.trim().to_string(),
            category: self.category.value.trim().to_string(),
            // Non-numeric input imposes no constraint.
            min_rating: self
                .min_rating
                .value
                .trim()
                .parse::<i64>()
                .ok()
                .map(clamp_rating),
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FilterField::Text => FilterField::Category,
            FilterField::Category => FilterField::MinRating,
            FilterField::MinRating => FilterField::Text,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FilterField::Text => FilterField::MinRating,
            FilterField::Category => FilterField::Text,
            FilterField::MinRating => FilterField::Category,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FilterField::Text => &mut self.text,
            FilterField::Category => &mut self.category,
            FilterField::MinRating => &mut self.min_rating,
        }
    }

    fn render_line(&self) -> Line<'static> {
        let field_span = |label: &str, field: &FieldValue, active: bool| {
            let value = if active {
                field.with_caret()
            } else {
                field.value.clone()
            };
            vec![
                Span::styled(
                    format!("{label}: "),
                    Style::default().fg(if active { Color::Cyan } else { Color::Gray }),
                ),
                Span::styled(
                    value,
                    Style::default().fg(if active { Color::Cyan } else { Color::White }),
                ),
                Span::raw("  "),
            ]
        };
        let mut spans = Vec::new();
        spans.extend(field_span(
            "Search",
            &self.text,
            self.field == FilterField::Text,
        ));
        spans.extend(field_span(
            "Category",
            &self.category,
            self.field == FilterField::Category,
        ));
        spans.extend(field_span(
            "Min rating",
            &self.min_rating,
            self.field == FilterField::MinRating,
        ));
        Line::from(spans)
    }
}

// ---- single-line editable field ------------------------------------------

#[derive(Clone)]
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
        if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.value.remove(idx);
            self.cursor = idx;
        }
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

// ---- helpers -------------------------------------------------------------

/// Which index a drag release lands on. Positive displacement pages back,
/// negative pages forward, small displacement is a no-op; bounds clamp.
fn swipe_target(index: usize, len: usize, offset_x: i32) -> usize {
    if offset_x > DRAG_THRESHOLD && index > 0 {
        index - 1
    } else if offset_x < -DRAG_THRESHOLD && index + 1 < len {
        index + 1
    } else {
        index
    }
}

/// Snaps a raw ratio to the highest crossed observation threshold, so header
/// tracking sees the same granularity a threshold-driven observer reports.
fn quantize_ratio(ratio: f64) -> f64 {
    build_threshold_list()
        .into_iter()
        .filter(|t| *t <= ratio)
        .fold(0.0, f64::max)
}

fn month_rows(weeks: u16) -> u16 {
    MONTH_TITLE_ROWS + WEEKDAY_ROWS + weeks * DAY_CELL_ROWS + MONTH_GAP_ROWS
}

fn default_month_rows() -> i32 {
    i32::from(month_rows(5))
}

/// Rows `rel..rel+height` of `area`, or None when any part falls outside.
/// Partially scrolled-off rows are simply not drawn.
fn slice(area: Rect, rel: i32, height: u16) -> Option<Rect> {
    if rel < 0 || rel + i32::from(height) > i32::from(area.height) {
        return None;
    }
    Some(Rect::new(
        area.x,
        area.y + rel as u16,
        area.width,
        height,
    ))
}

fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x + rect.width
        && row >= rect.y
        && row < rect.y + rect.height
}

fn star_row(rating: Option<u8>) -> String {
    let filled = usize::from(rating.unwrap_or(0).min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
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
    let segments: Vec<&str> = if text.is_empty() {
        vec![""]
    } else {
        text.split('\n').collect()
    };
    segments
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            Line::from(vec![
                Span::styled(
                    if idx == 0 {
                        prefix.clone()
                    } else {
                        spacer.clone()
                    },
                    label_style,
                ),
                Span::styled((*line).to_string(), value_style),
            ])
        })
        .collect()
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use crate::window::{EXTEND_STEP, INITIAL_REACH};

    fn test_app() -> App {
        let mut app = App::new(
            Journal::default(),
            std::env::temp_dir().join("lookback-ui-test.json"),
        );
        app.viewport_height = 40;
        app.measure_month_heights();
        app
    }

    #[test]
    fn month_jumps_extend_the_window_at_the_edge() {
        let mut app = test_app();
        app.jump_to(app.window.start());
        // Landing at the first month must grow the range backward.
        assert!(app.window.start() < -INITIAL_REACH);

        // And the next previous-month jump keeps going instead of pinning.
        let before = app.window.start();
        let current = app.window.first_mostly_visible(app.metrics());
        app.jump_to(current - 1);
        assert!(app.window.start() < before);
    }

    #[test]
    fn prepend_adjust_prices_measured_heights() {
        let mut app = test_app();
        // Offsets -30..-25 from this anchor are Sep 2023..Feb 2024; with
        // weeks starting Monday, October 2023 spans six grid rows.
        app.anchor = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        app.measure_month_heights();
        app.scroll_top = 300;

        let anchor_screen_top = app.window.month_top(0) - app.scroll_top;
        app.apply_scroll_transition();
        assert!(app.window.start() < -INITIAL_REACH);
        assert_eq!(app.window.month_top(0) - app.scroll_top, anchor_screen_top);

        // The batch holds a six-week month, so the default estimate would
        // have drifted the anchor.
        let added: i32 = (app.window.start()..app.window.start() + EXTEND_STEP)
            .map(|offset| app.window.height_of(offset))
            .sum();
        assert_ne!(added, EXTEND_STEP * i32::from(month_rows(5)));
    }

    #[test]
    fn swipe_paging_thresholds() {
        // Past the negative threshold advances.
        assert_eq!(swipe_target(0, 3, -150), 1);
        // Past the positive threshold at the lower bound is clamped.
        assert_eq!(swipe_target(0, 3, 150), 0);
        assert_eq!(swipe_target(2, 3, 150), 1);
        // Small displacement is a no-op either way.
        assert_eq!(swipe_target(1, 3, 80), 1);
        assert_eq!(swipe_target(1, 3, -80), 1);
        // Upper bound clamp.
        assert_eq!(swipe_target(2, 3, -150), 2);
        assert_eq!(swipe_target(0, 0, -150), 0);
    }

    #[test]
    fn quantized_ratios_land_on_thresholds() {
        assert_eq!(quantize_ratio(1.0), 1.0);
        assert_eq!(quantize_ratio(0.52), 0.5);
        assert_eq!(quantize_ratio(0.04), 0.0);
        assert_eq!(quantize_ratio(0.0), 0.0);
    }

    #[test]
    fn form_draft_validates_and_clamps() {
        let mut form = EntryForm::new("2024-03-10".to_string());
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.date, "2024-03-10");
        assert_eq!(draft.rating, None);

        form.rating = FieldValue::new("9");
        form.categories = FieldValue::new(" travel , food ,, ");
        form.image_url = FieldValue::new("  ");
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.rating, Some(5));
        assert_eq!(draft.categories, vec!["travel", "food"]);
        assert_eq!(draft.image_url, None);

        // Non-numeric rating is coerced to absent, not an error.
        form.rating = FieldValue::new("high");
        assert_eq!(form.to_draft().unwrap().rating, None);

        form.date = FieldValue::new("2024-13-40");
        assert!(form.to_draft().is_err());
        form.date = FieldValue::new("");
        assert!(form.to_draft().is_err());
    }

    #[test]
    fn form_reset_restores_day_defaults() {
        let entry = JournalEntry {
            id: "local-1".to_string(),
            date: "2024-04-02".to_string(),
            image_url: Some("http://x/y.jpg".to_string()),
            rating: Some(3),
            categories: vec!["travel".to_string()],
            description: "hello".to_string(),
            source: Source::Local,
        };
        let mut form = EntryForm::from_entry(&entry, "2024-04-01".to_string());
        assert_eq!(form.date.value, "2024-04-02");
        form.reset();
        // Defaults for the day the form was opened on, not the edited values.
        assert_eq!(form.date.value, "2024-04-01");
        assert!(form.rating.value.is_empty());
        assert!(form.image_url.value.is_empty());
        assert!(form.categories.value.is_empty());
        assert!(form.description.value.is_empty());
    }

    #[test]
    fn filter_form_coerces_rating_input() {
        let mut form = FilterForm::from_state(&FilterState::default());
        form.min_rating = FieldValue::new("7");
        assert_eq!(form.to_state().min_rating, Some(5));
        form.min_rating = FieldValue::new("three");
        assert_eq!(form.to_state().min_rating, None);
        form.min_rating = FieldValue::new("");
        assert_eq!(form.to_state().min_rating, None);
    }

    #[test]
    fn field_editing_respects_char_boundaries() {
        let mut field = FieldValue::new("ab");
        field.insert_char('é');
        assert_eq!(field.value, "abé");
        field.move_left();
        field.move_left();
        field.insert_char('x');
        assert_eq!(field.value, "axbé");
        field.backspace();
        assert_eq!(field.value, "abé");
        field.move_right();
        field.move_right();
        field.backspace();
        assert_eq!(field.value, "ab");
    }

    #[test]
    fn star_rows() {
        assert_eq!(star_row(Some(4)), "★★★★☆");
        assert_eq!(star_row(None), "☆☆☆☆☆");
        assert_eq!(star_row(Some(9)), "★★★★★");
    }

    #[test]
    fn rect_hit_testing() {
        let rect = Rect::new(10, 5, 4, 2);
        assert!(rect_contains(rect, 10, 5));
        assert!(rect_contains(rect, 13, 6));
        assert!(!rect_contains(rect, 14, 5));
        assert!(!rect_contains(rect, 10, 7));
    }

    #[test]
    fn month_row_budget_tracks_week_count() {
        assert_eq!(month_rows(4), MONTH_TITLE_ROWS + WEEKDAY_ROWS + 16 + MONTH_GAP_ROWS);
        assert!(month_rows(6) > month_rows(5));
    }
}
