use std::fs;
use std::mem;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::models::Beer;
use crate::store::{import_inbox, CollectionStore, DataDirs, ImageStore, InboxReport};

use super::forms::{BeerField, BeerForm, BeerInput, ConfirmBeerDelete};
use super::helpers::{centered_rect, step_index, surface_error, wrap_index};
use super::screens::DetailScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown in the beer list.
const PAGE_STEP: isize = 5;

/// High-level navigation states.
enum Screen {
    Beers,
    Detail(DetailScreen),
}

/// Fine-grained modes layered over the current screen.
enum Mode {
    Normal,
    AddingBeer(BeerForm),
    EditingBeer { index: usize, form: BeerForm },
    ConfirmDelete(ConfirmBeerDelete),
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

/// Central application state shared across the TUI. Owns the collection for
/// the lifetime of the session.
pub struct App {
    dirs: DataDirs,
    store: CollectionStore,
    images: ImageStore,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(dirs: DataDirs, store: CollectionStore, images: ImageStore) -> Self {
        Self {
            dirs,
            store,
            images,
            selected: 0,
            screen: Screen::Beers,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Summarize an inbox sweep in the footer. Quiet when nothing happened.
    pub fn report_inbox(&mut self, report: &InboxReport) {
        let count = report.imported.len();
        let plural = if count == 1 { "" } else { "s" };
        match report.failed.first() {
            None if count == 0 => {}
            None => self.set_status(
                format!("Imported {count} beer{plural} from the inbox."),
                StatusKind::Info,
            ),
            Some((path, err)) => self.set_status(
                format!(
                    "Imported {count} beer{plural}, skipped {} file(s). {}: {err}",
                    report.failed.len(),
                    path.display()
                ),
                StatusKind::Error,
            ),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBeer(form) => self.handle_form(code, None, form)?,
            Mode::EditingBeer { index, form } => self.handle_form(code, Some(index), form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let detail_index = match &self.screen {
            Screen::Beers => None,
            Screen::Detail(detail) => Some(detail.index),
        };
        match detail_index {
            None => self.handle_list_key(code, exit),
            Some(index) => self.handle_detail_key(code, index, exit),
        }
    }

    fn handle_list_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let len = self.store.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.selected = step_index(self.selected, -1, len),
            KeyCode::Down => self.selected = step_index(self.selected, 1, len),
            KeyCode::PageUp => self.selected = step_index(self.selected, -PAGE_STEP, len),
            KeyCode::PageDown => self.selected = step_index(self.selected, PAGE_STEP, len),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = len.saturating_sub(1),
            KeyCode::Enter => {
                if self.store.get(self.selected).is_some() {
                    self.clear_status();
                    self.open_detail(self.selected);
                } else {
                    self.set_status("No beer selected.", StatusKind::Error);
                }
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingBeer(BeerForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(mode) = self.edit_mode(self.selected) {
                    self.clear_status();
                    return Ok(mode);
                }
                self.set_status("No beer selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(mode) = self.confirm_delete_mode(self.selected) {
                    self.clear_status();
                    return Ok(mode);
                }
                self.set_status("No beer selected to remove.", StatusKind::Error);
            }
            KeyCode::Char('i') | KeyCode::Char('I') => self.import_from_inbox(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_detail_key(&mut self, code: KeyCode, index: usize, exit: &mut bool) -> Result<Mode> {
        let len = self.store.len();
        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc => {
                self.selected = step_index(index, 0, len);
                self.screen = Screen::Beers;
                self.clear_status();
            }
            KeyCode::Tab => {
                self.clear_status();
                self.open_detail(wrap_index(index, 1, len));
            }
            KeyCode::BackTab => {
                self.clear_status();
                self.open_detail(wrap_index(index, -1, len));
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(mode) = self.edit_mode(index) {
                    self.clear_status();
                    return Ok(mode);
                }
            }
            KeyCode::Char('x') | KeyCode::Char('X') => self.share(index),
            KeyCode::Char('o') | KeyCode::Char('O') => self.open_photo(index),
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(mode) = self.confirm_delete_mode(index) {
                    self.clear_status();
                    return Ok(mode);
                }
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingBeer(BeerForm::default()));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_form(
        &mut self,
        code: KeyCode,
        target: Option<usize>,
        mut form: BeerForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                let message = if target.is_some() {
                    "Edit cancelled."
                } else {
                    "Add beer cancelled."
                };
                self.set_status(message, StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left if form.active == BeerField::Rating => form.adjust_rating(-1),
            KeyCode::Right if form.active == BeerField::Rating => form.adjust_rating(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_form(target, &form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        Ok(match (keep_open, target) {
            (false, _) => Mode::Normal,
            (true, Some(index)) => Mode::EditingBeer { index, form },
            (true, None) => Mode::AddingBeer(form),
        })
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBeerDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::Normal)
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn edit_mode(&self, index: usize) -> Option<Mode> {
        let beer = self.store.get(index)?;
        Some(Mode::EditingBeer {
            index,
            form: BeerForm::from_beer(beer),
        })
    }

    fn confirm_delete_mode(&self, index: usize) -> Option<Mode> {
        let beer = self.store.get(index)?;
        Some(Mode::ConfirmDelete(ConfirmBeerDelete {
            index,
            name: beer.name.clone(),
        }))
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

        match &self.screen {
            Screen::Beers => self.draw_beer_list(frame, content_area),
            Screen::Detail(detail) => self.draw_detail(frame, content_area, detail),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBeer(form) => self.draw_beer_form(frame, area, "New Beer", form),
            Mode::EditingBeer { form, .. } => self.draw_beer_form(frame, area, "Edit Beer", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_beer_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Beers ({})", self.store.len()));

        if self.store.is_empty() {
            let message = Paragraph::new(vec![
                Line::from("No beers yet. Press '+' to add one."),
                Line::from(""),
                Line::from(Span::styled(
                    format!(
                        "Shared .btkr files dropped into {} are imported with 'i'.",
                        self.dirs.inbox_dir().display()
                    ),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .alignment(Alignment::Center)
            .block(block)
            .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .store
            .beers()
            .iter()
            .map(|beer| {
                ListItem::new(Line::from(vec![
                    Span::styled(beer.stars(), Style::default().fg(Color::Yellow)),
                    Span::raw("  "),
                    Span::raw(beer.name.clone()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let Some(beer) = self.store.get(detail.index) else {
            return;
        };

        let block = Block::default().borders(Borders::ALL).title(format!(
            "{} ({}/{})",
            beer.name,
            detail.index + 1,
            self.store.len()
        ));
        let label = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Rating: ", label),
                Span::styled(beer.stars(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(vec![
                Span::styled("Photo:  ", label),
                Span::raw(detail.photo.describe()),
            ]),
            Line::from(""),
            Line::from(Span::styled("Note", label)),
        ];
        match &beer.note {
            Some(note) => lines.extend(note.lines().map(|line| Line::from(line.to_string()))),
            None => lines.push(Line::from(Span::styled(
                "No note yet.",
                Style::default().fg(Color::DarkGray),
            ))),
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
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

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&'static str, &'static str)] = match (&self.screen, &self.mode) {
            (_, Mode::AddingBeer(_)) | (_, Mode::EditingBeer { .. }) => &[
                ("[Tab]", " Next field   "),
                ("[←→]", " Rating   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::ConfirmDelete(_)) => &[("[Y]", " Delete   "), ("[N]", " Keep")],
            (Screen::Beers, _) => &[
                ("[↑↓]", " Navigate   "),
                ("[Enter]", " Open   "),
                ("[+]", " Add   "),
                ("[E]", " Edit   "),
                ("[-]", " Delete   "),
                ("[I]", " Import inbox   "),
                ("[Q]", " Quit"),
            ],
            (Screen::Detail(_), _) => &[
                ("[Tab]", " Next beer   "),
                ("[E]", " Edit   "),
                ("[X]", " Share   "),
                ("[O]", " Open photo   "),
                ("[-]", " Delete   "),
                ("[Esc]", " Back"),
            ],
        };

        Line::from(
            hints
                .iter()
                .flat_map(|(key, action)| [Span::styled(*key, key_style), Span::raw(*action)])
                .collect::<Vec<_>>(),
        )
    }

    fn draw_beer_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BeerForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let fields = [
            BeerField::Name,
            BeerField::Rating,
            BeerField::Photo,
            BeerField::Note,
        ];
        let mut lines: Vec<Line> = fields.iter().map(|field| form.build_line(*field)).collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        if form.active != BeerField::Rating {
            if let Some(row) = fields.iter().position(|field| *field == form.active) {
                let prefix = format!("{}: ", form.active.label()).len() as u16;
                let cursor_x = inner.x + prefix + form.value_len(form.active) as u16;
                frame.set_cursor_position((cursor_x, inner.y + row as u16));
            }
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBeerDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Remove '{}'?", confirm.name)),
            Line::from("Its photo stays in the image folder."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
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

    /// Save the store, reporting a failure in the footer. The in-memory change
    /// is kept either way.
    fn persist(&mut self) -> bool {
        match self.store.save() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to save beers");
                let err = anyhow::Error::new(err).context("failed to save beers");
                self.set_status(
                    format!("Could not save beers: {}", surface_error(&err)),
                    StatusKind::Error,
                );
                false
            }
        }
    }

    fn save_form(&mut self, target: Option<usize>, form: &BeerForm) -> Result<()> {
        let BeerInput {
            name,
            rating,
            note,
            photo,
        } = form.parse_inputs()?;

        let mut beer = match target {
            Some(index) => self
                .store
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow!("Beer no longer exists."))?,
            None => Beer::default(),
        };
        beer.name = name;
        beer.rating = rating;
        beer.note = note;

        let photo_error = photo.and_then(|path| self.attach_photo(&mut beer, &path).err());
        let label = beer.name.clone();

        let index = match target {
            Some(index) => {
                self.store.replace(index, beer);
                index
            }
            None => self.store.append(beer),
        };
        self.selected = index;
        self.refresh_detail(index);

        if self.persist() {
            match photo_error {
                Some(err) => self.set_status(
                    format!(
                        "Saved {label}, but the photo was not attached: {}",
                        surface_error(&err)
                    ),
                    StatusKind::Error,
                ),
                None => self.set_status(format!("Saved {label}."), StatusKind::Info),
            }
        }
        Ok(())
    }

    fn attach_photo(&self, beer: &mut Beer, path: &Path) -> Result<()> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        beer.save_image(&self.images, &bytes)
            .context("failed to store photo")?;
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmBeerDelete) -> Result<()> {
        let beer = self
            .store
            .remove(confirm.index)
            .ok_or_else(|| anyhow!("Beer no longer exists."))?;
        self.screen = Screen::Beers;
        self.selected = step_index(confirm.index, 0, self.store.len());
        if self.persist() {
            self.set_status(format!("Deleted {}.", beer.name), StatusKind::Info);
        }
        Ok(())
    }

    fn open_detail(&mut self, index: usize) {
        if let Some(beer) = self.store.get(index) {
            let detail = DetailScreen::open(index, beer, &self.images);
            self.selected = index;
            self.screen = Screen::Detail(detail);
        }
    }

    /// Re-read the photo when the detail view shows the beer at `index`.
    fn refresh_detail(&mut self, index: usize) {
        if matches!(&self.screen, Screen::Detail(detail) if detail.index == index) {
            self.open_detail(index);
        }
    }

    fn share(&mut self, index: usize) {
        let Some(beer) = self.store.get(index) else {
            return;
        };
        let (message, kind) = match beer.export_to_file(&self.dirs, &self.images) {
            Ok(path) => (
                format!("Shared {} as {}.", beer.name, path.display()),
                StatusKind::Info,
            ),
            Err(err) => (
                format!("Export failed: {}", surface_error(&anyhow::Error::new(err))),
                StatusKind::Error,
            ),
        };
        self.set_status(message, kind);
    }

    fn open_photo(&mut self, index: usize) {
        let path = self
            .store
            .get(index)
            .and_then(|beer| beer.image_file(&self.images));
        match path {
            None => self.set_status("This beer does not have a photo.", StatusKind::Error),
            Some(path) => {
                if let Err(err) = open_link(&path) {
                    self.set_status(format!("Failed to open photo: {err}"), StatusKind::Error);
                } else {
                    self.set_status(format!("Opened {}.", path.display()), StatusKind::Info);
                }
            }
        }
    }

    fn import_from_inbox(&mut self) {
        match import_inbox(&self.dirs, &mut self.store, &self.images) {
            Ok(report) if report.is_empty() => {
                self.set_status("Inbox is empty.", StatusKind::Info)
            }
            Ok(report) => self.report_inbox(&report),
            Err(err) => {
                warn!(error = %err, "inbox import failed");
                self.set_status(
                    format!(
                        "Could not read inbox: {}",
                        surface_error(&anyhow::Error::new(err))
                    ),
                    StatusKind::Error,
                );
            }
        }
    }
}
