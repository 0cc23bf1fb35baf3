use std::path::PathBuf;

use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{clamp_rating, Beer, MAX_RATING, MIN_RATING};

/// Form state for adding or editing a beer.
#[derive(Clone)]
pub(crate) struct BeerForm {
    pub(crate) name: String,
    pub(crate) rating: i64,
    /// Path of an image file to attach. Empty keeps the current photo.
    pub(crate) photo: String,
    pub(crate) note: String,
    pub(crate) active: BeerField,
    pub(crate) error: Option<String>,
    /// Shown next to the photo field when the beer already has one.
    pub(crate) has_photo: bool,
}

/// Fields in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BeerField {
    #[default]
    Name,
    Rating,
    Photo,
    Note,
}

impl BeerField {
    const ORDER: [BeerField; 4] = [
        BeerField::Name,
        BeerField::Rating,
        BeerField::Photo,
        BeerField::Note,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BeerField::Name => "Name",
            BeerField::Rating => "Rating",
            BeerField::Photo => "Photo",
            BeerField::Note => "Note",
        }
    }

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }
}

/// Validated form contents ready to be applied to a beer.
#[derive(Debug, PartialEq)]
pub(crate) struct BeerInput {
    pub(crate) name: String,
    pub(crate) rating: i64,
    pub(crate) note: Option<String>,
    pub(crate) photo: Option<PathBuf>,
}

impl Default for BeerForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            rating: MIN_RATING,
            photo: String::new(),
            note: String::new(),
            active: BeerField::Name,
            error: None,
            has_photo: false,
        }
    }
}

impl BeerForm {
    /// Populate the form from an existing beer when editing.
    pub(crate) fn from_beer(beer: &Beer) -> Self {
        Self {
            name: beer.name.clone(),
            rating: clamp_rating(beer.rating),
            note: beer.note.clone().unwrap_or_default(),
            has_photo: beer.image_path.is_some(),
            ..Self::default()
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.shift_field(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.shift_field(BeerField::ORDER.len() - 1);
    }

    fn shift_field(&mut self, step: usize) {
        let next = (self.active.position() + step) % BeerField::ORDER.len();
        self.active = BeerField::ORDER[next];
    }

    /// Nudge the rating by `delta`, staying within the supported range.
    pub(crate) fn adjust_rating(&mut self, delta: i64) {
        self.rating = clamp_rating(self.rating + delta);
    }

    /// Append a character to the active field. On the rating field only the
    /// digits 1 through 5 are accepted and replace the current value.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BeerField::Name => self.name.push(ch),
            BeerField::Photo => self.photo.push(ch),
            BeerField::Note => self.note.push(ch),
            BeerField::Rating => match ch.to_digit(10).map(i64::from) {
                Some(value) if (MIN_RATING..=MAX_RATING).contains(&value) => self.rating = value,
                _ => return false,
            },
        }
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BeerField::Name => {
                self.name.pop();
            }
            BeerField::Photo => {
                self.photo.pop();
            }
            BeerField::Note => {
                self.note.pop();
            }
            BeerField::Rating => {}
        }
    }

    /// Validate the inputs and return typed values ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<BeerInput> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Beer name is required."));
        }
        let note = self.note.trim();
        let photo = self.photo.trim();
        Ok(BeerInput {
            name: name.to_string(),
            rating: clamp_rating(self.rating),
            note: (!note.is_empty()).then(|| note.to_string()),
            photo: (!photo.is_empty()).then(|| PathBuf::from(photo)),
        })
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: BeerField) -> Line<'static> {
        let is_active = self.active == field;
        let (display, empty) = match field {
            BeerField::Name => placeholder(&self.name, "<required>"),
            BeerField::Rating => {
                let stars = Beer::new("", None, None, self.rating).stars();
                (format!("{stars} ({})", self.rating), false)
            }
            BeerField::Photo => {
                let hint = if self.has_photo {
                    "<keep current photo>"
                } else {
                    "<path to image, optional>"
                };
                placeholder(&self.photo, hint)
            }
            BeerField::Note => placeholder(&self.note, "<optional>"),
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if empty {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Return the character count for the requested text field.
    pub(crate) fn value_len(&self, field: BeerField) -> usize {
        match field {
            BeerField::Name => self.name.chars().count(),
            BeerField::Photo => self.photo.chars().count(),
            BeerField::Note => self.note.chars().count(),
            BeerField::Rating => 0,
        }
    }
}

fn placeholder(value: &str, hint: &str) -> (String, bool) {
    if value.is_empty() {
        (hint.to_string(), true)
    } else {
        (value.to_string(), false)
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmBeerDelete {
    pub(crate) index: usize,
    pub(crate) name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let form = BeerForm {
            name: "   ".to_string(),
            ..BeerForm::default()
        };
        let err = form.parse_inputs().unwrap_err();
        assert_eq!(err.to_string(), "Beer name is required.");
    }

    #[test]
    fn inputs_are_trimmed_and_optional_fields_dropped() {
        let form = BeerForm {
            name: " Gose ".to_string(),
            rating: 4,
            note: "  ".to_string(),
            photo: " /tmp/gose.png ".to_string(),
            ..BeerForm::default()
        };
        assert_eq!(
            form.parse_inputs().unwrap(),
            BeerInput {
                name: "Gose".to_string(),
                rating: 4,
                note: None,
                photo: Some(PathBuf::from("/tmp/gose.png")),
            }
        );
    }

    #[test]
    fn rating_field_takes_digits_and_arrows() {
        let mut form = BeerForm::default();
        form.next_field();
        assert_eq!(form.active, BeerField::Rating);

        assert!(form.push_char('4'));
        assert_eq!(form.rating, 4);
        assert!(!form.push_char('9'));
        assert!(!form.push_char('x'));
        assert_eq!(form.rating, 4);

        form.adjust_rating(5);
        assert_eq!(form.rating, 5);
        form.adjust_rating(-10);
        assert_eq!(form.rating, 1);
    }

    #[test]
    fn focus_cycles_both_ways() {
        let mut form = BeerForm::default();
        form.previous_field();
        assert_eq!(form.active, BeerField::Note);
        form.next_field();
        assert_eq!(form.active, BeerField::Name);
    }

    #[test]
    fn editing_starts_from_beer() {
        let beer = Beer::new("Kölsch", Some("k.jpg".to_string()), Some("light".to_string()), 3);
        let form = BeerForm::from_beer(&beer);
        assert_eq!(form.name, "Kölsch");
        assert_eq!(form.rating, 3);
        assert_eq!(form.note, "light");
        assert!(form.has_photo);
        assert!(form.photo.is_empty());
        assert_eq!(form.value_len(BeerField::Name), 6);
    }
}
