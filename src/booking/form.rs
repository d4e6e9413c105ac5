use thiserror::Error;

use crate::booking::model::{BookingRequest, Draft, RowId, RowIds, SearchRow, ShiftRow};
use crate::booking::path::{FieldPath, ShiftField};
use crate::booking::validation::{self, ValidationErrors};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("the booking is being reviewed and cannot be edited")]
    ReadOnly,
    #[error("the booking is not being reviewed")]
    NotReviewing,
    #[error("no search at index {0}")]
    NoSuchSearch(usize),
    #[error("no shift at index {shift} in search {search}")]
    NoSuchShift { search: usize, shift: usize },
    #[error("no row {0} in the draft")]
    UnknownRow(RowId),
    #[error("the last search cannot be removed")]
    LastSearch,
    #[error("the last shift of a search cannot be removed")]
    LastShift,
    #[error("the booking has {0} validation error(s)")]
    Invalid(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Reviewing(BookingRequest),
}

/// Editable booking draft with a two-step submit.
///
/// Structural edits keep the "at least one search, at least one shift per
/// search" shape; removals that would break it are refused and leave the
/// draft untouched. Errors are only shown once a submit has been attempted,
/// after which every edit re-validates.
#[derive(Debug)]
pub struct BookingForm {
    ids: RowIds,
    draft: Draft,
    phase: Phase,
    errors: ValidationErrors,
    revalidate: bool,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingForm {
    pub fn new() -> Self {
        let mut ids = RowIds::default();
        let draft = Draft::blank(&mut ids);
        Self {
            ids,
            draft,
            phase: Phase::Editing,
            errors: ValidationErrors::default(),
            revalidate: false,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_reviewing(&self) -> bool {
        matches!(self.phase, Phase::Reviewing(_))
    }

    pub fn reviewed_request(&self) -> Option<&BookingRequest> {
        match &self.phase {
            Phase::Reviewing(request) => Some(request),
            Phase::Editing => None,
        }
    }

    /// Errors currently on display.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn can_remove_search(&self) -> bool {
        self.draft.searches.len() > 1
    }

    pub fn can_remove_shift(&self, search_index: usize) -> bool {
        self.draft
            .searches
            .get(search_index)
            .is_some_and(|search| search.shifts.len() > 1)
    }

    /// Current position of the search with this id.
    pub fn locate_search(&self, search: RowId) -> Option<usize> {
        self.draft
            .searches
            .iter()
            .position(|row| row.id == search)
    }

    /// Current position of a shift, which must still belong to `search`.
    pub fn locate_shift(&self, search: RowId, shift: RowId) -> Option<(usize, usize)> {
        let search_index = self.locate_search(search)?;
        let shift_index = self.draft.searches[search_index]
            .shifts
            .iter()
            .position(|row| row.id == shift)?;
        Some((search_index, shift_index))
    }

    pub fn add_search(&mut self) -> Result<(), FormError> {
        self.ensure_editing()?;
        let search = SearchRow::blank(&mut self.ids);
        self.draft.searches.push(search);
        self.after_edit();
        Ok(())
    }

    pub fn remove_search(&mut self, index: usize) -> Result<(), FormError> {
        self.ensure_editing()?;
        if index >= self.draft.searches.len() {
            return Err(FormError::NoSuchSearch(index));
        }
        if !self.can_remove_search() {
            return Err(FormError::LastSearch);
        }
        self.draft.searches.remove(index);
        self.after_edit();
        Ok(())
    }

    pub fn add_shift(&mut self, search_index: usize) -> Result<(), FormError> {
        self.ensure_editing()?;
        let shift = ShiftRow::blank(&mut self.ids);
        let search = self
            .draft
            .searches
            .get_mut(search_index)
            .ok_or(FormError::NoSuchSearch(search_index))?;
        search.shifts.push(shift);
        self.after_edit();
        Ok(())
    }

    pub fn remove_shift(&mut self, search_index: usize, shift_index: usize) -> Result<(), FormError> {
        self.ensure_editing()?;
        let search = self
            .draft
            .searches
            .get_mut(search_index)
            .ok_or(FormError::NoSuchSearch(search_index))?;
        if shift_index >= search.shifts.len() {
            return Err(FormError::NoSuchShift {
                search: search_index,
                shift: shift_index,
            });
        }
        if search.shifts.len() == 1 {
            return Err(FormError::LastShift);
        }
        search.shifts.remove(shift_index);
        self.after_edit();
        Ok(())
    }

    /// Writes one leaf value. Rows are edited in place so their ids, and any
    /// sibling input, are left alone.
    pub fn set_field(&mut self, path: &FieldPath, value: impl Into<String>) -> Result<(), FormError> {
        self.ensure_editing()?;
        let value = value.into();
        let slot = match *path {
            FieldPath::House => &mut self.draft.house,
            FieldPath::DropDate => &mut self.draft.drop_date,
            FieldPath::DropTime => &mut self.draft.drop_time,
            FieldPath::Shift {
                search,
                shift,
                field,
            } => {
                let row = self
                    .draft
                    .searches
                    .get_mut(search)
                    .ok_or(FormError::NoSuchSearch(search))?
                    .shifts
                    .get_mut(shift)
                    .ok_or(FormError::NoSuchShift { search, shift })?;
                match field {
                    ShiftField::Date => &mut row.date,
                    ShiftField::ShiftType => &mut row.shift_type,
                    ShiftField::StartTime => &mut row.start_time,
                }
            }
        };
        if *slot != value {
            *slot = value;
            self.after_edit();
        }
        Ok(())
    }

    pub fn validate(&self) -> ValidationErrors {
        validation::validate(&self.draft)
    }

    /// Validates the draft and, when it is clean, moves to the review step.
    /// An invalid draft stays editable with its errors on display.
    pub fn submit(&mut self) -> Result<&BookingRequest, FormError> {
        self.ensure_editing()?;
        self.revalidate = true;
        match validation::to_request(&self.draft) {
            Ok(request) => {
                self.errors = ValidationErrors::default();
                self.phase = Phase::Reviewing(request);
                match &self.phase {
                    Phase::Reviewing(request) => Ok(request),
                    Phase::Editing => Err(FormError::NotReviewing),
                }
            }
            Err(errors) => {
                let count = errors.leaf_messages(&self.draft).len();
                self.errors = errors;
                Err(FormError::Invalid(count.max(1)))
            }
        }
    }

    /// Finishes the review and starts over with a blank draft.
    pub fn confirm_review(&mut self) -> Result<BookingRequest, FormError> {
        let Phase::Reviewing(request) = std::mem::replace(&mut self.phase, Phase::Editing) else {
            return Err(FormError::NotReviewing);
        };
        self.draft = Draft::blank(&mut self.ids);
        self.errors = ValidationErrors::default();
        self.revalidate = false;
        Ok(request)
    }

    pub fn edit_review(&mut self) -> Result<(), FormError> {
        if !self.is_reviewing() {
            return Err(FormError::NotReviewing);
        }
        self.phase = Phase::Editing;
        Ok(())
    }

    fn ensure_editing(&self) -> Result<(), FormError> {
        if self.is_reviewing() {
            return Err(FormError::ReadOnly);
        }
        Ok(())
    }

    fn after_edit(&mut self) {
        if self.revalidate {
            self.errors = validation::validate(&self.draft);
        }
    }
}
