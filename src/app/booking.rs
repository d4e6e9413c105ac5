use crate::booking::{
    BookingForm, BookingRequest, FieldPath, FormError, HOUSES, Phase, RowId, RowPath, ShiftField,
    ShiftType, house_name,
};
use crate::ports::{BookingSubmitter, Route, SubmissionOutcome};
use crate::session::Identity;
use crate::state::{self, BrowserSession, Notice};
use crate::templates;

use axum::Extension;
use axum::extract::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, error, info, warn};

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

const SUBMIT_FAILED: &str = "We could not submit your booking. Please try again.";
const STALE_FORM: &str =
    "This booking was changed in another window. Please check it and try again.";

/// Button actions posted together with the draft fields. Rows are named by
/// id so an action always lands on the row that was on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormOp {
    Review,
    AddSearch,
    RemoveSearch(RowId),
    AddShift(RowId),
    RemoveShift(RowId, RowId),
}

impl FromStr for FormOp {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (name, args) = match raw.split_once(':') {
            Some((name, args)) => (name, Some(args)),
            None => (raw, None),
        };
        match (name, args) {
            ("review", None) => Ok(FormOp::Review),
            ("add-search", None) => Ok(FormOp::AddSearch),
            ("remove-search", Some(search)) => Ok(FormOp::RemoveSearch(search.parse()?)),
            ("add-shift", Some(search)) => Ok(FormOp::AddShift(search.parse()?)),
            ("remove-shift", Some(args)) => {
                let (search, shift) = args.split_once(':').ok_or(())?;
                Ok(FormOp::RemoveShift(search.parse()?, shift.parse()?))
            }
            _ => Err(()),
        }
    }
}

/// One posted editor form. Shift fields arrive by position; the hidden row
/// ids say which rows those positions held when the page was rendered.
#[derive(Debug, Default)]
struct PostedDraft {
    fields: Vec<(FieldPath, String)>,
    searches: HashMap<usize, RowId>,
    shifts: HashMap<(usize, usize), RowId>,
    op: Option<String>,
}

impl PostedDraft {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut posted = Self::default();
        for (name, value) in pairs {
            if name == "op" {
                posted.op = Some(value);
                continue;
            }
            if let Ok(row) = name.parse::<RowPath>() {
                let Ok(id) = value.parse::<RowId>() else {
                    debug!(%row, value = %value, "ignoring malformed row id");
                    continue;
                };
                match row {
                    RowPath::Search(search) => {
                        posted.searches.insert(search, id);
                    }
                    RowPath::Shift(search, shift) => {
                        posted.shifts.insert((search, shift), id);
                    }
                }
                continue;
            }
            match name.parse::<FieldPath>() {
                Ok(path) => posted.fields.push((path, value)),
                Err(err) => debug!(%err, "ignoring posted field"),
            }
        }
        posted
    }

    /// Maps every posted field onto the current draft by row id. `None` when
    /// a posted row no longer exists or a shift field arrived without its id.
    fn resolve(&self, form: &BookingForm) -> Option<Vec<(FieldPath, String)>> {
        if self
            .searches
            .values()
            .any(|id| form.locate_search(*id).is_none())
        {
            return None;
        }
        for (&(search, _), &shift) in &self.shifts {
            form.locate_shift(*self.searches.get(&search)?, shift)?;
        }

        self.fields
            .iter()
            .map(|(path, value)| {
                let path = match *path {
                    FieldPath::Shift {
                        search,
                        shift,
                        field,
                    } => {
                        let search_id = *self.searches.get(&search)?;
                        let shift_id = *self.shifts.get(&(search, shift))?;
                        let (search, shift) = form.locate_shift(search_id, shift_id)?;
                        FieldPath::shift(search, shift, field)
                    }
                    top_level => top_level,
                };
                Some((path, value.clone()))
            })
            .collect()
    }
}

pub(crate) async fn home() -> Redirect {
    Redirect::to(Route::Booking.path())
}

pub(crate) async fn booking_view(
    State(state): State<state::AppState>,
    Extension(browser): Extension<Arc<BrowserSession>>,
    Extension(identity): Extension<Identity>,
) -> Response {
    let notice = templates::NoticeView::from(browser.take_notice());
    let form = browser.form.lock().expect("booking form lock");
    match form.phase() {
        Phase::Reviewing(request) => {
            review_page(&state, &identity, notice, request).into_response()
        }
        Phase::Editing => editor_page(&state, &identity, notice, &form).into_response(),
    }
}

/// Applies every posted field, then the requested action. A post made
/// against rows that have since been removed is refused as a whole.
pub(crate) async fn booking_update(
    Extension(browser): Extension<Arc<BrowserSession>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Redirect {
    let posted = PostedDraft::from_pairs(pairs);
    let stale = {
        let mut form = browser.form.lock().expect("booking form lock");
        match posted.resolve(&form) {
            Some(fields) => {
                for (path, value) in fields {
                    if let Err(err) = form.set_field(&path, value) {
                        debug!(%path, %err, "posted field not applied");
                    }
                }
                match posted.op.as_deref().unwrap_or("review").parse::<FormOp>() {
                    Ok(op) => match apply(&mut form, op) {
                        Ok(()) => false,
                        Err(FormError::UnknownRow(id)) => {
                            debug!(?op, %id, "form action names a removed row");
                            true
                        }
                        Err(err) => {
                            debug!(?op, %err, "form action refused");
                            false
                        }
                    },
                    Err(()) => {
                        debug!(op = ?posted.op, "unknown form action");
                        false
                    }
                }
            }
            None => {
                debug!("posted rows no longer match the draft");
                true
            }
        }
    };
    if stale {
        browser.set_notice(Notice::Error(STALE_FORM.to_string()));
    }
    Redirect::to(Route::Booking.path())
}

fn apply(form: &mut BookingForm, op: FormOp) -> Result<(), FormError> {
    match op {
        FormOp::Review => {
            let request = form.submit()?;
            info!(house = %request.house, searches = request.searches.len(), "booking ready for review");
            Ok(())
        }
        FormOp::AddSearch => form.add_search(),
        FormOp::RemoveSearch(search) => {
            let index = locate_search(form, search)?;
            form.remove_search(index)
        }
        FormOp::AddShift(search) => {
            let index = locate_search(form, search)?;
            form.add_shift(index)
        }
        FormOp::RemoveShift(search, shift) => {
            let (search, shift) = form
                .locate_shift(search, shift)
                .ok_or(FormError::UnknownRow(shift))?;
            form.remove_shift(search, shift)
        }
    }
}

fn locate_search(form: &BookingForm, id: RowId) -> Result<usize, FormError> {
    form.locate_search(id).ok_or(FormError::UnknownRow(id))
}

pub(crate) async fn booking_edit(Extension(browser): Extension<Arc<BrowserSession>>) -> Redirect {
    if let Err(err) = browser.form.lock().expect("booking form lock").edit_review() {
        debug!(%err, "edit requested outside review");
    }
    Redirect::to(Route::Booking.path())
}

/// Hands the reviewed booking to the submission endpoint. Only an accepted
/// submission clears the draft; anything else keeps the review on screen.
pub(crate) async fn booking_confirm(
    State(state): State<state::AppState>,
    Extension(browser): Extension<Arc<BrowserSession>>,
) -> Redirect {
    let request = {
        let form = browser.form.lock().expect("booking form lock");
        form.reviewed_request().cloned()
    };
    let Some(request) = request else {
        debug!("confirm requested outside review");
        return Redirect::to(Route::Booking.path());
    };

    match state.submitter.submit(&request).await {
        Ok(SubmissionOutcome::Accepted { reference }) => {
            let mut form = browser.form.lock().expect("booking form lock");
            if form.reviewed_request() == Some(&request)
                && let Err(err) = form.confirm_review()
            {
                warn!(%err, "booking accepted but review could not be closed");
            }
            browser.set_notice(Notice::Info(format!("Booking {reference} submitted.")));
        }
        Ok(SubmissionOutcome::Rejected { reason }) => {
            warn!(%reason, "booking rejected");
            browser.set_notice(Notice::Error(format!("Booking was not accepted: {reason}")));
        }
        Err(err) => {
            error!(%err, "booking submission failed");
            browser.set_notice(Notice::Error(SUBMIT_FAILED.to_string()));
        }
    }
    Redirect::to(Route::Booking.path())
}

fn editor_page(
    state: &state::AppState,
    identity: &Identity,
    notice: templates::NoticeView,
    form: &BookingForm,
) -> templates::BookingTemplate {
    let draft = form.draft();
    let errors = form.errors();
    let houses = HOUSES
        .iter()
        .map(|house| templates::OptionView {
            value: house.id,
            label: house.name,
            selected: draft.house() == house.id,
        })
        .collect();

    let searches = draft
        .searches()
        .iter()
        .enumerate()
        .map(|(search_index, search)| {
            let shifts = search
                .shifts()
                .iter()
                .enumerate()
                .map(|(shift_index, shift)| {
                    let shift_errors = errors.shift(search.id(), shift.id());
                    let field = |field: ShiftField, value: &str| templates::FieldView {
                        name: FieldPath::shift(search_index, shift_index, field).to_string(),
                        value: value.to_string(),
                        error: shift_errors
                            .and_then(|errors| errors.get(field))
                            .unwrap_or_default()
                            .to_string(),
                    };
                    templates::ShiftView {
                        number: shift_index + 1,
                        row_id: shift.id().to_string(),
                        id_field: RowPath::Shift(search_index, shift_index).to_string(),
                        removable: form.can_remove_shift(search_index),
                        date: field(ShiftField::Date, shift.date()),
                        shift_type: field(ShiftField::ShiftType, shift.shift_type()),
                        shift_types: ShiftType::ALL
                            .iter()
                            .map(|shift_type| templates::OptionView {
                                value: shift_type.as_str(),
                                label: shift_type.label(),
                                selected: shift.shift_type() == shift_type.as_str(),
                            })
                            .collect(),
                        start_time: field(ShiftField::StartTime, shift.start_time()),
                    }
                })
                .collect();
            templates::SearchView {
                number: search_index + 1,
                row_id: search.id().to_string(),
                id_field: RowPath::Search(search_index).to_string(),
                removable: form.can_remove_search(),
                error: errors
                    .search(search.id())
                    .and_then(|errors| errors.shifts)
                    .unwrap_or_default()
                    .to_string(),
                shifts,
            }
        })
        .collect();

    templates::BookingTemplate {
        app_name: state.config.app_name.clone(),
        display_name: identity.display_name.clone(),
        active: "booking",
        notice,
        houses,
        house_error: errors.house.unwrap_or_default().to_string(),
        drop_date: draft.drop_date().to_string(),
        drop_date_error: errors.drop_date.unwrap_or_default().to_string(),
        drop_time: draft.drop_time().to_string(),
        drop_time_error: errors.drop_time.unwrap_or_default().to_string(),
        searches_error: errors.searches.unwrap_or_default().to_string(),
        searches,
    }
}

fn review_page(
    state: &state::AppState,
    identity: &Identity,
    notice: templates::NoticeView,
    request: &BookingRequest,
) -> templates::ReviewTemplate {
    let searches = request
        .searches
        .iter()
        .enumerate()
        .map(|(search_index, search)| templates::ReviewSearch {
            number: search_index + 1,
            shifts: search
                .shifts
                .iter()
                .enumerate()
                .map(|(shift_index, shift)| templates::ReviewShift {
                    number: shift_index + 1,
                    date: shift.date.clone(),
                    shift_type: shift.shift_type.label(),
                    start_time: shift.start_time.clone(),
                })
                .collect(),
        })
        .collect();

    templates::ReviewTemplate {
        app_name: state.config.app_name.clone(),
        display_name: identity.display_name.clone(),
        active: "booking",
        notice,
        house: house_name(&request.house)
            .map(str::to_string)
            .unwrap_or_else(|| request.house.clone()),
        drop_date: request.drop_date.clone(),
        drop_time: request.drop_time.clone(),
        searches,
    }
}
