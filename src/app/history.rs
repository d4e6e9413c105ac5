use crate::history::{BookingRecord, format_date, format_time, status_badge};
use crate::ports::{BookingHistory, Route};
use crate::session::Identity;
use crate::state::{self, BrowserSession, Notice};
use crate::templates;

use axum::Extension;
use axum::Json;
use axum::extract::Path as AxumPath;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Redirect;
use tracing::{debug, error, info};

use std::sync::Arc;

const HISTORY_UNAVAILABLE: &str = "Booking history is unavailable right now.";
const CANCEL_FAILED: &str = "We could not cancel this booking. Please try again.";
const CANCEL_REFUSED: &str = "Only ongoing bookings can be cancelled.";

pub(crate) async fn history_view(
    State(state): State<state::AppState>,
    Extension(browser): Extension<Arc<BrowserSession>>,
    Extension(identity): Extension<Identity>,
) -> templates::HistoryTemplate {
    let mut notice = browser.take_notice();
    let rows = match state.history.list_bookings().await {
        Ok(records) => records.iter().map(history_row).collect(),
        Err(err) => {
            error!(%err, "failed to list bookings");
            notice = Some(Notice::Error(HISTORY_UNAVAILABLE.to_string()));
            Vec::new()
        }
    };

    templates::HistoryTemplate {
        app_name: state.config.app_name.clone(),
        display_name: identity.display_name,
        active: "history",
        notice: notice.into(),
        rows,
    }
}

fn history_row(record: &BookingRecord) -> templates::HistoryRow {
    let badge = status_badge(record.status);
    templates::HistoryRow {
        id: record.id.clone(),
        house: record.house.clone(),
        status: record.status.as_str(),
        icon: badge.map(|badge| badge.icon).unwrap_or_default(),
        status_class: badge.map(|badge| badge.class).unwrap_or_default(),
        date: format_date(record.date),
        time_range: format!(
            "{} - {}",
            format_time(record.start_time),
            format_time(record.drop_time)
        ),
        can_cancel: record.can_cancel(),
    }
}

/// Cancels an ongoing booking. Any other status is refused before the
/// history service is asked.
pub(crate) async fn history_cancel(
    State(state): State<state::AppState>,
    Extension(browser): Extension<Arc<BrowserSession>>,
    AxumPath(booking_id): AxumPath<String>,
) -> Redirect {
    let cancellable = match state.history.list_bookings().await {
        Ok(records) => records
            .iter()
            .any(|record| record.id == booking_id && record.can_cancel()),
        Err(err) => {
            error!(%err, "failed to list bookings");
            browser.set_notice(Notice::Error(CANCEL_FAILED.to_string()));
            return Redirect::to(Route::History.path());
        }
    };
    if !cancellable {
        debug!(%booking_id, "cancel refused");
        browser.set_notice(Notice::Error(CANCEL_REFUSED.to_string()));
        return Redirect::to(Route::History.path());
    }

    match state.history.cancel(&booking_id).await {
        Ok(()) => {
            info!(%booking_id, "booking cancelled");
            browser.set_notice(Notice::Info("Booking cancelled.".to_string()));
        }
        Err(err) => {
            error!(%booking_id, %err, "booking cancellation failed");
            browser.set_notice(Notice::Error(CANCEL_FAILED.to_string()));
        }
    }
    Redirect::to(Route::History.path())
}

pub(crate) async fn api_bookings(
    State(state): State<state::AppState>,
) -> Result<Json<Vec<BookingRecord>>, (StatusCode, &'static str)> {
    state.history.list_bookings().await.map(Json).map_err(|err| {
        error!(%err, "failed to list bookings");
        (StatusCode::SERVICE_UNAVAILABLE, HISTORY_UNAVAILABLE)
    })
}
