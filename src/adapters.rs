use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::info;

use crate::booking::BookingRequest;
use crate::credentials::CredentialStore;
use crate::history::{BookingRecord, BookingStatus};
use crate::ports::{self, BoundaryError, CheckOutcome, Route, SubmissionOutcome};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

/// Credential check backed by a [`CredentialStore`], answering after a fixed
/// latency to behave like a remote identity service.
#[derive(Debug, Clone)]
pub struct StoreCredentialCheck<T> {
    store: Arc<CredentialStore>,
    time: T,
    latency: Duration,
}

impl<T> StoreCredentialCheck<T> {
    pub fn new(store: CredentialStore, time: T, latency: Duration) -> Self {
        Self {
            store: Arc::new(store),
            time,
            latency,
        }
    }
}

impl<T: ports::TimeProvider> ports::CredentialCheck for StoreCredentialCheck<T> {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<CheckOutcome, BoundaryError>> + Send + 'a>>
    where
        Self: 'a;

    fn check<'a>(&'a self, email: &'a str, password: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            if !self.latency.is_zero() {
                self.time.sleep(self.latency).await;
            }
            Ok(self.store.check(email, password))
        })
    }
}

/// Navigator for request handlers: remembers the last requested route so the
/// handler can answer with a redirect.
#[derive(Debug, Clone, Default)]
pub struct RouteRecorder {
    route: Arc<Mutex<Option<Route>>>,
}

impl RouteRecorder {
    pub fn take(&self) -> Option<Route> {
        self.route.lock().expect("route recorder lock").take()
    }
}

impl ports::Navigator for RouteRecorder {
    fn go_to(&self, route: Route) {
        *self.route.lock().expect("route recorder lock") = Some(route);
    }
}

/// Submission endpoint stand-in: accepts every request and hands back a
/// sequential reference.
#[derive(Debug, Clone)]
pub struct StubSubmitter<T> {
    time: T,
    sequence: Arc<AtomicU64>,
}

impl<T> StubSubmitter<T> {
    pub fn new(time: T) -> Self {
        Self {
            time,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T: ports::TimeProvider> ports::BookingSubmitter for StubSubmitter<T> {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<SubmissionOutcome, BoundaryError>> + Send + 'a>>
    where
        Self: 'a;

    fn submit<'a>(&'a self, request: &'a BookingRequest) -> Self::Fut<'a> {
        Box::pin(async move {
            let number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            let reference = format!("BK-{number:04}");
            let shifts: usize = request
                .searches
                .iter()
                .map(|search| search.shifts.len())
                .sum();
            info!(
                %reference,
                house = %request.house,
                searches = request.searches.len(),
                shifts,
                received_at = %self.time.now(),
                "booking accepted"
            );
            Ok(SubmissionOutcome::Accepted { reference })
        })
    }
}

/// History source holding records in memory. Cancelling flips the stored
/// status, which the next listing picks up.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    records: Arc<Mutex<Vec<BookingRecord>>>,
}

impl InMemoryHistory {
    pub fn new(records: Vec<BookingRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }
}

impl ports::BookingHistory for InMemoryHistory {
    type ListFut<'a>
        = std::future::Ready<Result<Vec<BookingRecord>, BoundaryError>>
    where
        Self: 'a;
    type CancelFut<'a>
        = std::future::Ready<Result<(), BoundaryError>>
    where
        Self: 'a;

    fn list_bookings(&self) -> Self::ListFut<'_> {
        let records = self.records.lock().expect("history lock").clone();
        std::future::ready(Ok(records))
    }

    fn cancel<'a>(&'a self, booking_id: &'a str) -> Self::CancelFut<'a> {
        let mut records = self.records.lock().expect("history lock");
        let result = match records.iter_mut().find(|record| record.id == booking_id) {
            Some(record) if record.status == BookingStatus::Ongoing => {
                record.status = BookingStatus::Cancelled;
                Ok(())
            }
            Some(record) => Err(BoundaryError::new(
                "history",
                format!("booking {booking_id} is {}", record.status.as_str()),
            )),
            None => Err(BoundaryError::new(
                "history",
                format!("booking {booking_id} not found"),
            )),
        };
        std::future::ready(result)
    }
}
