use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;

use crate::booking::BookingRequest;
use crate::history::BookingRecord;

/// Failure of a call into an external collaborator. Callers treat it as
/// recoverable and leave their local state as it was before the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{service} unavailable: {message}")]
pub struct BoundaryError {
    pub service: &'static str,
    pub message: String,
}

impl BoundaryError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Booking,
    History,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Booking => "/booking",
            Route::History => "/history",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Accepted { display_name: String },
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted { reference: String },
    Rejected { reason: String },
}

pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}

pub trait CredentialCheck: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<CheckOutcome, BoundaryError>> + Send + 'a
    where
        Self: 'a;

    fn check<'a>(&'a self, email: &'a str, password: &'a str) -> Self::Fut<'a>;
}

pub trait Navigator {
    fn go_to(&self, route: Route);
}

pub trait BookingSubmitter: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<SubmissionOutcome, BoundaryError>> + Send + 'a
    where
        Self: 'a;

    fn submit<'a>(&'a self, request: &'a BookingRequest) -> Self::Fut<'a>;
}

pub trait BookingHistory: Clone + Send + Sync + 'static {
    type ListFut<'a>: Future<Output = Result<Vec<BookingRecord>, BoundaryError>> + Send + 'a
    where
        Self: 'a;
    type CancelFut<'a>: Future<Output = Result<(), BoundaryError>> + Send + 'a
    where
        Self: 'a;

    fn list_bookings(&self) -> Self::ListFut<'_>;
    fn cancel<'a>(&'a self, booking_id: &'a str) -> Self::CancelFut<'a>;
}
