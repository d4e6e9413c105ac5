use crate::adapters::{InMemoryHistory, StoreCredentialCheck, StubSubmitter, TokioTimeProvider};
use crate::auth::{SessionCookies, new_session_id};
use crate::booking::BookingForm;
use crate::config::AppConfig;
use crate::session::{LoginService, SessionHandle};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub(crate) type AppLogin = LoginService<StoreCredentialCheck<TokioTimeProvider>, TokioTimeProvider>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub(crate) cookies: SessionCookies,
    pub(crate) sessions: SessionRegistry,
    pub(crate) login: AppLogin,
    pub(crate) submitter: StubSubmitter<TokioTimeProvider>,
    pub(crate) history: InMemoryHistory,
}

/// Server-side state owned by one browser.
#[derive(Debug, Default)]
pub(crate) struct BrowserSession {
    pub(crate) session: SessionHandle,
    pub(crate) form: Mutex<BookingForm>,
    pub(crate) notice: Mutex<Option<Notice>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    Info(String),
    Error(String),
}

impl BrowserSession {
    pub(crate) fn set_notice(&self, notice: Notice) {
        *self.notice.lock().expect("notice lock") = Some(notice);
    }

    pub(crate) fn take_notice(&self) -> Option<Notice> {
        self.notice.lock().expect("notice lock").take()
    }

    /// Starts the booking screen over for a new owner.
    pub(crate) fn reset_booking(&self) {
        *self.form.lock().expect("booking form lock") = BookingForm::new();
        self.notice.lock().expect("notice lock").take();
    }
}

#[derive(Clone, Default)]
pub(crate) struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, Arc<BrowserSession>>>>,
}

impl SessionRegistry {
    pub(crate) fn get(&self, id: &str) -> Option<Arc<BrowserSession>> {
        self.sessions
            .lock()
            .expect("session registry lock")
            .get(id)
            .cloned()
    }

    pub(crate) fn create(&self) -> (String, Arc<BrowserSession>) {
        let id = new_session_id();
        let browser = Arc::new(BrowserSession::default());
        self.sessions
            .lock()
            .expect("session registry lock")
            .insert(id.clone(), Arc::clone(&browser));
        (id, browser)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.sessions.lock().expect("session registry lock").len()
    }

    pub(crate) fn remove(&self, id: &str) -> Option<Arc<BrowserSession>> {
        self.sessions
            .lock()
            .expect("session registry lock")
            .remove(id)
    }
}
