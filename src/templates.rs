use crate::state::Notice;

use askama::Template;
use askama_web::WebTemplate;

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub(crate) struct LoginTemplate {
    pub(crate) app_name: String,
    pub(crate) display_name: String,
    pub(crate) active: &'static str,
    pub(crate) email: String,
    pub(crate) error: String,
    pub(crate) loading: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "loading.html")]
pub(crate) struct LoadingTemplate {
    pub(crate) app_name: String,
    pub(crate) display_name: String,
    pub(crate) active: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "booking.html")]
pub(crate) struct BookingTemplate {
    pub(crate) app_name: String,
    pub(crate) display_name: String,
    pub(crate) active: &'static str,
    pub(crate) notice: NoticeView,
    pub(crate) houses: Vec<OptionView>,
    pub(crate) house_error: String,
    pub(crate) drop_date: String,
    pub(crate) drop_date_error: String,
    pub(crate) drop_time: String,
    pub(crate) drop_time_error: String,
    pub(crate) searches_error: String,
    pub(crate) searches: Vec<SearchView>,
}

pub(crate) struct NoticeView {
    pub(crate) message: String,
    pub(crate) is_error: bool,
}

impl From<Option<Notice>> for NoticeView {
    fn from(notice: Option<Notice>) -> Self {
        match notice {
            Some(Notice::Info(message)) => Self {
                message,
                is_error: false,
            },
            Some(Notice::Error(message)) => Self {
                message,
                is_error: true,
            },
            None => Self {
                message: String::new(),
                is_error: false,
            },
        }
    }
}

pub(crate) struct OptionView {
    pub(crate) value: &'static str,
    pub(crate) label: &'static str,
    pub(crate) selected: bool,
}

pub(crate) struct SearchView {
    pub(crate) number: usize,
    pub(crate) row_id: String,
    pub(crate) id_field: String,
    pub(crate) removable: bool,
    pub(crate) error: String,
    pub(crate) shifts: Vec<ShiftView>,
}

pub(crate) struct ShiftView {
    pub(crate) number: usize,
    pub(crate) row_id: String,
    pub(crate) id_field: String,
    pub(crate) removable: bool,
    pub(crate) date: FieldView,
    pub(crate) shift_type: FieldView,
    pub(crate) shift_types: Vec<OptionView>,
    pub(crate) start_time: FieldView,
}

pub(crate) struct FieldView {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) error: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "review.html")]
pub(crate) struct ReviewTemplate {
    pub(crate) app_name: String,
    pub(crate) display_name: String,
    pub(crate) active: &'static str,
    pub(crate) notice: NoticeView,
    pub(crate) house: String,
    pub(crate) drop_date: String,
    pub(crate) drop_time: String,
    pub(crate) searches: Vec<ReviewSearch>,
}

pub(crate) struct ReviewSearch {
    pub(crate) number: usize,
    pub(crate) shifts: Vec<ReviewShift>,
}

pub(crate) struct ReviewShift {
    pub(crate) number: usize,
    pub(crate) date: String,
    pub(crate) shift_type: &'static str,
    pub(crate) start_time: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "history.html")]
pub(crate) struct HistoryTemplate {
    pub(crate) app_name: String,
    pub(crate) display_name: String,
    pub(crate) active: &'static str,
    pub(crate) notice: NoticeView,
    pub(crate) rows: Vec<HistoryRow>,
}

pub(crate) struct HistoryRow {
    pub(crate) id: String,
    pub(crate) house: String,
    pub(crate) status: &'static str,
    pub(crate) icon: &'static str,
    pub(crate) status_class: &'static str,
    pub(crate) date: String,
    pub(crate) time_range: String,
    pub(crate) can_cancel: bool,
}
