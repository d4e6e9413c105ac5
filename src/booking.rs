mod form;
mod model;
mod path;
mod validation;

pub use form::{BookingForm, FormError, Phase};
pub use model::{
    BookingRequest, Draft, HOUSES, House, RowId, SearchRequest, SearchRow, ShiftRequest, ShiftRow,
    ShiftType, house_name,
};
pub use path::{FieldPath, PathError, RowPath, ShiftField};
pub use validation::{SearchErrors, ShiftErrors, ValidationErrors, to_request, validate};
