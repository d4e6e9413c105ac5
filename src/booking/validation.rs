use std::collections::BTreeMap;

use crate::booking::model::{
    BookingRequest, Draft, RowId, SearchRequest, ShiftRequest, ShiftRow, ShiftType,
};
use crate::booking::path::{FieldPath, ShiftField};

pub const HOUSE_REQUIRED: &str = "Please select a house";
pub const DROP_DATE_REQUIRED: &str = "Drop date is required";
pub const DROP_TIME_REQUIRED: &str = "Drop time is required";
pub const DATE_REQUIRED: &str = "Date is required";
pub const SHIFT_TYPE_REQUIRED: &str = "Shift type is required";
pub const SHIFT_TYPE_INVALID: &str = "Shift type must be morning, afternoon or night";
pub const START_TIME_REQUIRED: &str = "Start time is required";
pub const SHIFTS_REQUIRED: &str = "At least one shift is required";
pub const SEARCHES_REQUIRED: &str = "At least one search is required";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftErrors {
    pub date: Option<&'static str>,
    pub shift_type: Option<&'static str>,
    pub start_time: Option<&'static str>,
}

impl ShiftErrors {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.shift_type.is_none() && self.start_time.is_none()
    }

    pub fn get(&self, field: ShiftField) -> Option<&'static str> {
        match field {
            ShiftField::Date => self.date,
            ShiftField::ShiftType => self.shift_type,
            ShiftField::StartTime => self.start_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchErrors {
    pub shifts: Option<&'static str>,
    rows: BTreeMap<RowId, ShiftErrors>,
}

impl SearchErrors {
    pub fn is_empty(&self) -> bool {
        self.shifts.is_none() && self.rows.is_empty()
    }

    pub fn shift(&self, id: RowId) -> Option<&ShiftErrors> {
        self.rows.get(&id)
    }
}

/// Error tree mirroring the draft. Nested entries are keyed by [`RowId`], so a
/// message stays with its row when other rows are inserted or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub house: Option<&'static str>,
    pub drop_date: Option<&'static str>,
    pub drop_time: Option<&'static str>,
    pub searches: Option<&'static str>,
    rows: BTreeMap<RowId, SearchErrors>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.house.is_none()
            && self.drop_date.is_none()
            && self.drop_time.is_none()
            && self.searches.is_none()
            && self.rows.is_empty()
    }

    pub fn search(&self, id: RowId) -> Option<&SearchErrors> {
        self.rows.get(&id)
    }

    pub fn shift(&self, search: RowId, shift: RowId) -> Option<&ShiftErrors> {
        self.search(search).and_then(|errors| errors.shift(shift))
    }

    /// Resolves an index-addressed path against `draft` and returns the
    /// message attached to the row currently at that position.
    pub fn message_at(&self, draft: &Draft, path: &FieldPath) -> Option<&'static str> {
        match *path {
            FieldPath::House => self.house,
            FieldPath::DropDate => self.drop_date,
            FieldPath::DropTime => self.drop_time,
            FieldPath::Shift {
                search,
                shift,
                field,
            } => {
                let search_row = draft.searches.get(search)?;
                let shift_row = search_row.shifts.get(shift)?;
                self.shift(search_row.id, shift_row.id)?.get(field)
            }
        }
    }

    /// Every leaf message that resolves to a row of `draft`, in draft order.
    pub fn leaf_messages(&self, draft: &Draft) -> Vec<(FieldPath, &'static str)> {
        let mut messages = Vec::new();
        let top = [
            (FieldPath::House, self.house),
            (FieldPath::DropDate, self.drop_date),
            (FieldPath::DropTime, self.drop_time),
        ];
        for (path, message) in top {
            if let Some(message) = message {
                messages.push((path, message));
            }
        }
        for (search_index, search) in draft.searches.iter().enumerate() {
            for (shift_index, shift) in search.shifts.iter().enumerate() {
                let Some(errors) = self.shift(search.id, shift.id) else {
                    continue;
                };
                for field in [ShiftField::Date, ShiftField::ShiftType, ShiftField::StartTime] {
                    if let Some(message) = errors.get(field) {
                        messages.push((
                            FieldPath::shift(search_index, shift_index, field),
                            message,
                        ));
                    }
                }
            }
        }
        messages
    }
}

pub fn validate(draft: &Draft) -> ValidationErrors {
    let mut errors = ValidationErrors {
        house: required(&draft.house, HOUSE_REQUIRED),
        drop_date: required(&draft.drop_date, DROP_DATE_REQUIRED),
        drop_time: required(&draft.drop_time, DROP_TIME_REQUIRED),
        searches: draft.searches.is_empty().then_some(SEARCHES_REQUIRED),
        rows: BTreeMap::new(),
    };

    for search in &draft.searches {
        let mut search_errors = SearchErrors {
            shifts: search.shifts.is_empty().then_some(SHIFTS_REQUIRED),
            rows: BTreeMap::new(),
        };
        for shift in &search.shifts {
            let shift_errors = validate_shift(shift);
            if !shift_errors.is_empty() {
                search_errors.rows.insert(shift.id, shift_errors);
            }
        }
        if !search_errors.is_empty() {
            errors.rows.insert(search.id, search_errors);
        }
    }

    errors
}

/// Converts a draft into a typed request, or explains why it cannot be.
pub fn to_request(draft: &Draft) -> Result<BookingRequest, ValidationErrors> {
    let errors = validate(draft);
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut searches = Vec::with_capacity(draft.searches.len());
    for search in &draft.searches {
        let mut shifts = Vec::with_capacity(search.shifts.len());
        for shift in &search.shifts {
            let Ok(shift_type) = shift.shift_type.parse::<ShiftType>() else {
                // unreachable after a clean validation pass
                return Err(errors);
            };
            shifts.push(ShiftRequest {
                date: shift.date.clone(),
                shift_type,
                start_time: shift.start_time.clone(),
            });
        }
        searches.push(SearchRequest { shifts });
    }

    Ok(BookingRequest {
        house: draft.house.clone(),
        drop_date: draft.drop_date.clone(),
        drop_time: draft.drop_time.clone(),
        searches,
    })
}

fn validate_shift(shift: &ShiftRow) -> ShiftErrors {
    let shift_type = if shift.shift_type.is_empty() {
        Some(SHIFT_TYPE_REQUIRED)
    } else if shift.shift_type.parse::<ShiftType>().is_err() {
        Some(SHIFT_TYPE_INVALID)
    } else {
        None
    };
    ShiftErrors {
        date: required(&shift.date, DATE_REQUIRED),
        shift_type,
        start_time: required(&shift.start_time, START_TIME_REQUIRED),
    }
}

fn required(value: &str, message: &'static str) -> Option<&'static str> {
    value.is_empty().then_some(message)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::booking::model::{RowIds, SearchRow};

    fn filled_shift(ids: &mut RowIds, date: &str, shift_type: &str, start_time: &str) -> ShiftRow {
        let mut shift = ShiftRow::blank(ids);
        shift.date = date.to_string();
        shift.shift_type = shift_type.to_string();
        shift.start_time = start_time.to_string();
        shift
    }

    fn valid_draft(ids: &mut RowIds) -> Draft {
        let mut draft = Draft::blank(ids);
        draft.house = "1".to_string();
        draft.drop_date = "2024-05-01".to_string();
        draft.drop_time = "09:00".to_string();
        draft.searches[0].shifts[0] = filled_shift(ids, "2024-05-02", "morning", "07:00");
        draft
    }

    #[test]
    fn validate__should_accept_complete_draft() {
        // Given
        let mut ids = RowIds::default();
        let draft = valid_draft(&mut ids);

        // When
        let errors = validate(&draft);

        // Then
        assert!(errors.is_empty());
    }

    #[test]
    fn validate__should_report_only_missing_house() {
        // Given
        let mut ids = RowIds::default();
        let mut draft = valid_draft(&mut ids);
        draft.house = String::new();

        // When
        let errors = validate(&draft);

        // Then
        assert_eq!(
            errors.leaf_messages(&draft),
            vec![(FieldPath::House, HOUSE_REQUIRED)]
        );
        assert!(errors.searches.is_none());
    }

    #[test]
    fn validate__should_report_each_missing_field_at_its_own_path() {
        // Given
        let mut ids = RowIds::default();
        let base = valid_draft(&mut ids);
        let cases = [
            (FieldPath::DropDate, DROP_DATE_REQUIRED),
            (FieldPath::DropTime, DROP_TIME_REQUIRED),
            (FieldPath::shift(0, 0, ShiftField::Date), DATE_REQUIRED),
            (FieldPath::shift(0, 0, ShiftField::ShiftType), SHIFT_TYPE_REQUIRED),
            (FieldPath::shift(0, 0, ShiftField::StartTime), START_TIME_REQUIRED),
        ];

        for (path, message) in cases {
            let mut draft = base.clone();
            match path {
                FieldPath::DropDate => draft.drop_date.clear(),
                FieldPath::DropTime => draft.drop_time.clear(),
                FieldPath::Shift { field, .. } => {
                    let shift = &mut draft.searches[0].shifts[0];
                    match field {
                        ShiftField::Date => shift.date.clear(),
                        ShiftField::ShiftType => shift.shift_type.clear(),
                        ShiftField::StartTime => shift.start_time.clear(),
                    }
                }
                FieldPath::House => unreachable!(),
            }

            // When
            let errors = validate(&draft);

            // Then
            assert_eq!(errors.leaf_messages(&draft), vec![(path, message)]);
            assert_eq!(errors.message_at(&draft, &path), Some(message));
        }
    }

    #[test]
    fn validate__should_reject_unknown_shift_type() {
        // Given
        let mut ids = RowIds::default();
        let mut draft = valid_draft(&mut ids);
        draft.searches[0].shifts[0].shift_type = "evening".to_string();

        // When
        let errors = validate(&draft);

        // Then
        assert_eq!(
            errors.message_at(&draft, &FieldPath::shift(0, 0, ShiftField::ShiftType)),
            Some(SHIFT_TYPE_INVALID)
        );
    }

    #[test]
    fn validate__should_enforce_minimum_lengths() {
        // Given
        let mut ids = RowIds::default();
        let mut draft = valid_draft(&mut ids);
        let mut empty_search = SearchRow::blank(&mut ids);
        empty_search.shifts.clear();
        let empty_id = empty_search.id;
        draft.searches.push(empty_search);

        // When
        let errors = validate(&draft);

        // Then
        assert_eq!(
            errors.search(empty_id).and_then(|search| search.shifts),
            Some(SHIFTS_REQUIRED)
        );
        assert!(errors.leaf_messages(&draft).is_empty());

        // When
        draft.searches.clear();
        let errors = validate(&draft);

        // Then
        assert_eq!(errors.searches, Some(SEARCHES_REQUIRED));
    }

    #[test]
    fn message_at__should_follow_row_identity_after_removal() {
        // Given
        let mut ids = RowIds::default();
        let mut draft = valid_draft(&mut ids);
        let mut second = SearchRow::blank(&mut ids);
        second.shifts[0] = filled_shift(&mut ids, "2024-05-03", "night", "");
        draft.searches.push(second);
        let errors = validate(&draft);
        assert_eq!(
            errors.message_at(&draft, &FieldPath::shift(1, 0, ShiftField::StartTime)),
            Some(START_TIME_REQUIRED)
        );

        // When
        draft.searches.remove(0);

        // Then
        assert_eq!(
            errors.message_at(&draft, &FieldPath::shift(0, 0, ShiftField::StartTime)),
            Some(START_TIME_REQUIRED)
        );
        assert_eq!(
            errors.message_at(&draft, &FieldPath::shift(0, 0, ShiftField::Date)),
            None
        );
    }

    #[test]
    fn message_at__should_not_leak_to_row_inserted_before() {
        // Given
        let mut ids = RowIds::default();
        let mut draft = valid_draft(&mut ids);
        draft.searches[0].shifts[0].date.clear();
        let errors = validate(&draft);

        // When
        let inserted = filled_shift(&mut ids, "2024-05-04", "afternoon", "12:00");
        draft.searches[0].shifts.insert(0, inserted);

        // Then
        assert_eq!(
            errors.message_at(&draft, &FieldPath::shift(0, 0, ShiftField::Date)),
            None
        );
        assert_eq!(
            errors.message_at(&draft, &FieldPath::shift(0, 1, ShiftField::Date)),
            Some(DATE_REQUIRED)
        );
    }

    #[test]
    fn to_request__should_type_shift_values() {
        // Given
        let mut ids = RowIds::default();
        let draft = valid_draft(&mut ids);

        // When
        let request = to_request(&draft).expect("valid draft");

        // Then
        assert_eq!(request.house, "1");
        assert_eq!(request.searches.len(), 1);
        assert_eq!(request.searches[0].shifts[0].shift_type, ShiftType::Morning);
        assert_eq!(request.searches[0].shifts[0].start_time, "07:00");
    }
}
