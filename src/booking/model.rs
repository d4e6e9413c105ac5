use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Synthetic identity of a search or shift row. Stays attached to the row for
/// as long as it exists, whatever its position in the enclosing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl FromStr for RowId {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let digits = raw.strip_prefix('r').ok_or(())?;
        if digits.starts_with('+') {
            return Err(());
        }
        digits.parse().map(RowId).map_err(|_| ())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RowIds {
    next: u64,
}

impl RowIds {
    pub(crate) fn next(&mut self) -> RowId {
        self.next += 1;
        RowId(self.next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Morning,
    Afternoon,
    Night,
}

impl ShiftType {
    pub const ALL: [ShiftType; 3] = [ShiftType::Morning, ShiftType::Afternoon, ShiftType::Night];

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Afternoon => "afternoon",
            ShiftType::Night => "night",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShiftType::Morning => "Morning",
            ShiftType::Afternoon => "Afternoon",
            ShiftType::Night => "Night",
        }
    }
}

impl FromStr for ShiftType {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ShiftType::ALL
            .into_iter()
            .find(|shift_type| shift_type.as_str() == raw)
            .ok_or(())
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRow {
    pub(crate) id: RowId,
    pub(crate) date: String,
    pub(crate) shift_type: String,
    pub(crate) start_time: String,
}

impl ShiftRow {
    pub(crate) fn blank(ids: &mut RowIds) -> Self {
        Self {
            id: ids.next(),
            date: String::new(),
            shift_type: String::new(),
            start_time: String::new(),
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn shift_type(&self) -> &str {
        &self.shift_type
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRow {
    pub(crate) id: RowId,
    pub(crate) shifts: Vec<ShiftRow>,
}

impl SearchRow {
    pub(crate) fn blank(ids: &mut RowIds) -> Self {
        Self {
            id: ids.next(),
            shifts: vec![ShiftRow::blank(ids)],
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn shifts(&self) -> &[ShiftRow] {
        &self.shifts
    }
}

/// The in-progress booking. Field values are kept exactly as entered; typing
/// happens in [`BookingRequest`] once the draft validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub(crate) house: String,
    pub(crate) drop_date: String,
    pub(crate) drop_time: String,
    pub(crate) searches: Vec<SearchRow>,
}

impl Draft {
    pub(crate) fn blank(ids: &mut RowIds) -> Self {
        Self {
            house: String::new(),
            drop_date: String::new(),
            drop_time: String::new(),
            searches: vec![SearchRow::blank(ids)],
        }
    }

    pub fn house(&self) -> &str {
        &self.house
    }

    pub fn drop_date(&self) -> &str {
        &self.drop_date
    }

    pub fn drop_time(&self) -> &str {
        &self.drop_time
    }

    pub fn searches(&self) -> &[SearchRow] {
        &self.searches
    }

    /// True when every leaf is blank and the shape is one search holding one shift.
    pub fn is_blank(&self) -> bool {
        self.house.is_empty()
            && self.drop_date.is_empty()
            && self.drop_time.is_empty()
            && self.searches.len() == 1
            && self.searches[0].shifts.len() == 1
            && self.searches[0].shifts.iter().all(|shift| {
                shift.date.is_empty() && shift.shift_type.is_empty() && shift.start_time.is_empty()
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRequest {
    pub date: String,
    pub shift_type: ShiftType,
    pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub shifts: Vec<ShiftRequest>,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub house: String,
    pub drop_date: String,
    pub drop_time: String,
    pub searches: Vec<SearchRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct House {
    pub id: &'static str,
    pub name: &'static str,
}

pub const HOUSES: [House; 3] = [
    House {
        id: "1",
        name: "House A",
    },
    House {
        id: "2",
        name: "House B",
    },
    House {
        id: "3",
        name: "House C",
    },
];

pub fn house_name(id: &str) -> Option<&'static str> {
    HOUSES
        .iter()
        .find(|house| house.id == id)
        .map(|house| house.name)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn draft_blank__should_hold_one_search_with_one_blank_shift() {
        // Given
        let mut ids = RowIds::default();

        // When
        let draft = Draft::blank(&mut ids);

        // Then
        assert!(draft.is_blank());
        assert_eq!(draft.searches().len(), 1);
        assert_eq!(draft.searches()[0].shifts().len(), 1);
        assert_ne!(draft.searches()[0].id(), draft.searches()[0].shifts()[0].id());
    }

    #[test]
    fn shift_type__should_parse_only_enumerated_values() {
        // Then
        assert_eq!("morning".parse::<ShiftType>(), Ok(ShiftType::Morning));
        assert_eq!("afternoon".parse::<ShiftType>(), Ok(ShiftType::Afternoon));
        assert_eq!("night".parse::<ShiftType>(), Ok(ShiftType::Night));
        assert!("Morning".parse::<ShiftType>().is_err());
        assert!("".parse::<ShiftType>().is_err());
    }

    #[test]
    fn row_id__should_parse_its_display_form() {
        // Given
        let mut ids = RowIds::default();
        let id = ids.next();

        // Then
        assert_eq!(id.to_string().parse::<RowId>(), Ok(id));
        assert!("7".parse::<RowId>().is_err());
        assert!("r".parse::<RowId>().is_err());
        assert!("r+7".parse::<RowId>().is_err());
        assert!("rx".parse::<RowId>().is_err());
    }

    #[test]
    fn house_name__should_resolve_catalogue_ids() {
        // Then
        assert_eq!(house_name("1"), Some("House A"));
        assert_eq!(house_name("3"), Some("House C"));
        assert_eq!(house_name("9"), None);
    }
}
