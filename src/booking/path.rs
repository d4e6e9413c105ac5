use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftField {
    Date,
    ShiftType,
    StartTime,
}

impl ShiftField {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftField::Date => "date",
            ShiftField::ShiftType => "shiftType",
            ShiftField::StartTime => "startTime",
        }
    }
}

/// Position of a single leaf field inside the draft, addressed by the
/// current array indices. Only meaningful for the draft it was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    House,
    DropDate,
    DropTime,
    Shift {
        search: usize,
        shift: usize,
        field: ShiftField,
    },
}

impl FieldPath {
    pub fn shift(search: usize, shift: usize, field: ShiftField) -> Self {
        FieldPath::Shift {
            search,
            shift,
            field,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("unknown field path '{0}'")]
    Unknown(String),
    #[error("invalid index '{index}' in field path '{path}'")]
    BadIndex { path: String, index: String },
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split('.').collect();
        match parts.as_slice() {
            ["house"] => Ok(FieldPath::House),
            ["dropDate"] => Ok(FieldPath::DropDate),
            ["dropTime"] => Ok(FieldPath::DropTime),
            ["searches", search, "shifts", shift, field] => {
                let field = match *field {
                    "date" => ShiftField::Date,
                    "shiftType" => ShiftField::ShiftType,
                    "startTime" => ShiftField::StartTime,
                    _ => return Err(PathError::Unknown(raw.to_string())),
                };
                Ok(FieldPath::Shift {
                    search: parse_index(raw, search)?,
                    shift: parse_index(raw, shift)?,
                    field,
                })
            }
            _ => Err(PathError::Unknown(raw.to_string())),
        }
    }
}

fn parse_index(path: &str, raw: &str) -> Result<usize, PathError> {
    raw.parse().map_err(|_| PathError::BadIndex {
        path: path.to_string(),
        index: raw.to_string(),
    })
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::House => f.write_str("house"),
            FieldPath::DropDate => f.write_str("dropDate"),
            FieldPath::DropTime => f.write_str("dropTime"),
            FieldPath::Shift {
                search,
                shift,
                field,
            } => write!(f, "searches.{search}.shifts.{shift}.{}", field.as_str()),
        }
    }
}

/// Name of the hidden input that carries a row's id next to its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowPath {
    Search(usize),
    Shift(usize, usize),
}

impl FromStr for RowPath {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split('.').collect();
        match parts.as_slice() {
            ["searches", search, "id"] => Ok(RowPath::Search(parse_index(raw, search)?)),
            ["searches", search, "shifts", shift, "id"] => Ok(RowPath::Shift(
                parse_index(raw, search)?,
                parse_index(raw, shift)?,
            )),
            _ => Err(PathError::Unknown(raw.to_string())),
        }
    }
}

impl fmt::Display for RowPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowPath::Search(search) => write!(f, "searches.{search}.id"),
            RowPath::Shift(search, shift) => write!(f, "searches.{search}.shifts.{shift}.id"),
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn from_str__should_parse_top_level_fields() {
        // Then
        assert_eq!("house".parse::<FieldPath>(), Ok(FieldPath::House));
        assert_eq!("dropDate".parse::<FieldPath>(), Ok(FieldPath::DropDate));
        assert_eq!("dropTime".parse::<FieldPath>(), Ok(FieldPath::DropTime));
    }

    #[test]
    fn from_str__should_parse_nested_shift_fields() {
        // When
        let path: FieldPath = "searches.2.shifts.10.shiftType".parse().expect("parse path");

        // Then
        assert_eq!(path, FieldPath::shift(2, 10, ShiftField::ShiftType));
        assert_eq!(path.to_string(), "searches.2.shifts.10.shiftType");
    }

    #[test]
    fn from_str__should_reject_unknown_and_malformed_paths() {
        // Then
        assert!(matches!(
            "op".parse::<FieldPath>(),
            Err(PathError::Unknown(_))
        ));
        assert!(matches!(
            "searches.0.shifts.0.colour".parse::<FieldPath>(),
            Err(PathError::Unknown(_))
        ));
        assert!(matches!(
            "searches.x.shifts.0.date".parse::<FieldPath>(),
            Err(PathError::BadIndex { .. })
        ));
        assert!(matches!(
            "searches.-1.shifts.0.date".parse::<FieldPath>(),
            Err(PathError::BadIndex { .. })
        ));
    }

    #[test]
    fn row_path__should_parse_id_inputs_only() {
        // Then
        assert_eq!("searches.1.id".parse::<RowPath>(), Ok(RowPath::Search(1)));
        assert_eq!(
            "searches.0.shifts.3.id".parse::<RowPath>(),
            Ok(RowPath::Shift(0, 3))
        );
        assert_eq!(RowPath::Shift(0, 3).to_string(), "searches.0.shifts.3.id");
        assert!("searches.0.shifts.0.date".parse::<RowPath>().is_err());
        assert!("searches.0.id".parse::<FieldPath>().is_err());
    }
}
