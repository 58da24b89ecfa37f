use sqlx::{
    error::BoxDynError,
    sqlite::{SqliteTypeInfo, SqliteValueRef},
    Decode, Sqlite, Type,
};
use std::fmt::{self, Display};
use unicode_segmentation::UnicodeSegmentation;

const MAX_GRAPHEMES: usize = 256;

/// Location a subscriber wants weather updates for, as typed by the user.
#[derive(Clone, Debug, PartialEq)]
pub struct CityName(String);

impl CityName {
    pub fn parse(s: String) -> Result<CityName, String> {
        let s = s.trim().to_string();

        match s {
            _ if s.is_empty() => Err("City is empty or contains whitespace only".to_string()),
            _ if s.graphemes(true).count() > MAX_GRAPHEMES => {
                Err(format!("`{s}` is longer than {MAX_GRAPHEMES} graphemes"))
            }
            _ if s.chars().any(char::is_control) => {
                Err(format!("`{s}` contains control characters"))
            }
            _ => Ok(Self(s)),
        }
    }
}

impl AsRef<str> for CityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Type<Sqlite> for CityName {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for CityName {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let city = <String as Decode<Sqlite>>::decode(value)?;
        Self::parse(city).map_err(|e| e.into())
    }
}
