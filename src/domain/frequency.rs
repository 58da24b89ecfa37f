use sqlx::{
    error::BoxDynError,
    sqlite::{SqliteTypeInfo, SqliteValueRef},
    Decode, Sqlite, Type,
};

/// How often a confirmed subscriber expects a weather update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frequency {
    Hourly,
    Daily,
}

impl AsRef<str> for Frequency {
    fn as_ref(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_ref() {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            other => Err(format!(
                "`{other}` is not a valid frequency. Use either `hourly` or `daily`."
            )),
        }
    }
}

impl Type<Sqlite> for Frequency {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for Frequency {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let frequency = <String as Decode<Sqlite>>::decode(value)?;
        Self::try_from(frequency).map_err(|e| e.into())
    }
}
