use once_cell::sync::Lazy;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use regex::Regex;
use secrecy::{ExposeSecret, Secret};
use sqlx::{
    error::BoxDynError,
    sqlite::{SqliteTypeInfo, SqliteValueRef},
    Decode, Sqlite, Type,
};
use std::iter::repeat_with;

const TOKEN_LENGTH: usize = 25;

/// Opaque single-purpose credential handed out in confirmation and unsubscribe links.
///
/// Tokens are drawn from a cryptographically secure generator, so they are
/// neither derived from the subscriber's email nor guessable from the time
/// they were issued.
#[derive(Clone, Debug)]
pub struct SubscriptionToken(Secret<String>);

impl SubscriptionToken {
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut thread_rng())
    }

    fn generate_with_rng(rng: &mut impl Rng) -> Self {
        let token = repeat_with(|| rng.sample(Alphanumeric))
            .map(char::from)
            .take(TOKEN_LENGTH)
            .collect();

        Self(Secret::new(token))
    }

    pub fn parse(s: String) -> Result<Self, String> {
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(&format!(r"^[[:alnum:]]{{{TOKEN_LENGTH}}}$"))
                .expect("token pattern is a valid regex")
        });

        if RE.is_match(&s) {
            Ok(Self(Secret::new(s)))
        } else {
            Err(format!("Invalid subscription token: `{s}`"))
        }
    }
}

impl ExposeSecret<String> for SubscriptionToken {
    fn expose_secret(&self) -> &String {
        self.0.expose_secret()
    }
}

impl TryFrom<String> for SubscriptionToken {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl Type<Sqlite> for SubscriptionToken {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for SubscriptionToken {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let token = <String as Decode<Sqlite>>::decode(value)?;
        Self::parse(token).map_err(|e| e.into())
    }
}
