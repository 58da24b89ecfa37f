use super::{CityName, Frequency, SubscriberEmail};

/// A validated request to receive weather updates, before it is stored as pending.
#[derive(Clone, Debug)]
pub struct NewSubscription {
    pub email: SubscriberEmail,
    pub city: CityName,
    pub frequency: Frequency,
}

impl NewSubscription {
    pub fn parse(email: String, city: String, frequency: String) -> Result<Self, String> {
        Ok(Self {
            email: SubscriberEmail::parse(email)?,
            city: CityName::parse(city)?,
            frequency: Frequency::try_from(frequency)?,
        })
    }
}
