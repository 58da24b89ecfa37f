mod city_name;
mod frequency;
mod new_subscription;
mod subscriber_email;
mod subscription;
mod subscription_token;

pub use city_name::CityName;
pub use frequency::Frequency;
pub use new_subscription::NewSubscription;
pub use subscriber_email::SubscriberEmail;
pub use subscription::Subscription;
pub use subscription_token::SubscriptionToken;
