use axum::Json;
use serde::Serialize;

pub mod health_check;
pub mod subscriptions;
pub mod subscriptions_confirm;
pub mod unsubscribe;
pub mod weather;

#[derive(Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

fn message(message: &'static str) -> Json<MessageBody> {
    Json(MessageBody { message })
}
