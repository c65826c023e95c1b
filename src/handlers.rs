use crate::messages;
use crate::pipeline::Pipeline;
use crate::transport::{ChatTransport, InboundMessage, PhotoVariant};
use tracing::{error, info};

/// What to do with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Start,
    UnknownCommand(String),
    Photo(PhotoVariant),
    Other,
}

pub fn route(msg: &InboundMessage) -> Route {
    if let Some(command) = msg.command.as_deref() {
        return match command {
            "start" => Route::Start,
            other => Route::UnknownCommand(other.to_string()),
        };
    }

    // Telegram lists sizes from smallest to largest
    match msg.photos.last() {
        Some(largest) => Route::Photo(largest.clone()),
        None => Route::Other,
    }
}

pub async fn handle_message<T>(transport: &T, pipeline: &Pipeline, msg: &InboundMessage)
where
    T: ChatTransport + ?Sized,
{
    let chat_id = msg.chat_id;

    match route(msg) {
        Route::Start => reply(transport, msg, messages::START).await,
        Route::UnknownCommand(command) => {
            info!(chat_id = %chat_id, "Unknown command /{}", command);
            reply(transport, msg, messages::UNKNOWN_COMMAND).await;
        }
        Route::Photo(photo) => {
            info!(
                chat_id = %chat_id,
                "Received photo {} ({}x{})",
                photo.file_id,
                photo.width,
                photo.height
            );
            pipeline.process_photo(transport, chat_id, &photo).await;
        }
        Route::Other => reply(transport, msg, messages::SEND_PHOTO).await,
    }
}

async fn reply<T>(transport: &T, msg: &InboundMessage, text: &str)
where
    T: ChatTransport + ?Sized,
{
    if let Err(e) = transport.send_text(msg.chat_id, text).await {
        error!(chat_id = %msg.chat_id, "Failed to send message '{}': {:#}", text, e);
    }
}
