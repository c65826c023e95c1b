use crate::handlers;
use crate::pipeline::Pipeline;
use crate::transport::{InboundMessage, TelegramTransport};
use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::{info, trace};

pub async fn start_bot(bot: Bot, pipeline: Arc<Pipeline>) -> Result<()> {
    info!("Bot is starting...");

    let me = bot
        .get_me()
        .await
        .context("Failed to authorize with the Telegram Bot API")?;
    info!("Authorized as @{}", me.username());

    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    // Обновления без сообщения сюда не попадают
    let handler = dptree::entry().branch(Update::filter_message().endpoint(
        move |msg: Message| {
            let transport = transport.clone();
            let pipeline = pipeline.clone();
            async move {
                let inbound = InboundMessage::from(&msg);
                handlers::handle_message(transport.as_ref(), &pipeline, &inbound).await;
                respond(())
            }
        },
    ));

    // Updates are distributed per chat: one chat is handled strictly in
    // order, different chats may run concurrently.
    Dispatcher::builder(bot, handler)
        .default_handler(skip_update)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Edited messages, callbacks and other non-message updates are dropped
/// without the dispatcher's default warning.
async fn skip_update(update: Arc<Update>) {
    trace!("Skipping update {} without a message", update.id);
}
