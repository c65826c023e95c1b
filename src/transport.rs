use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Message, MessageEntity, MessageEntityKind};

/// One size of an inbound photo as Telegram lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

/// The parts of a Telegram message the bot cares about.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    /// Bot command at the start of the text, without `/` and `@bot` suffix.
    pub command: Option<String>,
    /// Ordered from smallest to largest, as delivered.
    pub photos: Vec<PhotoVariant>,
}

impl From<&Message> for InboundMessage {
    fn from(msg: &Message) -> Self {
        let photos = msg
            .photo()
            .map(|sizes| {
                sizes
                    .iter()
                    .map(|size| PhotoVariant {
                        file_id: size.file.id.clone(),
                        width: size.width,
                        height: size.height,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            chat_id: msg.chat.id,
            command: msg
                .text()
                .zip(msg.entities())
                .and_then(|(text, entities)| leading_command(text, entities)),
            photos,
        }
    }
}

/// Name of the command Telegram marked at offset 0, if any. Text merely
/// starting with `/` (`/`, `/привет`) carries no such entity.
pub fn leading_command(text: &str, entities: &[MessageEntity]) -> Option<String> {
    let entity = entities
        .iter()
        .find(|e| e.offset == 0 && matches!(e.kind, MessageEntityKind::BotCommand))?;

    // Entity bounds are UTF-16 code units
    let units: Vec<u16> = text.encode_utf16().take(entity.length).collect();
    let raw = String::from_utf16(&units).ok()?;
    let command = raw.strip_prefix('/')?;
    let name = command.split('@').next().unwrap_or(command);

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Download link for a file path returned by `getFile`, relative to the
/// Bot API base so a self-hosted server's path prefix is kept.
pub fn file_url(api_url: &Url, token: &str, file_path: &str) -> Result<Url> {
    api_url
        .join(&format!("file/bot{token}/{file_path}"))
        .context("Failed to build file download URL")
}

/// Outbound chat operations used by the dispatcher and the photo pipeline.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()>;

    /// Direct HTTPS link for downloading the file behind `file_id`.
    async fn resolve_file_url(&self, file_id: &str) -> Result<String>;
}

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(chat_id, text)
            .await
            .context("Failed to send message")?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()> {
        let document = InputFile::memory(bytes).file_name(file_name.to_string());
        self.bot
            .send_document(chat_id, document)
            .caption(caption)
            .await
            .context("Failed to send document")?;
        Ok(())
    }

    async fn resolve_file_url(&self, file_id: &str) -> Result<String> {
        let file = self
            .bot
            .get_file(file_id)
            .await
            .context("getFile request failed")?;

        let url = file_url(&self.bot.api_url(), self.bot.token(), &file.path)?;
        Ok(url.to_string())
    }
}
