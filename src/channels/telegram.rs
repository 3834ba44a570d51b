//! Telegram channel — long-polls the Bot API for updates.
//!
//! Decodes raw updates into typed `InboundEvent`s at this boundary:
//! malformed callback tokens are acknowledged and dropped here, so the
//! conversation engine only ever sees well-formed events.

use async_trait::async_trait;

use crate::channels::{Channel, EventStream};
use crate::engine::{Callback, InboundEvent, Keyboard, OutboundAction, Sender};
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
}

/// What one raw update decodes to.
#[derive(Debug, PartialEq, Eq)]
enum Decoded {
    Event(InboundEvent),
    /// Callback with unusable data; must still be acknowledged so the
    /// client stops its spinner.
    MalformedCallback { callback_id: String },
    /// Nothing we handle (stickers, edits, joins, ...).
    Skip,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Send a text message, splitting at Telegram's 4096-char limit. The
    /// keyboard, if any, goes on the last chunk.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.iter().enumerate() {
            let mut body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            if i == last {
                if let Some(kb) = keyboard {
                    body["reply_markup"] = keyboard_json(kb);
                }
            }
            self.call("sendMessage", &body).await?;
        }
        Ok(())
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("{method} failed ({status}): {err}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let url = format!("https://api.telegram.org/bot{bot_token}/getUpdates");
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                    for update in results {
                        if let Some(uid) =
                            update.get("update_id").and_then(serde_json::Value::as_i64)
                        {
                            offset = uid + 1;
                        }

                        match decode_update(update) {
                            Decoded::Event(event) => {
                                if tx.send(event).is_err() {
                                    tracing::info!("Telegram listener channel closed");
                                    return;
                                }
                            }
                            Decoded::MalformedCallback { callback_id } => {
                                tracing::warn!(callback_id, "Dropping malformed callback data");
                                let ack = serde_json::json!({
                                    "callback_query_id": callback_id
                                });
                                let _ = client
                                    .post(format!(
                                        "https://api.telegram.org/bot{bot_token}/answerCallbackQuery"
                                    ))
                                    .json(&ack)
                                    .send()
                                    .await;
                            }
                            Decoded::Skip => {}
                        }
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn deliver(&self, action: OutboundAction) -> Result<(), ChannelError> {
        match action {
            OutboundAction::SendText {
                chat_id,
                text,
                keyboard,
            } => self.send_message(chat_id, &text, keyboard.as_ref()).await,
            OutboundAction::EditChoices {
                chat_id,
                message_id,
                keyboard,
            } => {
                let body = serde_json::json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "reply_markup": keyboard_json(&keyboard),
                });
                self.call("editMessageReplyMarkup", &body).await
            }
            OutboundAction::Acknowledge { callback_id, alert } => {
                let mut body = serde_json::json!({
                    "callback_query_id": callback_id,
                });
                if let Some(text) = alert {
                    body["text"] = serde_json::Value::String(text);
                    body["show_alert"] = serde_json::Value::Bool(true);
                }
                self.call("answerCallbackQuery", &body).await
            }
        }
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::HealthCheckFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::HealthCheckFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Update decoding ─────────────────────────────────────────────────

fn decode_update(update: &serde_json::Value) -> Decoded {
    if let Some(query) = update.get("callback_query") {
        return decode_callback_query(query);
    }
    if let Some(message) = update.get("message") {
        return decode_message(message);
    }
    Decoded::Skip
}

fn decode_message(message: &serde_json::Value) -> Decoded {
    let Some(text) = message.get("text").and_then(serde_json::Value::as_str) else {
        return Decoded::Skip;
    };
    let Some(sender) = decode_sender(message.get("from")) else {
        return Decoded::Skip;
    };
    Decoded::Event(InboundEvent::Text {
        sender,
        text: text.to_string(),
    })
}

fn decode_callback_query(query: &serde_json::Value) -> Decoded {
    let Some(callback_id) = query.get("id").and_then(serde_json::Value::as_str) else {
        return Decoded::Skip;
    };
    let Some(sender) = decode_sender(query.get("from")) else {
        return Decoded::MalformedCallback {
            callback_id: callback_id.to_string(),
        };
    };
    let message_id = query
        .get("message")
        .and_then(|m| m.get("message_id"))
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0);

    let token = query
        .get("data")
        .and_then(serde_json::Value::as_str)
        .and_then(Callback::decode);
    match token {
        Some(token) => Decoded::Event(InboundEvent::Choice {
            sender,
            callback_id: callback_id.to_string(),
            message_id,
            token,
        }),
        None => Decoded::MalformedCallback {
            callback_id: callback_id.to_string(),
        },
    }
}

fn decode_sender(from: Option<&serde_json::Value>) -> Option<Sender> {
    let from = from?;
    let id = from.get("id").and_then(serde_json::Value::as_i64)?;
    let name = from
        .get("first_name")
        .or_else(|| from.get("username"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown");
    Some(Sender::new(id, name))
}

/// Render a keyboard as Telegram `InlineKeyboardMarkup` JSON.
fn keyboard_json(keyboard: &Keyboard) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|choice| {
                    serde_json::json!({
                        "text": choice.label,
                        "callback_data": choice.token.encode(),
                    })
                })
                .collect()
        })
        .collect();
    serde_json::json!({ "inline_keyboard": rows })
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts. The limit is
/// in bytes and the text is mostly Cyrillic, so a hard cut lands on the
/// nearest char boundary below it.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut boundary = max_len;
        while boundary > 0 && !remaining.is_char_boundary(boundary) {
            boundary -= 1;
        }
        if boundary == 0 {
            // Limit smaller than the first char; emit it whole.
            boundary = remaining
                .chars()
                .next()
                .map_or(remaining.len(), char::len_utf8);
        }
        let chunk = &remaining[..boundary];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            // Position 0 would loop forever; hard-cut instead.
            .filter(|&i| i > 0)
            .unwrap_or(boundary);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Choice;

    #[test]
    fn telegram_channel_name() {
        let ch = TelegramChannel::new("fake-token".into());
        assert_eq!(ch.name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        let ch = TelegramChannel::new("123:ABC".into());
        assert_eq!(
            ch.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    // ── Update decoding ─────────────────────────────────────────────

    #[test]
    fn decode_text_message() {
        let update = serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "from": {"id": 42, "first_name": "Алиса"},
                "chat": {"id": 42},
                "text": "/start"
            }
        });
        assert_eq!(
            decode_update(&update),
            Decoded::Event(InboundEvent::Text {
                sender: Sender::new(42, "Алиса"),
                text: "/start".into(),
            })
        );
    }

    #[test]
    fn decode_non_text_message_is_skipped() {
        let update = serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "from": {"id": 42, "first_name": "Алиса"},
                "sticker": {"file_id": "abc"}
            }
        });
        assert_eq!(decode_update(&update), Decoded::Skip);
    }

    #[test]
    fn decode_callback_with_valid_token() {
        let update = serde_json::json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb-77",
                "from": {"id": 42, "username": "alice"},
                "message": {"message_id": 15, "chat": {"id": 42}},
                "data": "club:3"
            }
        });
        assert_eq!(
            decode_update(&update),
            Decoded::Event(InboundEvent::Choice {
                sender: Sender::new(42, "alice"),
                callback_id: "cb-77".into(),
                message_id: 15,
                token: Callback::Club(3),
            })
        );
    }

    #[test]
    fn decode_callback_with_malformed_token() {
        let update = serde_json::json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb-78",
                "from": {"id": 42, "first_name": "Алиса"},
                "message": {"message_id": 15, "chat": {"id": 42}},
                "data": "club:banana"
            }
        });
        assert_eq!(
            decode_update(&update),
            Decoded::MalformedCallback {
                callback_id: "cb-78".into()
            }
        );
    }

    #[test]
    fn decode_unknown_update_kind_is_skipped() {
        let update = serde_json::json!({"update_id": 3, "edited_message": {}});
        assert_eq!(decode_update(&update), Decoded::Skip);
    }

    #[test]
    fn sender_prefers_first_name() {
        let from = serde_json::json!({"id": 1, "first_name": "Боб", "username": "bob42"});
        assert_eq!(decode_sender(Some(&from)), Some(Sender::new(1, "Боб")));
    }

    // ── Keyboard rendering ──────────────────────────────────────────

    #[test]
    fn keyboard_renders_inline_markup() {
        let kb = Keyboard::new()
            .row(vec![Choice::new("Да", Callback::ConfirmDelete(0))])
            .with_home();
        let json = keyboard_json(&kb);
        assert_eq!(json["inline_keyboard"][0][0]["text"], "Да");
        assert_eq!(json["inline_keyboard"][0][0]["callback_data"], "del-yes:0");
        assert_eq!(json["inline_keyboard"][1][0]["callback_data"], "home");
    }

    // ── Message splitting ───────────────────────────────────────────

    #[test]
    fn split_message_short() {
        let chunks = split_message("Hello", 4096);
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn split_message_exact_limit() {
        let msg = "a".repeat(4096);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 4096);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(2000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn split_message_cyrillic_hard_cut_stays_on_char_boundary() {
        // 1 ASCII byte followed by two-byte chars puts every char boundary
        // on an odd offset, so a naive cut at 4096 would land mid-char.
        let msg = format!("a{}", "я".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() <= 4096));
        assert_eq!(chunks.concat(), msg);
    }
}
