//! Conversation state machine.
//!
//! ```text
//! Idle --submit--> Sending --metadata/chunk--> Receiving --done/error/finish--> Settled
//!   ^                 |                                                           |
//!   |                 +-------------------- fail / apply_answer ------------------+
//!   +------------------------------------- submit <-------------------------------+
//! ```
//!
//! Every message-list change goes through [`append`] or [`replace_last`];
//! the previous list is never edited in place.

use std::borrow::Cow;

use chat_protocol::{ChatAnswer, ChatRequest, NO_IMAGE, StreamFrame};
use tracing::debug;

use crate::{
    display::{ImageView, render_content},
    message::{Message, append, replace_last},
    typing::TypingProjection,
};

/// Prefix put in front of any failure shown to the user.
pub const ERROR_PREFIX: &str = "ขออภัย เกิดข้อผิดพลาด: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    Receiving,
    Settled,
}

#[derive(Debug)]
pub struct ChatSession {
    messages: Vec<Message>,
    input: String,
    phase: Phase,
    /// Whether the next request asks for a streamed answer.
    stream: bool,
    /// Index of the bot message being filled, while busy.
    pending: Option<usize>,
    typing: TypingProjection,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ChatSession {
    pub fn new(stream: bool) -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            phase: Phase::Idle,
            stream,
            pending: None,
            typing: TypingProjection::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Input is accepted only when no exchange is in flight.
    pub fn can_send(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Settled)
    }

    /// Index of the bot message still being filled.
    pub fn pending_index(&self) -> Option<usize> {
        self.pending
    }

    /// Starts an exchange from the current input.
    ///
    /// Returns `None` (and changes nothing) for whitespace-only input or while
    /// busy. Otherwise appends the user message and an empty bot placeholder,
    /// clears the input and returns the request to send.
    pub fn submit(&mut self) -> Option<ChatRequest> {
        if !self.can_send() || self.input.trim().is_empty() {
            return None;
        }
        let question = std::mem::take(&mut self.input);
        let with_user = append(&self.messages, Message::user(question.clone()));
        self.messages = append(&with_user, Message::bot(""));
        self.pending = Some(self.messages.len() - 1);
        self.typing.reset();
        self.phase = Phase::Sending;
        Some(ChatRequest::new(question, Some(self.stream)))
    }

    /// Applies one stream frame to the pending bot message.
    ///
    /// Frames arriving outside an exchange are ignored.
    pub fn apply(&mut self, frame: StreamFrame) {
        if self.pending.is_none() {
            debug!(?frame, "frame ignored: no pending message");
            return;
        }
        match frame {
            StreamFrame::Metadata { image } => {
                let image = image_choice(image);
                self.update_pending(|m| Message {
                    image,
                    ..m.clone()
                });
                self.phase = Phase::Receiving;
            }
            StreamFrame::Chunk { content } => {
                self.update_pending(|m| Message {
                    content: format!("{}{content}", m.content),
                    ..m.clone()
                });
                self.phase = Phase::Receiving;
            }
            StreamFrame::Done => self.finish(),
            StreamFrame::Error { error } => self.fail(&error),
        }
    }

    /// Settles the pending message as it stands.
    pub fn finish(&mut self) {
        if self.pending.is_some() {
            self.settle();
        }
    }

    /// Replaces the pending message's text with a localized failure and
    /// settles it.
    pub fn fail(&mut self, message: &str) {
        if self.pending.is_none() {
            return;
        }
        self.update_pending(|m| Message {
            content: format!("{ERROR_PREFIX}{message}"),
            ..m.clone()
        });
        self.settle();
    }

    /// Fills the pending message from a single-shot answer and settles it.
    pub fn apply_answer(&mut self, answer: ChatAnswer) {
        if self.pending.is_none() {
            return;
        }
        let image = image_choice(answer.image);
        self.update_pending(|m| Message {
            content: answer.answer,
            image,
            ..m.clone()
        });
        self.settle();
    }

    /// Reveals up to `max_chars` more of the pending answer. Returns `false`
    /// once there is nothing left to reveal.
    pub fn tick(&mut self, max_chars: usize) -> bool {
        let Some(msg) = self.pending.and_then(|i| self.messages.get(i)) else {
            return false;
        };
        !self.typing.advance(&msg.content, max_chars).is_empty()
    }

    /// Text to show for message `index`: the typed prefix while the answer is
    /// arriving, the whole content otherwise. Bot text is rendered.
    pub fn display_text(&self, index: usize) -> Option<Cow<'_, str>> {
        let msg = self.messages.get(index)?;
        if msg.role == crate::message::Role::User {
            return Some(Cow::Borrowed(&msg.content));
        }
        let text = if self.pending == Some(index) {
            self.typing.visible(&msg.content)
        } else {
            &msg.content
        };
        Some(Cow::Owned(render_content(text)))
    }

    /// Illustration state for message `index`. Images appear only once the
    /// answer has settled.
    pub fn image_view(&self, index: usize) -> ImageView<'_> {
        match self.messages.get(index).and_then(|m| m.image.as_deref()) {
            None => ImageView::Hidden,
            Some(_) if self.pending == Some(index) => ImageView::Pending,
            Some(file) => ImageView::Show(file),
        }
    }

    /// The illustration file for message `index`, only once it has settled.
    pub fn visible_image(&self, index: usize) -> Option<&str> {
        match self.image_view(index) {
            ImageView::Show(file) => Some(file),
            ImageView::Hidden | ImageView::Pending => None,
        }
    }

    fn update_pending(&mut self, f: impl FnOnce(&Message) -> Message) {
        // The pending message is always the last one.
        self.messages = replace_last(&self.messages, f);
    }

    fn settle(&mut self) {
        self.pending = None;
        self.typing.reset();
        self.phase = Phase::Settled;
    }
}

fn image_choice(image: String) -> Option<String> {
    match image.trim() {
        "" | NO_IMAGE => None,
        _ => Some(image),
    }
}
