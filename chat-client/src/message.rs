//! Conversation messages and the two list updates the session is allowed to make.

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// One entry of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Illustration file name chosen for a bot answer.
    pub image: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image: None,
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            image: None,
        }
    }
}

/// New list with `msg` at the end.
pub fn append(list: &[Message], msg: Message) -> Vec<Message> {
    let mut next = Vec::with_capacity(list.len() + 1);
    next.extend_from_slice(list);
    next.push(msg);
    next
}

/// New list whose last element is `f(last)`. An empty list is returned as is.
pub fn replace_last(list: &[Message], f: impl FnOnce(&Message) -> Message) -> Vec<Message> {
    match list.split_last() {
        Some((last, head)) => append(head, f(last)),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_leave_the_source_untouched() {
        let before = vec![Message::user("q"), Message::bot("")];
        let after = replace_last(&before, |m| Message {
            content: format!("{}a", m.content),
            ..m.clone()
        });
        assert_eq!(before[1].content, "");
        assert_eq!(after[1].content, "a");
        assert_eq!(after.len(), 2);

        let grown = append(&after, Message::user("again"));
        assert_eq!(grown.len(), 3);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn replace_last_on_empty_is_empty() {
        assert!(replace_last(&[], |m| m.clone()).is_empty());
    }
}
