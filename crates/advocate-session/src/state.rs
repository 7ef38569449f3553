use advocate_core::{ChatMessage, Location};

/// Mutable conversation state, owned by the controller
#[derive(Debug, Clone, Default)]
pub(crate) struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub session_id: Option<String>,
    pub location: Location,
    pub busy: bool,
    /// The welcome message may still be shown in this session
    pub welcome_armed: bool,
    /// `messages[0]` is the unsent welcome message
    pub welcome_pending: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            welcome_armed: true,
            ..Default::default()
        }
    }

    /// Forget the current conversation; the welcome may show again
    pub fn reset(&mut self) {
        self.messages.clear();
        self.welcome_pending = false;
        self.welcome_armed = true;
    }

    /// Show the welcome if armed, the location has a state and nothing has
    /// been said yet. A pending welcome is re-rendered for the new location.
    /// An empty template disables the welcome.
    pub fn offer_welcome(&mut self, template: &str) -> bool {
        if template.trim().is_empty() || !self.location.has_state() {
            return false;
        }

        if self.welcome_pending && self.messages.len() == 1 {
            self.messages[0] = ChatMessage::assistant(render_welcome(template, &self.location));
            return true;
        }

        if self.welcome_armed && self.messages.is_empty() {
            self.messages
                .push(ChatMessage::assistant(render_welcome(template, &self.location)));
            self.welcome_pending = true;
            self.welcome_armed = false;
            return true;
        }

        false
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.messages.clone(),
            session_id: self.session_id.clone(),
            location: self.location.clone(),
            busy: self.busy,
            has_welcome: self.welcome_pending,
        }
    }
}

pub(crate) fn render_welcome(template: &str, location: &Location) -> String {
    template.replace("{location}", &location.to_string())
}

/// Read-only view published to observers after every change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSnapshot {
    pub messages: Vec<ChatMessage>,
    pub session_id: Option<String>,
    pub location: Location,
    pub busy: bool,
    /// `messages[0]` is the local welcome message, not yet persisted
    pub has_welcome: bool,
}

impl ConversationSnapshot {
    /// Whether the send affordance should be enabled
    pub fn can_send(&self) -> bool {
        !self.busy && self.location.has_state()
    }

    /// Messages the backend knows about (welcome excluded)
    pub fn persisted_messages(&self) -> &[ChatMessage] {
        if self.has_welcome && !self.messages.is_empty() {
            &self.messages[1..]
        } else {
            &self.messages
        }
    }

    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| !m.is_user())
    }
}
