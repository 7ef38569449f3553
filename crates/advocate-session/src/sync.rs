//! # Conversation Sync
//!
//! Merges the local, optimistically updated message list with the history the
//! backend returns after each exchange. The server is authoritative; the only
//! local message that survives is the unsent welcome message at the front.

use advocate_core::ChatMessage;

/// Result of merging local and server state
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub messages: Vec<ChatMessage>,
    /// Whether `messages[0]` is still the unsent welcome message
    pub welcome_kept: bool,
}

/// Merge server history into the local view.
///
/// With a pending welcome and a non-empty history the result is
/// `[welcome] ++ server_history`; otherwise it is exactly `server_history`.
/// The optimistic user message is never carried over since the server
/// history already contains it.
pub fn reconcile(
    local: &[ChatMessage],
    server_history: Vec<ChatMessage>,
    welcome_pending: bool,
) -> Reconciled {
    match local.first() {
        Some(welcome) if welcome_pending && !server_history.is_empty() => {
            // Backend already persisted the greeting; keep a single copy.
            if server_history
                .first()
                .is_some_and(|first| same_turn(first, welcome))
            {
                return Reconciled {
                    messages: server_history,
                    welcome_kept: false,
                };
            }

            let mut messages = Vec::with_capacity(server_history.len() + 1);
            messages.push(welcome.clone());
            messages.extend(server_history);
            Reconciled {
                messages,
                welcome_kept: true,
            }
        }
        _ => Reconciled {
            messages: server_history,
            welcome_kept: false,
        },
    }
}

/// Remove the optimistic message appended before a failed call.
///
/// Returns `false` if the message is no longer in the list.
pub fn rollback(messages: &mut Vec<ChatMessage>, optimistic: &ChatMessage) -> bool {
    match messages.iter().rposition(|m| m == optimistic) {
        Some(index) => {
            messages.remove(index);
            true
        }
        None => false,
    }
}

fn same_turn(a: &ChatMessage, b: &ChatMessage) -> bool {
    a.role == b.role && a.content == b.content
}
