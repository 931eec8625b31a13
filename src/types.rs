//! Shared request types for admin operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of an entry in a topic's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    pub ledger_id: i64,
    pub entry_id: i64,
}

impl MessageId {
    /// Position before the first retained entry.
    pub const EARLIEST: MessageId = MessageId {
        ledger_id: -1,
        entry_id: -1,
    };

    /// Position after the last published entry.
    pub const LATEST: MessageId = MessageId {
        ledger_id: i64::MAX,
        entry_id: i64::MAX,
    };

    pub const fn new(ledger_id: i64, entry_id: i64) -> Self {
        Self {
            ledger_id,
            entry_id,
        }
    }

    #[inline]
    pub fn is_earliest(&self) -> bool {
        *self == Self::EARLIEST
    }

    #[inline]
    pub fn is_latest(&self) -> bool {
        *self == Self::LATEST
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_earliest() {
            write!(f, "earliest")
        } else if self.is_latest() {
            write!(f, "latest")
        } else {
            write!(f, "{}:{}", self.ledger_id, self.entry_id)
        }
    }
}

/// Where to move a subscription cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorTarget {
    /// Publish time in milliseconds since the epoch.
    Timestamp(i64),
    /// An exact log position. Only valid on a single partition.
    Position(MessageId),
}

/// Which subscriptions an expiry applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpireTarget {
    Subscription(String),
    AllSubscriptions,
}

impl ExpireTarget {
    pub fn subscription(name: impl Into<String>) -> Self {
        ExpireTarget::Subscription(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_display() {
        assert_eq!(MessageId::EARLIEST.to_string(), "earliest");
        assert_eq!(MessageId::LATEST.to_string(), "latest");
        assert_eq!(MessageId::new(12, 7).to_string(), "12:7");
    }

    #[test]
    fn test_message_id_ordering() {
        assert!(MessageId::EARLIEST < MessageId::new(0, 0));
        assert!(MessageId::new(3, 100) < MessageId::new(4, 0));
        assert!(MessageId::new(4, 0) < MessageId::LATEST);
    }
}
