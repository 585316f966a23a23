use serde::Deserialize;

/// Event name emitted when the site connects.
pub const CONNECTED_EVENT: &str = "casper-wallet:connected";
/// Event name emitted when the site disconnects.
pub const DISCONNECTED_EVENT: &str = "casper-wallet:disconnected";
/// Event name emitted when the user switches accounts.
pub const ACTIVE_KEY_CHANGED_EVENT: &str = "casper-wallet:activeKeyChanged";
/// Event name emitted when the wallet locks.
pub const LOCKED_EVENT: &str = "casper-wallet:locked";
/// Event name emitted when the wallet unlocks.
pub const UNLOCKED_EVENT: &str = "casper-wallet:unlocked";

/// A state-change notification pushed by the wallet provider.
///
/// `Connected` and `ActiveKeyChanged` carry the raw JSON detail, shaped as
/// `{"activeKey": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The site was connected.
    Connected(String),
    /// The site was disconnected.
    Disconnected,
    /// The active account changed.
    ActiveKeyChanged(String),
    /// The wallet was locked.
    Locked,
    /// The wallet was unlocked.
    Unlocked,
}

impl WalletEvent {
    /// Builds an event from its provider name and optional JSON detail.
    ///
    /// Returns `None` for names the SDK does not track.
    #[must_use]
    pub fn from_name(name: &str, detail: Option<String>) -> Option<Self> {
        let event = match name {
            CONNECTED_EVENT => Self::Connected(detail.unwrap_or_default()),
            DISCONNECTED_EVENT => Self::Disconnected,
            ACTIVE_KEY_CHANGED_EVENT => Self::ActiveKeyChanged(detail.unwrap_or_default()),
            LOCKED_EVENT => Self::Locked,
            UNLOCKED_EVENT => Self::Unlocked,
            _ => return None,
        };
        Some(event)
    }

    /// Returns the provider name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connected(_) => CONNECTED_EVENT,
            Self::Disconnected => DISCONNECTED_EVENT,
            Self::ActiveKeyChanged(_) => ACTIVE_KEY_CHANGED_EVENT,
            Self::Locked => LOCKED_EVENT,
            Self::Unlocked => UNLOCKED_EVENT,
        }
    }
}

#[derive(Deserialize)]
struct EventDetail {
    #[serde(rename = "activeKey", default)]
    active_key: Option<String>,
}

/// Extracts the active key from an event detail.
///
/// The outer `None` means the payload was malformed. An absent or empty key
/// yields `Some(None)`.
pub(crate) fn parse_active_key(detail: &str) -> Option<Option<String>> {
    let detail: EventDetail = serde_json::from_str(detail).ok()?;
    Some(detail.active_key.filter(|key| !key.is_empty()))
}
