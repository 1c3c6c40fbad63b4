//! # Monet Preferences
//!
//! `monet_preferences` holds the user side of Monet: which capabilities the
//! user allows and which they deny.
//!
//! Key concepts:
//!
//! 1. **Pattern**: A capability name, possibly a `namespace/*` wildcard.
//!
//! 2. **Denial**: A capability is denied when a deny pattern matches it and the
//!    capability itself is not explicitly allowed.
//!
//! 3. **Header projection**: The allow/deny lists rendered as a weighted
//!    `Accept-Monetization` header value.
//!
//! 4. **Change events**: Listeners subscribed on the store are called after
//!    every successful mutation.

pub mod events;
pub mod preferences;
pub mod store;

// Re-export key types for convenience
pub use events::{ChangeKind, PreferenceEvent, SubscriptionId};
pub use preferences::Preferences;
pub use store::{PreferenceUpdate, UserPreferences};
