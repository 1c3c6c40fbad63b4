//! Preference snapshots and their header projection.

use serde::{Deserialize, Serialize};

use monet_core::Capability;

/// Lowest weight an allow entry receives, in thousandths.
const MIN_WEIGHT_MILLIS: u64 = 1;

/// A copy of the user's allow-list and deny-list.
///
/// Both lists are in insertion order. A snapshot is a value: later changes to
/// the store are not reflected in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Allowed capability patterns
    pub allows: Vec<Capability>,

    /// Denied capability patterns
    pub denies: Vec<Capability>,
}

impl Preferences {
    /// Create a snapshot from the two lists.
    pub fn new(allows: Vec<Capability>, denies: Vec<Capability>) -> Self {
        Self { allows, denies }
    }

    /// Render the value of an `Accept-Monetization` header.
    ///
    /// Allow entry `i` of `k` is weighted `(k - i) / k`, rounded half-up to one
    /// significant digit and never below `0.001`. Deny entries are weighted 0.
    ///
    /// ```
    /// use monet_core::Capability;
    /// use monet_preferences::Preferences;
    ///
    /// let prefs = Preferences::new(
    ///     vec![Capability::new("a/*").unwrap(), Capability::new("b/x").unwrap()],
    ///     vec![Capability::new("c/*").unwrap()],
    /// );
    /// assert_eq!(prefs.to_accept_header(), "a/*;q=1, b/x;q=0.5, c/*;q=0");
    /// ```
    pub fn to_accept_header(&self) -> String {
        let k = self.allows.len() as u64;
        let allows = self
            .allows
            .iter()
            .enumerate()
            .map(|(i, cap)| format!("{};q={}", cap, quality(k - i as u64, k)));
        let denies = self.denies.iter().map(|cap| format!("{};q=0", cap));
        allows.chain(denies).collect::<Vec<_>>().join(", ")
    }
}

/// Format `num / den` (with `0 < num <= den`) to one significant digit.
fn quality(num: u64, den: u64) -> String {
    if num >= den {
        return "1".to_string();
    }

    // Find the first decimal place holding a significant digit, up to the
    // three places a header weight may carry.
    let mut scale = 1;
    for places in 1..=3u32 {
        scale *= 10;
        if num * scale >= den {
            // Round half-up: floor((num * scale * 2 + den) / (2 * den))
            let digit = (num * scale * 2 + den) / (2 * den);
            return match (places, digit) {
                (1, 10) => "1".to_string(),
                (_, 10) => format!("0.{}1", "0".repeat(places as usize - 2)),
                _ => format!("0.{}{}", "0".repeat(places as usize - 1), digit),
            };
        }
    }

    format!("0.{:03}", MIN_WEIGHT_MILLIS)
}
