//! Amendment (feature) gating.
//!
//! Behavior changes are gated on named amendments that the network enables
//! by consensus. Every replica must agree on the active set, so the set is
//! part of the ledger parameters rather than node-local configuration.

use serde::{Deserialize, Serialize};

/// Named amendments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Feature {
    /// Payment channels may hold issued tokens, not just the native
    /// currency, with locked-balance accounting on trust lines.
    IssuedTokenChannels = 0,
    /// Channels are also registered in the recipient's owner directory.
    RecipientChannelDirectory = 1,
    /// Destinations may require deposit authorization; also retires the
    /// legacy disallow-native-deposits check.
    DepositAuthorization = 2,
    /// Reject transactions carrying undefined flag bits.
    StrictTransactionFlags = 3,
}

impl Feature {
    const ALL: [Feature; 4] = [
        Feature::IssuedTokenChannels,
        Feature::RecipientChannelDirectory,
        Feature::DepositAuthorization,
        Feature::StrictTransactionFlags,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// The set of amendments active on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSet(u32);

impl FeatureSet {
    /// No amendments active.
    pub fn none() -> Self {
        Self(0)
    }

    /// Every known amendment active.
    pub fn all() -> Self {
        let mut set = Self(0);
        for feature in Feature::ALL {
            set.0 |= feature.bit();
        }
        set
    }

    /// Whether `feature` is active.
    pub fn enabled(&self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    /// A copy of the set with `feature` active.
    pub fn with(mut self, feature: Feature) -> Self {
        self.0 |= feature.bit();
        self
    }

    /// A copy of the set with `feature` inactive.
    pub fn without(mut self, feature: Feature) -> Self {
        self.0 &= !feature.bit();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        let set = FeatureSet::none();
        for feature in Feature::ALL {
            assert!(!set.enabled(feature));
        }
    }

    #[test]
    fn test_all_set() {
        let set = FeatureSet::all();
        for feature in Feature::ALL {
            assert!(set.enabled(feature));
        }
    }

    #[test]
    fn test_with_without() {
        let set = FeatureSet::none().with(Feature::DepositAuthorization);
        assert!(set.enabled(Feature::DepositAuthorization));
        assert!(!set.enabled(Feature::IssuedTokenChannels));

        let set = set.without(Feature::DepositAuthorization);
        assert!(!set.enabled(Feature::DepositAuthorization));
    }
}
