//! Fee and reserve schedule, hook resource parameters.
//!
//! These are consensus parameters: every replica must apply the same
//! schedule or post-states diverge.

use serde::{Deserialize, Serialize};

/// Fee and reserve schedule for a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Base transaction fee in drops.
    pub base_fee: i64,
    /// Reserve an account must hold with zero owned entries.
    pub reserve_base: i64,
    /// Additional reserve per owned entry.
    pub reserve_increment: i64,
}

impl FeeSchedule {
    /// The reserve an account with `owner_count` owned entries must retain.
    ///
    /// Monotonic in `owner_count`; saturates rather than overflowing.
    pub fn account_reserve(&self, owner_count: u32) -> i64 {
        self.reserve_base
            .saturating_add(self.reserve_increment.saturating_mul(owner_count as i64))
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: 10,
            reserve_base: 100_000,
            reserve_increment: 100_000,
        }
    }
}

/// Hook resource parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookParams {
    /// Maximum size of a single hook state blob.
    pub data_max_size: u32,
    /// Fuel budget for one hook invocation.
    pub fuel_limit: u64,
}

impl HookParams {
    /// Reserve units charged for storing `code_len` bytes of hook code.
    pub fn code_reserve_units(&self, code_len: usize) -> u32 {
        let unit = 5 * self.data_max_size as u64;
        (code_len as u64).div_ceil(unit) as u32
    }
}

impl Default for HookParams {
    fn default() -> Self {
        Self {
            data_max_size: 128,
            fuel_limit: 1_000_000,
        }
    }
}

/// Owner-count units consumed by `state_count` hook state entries.
///
/// One unit per started block of eight entries. Frozen: changing this
/// function is a consensus break.
pub fn hook_state_owner_units(state_count: u32) -> u32 {
    state_count.div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_reserve_is_monotonic() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.account_reserve(0), 100_000);
        assert_eq!(fees.account_reserve(1), 200_000);
        assert_eq!(fees.account_reserve(4), 500_000);
        for n in 0..64 {
            assert!(fees.account_reserve(n + 1) >= fees.account_reserve(n));
        }
    }

    #[test]
    fn test_code_reserve_units() {
        let params = HookParams::default();
        // 5 * 128 = 640 bytes per unit
        assert_eq!(params.code_reserve_units(0), 0);
        assert_eq!(params.code_reserve_units(1), 1);
        assert_eq!(params.code_reserve_units(640), 1);
        assert_eq!(params.code_reserve_units(641), 2);
        assert_eq!(params.code_reserve_units(2000), 4);
    }

    #[test]
    fn test_hook_state_owner_units() {
        assert_eq!(hook_state_owner_units(0), 0);
        assert_eq!(hook_state_owner_units(1), 1);
        assert_eq!(hook_state_owner_units(8), 1);
        assert_eq!(hook_state_owner_units(9), 2);
        assert_eq!(hook_state_owner_units(16), 2);
        assert_eq!(hook_state_owner_units(17), 3);
    }
}
