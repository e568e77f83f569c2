//! Converts validated distance into coins.

/// Pays one coin per fixed number of meters, carrying the sub-coin
/// remainder across calls so distance is neither lost to rounding nor
/// rewarded early.
#[derive(Debug, Clone)]
pub struct RewardLedger {
    meters_per_coin: f64,
    remainder_m: f64,
    coins_awarded: u64,
    distance_credited_m: f64,
}

impl RewardLedger {
    /// The game rate: 1 coin per 10 meters.
    pub fn new() -> Self {
        Self::with_rate(10.0)
    }

    pub fn with_rate(meters_per_coin: f64) -> Self {
        RewardLedger {
            meters_per_coin,
            remainder_m: 0.0,
            coins_awarded: 0,
            distance_credited_m: 0.0,
        }
    }

    /// Credit validated movement; returns the coins this delta unlocked.
    pub fn credit(&mut self, distance_m: f64) -> u32 {
        self.distance_credited_m += distance_m;
        self.remainder_m += distance_m;

        if self.remainder_m < self.meters_per_coin {
            return 0;
        }
        let coins = (self.remainder_m / self.meters_per_coin) as u32;
        self.remainder_m -= coins as f64 * self.meters_per_coin;
        self.coins_awarded += coins as u64;
        coins
    }

    pub fn coins_awarded(&self) -> u64 {
        self.coins_awarded
    }

    pub fn remainder_m(&self) -> f64 {
        self.remainder_m
    }
}

impl Default for RewardLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn carries_remainder_across_credits() {
        let mut ledger = RewardLedger::new();

        assert_eq!(ledger.credit(12.0), 1);
        assert_eq!(ledger.credit(8.0), 1);
        assert_eq!(ledger.credit(15.0), 1);

        assert_eq!(ledger.coins_awarded(), 3);
        assert_relative_eq!(ledger.remainder_m(), 5.0);
    }

    #[test]
    fn never_awards_early() {
        let mut ledger = RewardLedger::new();
        assert_eq!(ledger.credit(9.5), 0);
        assert_eq!(ledger.coins_awarded(), 0);
        // The fraction is kept, not dropped.
        assert_eq!(ledger.credit(0.5), 1);
    }

    #[test]
    fn large_deltas_pay_out_in_full() {
        let mut ledger = RewardLedger::new();
        assert_eq!(ledger.credit(47.0), 4);
        assert_relative_eq!(ledger.remainder_m(), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn awarded_coins_never_exceed_credited_distance() {
        let mut ledger = RewardLedger::new();
        for delta in [3.2, 11.0, 0.4, 25.9, 9.9, 10.0, 7.7, 0.1] {
            ledger.credit(delta);
            let owed = ledger.coins_awarded() as f64 * 10.0;
            assert!(owed <= ledger.distance_credited_m + 1e-9);
            assert!(ledger.distance_credited_m - owed < 10.0);
        }
    }
}
