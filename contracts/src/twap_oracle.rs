//! TWAP Oracle Contract
//!
//! Time-weighted market price per pair, fed by keepers. `update` integrates
//! the spot price into a rolling window average at most once per
//! `min_update_interval` (earlier calls are silent no-ops, mirroring the
//! rebase idempotence pattern); `consult` fails closed once the newest
//! sample ages past `max_age`.
//!
//! Prices are `PRICE_SCALE` fixed point: 10_000 = one reserve unit of value
//! per HLX.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::HelixError;
use crate::types::PRICE_SCALE;

/// Default minimum interval between samples
const DEFAULT_MIN_UPDATE_INTERVAL: u64 = 300;
/// Default staleness window
const DEFAULT_MAX_AGE: u64 = 3600;

/// One pair's rolling observation
#[odra::odra_type]
pub struct Observation {
    /// Time-weighted cumulative price
    pub cumulative: U256,
    /// Last accepted sample time
    pub timestamp: u64,
    /// Windowed average price, `PRICE_SCALE` fixed point
    pub average: U256,
}

/// TWAP Oracle Contract
#[odra::module]
pub struct TwapOracle {
    /// Policy address
    policy: Var<Address>,
    /// Minimum time between accepted samples
    min_update_interval: Var<u64>,
    /// Maximum sample age before `consult` fails
    max_age: Var<u64>,
    /// Per-pair observations
    observations: Mapping<Address, Observation>,
}

#[odra::module]
impl TwapOracle {
    /// Initialize the oracle
    pub fn init(&mut self) {
        self.policy.set(self.env().caller());
        self.min_update_interval.set(DEFAULT_MIN_UPDATE_INTERVAL);
        self.max_age.set(DEFAULT_MAX_AGE);
    }

    /// Fold a spot price into the pair's window average.
    ///
    /// The first sample seeds the average; later samples weight the spot by
    /// elapsed time over the staleness window. Returns whether the sample
    /// was accepted.
    pub fn update(&mut self, pair: Address, spot: U256) -> bool {
        if spot.is_zero() {
            self.env().revert(HelixError::InvalidParameter);
        }

        let now = self.env().get_block_time();
        let window = self.max_age.get().unwrap_or(DEFAULT_MAX_AGE);

        let observation = match self.observations.get(&pair) {
            None => Observation {
                cumulative: U256::zero(),
                timestamp: now,
                average: spot,
            },
            Some(previous) => {
                let elapsed = now.saturating_sub(previous.timestamp);
                if elapsed < self.min_update_interval.get().unwrap_or(DEFAULT_MIN_UPDATE_INTERVAL) {
                    return false;
                }

                let weighted = elapsed.min(window);
                let average = previous
                    .average
                    .checked_mul(U256::from(window - weighted))
                    .and_then(|aged| spot.checked_mul(U256::from(weighted)).map(|fresh| (aged, fresh)))
                    .and_then(|(aged, fresh)| aged.checked_add(fresh))
                    .and_then(|sum| sum.checked_div(U256::from(window)));
                let average = match average {
                    Some(average) => average,
                    None => self.env().revert(HelixError::ArithmeticFailure),
                };

                Observation {
                    cumulative: previous.cumulative + spot * U256::from(elapsed),
                    timestamp: now,
                    average,
                }
            }
        };

        self.observations.set(&pair, observation);
        true
    }

    /// Reserve value of `amount_in` HLX at the pair's windowed average
    pub fn consult(&self, pair: Address, amount_in: U256) -> U256 {
        let average = self.market_price(pair);
        amount_in
            .checked_mul(average)
            .and_then(|v| v.checked_div(U256::from(PRICE_SCALE)))
            .unwrap_or_else(|| self.env().revert(HelixError::ArithmeticFailure))
    }

    /// Windowed average price, failing closed when stale or never sampled
    pub fn market_price(&self, pair: Address) -> U256 {
        let observation = match self.observations.get(&pair) {
            Some(observation) => observation,
            None => self.env().revert(HelixError::StaleOracle),
        };
        let age = self.env().get_block_time().saturating_sub(observation.timestamp);
        if age > self.max_age.get().unwrap_or(DEFAULT_MAX_AGE) {
            self.env().revert(HelixError::StaleOracle);
        }
        observation.average
    }

    /// Raw observation for a pair
    pub fn get_observation(&self, pair: Address) -> Option<Observation> {
        self.observations.get(&pair)
    }

    /// Tune sampling intervals (policy only)
    pub fn set_intervals(&mut self, min_update_interval: u64, max_age: u64) {
        self.require_policy();
        if min_update_interval == 0 || max_age < min_update_interval {
            self.env().revert(HelixError::InvalidParameter);
        }
        self.min_update_interval.set(min_update_interval);
        self.max_age.set(max_age);
    }

    /// Get the configured intervals
    pub fn get_intervals(&self) -> (u64, u64) {
        (
            self.min_update_interval.get().unwrap_or(DEFAULT_MIN_UPDATE_INTERVAL),
            self.max_age.get().unwrap_or(DEFAULT_MAX_AGE),
        )
    }

    fn require_policy(&self) {
        if Some(self.env().caller()) != self.policy.get() {
            self.env().revert(HelixError::Unauthorized);
        }
    }
}
