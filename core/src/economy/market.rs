//! Market exchange model
//!
//! The market trades commodities (wood, food, stone) against gold in lots of
//! 100 units. Each commodity has a hidden "fair" price shared by every
//! player; the price a player sees is the fair price adjusted by that
//! player's trading fee. Every traded lot moves the fair price by a fixed
//! step, so prices drift with supply and demand over the course of a game.
//!
//! Fees are per player. They start at the default fraction and drop once, when
//! the player researches the fee-reducing technology. The reduction is never
//! undone: a replay only records the research click, so a click that was later
//! cancelled looks exactly like a completed research. The first click wins and
//! every later one is a no-op.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::resources::{Resource, ResourceVector};
use crate::replay::{PlayerId, Timestamp};

/// Market rate table
///
/// Prices and fees change with game-balance patches, so the table is data
/// with a version label rather than a set of constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRates {
    /// Label of the balance patch these rates describe
    #[serde(default = "default_version")]
    pub version: String,
    /// Fee charged before the fee-reducing technology (default: 0.30)
    #[serde(default = "default_fee")]
    pub default_fee: f64,
    /// Fee charged after the fee-reducing technology (default: 0.15)
    #[serde(default = "default_reduced_fee")]
    pub reduced_fee: f64,
    /// Technology id that lowers the fee (default: 15, Guilds)
    #[serde(default = "default_fee_technology")]
    pub fee_reducing_technology: u32,
    /// Units of commodity per market click (default: 100)
    #[serde(default = "default_lot_size")]
    pub lot_size: f64,
    /// Fair price change per traded lot (default: 3)
    #[serde(default = "default_price_step")]
    pub price_step: f64,
    /// Lowest fair price (default: 25)
    #[serde(default = "default_min_price")]
    pub min_price: f64,
    /// Highest fair price (default: 9999)
    #[serde(default = "default_max_price")]
    pub max_price: f64,
    /// Lowest gold amount a single lot can trade for (default: 25)
    #[serde(default = "default_min_quote")]
    pub min_quote: f64,
    /// Most lots a single market action may trade (default: 100)
    #[serde(default = "default_max_lots")]
    pub max_lots: u32,
    /// Fair prices at the start of a game
    #[serde(default)]
    pub initial_prices: MarketPrices,
}

fn default_version() -> String {
    "de".to_string()
}
fn default_fee() -> f64 {
    0.30
}
fn default_reduced_fee() -> f64 {
    0.15
}
fn default_fee_technology() -> u32 {
    15
}
fn default_lot_size() -> f64 {
    100.0
}
fn default_price_step() -> f64 {
    3.0
}
fn default_min_price() -> f64 {
    25.0
}
fn default_max_price() -> f64 {
    9999.0
}
fn default_min_quote() -> f64 {
    25.0
}
fn default_max_lots() -> u32 {
    100
}

impl Default for MarketRates {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_fee: default_fee(),
            reduced_fee: default_reduced_fee(),
            fee_reducing_technology: default_fee_technology(),
            lot_size: default_lot_size(),
            price_step: default_price_step(),
            min_price: default_min_price(),
            max_price: default_max_price(),
            min_quote: default_min_quote(),
            max_lots: default_max_lots(),
            initial_prices: MarketPrices::default(),
        }
    }
}

impl MarketRates {
    /// Check the table for values the market model cannot work with
    pub fn validate(&self) -> Result<(), MarketError> {
        let fee_range = 0.0..1.0;
        if !fee_range.contains(&self.default_fee) {
            return Err(MarketError::InvalidRates(format!(
                "default_fee {} must be in [0, 1)",
                self.default_fee
            )));
        }
        if !fee_range.contains(&self.reduced_fee) || self.reduced_fee > self.default_fee {
            return Err(MarketError::InvalidRates(format!(
                "reduced_fee {} must be in [0, default_fee]",
                self.reduced_fee
            )));
        }
        if self.lot_size <= 0.0 {
            return Err(MarketError::InvalidRates(format!(
                "lot_size {} must be positive",
                self.lot_size
            )));
        }
        if self.min_price <= 0.0 || self.min_price > self.max_price {
            return Err(MarketError::InvalidRates(format!(
                "price bounds [{}, {}] are empty or non-positive",
                self.min_price, self.max_price
            )));
        }
        if !self.price_step.is_finite() || self.price_step < 0.0 {
            return Err(MarketError::InvalidRates(format!(
                "price_step {} must be non-negative",
                self.price_step
            )));
        }
        if !self.min_quote.is_finite() || self.min_quote < 0.0 {
            return Err(MarketError::InvalidRates(format!(
                "min_quote {} must be non-negative",
                self.min_quote
            )));
        }
        if self.max_lots == 0 {
            return Err(MarketError::InvalidRates("max_lots must be at least 1".to_string()));
        }
        for resource in [Resource::Wood, Resource::Food, Resource::Stone] {
            let price = self.initial_prices.price(resource).unwrap_or_default();
            if !(self.min_price..=self.max_price).contains(&price) {
                return Err(MarketError::InvalidRates(format!(
                    "initial {} price {} is outside [{}, {}]",
                    resource, price, self.min_price, self.max_price
                )));
            }
        }
        Ok(())
    }
}

/// Fair commodity prices, in gold per lot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketPrices {
    #[serde(default = "default_commodity_price")]
    pub wood: f64,
    #[serde(default = "default_commodity_price")]
    pub food: f64,
    #[serde(default = "default_stone_price")]
    pub stone: f64,
}

fn default_commodity_price() -> f64 {
    100.0
}
fn default_stone_price() -> f64 {
    130.0
}

impl Default for MarketPrices {
    fn default() -> Self {
        Self {
            wood: default_commodity_price(),
            food: default_commodity_price(),
            stone: default_stone_price(),
        }
    }
}

impl MarketPrices {
    /// Fair price of a commodity (None for gold)
    pub fn price(&self, resource: Resource) -> Option<f64> {
        match resource {
            Resource::Wood => Some(self.wood),
            Resource::Food => Some(self.food),
            Resource::Stone => Some(self.stone),
            Resource::Gold => None,
        }
    }

    fn price_mut(&mut self, resource: Resource) -> Option<&mut f64> {
        match resource {
            Resource::Wood => Some(&mut self.wood),
            Resource::Food => Some(&mut self.food),
            Resource::Stone => Some(&mut self.stone),
            Resource::Gold => None,
        }
    }

    /// Gold value of a resource vector at these prices
    ///
    /// A lot of commodity is worth its fair price; gold is worth itself.
    pub fn gold_equivalent(&self, amounts: &ResourceVector, lot_size: f64) -> f64 {
        amounts.wood * self.wood / lot_size
            + amounts.food * self.food / lot_size
            + amounts.gold
            + amounts.stone * self.stone / lot_size
    }
}

/// Which side of the market a player is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn name(self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

/// Outcome of a fee-reduction request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeeChange {
    /// The fee dropped at this call
    Reduced { from: f64, to: f64 },
    /// The fee was already reduced; nothing changed
    AlreadyReduced { since: Timestamp, fee: f64 },
}

/// One market transaction, possibly several lots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketTrade {
    pub side: TradeSide,
    pub resource: Resource,
    pub lots: u32,
    /// Fee applied to every lot of this trade
    pub fee: f64,
    /// Signed change to the player's stockpile
    pub delta: ResourceVector,
}

/// Market errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketError {
    /// Gold cannot be bought or sold for gold
    #[error("{0} is not traded at the market")]
    NotTradable(Resource),

    /// Conversion into the same resource
    #[error("cannot convert {0} into itself")]
    SameResource(Resource),

    /// Negative or non-finite amount
    #[error("invalid trade amount {0}")]
    InvalidAmount(f64),

    /// More lots in one action than the rate table allows
    #[error("{lots} lots in one trade exceeds the limit of {max}")]
    TooManyLots { lots: u32, max: u32 },

    /// Rate table rejected by validation
    #[error("invalid market rates: {0}")]
    InvalidRates(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlayerFee {
    fee: f64,
    reduced_at: Option<Timestamp>,
}

/// Market state for one replay
///
/// Owned by a single interpreter run. Never share one between two replays:
/// prices and fees are replay-specific.
#[derive(Debug, Clone)]
pub struct MarketState {
    rates: MarketRates,
    prices: MarketPrices,
    fees: HashMap<PlayerId, PlayerFee>,
}

impl MarketState {
    /// Create a market at the rate table's starting prices
    pub fn new(rates: MarketRates) -> Self {
        let prices = rates.initial_prices;
        Self {
            rates,
            prices,
            fees: HashMap::new(),
        }
    }

    pub fn rates(&self) -> &MarketRates {
        &self.rates
    }

    /// Current fair prices
    pub fn prices(&self) -> MarketPrices {
        self.prices
    }

    /// Current fee fraction for a player
    pub fn fee_for(&self, player: PlayerId) -> f64 {
        self.fees
            .get(&player)
            .map(|f| f.fee)
            .unwrap_or(self.rates.default_fee)
    }

    /// When the player's fee was reduced, if it was
    pub fn fee_reduced_at(&self, player: PlayerId) -> Option<Timestamp> {
        self.fees.get(&player).and_then(|f| f.reduced_at)
    }

    /// Players the market has seen, in ascending order
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: Vec<_> = self.fees.keys().copied().collect();
        players.sort_unstable();
        players
    }

    fn observe(&mut self, player: PlayerId) -> &mut PlayerFee {
        let default_fee = self.rates.default_fee;
        self.fees.entry(player).or_insert(PlayerFee {
            fee: default_fee,
            reduced_at: None,
        })
    }

    /// Lower the player's fee from `timestamp` onward
    ///
    /// Only the first call per player changes anything.
    pub fn apply_fee_reduction(&mut self, player: PlayerId, timestamp: Timestamp) -> FeeChange {
        let reduced_fee = self.rates.reduced_fee;
        let entry = self.observe(player);

        if let Some(since) = entry.reduced_at {
            return FeeChange::AlreadyReduced {
                since,
                fee: entry.fee,
            };
        }

        let from = entry.fee;
        entry.fee = entry.fee.min(reduced_fee);
        entry.reduced_at = Some(timestamp);
        FeeChange::Reduced { from, to: entry.fee }
    }

    /// Gold value of one unit of a resource at current prices
    fn unit_rate(&self, resource: Resource) -> f64 {
        match self.prices.price(resource) {
            Some(price) => price / self.rates.lot_size,
            None => 1.0,
        }
    }

    /// Quote a conversion without trading
    ///
    /// The player sells `amount_in` of `resource_in` and receives
    /// `resource_out`. The fee is taken from the proceeds of the selling leg:
    /// `amount_in * rate(in) * (1 - fee) / rate(out)`.
    pub fn convert(
        &self,
        player: PlayerId,
        resource_in: Resource,
        amount_in: f64,
        resource_out: Resource,
    ) -> Result<f64, MarketError> {
        if resource_in == resource_out {
            return Err(MarketError::SameResource(resource_in));
        }
        if !amount_in.is_finite() || amount_in < 0.0 {
            return Err(MarketError::InvalidAmount(amount_in));
        }

        let fee = self.fee_for(player);
        let proceeds = amount_in * self.unit_rate(resource_in) * (1.0 - fee);
        Ok(proceeds / self.unit_rate(resource_out))
    }

    fn shift_price(&mut self, resource: Resource, step: f64) {
        let (min, max) = (self.rates.min_price, self.rates.max_price);
        if let Some(price) = self.prices.price_mut(resource) {
            *price = (*price + step).clamp(min, max);
        }
    }

    /// Sell one lot of a commodity for gold
    pub fn sell_lot(
        &mut self,
        player: PlayerId,
        resource: Resource,
    ) -> Result<ResourceVector, MarketError> {
        if !resource.is_commodity() {
            return Err(MarketError::NotTradable(resource));
        }
        self.observe(player);

        let lot = self.rates.lot_size;
        let proceeds = self
            .convert(player, resource, lot, Resource::Gold)?
            .max(self.rates.min_quote);
        self.shift_price(resource, -self.rates.price_step);

        Ok(ResourceVector::single(resource, -lot)
            + ResourceVector::single(Resource::Gold, proceeds))
    }

    /// Buy one lot of a commodity with gold
    ///
    /// The player pays the fair price plus the fee.
    pub fn buy_lot(
        &mut self,
        player: PlayerId,
        resource: Resource,
    ) -> Result<ResourceVector, MarketError> {
        let Some(price) = self.prices.price(resource) else {
            return Err(MarketError::NotTradable(resource));
        };
        let fee = self.observe(player).fee;

        let lot = self.rates.lot_size;
        let cost = (price * (1.0 + fee)).max(self.rates.min_quote);
        self.shift_price(resource, self.rates.price_step);

        Ok(ResourceVector::single(Resource::Gold, -cost) + ResourceVector::single(resource, lot))
    }

    /// Trade `lots` lots in one action
    ///
    /// A shift-click trades five lots and yields exactly what five separate
    /// clicks would, price drift included. Zero lots counts as one click;
    /// more than `max_lots` is refused before anything is traded.
    pub fn trade(
        &mut self,
        player: PlayerId,
        side: TradeSide,
        resource: Resource,
        lots: u32,
    ) -> Result<MarketTrade, MarketError> {
        let max = self.rates.max_lots;
        if lots > max {
            return Err(MarketError::TooManyLots { lots, max });
        }
        let fee = self.fee_for(player);
        let lots = lots.max(1);
        let mut delta = ResourceVector::zero();

        for _ in 0..lots {
            delta += match side {
                TradeSide::Buy => self.buy_lot(player, resource)?,
                TradeSide::Sell => self.sell_lot(player, resource)?,
            };
        }

        tracing::debug!(
            "market {} x{} {} by player {} at fee {:.2}: {}",
            side.name(),
            lots,
            resource,
            player,
            fee,
            delta
        );

        Ok(MarketTrade {
            side,
            resource,
            lots,
            fee,
            delta,
        })
    }
}
