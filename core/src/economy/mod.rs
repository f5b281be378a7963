//! Resource accounting and the market model

mod market;
mod resources;

pub use market::{
    FeeChange, MarketError, MarketPrices, MarketRates, MarketState, MarketTrade, TradeSide,
};
pub use resources::{Resource, ResourceVector};
