pub mod protocol;
pub mod tradingview;

pub use tradingview::{TradingViewChannel, TradingViewFactory};
