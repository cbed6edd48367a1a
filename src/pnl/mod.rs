/// Realized PnL under FIFO cost-basis accounting
///
/// `fifo` rebuilds a wallet's lot and position state from its full trade
/// stream; `summary` reports over a timeframe using the lifetime average
/// buy price as the reference cost basis.

pub mod fifo;
pub mod summary;

pub use fifo::{ compute_fifo, recompute_wallet, FifoState };
pub use summary::{ summarize, summarize_at };
