pub mod candles;
pub mod signal_events;
