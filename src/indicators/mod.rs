// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator implementations. Every series function
// returns output aligned to its input, with `None` marking warm-up indices,
// so insufficient history can never become an error — only an absent value.

pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod rsi;
