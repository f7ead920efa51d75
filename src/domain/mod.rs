//! Domain layer: the payout record, its state graph, and the ports the
//! application services depend on.

pub mod payout;
pub mod ports;
pub mod transition;
