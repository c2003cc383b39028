// Domain layer - Overlay models and the math behind them
pub mod draw;
pub mod gauge;
pub mod generator;
pub mod generators;
pub mod geo;
pub mod map_view;
pub mod order;
pub mod overlay;
pub mod rate;
pub mod region;
pub mod stopwatch;
