pub mod busy;
pub mod commands;
pub mod controller;
pub mod form;
pub mod state;

pub use busy::BusySignals;
pub use controller::{FeedController, FeedError, FeedOptions, RefreshOutcome, VoteOutcome};
pub use form::FactForm;
pub use state::FeedState;
