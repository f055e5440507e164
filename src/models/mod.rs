pub mod category;
pub mod fact;

pub use category::{Category, CategoryFilter, CategoryInfo};
pub use fact::{Fact, FactId, NewFact, VoteField};
