pub mod policy;
pub mod td;
pub mod value_store;

pub use policy::{ActionSelection, EpsilonGreedy};
pub use td::QLearning;
pub use value_store::ValueStore;
