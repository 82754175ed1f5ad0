pub mod learner;
pub mod store;
