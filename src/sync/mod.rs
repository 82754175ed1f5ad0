pub mod reconciler;
pub mod report;
pub mod resolver;
