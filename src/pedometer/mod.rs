pub mod pipeline;
pub mod reconcile;
pub mod threshold;
pub mod window;
