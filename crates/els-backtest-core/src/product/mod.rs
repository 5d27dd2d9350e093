pub mod step_down;

pub use step_down::ProductSpec;
