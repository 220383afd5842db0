pub mod finalizer;
pub mod model;
