mod model;

pub use model::SampleContext;
