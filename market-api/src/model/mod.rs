pub mod instrument;
pub mod observation;
pub mod summary;
