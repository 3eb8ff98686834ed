pub mod persistence;

pub use persistence::{load_json, save_json};
