pub mod fink;

pub use fink::FinkConfig;
