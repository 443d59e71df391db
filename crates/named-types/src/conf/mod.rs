pub mod deserialise;
pub mod types;
