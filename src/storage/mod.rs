mod json;

pub use json::JsonStorage;
