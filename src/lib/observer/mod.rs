pub mod extractor;
pub mod observer;
pub mod ports;
pub mod types;
pub mod watcher;
