pub mod downloader;
pub mod formatter;
pub mod repeater;
pub mod tagger;
pub mod watcher;
