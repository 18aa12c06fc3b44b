pub mod audio;
pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod cursor;
pub mod error;
pub mod key;
pub mod onboarding;
pub mod render;
pub mod storage;
pub mod theme;
pub mod throttle;
pub mod typewriter;
