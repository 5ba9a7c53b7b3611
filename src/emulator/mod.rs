pub mod ascii_display;
pub mod basics;
pub mod engine;
pub mod execution;
pub mod executor;
pub mod framebuffer;
pub mod machine;
