pub mod console;
pub mod patterns;
pub mod retry;
