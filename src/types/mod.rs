pub mod cleanup_guard;
pub mod consts;
pub mod generate_args;
pub mod info;
pub mod play_args;
pub mod run_args;
pub mod story;
pub mod terminal_guard;
