//! UI utilities for the client.

use std::io::Write;

pub const PROMPT: &str = "parley> ";

/// Redisplay the prompt after printing asynchronous output
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}

/// Print a block of output followed by a fresh prompt
pub fn print_and_prompt(text: &str) {
    print!("{}", text);
    redisplay_prompt();
}
