// Echo Session
// Prints every line read from stdin; stops after `exit` or at end of input.

use std::io::{self, BufRead, Write};

fn main() {
    let stdin = io::stdin();
    let mut out = io::stdout();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
        if line == "exit" {
            break;
        }
    }
}
