// Mini Shell Session
// A tiny interactive shell: prints `<cwd>$ ` before every command.
//
// Commands:
//   pwd         print the working directory
//   cd DIR      change the working directory
//   sleep MS    sleep, then report the elapsed time in seconds
//   exit        leave the shell

use std::env;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

fn prompt(out: &mut impl Write) {
    let cwd = env::current_dir().map(|p| p.display().to_string()).unwrap_or_default();
    let _ = write!(out, "{}$ ", cwd);
    let _ = out.flush();
}

fn main() {
    let stdin = io::stdin();
    let mut out = io::stdout();

    prompt(&mut out);
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (None, _) => {}
            (Some("exit"), _) => break,
            (Some("pwd"), _) => {
                let cwd = env::current_dir().map(|p| p.display().to_string()).unwrap_or_default();
                let _ = writeln!(out, "{}", cwd);
            }
            (Some("cd"), Some(dir)) => {
                if let Err(e) = env::set_current_dir(dir) {
                    let _ = writeln!(out, "cd: {}: {}", dir, e);
                }
            }
            (Some("sleep"), Some(ms)) => {
                let start = Instant::now();
                thread::sleep(Duration::from_millis(ms.parse().unwrap_or(0)));
                let _ = writeln!(out, "Execution time: {:.3} seconds", start.elapsed().as_secs_f64());
            }
            (Some(cmd), _) => {
                let _ = writeln!(out, "unknown command: {}", cmd);
            }
        }
        prompt(&mut out);
    }
}
