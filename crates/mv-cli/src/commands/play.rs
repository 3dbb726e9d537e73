use std::io::{self, BufRead, Write};

use colored::Colorize;

use mv_session::SessionConfig;

pub fn run(config: SessionConfig) -> Result<(), String> {
    let seed = config.seed;
    let mut session = super::open_session(config)?;

    println!("  {} Mossvale", "Welcome to".bold());
    println!("  Seed: {seed}");
    println!("  Type 'help' for commands, 'commands' for what you can do now.\n");
    if let Ok(listing) = session.process("commands") {
        println!("{listing}\n");
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match session.process(input) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{output}\n");
                }
                if session.quit_requested() {
                    break;
                }
            }
            Err(e) => {
                println!("{}\n", e.to_string().yellow());
            }
        }
    }

    Ok(())
}
