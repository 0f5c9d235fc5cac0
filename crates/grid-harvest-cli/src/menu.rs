//! The interactive run menu.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const TITLE: &str = "Power Grid Harvest - First 11 Columns";

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Sample,
    Full,
}

/// Map a menu answer to a run. Anything other than `1` or `2` falls back to the sample.
pub fn parse_choice(input: &str) -> (MenuChoice, bool) {
    match input.trim() {
        "1" => (MenuChoice::Sample, true),
        "2" => (MenuChoice::Full, true),
        _ => (MenuChoice::Sample, false),
    }
}

/// Show the menu and read one answer. `None` when the operator hit Ctrl-C or Ctrl-D.
pub fn prompt() -> anyhow::Result<Option<MenuChoice>> {
    println!("{TITLE}");
    println!("{}", "=".repeat(45));
    println!();
    println!("Choose option:");
    println!("1. Quick test (first page, 11 columns)");
    println!("2. Full harvest (all pages, 11 columns)");

    let mut rl = DefaultEditor::new()?;
    let line = match rl.readline("Enter choice (1 or 2): ") {
        Ok(line) => line,
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let (choice, valid) = parse_choice(&line);
    if !valid {
        println!("Invalid choice. Running quick test...");
    }
    Ok(Some(choice))
}
