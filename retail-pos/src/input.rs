use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// What a key press did to a hidden entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Continue,
    Submit,
    Cancel,
}

/// Apply one key press to the hidden buffer
pub fn apply_key(buffer: &mut String, key: KeyEvent) -> Entry {
    if key.kind != KeyEventKind::Press {
        return Entry::Continue;
    }

    match key.code {
        KeyCode::Enter => Entry::Submit,
        KeyCode::Esc => Entry::Cancel,
        KeyCode::Char('c') | KeyCode::Char('d')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Entry::Cancel
        }
        KeyCode::Backspace => {
            buffer.pop();
            Entry::Continue
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            Entry::Continue
        }
        _ => Entry::Continue,
    }
}

/// Read a line from the terminal without echoing it.
/// Returns `None` when the operator cancels with Esc or Ctrl-C.
///
/// Blocks; call it from `spawn_blocking`.
pub fn read_hidden() -> std::io::Result<Option<String>> {
    terminal::enable_raw_mode()?;
    let result = collect_hidden();
    let restored = terminal::disable_raw_mode();
    println!();
    restored?;
    result
}

fn collect_hidden() -> std::io::Result<Option<String>> {
    let mut buffer = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            match apply_key(&mut buffer, key) {
                Entry::Continue => {}
                Entry::Submit => return Ok(Some(buffer)),
                Entry::Cancel => return Ok(None),
            }
        }
    }
}
