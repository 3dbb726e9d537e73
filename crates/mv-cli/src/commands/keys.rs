use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, execute};

use mv_session::input::{GRID_ROWS, active_cursor, cast_rank_choice, grid_columns};
use mv_session::names::{self, Key};
use mv_session::{InputEvent, Mode, Session, SessionConfig, TitleStep};

pub fn run(config: SessionConfig) -> Result<(), String> {
    let mut session = super::open_session(config)?;

    enable_raw_mode().map_err(|e| format!("terminal error: {e}"))?;
    let result = run_loop(&mut session);
    disable_raw_mode().ok();
    println!();

    result
}

fn run_loop(session: &mut Session) -> Result<(), String> {
    loop {
        draw(session).map_err(|e| format!("draw error: {e}"))?;
        if session.quit_requested() {
            return Ok(());
        }

        let Event::Key(key) = event::read().map_err(|e| format!("event error: {e}"))? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(());
        }

        let press = match key.code {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => InputEvent::Up,
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => InputEvent::Down,
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => InputEvent::Left,
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => InputEvent::Right,
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('z') => InputEvent::Confirm,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('x') => InputEvent::Back,
            KeyCode::Tab => InputEvent::Start,
            KeyCode::Char('q') => return Ok(()),
            _ => continue,
        };
        session.press(press);
    }
}

/// Redraw the whole screen. Raw mode needs explicit carriage returns.
fn draw(session: &Session) -> io::Result<()> {
    let mut out = io::stdout();
    execute!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;

    let state = session.state();
    let p = &state.player;
    if !matches!(state.mode, Mode::Title(_)) {
        write!(
            out,
            "{} Lv {}  HP {}/{}  MP {}/{}  {} GP  [{}]\r\n\r\n",
            p.name, p.level, p.hp.current, p.hp.max, p.mp.current, p.mp.max, p.gold, state.location
        )?;
    }

    for (i, o) in state.encounter.opponents.iter().enumerate().filter(|(_, o)| o.is_alive()) {
        let marker = match &state.target_select {
            Some(sel) if sel.index == i => ">",
            _ => " ",
        };
        write!(out, "{marker} {} {} HP {}/{}\r\n", i + 1, o.name, o.hp.current, o.hp.max)?;
    }
    for line in state.log.lines() {
        write!(out, "  {line}\r\n")?;
    }
    write!(out, "\r\n{}\r\n\r\n", state.message)?;

    if let Mode::Title(TitleStep::NameInput {
        name, cursor, shift, ..
    }) = &state.mode
    {
        write!(out, "Name: {name}_\r\n\r\n")?;
        draw_keyboard(&mut out, *cursor, *shift)?;
    } else {
        draw_grid(session, &mut out)?;
    }
    write!(out, "\r\narrows move, Enter confirms, Esc backs out, Tab opens the menu, q quits\r\n")?;
    out.flush()
}

fn draw_keyboard(out: &mut impl Write, cursor: (usize, usize), shift: bool) -> io::Result<()> {
    for row in 0..names::rows() {
        for col in 0..names::row_len(row) {
            let Some(key) = names::key_at(row, col) else { continue };
            let cap = match key {
                Key::Char(c) if shift => c.to_ascii_uppercase().to_string(),
                Key::Char(c) => c.to_string(),
                Key::Space => "SPACE".to_string(),
                Key::Backspace => "DEL".to_string(),
                Key::Shift => "SHIFT".to_string(),
                Key::Done => "DONE".to_string(),
                Key::Cancel => "CANCEL".to_string(),
            };
            let marker = if (row, col) == cursor { ">" } else { " " };
            write!(out, "{marker}{cap} ")?;
        }
        write!(out, "\r\n")?;
    }
    Ok(())
}

fn draw_grid(session: &Session, out: &mut impl Write) -> io::Result<()> {
    let commands = session.commands();
    let cursor = active_cursor(session.state());
    let columns = grid_columns(commands.len()).max(commands.len().div_ceil(GRID_ROWS));
    let rows = commands.len().clamp(1, GRID_ROWS);
    for row in 0..rows {
        for col in 0..columns {
            let i = col * GRID_ROWS + row;
            let Some(c) = commands.get(i) else { continue };
            let label = if c.def.label.is_empty() {
                c.def.command.to_string()
            } else {
                c.def.label.clone()
            };
            let marker = if i == cursor { ">" } else { " " };
            let text = if c.enabled { label } else { format!("({label})") };
            write!(out, "{marker} {text:<20}")?;
        }
        write!(out, "\r\n")?;
    }
    if let Some((rank, top)) = cast_rank_choice(session.state(), session.catalogs(), session.saves()) {
        write!(out, "\r\nRank {rank}/{top} (left/right to change)\r\n")?;
    }
    Ok(())
}
