pub mod catalog;
pub mod keys;
pub mod play;
pub mod slots;

use mv_session::{Session, SessionConfig};

use crate::GameOpts;

/// Translate command-line options into a session configuration.
pub fn session_config(opts: &GameOpts) -> SessionConfig {
    let mut config = SessionConfig::default()
        .with_seed(opts.seed)
        .with_max_slots(opts.slots)
        .with_battle_log_lines(opts.log_lines);
    if !opts.no_save {
        config = config.with_save_dir(&opts.save_dir);
    }
    if let Some(dir) = &opts.data_dir {
        config = config.with_data_dir(dir);
    }
    config
}

/// Start a session, turning load failures into a printable error.
fn open_session(config: SessionConfig) -> Result<Session, String> {
    Session::new(config).map_err(|e| format!("failed to start session: {e}"))
}
