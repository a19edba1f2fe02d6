use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

lazy_static::lazy_static! {
    static ref LOGGER: Mutex<Option<File>> = Mutex::new(None);
}

/// Opens (or creates) the log file in append mode. Later calls are ignored
/// once a file is open.
pub fn init(path: &Path) {
    let Ok(mut logger) = LOGGER.lock() else {
        return;
    };
    if logger.is_none()
        && let Ok(file) = OpenOptions::new().create(true).append(true).open(path)
    {
        *logger = Some(file);
    }
}

pub fn log(message: &str) {
    let Ok(mut guard) = LOGGER.lock() else {
        return;
    };
    if let Some(logger) = guard.as_mut() {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(logger, "[{}] {}", timestamp, message);
    }
}

pub fn info(message: &str) {
    log(&format!("INFO  {}", message));
}

pub fn warn(message: &str) {
    log(&format!("WARN  {}", message));
}

pub fn error(message: &str) {
    log(&format!("ERROR {}", message));
}
