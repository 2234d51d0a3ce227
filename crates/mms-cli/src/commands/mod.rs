pub mod inspect;
pub mod maze;
pub mod run;

use std::fs;
use std::path::Path;
use std::time::Duration;

use mms_core::MazeLayout;

/// Read a maze layout from a JSON file.
fn load_layout(path: &Path) -> Result<MazeLayout, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read maze file {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid maze file {}: {e}", path.display()))
}

/// Format an optional duration the way the stats readout does.
fn format_time(time: Option<Duration>) -> String {
    time.map_or_else(|| "NONE".to_string(), |t| format!("{:.3} s", t.as_secs_f64()))
}
