use std::fs;
use std::path::Path;

use crate::generator;

pub fn run(
    width: usize,
    height: usize,
    seed: u64,
    json: bool,
    output: Option<&Path>,
) -> Result<(), String> {
    let layout = generator::generate(width, height, seed)?;

    let text = if json {
        serde_json::to_string_pretty(&layout).map_err(|e| format!("serialization failed: {e}"))?
    } else {
        generator::render_ascii(&layout)
    };

    match output {
        Some(path) => {
            fs::write(path, &text)
                .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
            println!("  Wrote {width}x{height} maze (seed {seed}) to {}", path.display());
        }
        None => println!("{}", text.trim_end()),
    }

    Ok(())
}
