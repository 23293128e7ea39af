use std::path::PathBuf;

use anyhow::{bail, Context};

fn main() -> anyhow::Result<()> {
    let Some(script) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: cropview <script.json>");
    };
    let report = cropview::run(&script)
        .with_context(|| format!("replaying {}", script.display()))?;
    for line in &report.status {
        println!("{line}");
    }
    Ok(())
}
