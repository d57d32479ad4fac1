use std::path::Path;

pub fn run(
    path: &Path,
    format: &str,
    seed: u64,
    steps: u32,
    output: Option<&Path>,
) -> Result<(), String> {
    let catalog = super::load_catalog(path)?;
    let (session, _turns) = super::autoplay(catalog, seed, steps)?;
    let trace = session
        .trace()
        .ok_or_else(|| "session was run without tracing".to_string())?;

    let content = match format {
        "markdown" | "md" => trace.export_markdown(),
        "json" => trace.export_json().map_err(|e| e.to_string())?,
        other => {
            return Err(format!(
                "unsupported format '{other}'. Supported: markdown, json"
            ));
        }
    };

    if let Some(output_path) = output {
        std::fs::write(output_path, &content)
            .map_err(|e| format!("cannot write '{}': {e}", output_path.display()))?;
        eprintln!("  Wrote {} to '{}'.", format, output_path.display());
    } else {
        print!("{content}");
    }
    Ok(())
}
