use std::path::Path;

pub fn run(path: &Path) -> Result<(), String> {
    let catalog = super::load_catalog(path)?;
    let templates = catalog.scene_templates();
    let situations: usize = templates.iter().map(|t| t.situation_templates.len()).sum();
    let starters = catalog.starter_templates().count();
    let package = catalog.package();

    println!("  All checks passed for '{}'.", path.display());
    println!(
        "  {} scene template(s) ({} starter), {} situation(s).",
        templates.len(),
        starters,
        situations
    );
    println!(
        "  {} NPC(s), {} location(s), {} route(s), {} item(s), {} achievement(s).",
        package.npcs.len(),
        package.locations.len(),
        package.routes.len(),
        package.items.len(),
        catalog.achievements().len()
    );
    Ok(())
}
