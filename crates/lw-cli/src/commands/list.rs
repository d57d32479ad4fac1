use std::path::Path;

use comfy_table::{ContentArrangement, Table};

pub fn run(path: &Path, starters_only: bool) -> Result<(), String> {
    let catalog = super::load_catalog(path)?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Id",
        "Name",
        "Placement",
        "Situations",
        "Starter",
        "Expires",
    ]);

    for template in catalog.scene_templates() {
        if starters_only && !template.is_starter {
            continue;
        }
        let placement = template
            .placement_filter
            .as_ref()
            .map(|f| f.placement_type.to_string())
            .unwrap_or_else(|| "-".into());
        let expires = template
            .expiration_days
            .map(|d| format!("{d} day(s)"))
            .unwrap_or_else(|| "never".into());
        table.add_row(vec![
            template.id.clone(),
            template.display_name.clone().unwrap_or_default(),
            placement,
            template.situation_templates.len().to_string(),
            if template.is_starter { "yes" } else { "" }.to_string(),
            expires,
        ]);
    }

    println!("{table}");
    Ok(())
}
