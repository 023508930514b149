use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use pointshot_core::Project;

pub fn show(project: &Project) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Key"), Cell::new("Value")]);

    for (key, value) in project.settings().entries() {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }

    println!("{table}");
    Ok(())
}

pub fn set(project: &mut Project, key: &str, value: &str) -> Result<()> {
    project.set_setting(key, value)?;
    let stored = project
        .settings()
        .entries()
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .unwrap_or_else(|| value.to_string());
    println!("{key} = {stored}");
    Ok(())
}
