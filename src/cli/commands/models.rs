//! `list-models` command.

use anyhow::Result;
use comfy_table::Table;

use crate::adapters::models::default_registry;
use crate::infrastructure::ConfigLoader;

pub async fn execute() -> Result<()> {
    let config = ConfigLoader::load()?;
    let registry = default_registry(&config);

    let mut generative = Table::new();
    generative.set_header(vec!["Generative model", "Output", "Pool capacity"]);
    for name in registry.generative_names() {
        let handle = registry.generative(&name)?;
        generative.add_row(vec![
            name,
            handle.modality().to_string(),
            handle.capacity().to_string(),
        ]);
    }

    let mut embedders = Table::new();
    embedders.set_header(vec!["Embedding model", "Dimension", "Pool capacity"]);
    for name in registry.embedder_names() {
        let handle = registry.embedder(&name)?;
        embedders.add_row(vec![
            name,
            handle.dimension().to_string(),
            handle.capacity().to_string(),
        ]);
    }

    println!("{generative}");
    println!();
    println!("{embedders}");
    Ok(())
}
