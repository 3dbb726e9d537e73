use comfy_table::{ContentArrangement, Table};

use mv_core::Catalogs;
use mv_session::SessionConfig;

pub fn run(config: SessionConfig, kind: &str) -> Result<(), String> {
    let catalogs = match &config.data_dir {
        Some(dir) => Catalogs::from_dir(dir),
        None => Catalogs::builtin(),
    }
    .map_err(|e| format!("failed to load catalogs: {e}"))?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let count = match kind.to_lowercase().as_str() {
        "items" => {
            table.set_header(vec!["Id", "Name", "Kind", "Price", "Element"]);
            for (id, item) in &catalogs.items {
                table.add_row(vec![
                    id.clone(),
                    item.name.clone(),
                    format!("{:?}", item.kind),
                    item.price.to_string(),
                    item.element.map_or_else(|| "-".to_string(), |e| e.to_string()),
                ]);
            }
            catalogs.items.len()
        }
        "spells" => {
            table.set_header(vec!["Id", "Name", "Kind", "MP", "Level"]);
            for (id, spell) in &catalogs.spells {
                table.add_row(vec![
                    id.clone(),
                    spell.name.clone(),
                    format!("{:?}", spell.kind),
                    spell.mp_cost.to_string(),
                    spell.level_required.to_string(),
                ]);
            }
            catalogs.spells.len()
        }
        "quests" => {
            table.set_header(vec!["Id", "Title", "Continent", "Pages"]);
            let quests = catalogs.quests.ordered();
            for (id, quest) in &quests {
                table.add_row(vec![
                    id.to_string(),
                    quest.title.clone(),
                    quest.continent.map_or_else(|| "-".to_string(), |e| e.to_string()),
                    quest.dialog.len().to_string(),
                ]);
            }
            quests.len()
        }
        "venues" => {
            table.set_header(vec!["Id", "Name", "Kind", "Services"]);
            for (id, venue) in &catalogs.venues {
                let services: Vec<&str> = venue.services.keys().map(String::as_str).collect();
                table.add_row(vec![
                    id.clone(),
                    venue.name.clone(),
                    format!("{:?}", venue.kind),
                    services.join(", "),
                ]);
            }
            catalogs.venues.len()
        }
        other => {
            return Err(format!(
                "unknown catalog '{other}' (expected items, spells, quests or venues)"
            ));
        }
    };

    println!("{table}");
    println!();
    println!("  {count} entries");

    Ok(())
}
