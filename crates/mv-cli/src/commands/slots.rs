use comfy_table::{ContentArrangement, Table};

use mv_session::{SaveSlots, SessionConfig};

pub fn run(config: SessionConfig) -> Result<(), String> {
    let saves = SaveSlots::from_config(&config);
    let summaries = saves.summaries();

    if summaries.is_empty() {
        println!("  No saves found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Slot", "Name", "Level", "Gold", "Last played"]);

    for s in &summaries {
        table.add_row(vec![
            s.slot.to_string(),
            s.name.clone(),
            s.level.to_string(),
            s.gold.to_string(),
            s.last_played.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} of {} slots used", summaries.len(), saves.max_slots());

    Ok(())
}
