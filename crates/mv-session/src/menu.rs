//! What each mode offers: the filtered command grid and the lists behind
//! numbered picks (inventory, shop stock, spells, elements, gear).

use mv_core::command::{AvailableCommand, filter_commands};
use mv_core::item::ItemDef;
use mv_core::player::Fortune;
use mv_core::venue::VenueDef;
use mv_core::{Catalogs, CommandDef, CommandId, Element, GearId, Player, PredicateContext, Stat};
use mv_mechanics::QuestEntry;
use mv_mechanics::quest::quest_entries;
use mv_mechanics::spells::available_spells;

use crate::mode::{Location, Mode, TitleStep, VenueView};
use crate::state::GameState;

/// One row of the inventory panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEntry {
    /// A stack of consumables.
    Item {
        /// Item id.
        key: String,
        /// Display name.
        name: String,
        /// How many are held.
        count: u32,
    },
    /// A gear instance; picking it toggles equip.
    Gear {
        /// Gear id.
        id: GearId,
        /// Display name.
        name: String,
        /// Whether the player wears it.
        equipped: bool,
    },
}

impl InventoryEntry {
    /// Display label.
    pub fn label(&self) -> String {
        match self {
            InventoryEntry::Item { name, count, .. } => format!("{name} x{count}"),
            InventoryEntry::Gear { name, equipped, .. } => {
                if *equipped {
                    format!("{name} (E)")
                } else {
                    name.clone()
                }
            }
        }
    }
}

/// Stack items first (by id), then gear in arena order.
pub fn inventory_entries(player: &Player, catalogs: &Catalogs) -> Vec<InventoryEntry> {
    let items = player.inventory.iter().filter(|(_, n)| **n > 0).map(|(key, count)| {
        let name = catalogs
            .item(key)
            .map(|i| i.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| key.clone());
        InventoryEntry::Item {
            key: key.clone(),
            name,
            count: *count,
        }
    });
    let gear = player.gear().iter().map(|g| InventoryEntry::Gear {
        id: g.id.clone(),
        name: g.name.clone(),
        equipped: player.is_equipped(&g.id),
    });
    items.chain(gear).collect()
}

/// Something the shop will buy back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellEntry {
    /// One item from a stack.
    Item {
        /// Item id.
        key: String,
        /// Display name.
        name: String,
        /// GP paid.
        price: u32,
    },
    /// A gear instance nobody wears.
    Gear {
        /// Gear id.
        id: GearId,
        /// Display name.
        name: String,
        /// GP paid.
        price: u32,
    },
}

impl SellEntry {
    /// Display label.
    pub fn label(&self) -> String {
        match self {
            SellEntry::Item { name, price, .. } | SellEntry::Gear { name, price, .. } => {
                format!("Sell {name} ({price} GP)")
            }
        }
    }
}

/// Sellable stacks, then unworn gear. Prices are half the list price.
pub fn sell_entries(player: &Player, catalogs: &Catalogs) -> Vec<SellEntry> {
    let items = player
        .inventory
        .iter()
        .filter(|(_, n)| **n > 0)
        .filter_map(|(key, _)| {
            let item = catalogs.item(key)?;
            Some(SellEntry::Item {
                key: key.clone(),
                name: item.name.clone(),
                price: item.sale_price(),
            })
        });
    let gear = player.gear().unowned().map(|g| SellEntry::Gear {
        id: g.id.clone(),
        name: g.name.clone(),
        price: g.price / 2,
    });
    items.chain(gear).collect()
}

/// Shop stock for the player's continent, skipping unknown items.
pub fn shop_stock<'a>(
    venue: &'a VenueDef,
    catalogs: &'a Catalogs,
    element: Element,
) -> Vec<(&'a str, &'a ItemDef)> {
    venue
        .stock_for(element)
        .iter()
        .filter_map(|e| catalogs.item(&e.item_id).map(|i| (e.item_id.as_str(), i)))
        .collect()
}

/// Shop label for an item: gear shows its bonuses, consumables what they
/// restore.
pub fn item_label(item: &ItemDef) -> String {
    if item.gear_slot().is_some() {
        let mut bonus = Vec::new();
        if item.atk != 0 {
            bonus.push(format!("ATK+{}", item.atk));
        }
        if item.defense != 0 {
            bonus.push(format!("DEF+{}", item.defense));
        }
        let detail = if bonus.is_empty() {
            "No bonuses".to_string()
        } else {
            bonus.join(", ")
        };
        return format!("{} ({detail})", item.name);
    }
    if item.hp != 0 || item.mp != 0 {
        return format!("{} (+{} HP/+{} MP)", item.name, item.hp, item.mp);
    }
    item.name.clone()
}

/// Unlocked elements in continent order.
pub fn element_list(player: &Player, catalogs: &Catalogs) -> Vec<Element> {
    let ordered: Vec<Element> = catalogs
        .continents
        .order()
        .into_iter()
        .filter(|e| player.elements().contains(e))
        .collect();
    if ordered.is_empty() {
        player.elements().iter().copied().collect()
    } else {
        ordered
    }
}

/// Spell ids the spellbook lists.
pub fn spell_ids(player: &Player, catalogs: &Catalogs) -> Vec<String> {
    available_spells(player, catalogs)
        .into_iter()
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Quest browser rows for the continent at `continent` in
/// [`element_list`].
pub fn quest_rows(player: &Player, catalogs: &Catalogs, continent: usize) -> Vec<QuestEntry> {
    let elements = element_list(player, catalogs);
    let element = elements.get(continent).copied().unwrap_or_default();
    quest_entries(player, catalogs, element)
}

// ---------------------------------------------------------------------------
// Command grid
// ---------------------------------------------------------------------------

fn enabled(def: CommandDef) -> AvailableCommand {
    AvailableCommand { def, enabled: true }
}

fn back() -> AvailableCommand {
    enabled(CommandDef::new(CommandId::BKey, "Back"))
}

/// The commands the current mode offers, filtered against live state.
///
/// Only an entry listed here and enabled can be used; the router checks
/// scene, venue and menu commands against this list.
pub fn available_commands(state: &GameState, catalogs: &Catalogs, has_save: bool) -> Vec<AvailableCommand> {
    let ctx = predicate_context(state, has_save);
    let player = &state.player;
    match &state.mode {
        Mode::Title(step) => title_commands(step, catalogs, &ctx),
        Mode::Town | Mode::Battle => catalogs.scenes.scene_commands(state.location.scene_id(), &ctx),
        Mode::Venue(venue) => {
            let Some(def) = catalogs.venue(&venue.id) else {
                return vec![back()];
            };
            match &venue.view {
                VenueView::Menu | VenueView::Info(_) => filter_commands(def.commands.iter(), &ctx),
                VenueView::Buy => {
                    let mut out: Vec<AvailableCommand> =
                        shop_stock(def, catalogs, player.current_element())
                            .into_iter()
                            .zip(1u8..)
                            .map(|((_, item), n)| {
                                enabled(CommandDef::new(
                                    CommandId::ShopPick(n),
                                    format!("Buy {}", item_label(item)),
                                ))
                            })
                            .collect();
                    out.push(back());
                    out
                }
                VenueView::Sell => {
                    let mut out: Vec<AvailableCommand> = sell_entries(player, catalogs)
                        .into_iter()
                        .zip(1u8..)
                        .map(|(e, n)| enabled(CommandDef::new(CommandId::ShopPick(n), e.label())))
                        .collect();
                    out.push(back());
                    out
                }
                VenueView::Fuse { first } => {
                    let mut out: Vec<AvailableCommand> = player
                        .fusable_gear(first.as_ref())
                        .into_iter()
                        .zip(1u8..)
                        .map(|(g, n)| enabled(CommandDef::new(CommandId::AlchemyPick(n), g.name.clone())))
                        .collect();
                    out.push(back());
                    out
                }
                VenueView::Portal => {
                    let mut out: Vec<AvailableCommand> = element_list(player, catalogs)
                        .into_iter()
                        .map(|el| {
                            enabled(CommandDef::new(
                                CommandId::PortalTo(el),
                                catalogs.continents.name_of(el),
                            ))
                        })
                        .collect();
                    out.push(back());
                    out
                }
            }
        }
        Mode::Options { .. } => menu_commands("options", catalogs, &ctx),
        Mode::Stats { .. } => {
            let mut out = menu_commands("stats", catalogs, &ctx);
            out.push(back());
            out
        }
        Mode::Spellbook { .. } => {
            let mut out: Vec<AvailableCommand> = available_spells(player, catalogs)
                .into_iter()
                .map(|(id, s)| enabled(CommandDef::new(CommandId::Cast(id.to_string()), s.name.clone())))
                .collect();
            out.push(back());
            out
        }
        Mode::Inventory { .. } => {
            let mut out: Vec<AvailableCommand> = inventory_entries(player, catalogs)
                .into_iter()
                .zip(1u8..)
                .map(|(e, n)| enabled(CommandDef::new(CommandId::Num(n), e.label())))
                .collect();
            out.push(back());
            out
        }
        Mode::Elements { .. } => {
            let mut out: Vec<AvailableCommand> = element_list(player, catalogs)
                .into_iter()
                .map(|el| enabled(CommandDef::new(CommandId::SetElement(el), el.title())))
                .collect();
            out.push(back());
            out
        }
        Mode::Followers(view) => {
            let mut out = Vec::new();
            for (f, n) in player.followers().iter().zip(1u8..) {
                let dismiss = if view.dismiss_pending == Some(usize::from(n) - 1) {
                    format!("Confirm dismiss {}", f.name)
                } else {
                    format!("Dismiss {}", f.name)
                };
                out.push(enabled(CommandDef::new(CommandId::FollowerDismiss(n), dismiss)));
                out.push(enabled(CommandDef::new(
                    CommandId::FollowerUnequip(n),
                    format!("Unequip {}", f.name),
                )));
            }
            out.push(back());
            out
        }
        Mode::QuestBrowser(view) => {
            let mut out = Vec::new();
            match &view.detail {
                None => {
                    for (row, n) in quest_rows(player, catalogs, view.continent).into_iter().zip(1u8..) {
                        out.push(enabled(CommandDef::new(
                            CommandId::Num(n),
                            format!("{} [{}]", row.title, row.status.label()),
                        )));
                    }
                }
                Some(detail) => {
                    let pages = catalogs.quests.get(&detail.id).map_or(0, |q| q.dialog.len());
                    if detail.page + 1 < pages {
                        out.push(enabled(CommandDef::new(CommandId::Num(1), "Next")));
                    } else {
                        out.push(enabled(CommandDef::new(
                            CommandId::QuestStart(detail.id.clone()),
                            "Start Quest",
                        )));
                    }
                }
            }
            out.push(back());
            out
        }
        Mode::Leveling { .. } => {
            let mut out: Vec<AvailableCommand> = Stat::ALL
                .into_iter()
                .zip(1u8..)
                .map(|(stat, n)| enabled(CommandDef::new(CommandId::Num(n), format!("+1 {stat}"))))
                .collect();
            out.push(enabled(CommandDef::new(CommandId::BKey, "Balanced")));
            out.push(enabled(CommandDef::new(CommandId::XKey, "Random")));
            out.push(enabled(CommandDef::new(CommandId::Bank, "Bank Points")));
            out
        }
    }
}

fn predicate_context(state: &GameState, has_save: bool) -> PredicateContext<'_> {
    PredicateContext {
        player: &state.player,
        opponents: &state.encounter.opponents,
        in_town: state.location == Location::Town,
        has_save,
    }
}

/// The options menu's entries, filtered against live state whichever
/// mode is open.
pub fn options_entries(state: &GameState, catalogs: &Catalogs, has_save: bool) -> Vec<AvailableCommand> {
    menu_commands("options", catalogs, &predicate_context(state, has_save))
}

/// A menu's open message from the scene catalog.
pub fn menu_open_message(catalogs: &Catalogs, id: &str, fallback: &str) -> String {
    catalogs
        .scenes
        .menu(id)
        .and_then(|m| m.open_message.clone())
        .unwrap_or_else(|| fallback.to_string())
}

fn menu_commands(id: &str, catalogs: &Catalogs, ctx: &PredicateContext<'_>) -> Vec<AvailableCommand> {
    catalogs
        .scenes
        .menu(id)
        .map(|m| filter_commands(m.commands.iter(), ctx))
        .unwrap_or_default()
}

fn title_commands(step: &TitleStep, catalogs: &Catalogs, ctx: &PredicateContext<'_>) -> Vec<AvailableCommand> {
    let list = |entries: Vec<(CommandId, &str)>| -> Vec<AvailableCommand> {
        entries
            .into_iter()
            .map(|(id, label)| enabled(CommandDef::new(id, label)))
            .collect()
    };
    match step {
        TitleStep::Menu => catalogs.scenes.scene_commands("title", ctx),
        TitleStep::ConfirmOverwrite { .. } => list(vec![
            (CommandId::TitleConfirmYes, "Overwrite"),
            (CommandId::TitleConfirmNo, "Cancel"),
        ]),
        TitleStep::NameSelect { .. } => list(vec![
            (CommandId::TitleNameRandom, "Random Name"),
            (CommandId::TitleNameCustom, "Enter Name"),
            (CommandId::TitleNameBack, "Back"),
        ]),
        TitleStep::NameInput { .. } => Vec::new(),
        TitleStep::Fortune { .. } => {
            let mut out: Vec<AvailableCommand> = Fortune::ALL
                .into_iter()
                .map(|f| enabled(CommandDef::new(CommandId::Fortune(f), f.label())))
                .collect();
            out.push(enabled(CommandDef::new(CommandId::TitleFortuneBack, "Back")));
            out
        }
        TitleStep::StartConfirm { .. } => list(vec![
            (CommandId::TitleStartConfirmYes, "Begin"),
            (CommandId::TitleStartConfirmNo, "Back"),
        ]),
        TitleStep::SlotSelect => Vec::new(),
    }
}

/// The first enabled entry for `id`, matching `target` when given.
pub fn find_enabled<'a>(
    commands: &'a [AvailableCommand],
    id: &CommandId,
    target: Option<&str>,
) -> Option<&'a CommandDef> {
    commands
        .iter()
        .filter(|c| c.enabled && &c.def.command == id)
        .map(|c| &c.def)
        .find(|d| match target {
            None => true,
            Some(t) => d.target.as_deref() == Some(t) || d.service_id.as_deref() == Some(t),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogs() -> Catalogs {
        Catalogs::builtin().unwrap()
    }

    fn in_town() -> GameState {
        let mut state = GameState::new(7);
        state.move_to(Location::Town);
        state
    }

    #[test]
    fn town_grid_lists_venues_and_globals() {
        let cat = catalogs();
        let cmds = available_commands(&in_town(), &cat, false);
        let venues: Vec<&str> = cmds
            .iter()
            .filter(|c| c.def.command == CommandId::EnterVenue)
            .filter_map(|c| c.def.target.as_deref())
            .collect();
        assert_eq!(venues.len(), 7);
        assert!(cmds.iter().all(|c| c.enabled));
        assert!(cmds.iter().any(|c| c.def.command == CommandId::Spellbook));
        assert!(find_enabled(&cmds, &CommandId::EnterVenue, Some("town_inn")).is_some());
        assert!(find_enabled(&cmds, &CommandId::EnterVenue, Some("nowhere")).is_none());
    }

    #[test]
    fn forest_grid_without_opponents() {
        let cat = catalogs();
        let mut state = in_town();
        state.move_to(Location::Forest);
        let cmds = available_commands(&state, &cat, false);
        assert!(find_enabled(&cmds, &CommandId::Attack, None).is_none());
        assert!(find_enabled(&cmds, &CommandId::EnterScene, Some("town")).is_some());
        assert!(find_enabled(&cmds, &CommandId::EnterVenue, None).is_none());
    }

    #[test]
    fn inventory_lists_items_then_gear() {
        let cat = catalogs();
        let mut p = Player::default();
        p.add_item("potion", 2);
        p.add_gear("iron_sword", cat.item("iron_sword").unwrap());
        let rows = inventory_entries(&p, &cat);
        assert_eq!(rows.len(), 2);
        assert!(matches!(&rows[0], InventoryEntry::Item { count: 2, .. }));
        assert!(matches!(&rows[1], InventoryEntry::Gear { equipped: true, .. }));
        assert!(rows[1].label().ends_with("(E)"));
    }

    #[test]
    fn worn_gear_is_not_for_sale() {
        let cat = catalogs();
        let mut p = Player::default();
        p.add_gear("iron_sword", cat.item("iron_sword").unwrap());
        p.add_gear("wooden_sword", cat.item("wooden_sword").unwrap());
        let rows = sell_entries(&p, &cat);
        assert_eq!(rows.len(), 1);
        let SellEntry::Gear { name, price, .. } = &rows[0] else {
            panic!("expected gear");
        };
        assert_eq!(name, &cat.item("wooden_sword").unwrap().name);
        assert_eq!(*price, cat.item("wooden_sword").unwrap().price / 2);
    }

    #[test]
    fn shop_labels() {
        let cat = catalogs();
        assert!(item_label(cat.item("iron_sword").unwrap()).contains("ATK+"));
        assert!(item_label(cat.item("potion").unwrap()).contains("HP"));
    }
}
