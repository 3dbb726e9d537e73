//! Town venues: shop, hall, inn, alchemist, temple, smithy and portal.

use mv_core::venue::{ServiceDef, ServiceKind, VenueDef, VenueKind};
use mv_core::{CommandId, Element, GearId, TeamTarget};
use mv_mechanics::quest::QuestEvent;

use super::{Invocation, RouterContext, quest_event, settle_quests, with_notes};
use crate::menu::{SellEntry, find_enabled, sell_entries, shop_stock};
use crate::mode::{Location, Mode, VenueState, VenueView};
use crate::state::GameState;

/// Followers consumed by one temple fusion.
pub const FOLLOWER_FUSION_SIZE: usize = 3;

/// GP the temple charges per fusion.
pub const FOLLOWER_FUSION_COST: u32 = 100;

pub(super) fn handle(inv: &Invocation, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let Mode::Venue(venue) = &state.mode else {
        return false;
    };
    let venue = venue.clone();
    let catalogs = ctx.catalogs;
    let Some(def) = catalogs.venue(&venue.id) else {
        return false;
    };
    match (&venue.view, &inv.id) {
        (VenueView::Menu | VenueView::Info(_), CommandId::Leave | CommandId::BKey) => {
            state.close_panel();
            state.say(def.farewell());
            true
        }
        (VenueView::Menu | VenueView::Info(_), _) => menu_command(inv, &venue, def, state, ctx),
        (_, CommandId::BKey) => {
            set_view(state, VenueView::Menu);
            state.say(def.welcome());
            true
        }
        (VenueView::Buy, CommandId::ShopPick(n)) => buy(usize::from(*n), def, state, ctx),
        (VenueView::Sell, CommandId::ShopPick(n)) => sell(usize::from(*n), state, ctx),
        (VenueView::Fuse { first }, CommandId::AlchemyPick(n)) => {
            fuse_pick(usize::from(*n), first.clone(), state, ctx)
        }
        (VenueView::Portal, CommandId::PortalTo(el)) => portal_to(*el, state, ctx),
        _ => false,
    }
}

fn menu_command(
    inv: &Invocation,
    venue: &VenueState,
    def: &VenueDef,
    state: &mut GameState,
    ctx: &mut RouterContext<'_>,
) -> bool {
    let cmds = ctx.commands(state);
    let Some(entry) = find_enabled(&cmds, &inv.id, inv.target.as_deref()) else {
        return false;
    };
    match (&inv.id, venue.kind) {
        (CommandId::ShopBuy, VenueKind::Shop) => {
            set_view(state, VenueView::Buy);
            state.say("What would you like to buy?");
            true
        }
        (CommandId::ShopSell, VenueKind::Shop) => {
            if sell_entries(&state.player, ctx.catalogs).is_empty() {
                state.say("You have nothing to sell.");
            } else {
                set_view(state, VenueView::Sell);
                state.say("What would you like to sell?");
            }
            true
        }
        (CommandId::UseService, _) => {
            let Some(service) = entry.service_id.as_deref().and_then(|id| def.services.get(id)) else {
                tracing::warn!(venue = %venue.id, "service entry names no known service");
                return false;
            };
            use_service(service, state, ctx);
            true
        }
        (CommandId::Num(_), VenueKind::Hall) => {
            let key = inv.id.to_string();
            let Some(section) = def.info_sections.iter().find(|s| s.command == key) else {
                return false;
            };
            set_view(state, VenueView::Info(section.key.clone()));
            state.say(section.message.clone());
            true
        }
        (CommandId::AlchemyFuse, VenueKind::Alchemist) => {
            if state.player.fusable_gear(None).is_empty() {
                state.say("You need two matching pieces of gear to fuse.");
            } else {
                set_view(state, VenueView::Fuse { first: None });
                state.say("Choose the first item to fuse.");
            }
            true
        }
        (CommandId::FollowerFuseAuto, VenueKind::Temple) => {
            fuse_followers(state, ctx);
            true
        }
        (CommandId::Portal, VenueKind::Portal) => {
            set_view(state, VenueView::Portal);
            state.say("Select a continent.");
            true
        }
        _ => false,
    }
}

fn set_view(state: &mut GameState, view: VenueView) {
    if let Mode::Venue(venue) = &mut state.mode {
        venue.view = view;
        venue.cursor = 0;
    }
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

fn buy(n: usize, def: &VenueDef, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let catalogs = ctx.catalogs;
    let stock = shop_stock(def, catalogs, state.player.current_element());
    let Some((item_id, item)) = n.checked_sub(1).and_then(|i| stock.get(i)).copied() else {
        return false;
    };
    if state.player.gold < item.price {
        state.say("Not enough GP.");
        return true;
    }
    state.player.gold -= item.price;
    let message = if item.gear_slot().is_some() {
        state.player.add_gear(item_id, item);
        with_notes(format!("Purchased {}.", item.name), settle_quests(state, ctx))
    } else {
        state.player.add_item(item_id, 1);
        format!("Purchased {}.", item.name)
    };
    tracing::debug!(item = item_id, price = item.price, "bought");
    state.say(message);
    ctx.save(state);
    true
}

fn sell(n: usize, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let entries = sell_entries(&state.player, ctx.catalogs);
    let Some(entry) = n.checked_sub(1).and_then(|i| entries.get(i)) else {
        return false;
    };
    let (name, price) = match entry {
        SellEntry::Item { key, name, price } => {
            if !state.player.take_item(key) {
                return false;
            }
            (name, *price)
        }
        SellEntry::Gear { id, name, price } => {
            if state.player.remove_gear(id).is_none() {
                return false;
            }
            (name, *price)
        }
    };
    state.player.gold += price;
    state.say(format!("Sold {name} for {price} GP."));
    if sell_entries(&state.player, ctx.catalogs).is_empty() {
        set_view(state, VenueView::Menu);
    }
    ctx.save(state);
    true
}

// ---------------------------------------------------------------------------
// Inn
// ---------------------------------------------------------------------------

/// Checks run in order: already full, wrong place, too poor, no wand.
/// Nothing is paid unless every check passes.
fn use_service(service: &ServiceDef, state: &mut GameState, ctx: &mut RouterContext<'_>) {
    let msg = |custom: &Option<String>, fallback: &str| custom.clone().unwrap_or_else(|| fallback.to_string());
    let player = &state.player;
    let full = player.hp.current >= player.hp.max && player.mp.current >= player.mp.max;
    if service.kind != ServiceKind::Overcharge && full {
        state.say(msg(&service.full_message, "You're already fully rested."));
        return;
    }
    if state.location != Location::Town {
        state.say(msg(&service.location_message, "The inn is only in town."));
        return;
    }
    if state.player.gold < service.cost {
        state.say(msg(&service.insufficient_message, "Not enough GP."));
        return;
    }
    if service.kind == ServiceKind::Overcharge && !state.player.has_wand() {
        state.say(msg(&service.no_wand_message, "You have no wand to charge."));
        return;
    }

    state.player.gold -= service.cost;
    match service.kind {
        ServiceKind::Rest => state.player.rest(),
        ServiceKind::Meal => {
            let (hp, mp) = service
                .item_id
                .as_deref()
                .and_then(|id| ctx.catalogs.item(id))
                .map_or((0, 0), |item| (item.hp, item.mp));
            state.player.restore_member(TeamTarget::Player, hp, mp);
        }
        ServiceKind::Overcharge => state.player.recharge_wands(true),
    }
    if service.kind != ServiceKind::Overcharge {
        state.player.recharge_wands(false);
        state.player.recharge_follower_wands();
        state.player.restore_follower_mp();
    }
    tracing::debug!(kind = ?service.kind, cost = service.cost, "inn service used");
    state.say(msg(&service.message, "Thank you for staying."));
    ctx.save(state);
}

// ---------------------------------------------------------------------------
// Alchemist
// ---------------------------------------------------------------------------

fn fuse_pick(n: usize, first: Option<GearId>, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    let Some(picked) = n
        .checked_sub(1)
        .and_then(|i| state.player.fusable_gear(first.as_ref()).get(i).map(|g| (g.id.clone(), g.name.clone())))
    else {
        return false;
    };
    let (id, name) = picked;
    let Some(first) = first else {
        set_view(state, VenueView::Fuse { first: Some(id) });
        state.say(format!("Choose an item to fuse with {name}."));
        return true;
    };
    let Some(fused) = state.player.fuse_gear(&first, &id) else {
        state.say("Those items cannot be fused.");
        return true;
    };
    let (item_id, rank, fused_name) = match state.player.gear_instance(&fused) {
        Some(g) => (g.item_id.clone(), g.fuse_rank, g.name.clone()),
        None => return true,
    };
    let notes = quest_event(state, ctx, QuestEvent::FuseGear { item_id, rank });
    set_view(state, VenueView::Menu);
    state.say(with_notes(format!("Created {fused_name}."), notes));
    ctx.save(state);
    true
}

// ---------------------------------------------------------------------------
// Temple
// ---------------------------------------------------------------------------

fn fuse_followers(state: &mut GameState, ctx: &mut RouterContext<'_>) {
    if state.player.gold < FOLLOWER_FUSION_COST {
        state.say("Not enough GP to fuse followers.");
        return;
    }
    let catalogs = ctx.catalogs;
    let catalog = &catalogs.followers;
    let fused = state
        .player
        .fusable_follower_kind(FOLLOWER_FUSION_SIZE, catalog)
        .and_then(|kind| {
            let idx = state.player.fuse_followers(&kind, FOLLOWER_FUSION_SIZE, catalog)?;
            Some((kind, idx))
        });
    let Some((kind, idx)) = fused else {
        state.say("Need three followers of the same type to fuse.");
        return;
    };
    state.player.gold -= FOLLOWER_FUSION_COST;
    let name = state.player.follower(idx).map(|f| f.name.clone()).unwrap_or_default();
    tracing::info!(kind = %kind, into = %name, "followers fused");
    let notes = quest_event(
        state,
        ctx,
        QuestEvent::FuseFollowers {
            follower_type: kind,
            count: FOLLOWER_FUSION_SIZE as u32,
        },
    );
    state.say(with_notes(format!("{name} joins your party."), notes));
    ctx.save(state);
}

// ---------------------------------------------------------------------------
// Portal
// ---------------------------------------------------------------------------

fn portal_to(element: Element, state: &mut GameState, ctx: &mut RouterContext<'_>) -> bool {
    if !state.player.set_current_element(element) {
        return false;
    }
    set_view(state, VenueView::Menu);
    state.say(format!("Teleported to {} continent.", element.title()));
    ctx.save(state);
    true
}
