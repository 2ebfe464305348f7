use std::process;

use floorcore::{
    build_floor, parse_floor_def, EntityCategory, EntityId, EntityState, Floor, ItemKind,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEMO_FLOOR_JSON: &str = include_str!("../floors/demo.json");

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(error) = run_demo() {
        error!("floorsim failed: {error}");
        process::exit(1);
    }
}

fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    let def = parse_floor_def(DEMO_FLOOR_JSON)?;
    let mut floor = build_floor(&def)?;
    floor.activate_bindings();
    floor.validate()?;

    let player = find_in_category(&floor, EntityCategory::Player, 0)?;
    let opener = find_in_category(&floor, EntityCategory::Button, 0)?;
    let portal_in = find_in_category(&floor, EntityCategory::Portal, 0)?;
    let goal = find_in_category(&floor, EntityCategory::Goal, 0)?;
    let hazard = find_in_category(&floor, EntityCategory::Hazard, 0)?;

    // First attempt: grab the sword, open the portals, then blunder into
    // the spike trap. The level controller answers the death with a
    // floor-wide reset.
    let sword = find_item(&floor, ItemKind::Weapon)?;
    floor.interact(sword, player);
    drain_events(&mut floor, "pickup_sword");

    floor.trigger_enter(opener, player);
    floor.interact(opener, player);
    floor.trigger_exit(opener, player);
    floor.interact(portal_in, player);
    drain_events(&mut floor, "open_and_warp");

    floor.interact(hazard, player);
    drain_events(&mut floor, "trap");
    floor.reset_floor();
    drain_events(&mut floor, "reset");
    info!(
        keys = floor.key_item_count(),
        attack = floor.player().map(|p| p.attack_enabled).unwrap_or(true),
        "state after reset"
    );

    // Second attempt: open the portals again, warp across, collect the
    // vault key, and leave through the now-usable goal.
    floor.interact(opener, player);
    floor.interact(portal_in, player);
    let vault_key = find_item(&floor, ItemKind::Key)?;
    floor.interact(vault_key, player);
    let entered = floor.try_enter_goal(goal, player);
    drain_events(&mut floor, "second_run");
    info!(entered, "goal attempt");

    let counts = floor.event_counts();
    info!(
        total = counts.total,
        button_pressed = counts.button_pressed,
        portal_traversed = counts.portal_traversed,
        item_collected = counts.item_collected,
        player_died = counts.player_died,
        floor_completed = counts.floor_completed,
        "demo finished"
    );
    Ok(())
}

fn find_in_category(
    floor: &Floor,
    category: EntityCategory,
    index: usize,
) -> Result<EntityId, String> {
    floor
        .world()
        .entities_in_category(category)
        .get(index)
        .copied()
        .ok_or_else(|| format!("demo floor has no {} at index {index}", category.as_token()))
}

fn find_item(floor: &Floor, kind: ItemKind) -> Result<EntityId, String> {
    floor
        .world()
        .entities()
        .iter()
        .find(|entity| matches!(entity.state(), EntityState::Item(item) if item.kind == kind))
        .map(|entity| entity.id)
        .ok_or_else(|| format!("demo floor has no live {} item", kind.as_token()))
}

fn drain_events(floor: &mut Floor, stage: &str) {
    for event in floor.take_events() {
        info!(stage = stage, ?event, "floor event");
    }
}
