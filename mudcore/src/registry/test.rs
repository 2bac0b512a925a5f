use super::*;
use crate::entities::Room;
use crate::test_support::unique_domain;
use std::sync::Mutex;

// `Room::DOMAIN` is a fixed `"rooms"`, so every test below shares one FDB
// domain within this test binary's shared data dir (see `test_support`).
// Preflight reservation via `init()` keeps id allocation correct across
// tests, but two tests racing their `init()`/`new_entity()` calls against
// the same on-disk domain could still interleave their writes, so this
// lock serializes them.
static TEST_LOCK: Mutex<()> = Mutex::new(());

fn locked() -> std::sync::MutexGuard<'static, ()> {
    let _ = unique_domain("registry"); // ensures the shared test data dir exists
    TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[test]
fn new_entity_allocates_and_persists_immediately() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();

    let handle = reg.new_entity().unwrap();
    let id = handle.id();
    handle.put();

    // A fresh registry instance over the same (already-populated) domain
    // must see the record `new_entity` wrote immediately.
    let reg2 = EntityRegistry::<Room>::new();
    reg2.init().unwrap();
    let reopened = reg2.open(id).unwrap();
    assert_eq!(reopened.id(), id);
}

#[test]
fn attr_set_and_get_round_trip_schema_and_extras() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();

    let handle = reg.new_entity().unwrap();
    handle.attr_set("name.short", "Town Square").unwrap();
    handle.attr_set("weather", "overcast").unwrap();

    assert_eq!(handle.attr_get("name.short").as_deref(), Some("Town Square"));
    assert_eq!(handle.attr_get("weather").as_deref(), Some("overcast"));
    assert_eq!(handle.attr_get("nonexistent"), None);
}

#[test]
fn save_is_a_noop_when_not_dirty() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();

    let handle = reg.new_entity().unwrap();
    // new_entity already wrote the blank record and cleared dirty.
    handle.save().unwrap();
}

#[test]
fn second_open_shares_the_same_cached_state() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();

    let h1 = reg.new_entity().unwrap();
    let id = h1.id();
    h1.attr_set("name.short", "Dirty In Memory").unwrap();

    // Not saved yet; a second `open` for the same id must still see it,
    // because the cache hands back the live state, not a disk read.
    let h2 = reg.open(id).unwrap();
    assert_eq!(h2.attr_get("name.short").as_deref(), Some("Dirty In Memory"));

    drop(h1);
    drop(h2);
}

#[test]
fn release_of_last_handle_saves_dirty_entity() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();

    let handle = reg.new_entity().unwrap();
    let id = handle.id();
    handle.attr_set("name.short", "Saved On Release").unwrap();
    drop(handle);

    let reopened = reg.open(id).unwrap();
    assert_eq!(
        reopened.attr_get("name.short").as_deref(),
        Some("Saved On Release")
    );
}

#[test]
fn init_reserves_ids_already_present_on_disk() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();

    let first = reg.new_entity().unwrap();
    let first_id = first.id();
    first.put();

    // A fresh registry over the same domain must reserve `first_id` during
    // preflight, so the next `new_entity` skips over it.
    let reg2 = EntityRegistry::<Room>::new();
    reg2.init().unwrap();
    let second = reg2.new_entity().unwrap();
    assert_ne!(second.id(), first_id);
}

#[test]
fn cached_count_tracks_live_handles_not_total_records() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();

    let before = reg.cached_count();
    let h1 = reg.new_entity().unwrap();
    assert_eq!(reg.cached_count(), before + 1);

    let h2 = reg.open(h1.id()).unwrap();
    assert_eq!(reg.cached_count(), before + 1, "same entity, one cache slot");

    drop(h1);
    assert_eq!(reg.cached_count(), before + 1, "h2 still live");

    drop(h2);
    assert_eq!(reg.cached_count(), before, "detached once unreferenced");
}

#[test]
fn for_each_visits_a_newly_created_entity() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();

    let handle = reg.new_entity().unwrap();
    let id = handle.id();
    handle.put();

    let mut seen = false;
    reg.for_each(|h| {
        if h.id() == id {
            seen = true;
        }
    })
    .unwrap();
    assert!(seen, "iteration must yield the new id at least once");
}

#[test]
fn open_of_unknown_id_is_not_found() {
    let _guard = locked();
    let reg = EntityRegistry::<Room>::new();
    reg.init().unwrap();
    assert_eq!(reg.open(u16::MAX).unwrap_err(), crate::error::Error::NotFound);
}
