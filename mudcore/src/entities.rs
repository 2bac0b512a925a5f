//!
//! Concrete entity types: the three schemas built on
//! [`crate::registry::EntityRegistry`] and [`crate::schema::Schema`].
//! Fields outside each schema's typed list land in `extras` automatically;
//! see `mudcore-derive` for how `#[derive(Entity)]` wires that up.
//!

use crate::attrlist::AttributeList;
use mudcore_derive::Entity;

/// A location in the world graph. `exits` is left to extras (its shape,
/// direction name to target room id, is a convention of the command
/// layer) rather than a typed field.
#[derive(Entity, Debug, Clone)]
#[entity(domain = "rooms")]
pub struct Room {
    pub id: u16,
    #[entity(name = "name.short")]
    pub short_name: String,
    #[entity(name = "desc.long")]
    pub description: String,
    pub extras: AttributeList,
}

/// A player character, persisted independently of whether its owning user
/// is connected.
#[derive(Entity, Debug, Clone)]
#[entity(domain = "characters")]
pub struct Character {
    pub id: u16,
    #[entity(name = "name.short")]
    pub name: String,
    #[entity(name = "room")]
    pub room_id: u32,
    #[entity(name = "hp")]
    pub hp: u32,
    pub extras: AttributeList,
}

/// An account record. Authentication material lives in extras under
/// whatever convention the collaborator layer picks.
#[derive(Entity, Debug, Clone)]
#[entity(domain = "users")]
pub struct User {
    pub id: u16,
    #[entity(name = "login")]
    pub login: String,
    pub extras: AttributeList,
}
