//!
//! Entity registry: a cache of live entities backed by an FDB domain and
//! an id [`Freelist`], generic over any [`Schema`].
//!
//! The cache holds only a [`Weak`] link per entity; the strong owner is
//! whichever [`EntityHandle`]s are currently alive. `Rc::strong_count`
//! doubles as the refcount: when the last handle drops, the entity is
//! saved if dirty and detached from the cache. Single-threaded `Rc`/
//! `RefCell` rather than `Arc<Mutex<_>>`, since no entity ever crosses a
//! thread boundary.
//!

#[cfg(test)]
mod test;

use crate::error::{Error, Result};
use crate::fdb;
use crate::schema::{FieldValue, Schema};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/////////////////////////////////////////////////////////////////////////////
/////////////////////////////////////////////////////////////////////////////

struct EntityState<T> {
    entity: T,
    dirty: bool,
}

struct RegistryCore<T> {
    cache: RefCell<HashMap<u16, Weak<RefCell<EntityState<T>>>>>,
    ids: RefCell<crate::freelist::Freelist>,
}

/// A cache-and-allocator pair bound to one entity type's FDB domain. Cheap
/// to clone; clones share the same cache and freelist (an `Rc` handle to
/// the same core), the way a `Mapx` handle shares its underlying engine.
pub struct EntityRegistry<T: Schema>(Rc<RegistryCore<T>>);

impl<T: Schema> Clone for EntityRegistry<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Schema> Default for EntityRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Schema> EntityRegistry<T> {
    pub fn new() -> Self {
        Self(Rc::new(RegistryCore {
            cache: RefCell::new(HashMap::new()),
            ids: RefCell::new(crate::freelist::Freelist::with_seed(
                1,
                crate::common::ID_MAX as usize,
            )),
        }))
    }

    /// Preflight: creates the domain, then loads every record once to
    /// verify parse integrity and id consistency and to reserve its id in
    /// the freelist. A duplicate id or a parse failure is fatal, so this
    /// panics rather than returning `Err`.
    pub fn init(&self) -> Result<()> {
        fdb::domain_init(T::DOMAIN)?;
        for id in fdb::iterator_begin(T::DOMAIN)? {
            let entity = load_from_disk::<T>(id).unwrap_or_else(|e| {
                panic!("preflight: record {id} in domain {} is corrupt: {e}", T::DOMAIN)
            });
            assert!(
                entity.id() == id,
                "preflight: record {id} in domain {} declares id {}",
                T::DOMAIN,
                id,
                entity.id(),
            );
            assert!(
                self.0.ids.borrow_mut().thwack(id as usize, 1),
                "preflight: duplicate id {id} in domain {}",
                T::DOMAIN,
            );
        }
        Ok(())
    }

    /// Load path: returns the cached handle if live, otherwise reads the
    /// record from disk. A parse or I/O failure is demoted to `NotFound`
    /// and the underlying reason logged; only preflight treats a bad
    /// record as fatal.
    pub fn open(&self, id: u16) -> Result<EntityHandle<T>> {
        if let Some(state) = self.0.cache.borrow().get(&id).and_then(Weak::upgrade) {
            return Ok(EntityHandle {
                registry: self.clone(),
                state,
            });
        }
        let entity = load_from_disk::<T>(id).map_err(|e| demote_load_error(T::DOMAIN, id, e))?;
        if entity.id() != id {
            let e = Error::Malformed(format!(
                "record {id} in domain {} declares id {}",
                T::DOMAIN,
                entity.id(),
            ));
            return Err(demote_load_error(T::DOMAIN, id, e));
        }
        let state = Rc::new(RefCell::new(EntityState {
            entity,
            dirty: false,
        }));
        self.0.cache.borrow_mut().insert(id, Rc::downgrade(&state));
        Ok(EntityHandle {
            registry: self.clone(),
            state,
        })
    }

    /// Visits every record id currently present in this domain on disk,
    /// opening a handle for each in turn and releasing it once `visitor`
    /// returns. A record that fails to load is skipped rather than
    /// aborting the whole sweep. Order is unspecified, same as the
    /// underlying FDB directory iteration.
    pub fn for_each(&self, mut visitor: impl FnMut(&EntityHandle<T>)) -> Result<()> {
        for id in fdb::iterator_begin(T::DOMAIN)? {
            if let Ok(handle) = self.open(id) {
                visitor(&handle);
            }
        }
        Ok(())
    }

    /// Number of entities currently referenced by at least one live handle.
    /// The cache never holds more than this: release detaches an entity
    /// the moment its last handle drops, so there is nothing to evict
    /// beyond what callers are still holding onto.
    pub fn cached_count(&self) -> usize {
        self.0.cache.borrow().len()
    }

    /// Create path: allocates an id from the freelist, writes a blank
    /// entity immediately so a crash right after still finds it, and
    /// caches it.
    pub fn new_entity(&self) -> Result<EntityHandle<T>> {
        let ofs = self.0.ids.borrow_mut().alloc(1).ok_or(Error::OutOfSpace)?;
        let id = ofs as u16;
        let entity = T::blank(id);
        write_entity(&entity)?;
        let state = Rc::new(RefCell::new(EntityState {
            entity,
            dirty: false,
        }));
        self.0.cache.borrow_mut().insert(id, Rc::downgrade(&state));
        Ok(EntityHandle {
            registry: self.clone(),
            state,
        })
    }
}

/// The on-disk name for an entity's own id, written and parsed specially
/// rather than through a schema [`FieldDescriptor`]: it's the one field
/// every entity type has, so the derive macro handles it via the `id`
/// struct field directly rather than generating a descriptor for it.
const ID_FIELD: &str = "id";

/// Demotes a parse or I/O failure to `NotFound`, logging the real reason.
/// `NotFound` itself passes through unlogged; it isn't a failure to demote.
fn demote_load_error(domain: &str, id: u16, err: Error) -> Error {
    if err == Error::NotFound {
        return err;
    }
    let result: Result<()> = Err(Error::Malformed(format!("load {domain}/{id}: {err}")));
    ruc::info_omit!(result);
    Error::NotFound
}

fn load_from_disk<T: Schema>(id: u16) -> Result<T> {
    let mut r = fdb::read_begin(T::DOMAIN, id)?;
    let mut entity = T::blank(id);
    let mut field_error = None;
    while let Some((name, value)) = r.read_next() {
        if name.eq_ignore_ascii_case(ID_FIELD) {
            match value.parse::<u16>() {
                Ok(parsed) => entity.set_id(parsed),
                Err(_) => {
                    field_error = Some(Error::Malformed(format!("id field is not a u16: {value:?}")));
                    break;
                }
            }
            continue;
        }
        match T::find_descriptor(&name) {
            Some(desc) => match FieldValue::parse(desc.kind, &value).and_then(|v| (desc.set)(&mut entity, v)) {
                Ok(()) => {}
                Err(e) => {
                    field_error = Some(e);
                    break;
                }
            },
            None => entity.extras_mut().set_or_add(name, value),
        }
    }
    r.end()?;
    match field_error {
        Some(e) => Err(e),
        None => Ok(entity),
    }
}

fn write_entity<T: Schema>(entity: &T) -> Result<()> {
    let mut w = fdb::write_begin(T::DOMAIN, entity.id())?;
    w.write_pair(ID_FIELD, entity.id().to_string());
    for desc in T::field_descriptors() {
        w.write_pair(desc.name, (desc.get)(entity).render());
    }
    for attr in entity.extras().iter() {
        w.write_pair(&attr.name, &attr.value);
    }
    w.end()
}

/////////////////////////////////////////////////////////////////////////////
// Handle
/////////////////////////////////////////////////////////////////////////////

/// A live reference to a cached entity. Cloning increments the effective
/// refcount (another strong owner of the same cached state); dropping the
/// last clone saves it if dirty and detaches it from the registry's cache.
pub struct EntityHandle<T: Schema> {
    registry: EntityRegistry<T>,
    state: Rc<RefCell<EntityState<T>>>,
}

impl<T: Schema> Clone for EntityHandle<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Schema> EntityHandle<T> {
    pub fn id(&self) -> u16 {
        self.state.borrow().entity.id()
    }

    /// Runs `f` against the underlying entity without copying it out.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow().entity)
    }

    /// Schema fields are parsed and typed-set; any other name lands in
    /// extras. Either way marks the entity dirty.
    pub fn attr_set(&self, name: &str, value: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        match T::find_descriptor(name) {
            Some(desc) => {
                let parsed = FieldValue::parse(desc.kind, value)?;
                (desc.set)(&mut state.entity, parsed)?;
            }
            None => state.entity.extras_mut().set_or_add(name, value),
        }
        state.dirty = true;
        Ok(())
    }

    /// Schema match renders the typed value; otherwise the stored extras
    /// string is returned.
    pub fn attr_get(&self, name: &str) -> Option<String> {
        let state = self.state.borrow();
        match T::find_descriptor(name) {
            Some(desc) => Some((desc.get)(&state.entity).render()),
            None => state.entity.extras().find(name).map(|e| e.value.clone()),
        }
    }

    /// A no-op unless dirty; a successful write clears the dirty flag. A
    /// failed write leaves the entity dirty so a later save can retry.
    pub fn save(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.dirty {
            return Ok(());
        }
        write_entity(&state.entity)?;
        state.dirty = false;
        Ok(())
    }

    /// Named explicitly to mirror the sources' API even though dropping
    /// the handle does the same thing. `put` consumes `self`, so there is
    /// no handle value left to call it on a second time: the compiler
    /// rejects a double release rather than the runtime aborting on one.
    pub fn put(self) {}
}

impl<T: Schema> Drop for EntityHandle<T> {
    fn drop(&mut self) {
        // The cache's Weak link doesn't count toward strong_count, so 1
        // means this is the last live handle.
        if Rc::strong_count(&self.state) != 1 {
            return;
        }
        let id = self.state.borrow().entity.id();
        {
            let mut state = self.state.borrow_mut();
            if state.dirty {
                let result = write_entity(&state.entity);
                if result.is_ok() {
                    state.dirty = false;
                }
                ruc::omit!(result);
            }
        }
        self.registry.0.cache.borrow_mut().remove(&id);
    }
}
