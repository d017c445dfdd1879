/// ObjectRegistry: the ordered entity list of one region.
///
/// Insertion order is update order and paint order. Removal is two-phase:
/// `mark_removed` only sets a flag, and `compact` is the one place entities
/// actually leave the list. Compaction keeps survivors in order, so ids stay
/// sorted and lookup is a binary search.

use super::entity::{Entity, EntityId};

#[derive(Clone, Debug)]
pub struct ObjectRegistry {
    objects: Vec<Entity>,
    next_id: u32,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        ObjectRegistry::new()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        ObjectRegistry { objects: Vec::new(), next_id: 1 }
    }

    /// Append, assigning the next id. O(1) amortised.
    pub fn append(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.id = id;
        self.objects.push(entity);
        id
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.objects.binary_search_by_key(&id, |e| e.id).ok()
    }

    #[cfg(test)]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.position(id).map(|i| &self.objects[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.position(id) {
            Some(i) => Some(&mut self.objects[i]),
            None => None,
        }
    }

    /// Flag for removal. The entity stays in the list until `compact`.
    /// Behaviors set `removed` on the entity they hold; this is the by-id form.
    #[cfg(test)]
    pub fn mark_removed(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(e) => {
                e.removed = true;
                true
            }
            None => false,
        }
    }

    /// Drop every removed entity, keeping survivor order. Returns how many
    /// were dropped; a second call in a row returns 0.
    pub fn compact(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|e| !e.removed);
        before - self.objects.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[cfg(test)]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Index access for the frame loop, which must tolerate appends while
    /// it walks the list.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> &mut Entity {
        &mut self.objects[index]
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.objects.iter_mut()
    }

    /// Live (not removed) entities, in paint order.
    pub fn live(&self) -> impl Iterator<Item = &Entity> {
        self.objects.iter().filter(|e| !e.removed)
    }
}
