use std::collections::HashMap;

/// The namespace an identifier is canonicalized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Lock,
    Variable,
}

/// How lock names are mapped to ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockIds {
    /// Locks get their own id space, independent of variables.
    #[default]
    Separate,
    /// Locks are numbered from the variable id space.
    SharedWithVariables,
}

/// Assigns dense, zero-based ids to textual identifiers in first-seen order.
///
/// A registry lives for the conversion of a single trace. Ids are never
/// reused or reassigned.
#[derive(Debug, Default)]
pub struct Registry {
    lock_ids: LockIds,
    locks: HashMap<String, u32>,
    vars: HashMap<String, u32>,
}

impl Registry {
    pub fn new(lock_ids: LockIds) -> Self {
        Self {
            lock_ids,
            ..Default::default()
        }
    }

    pub fn lock_ids(&self) -> LockIds {
        self.lock_ids
    }

    /// Return the id of `name` in `category`, assigning the next free id on
    /// first sight.
    pub fn resolve(&mut self, category: Category, name: &str) -> u32 {
        let table = self.table_mut(category);
        if let Some(&id) = table.get(name) {
            return id;
        }
        let id = table.len() as u32;
        table.insert(name.to_string(), id);
        log::trace!("assigned {:?} id {} to {:?}", category, id, name);
        id
    }

    /// Return the id of `name` without assigning one.
    pub fn lookup(&self, category: Category, name: &str) -> Option<u32> {
        self.table(category).get(name).copied()
    }

    /// Number of ids handed out in `category`.
    pub fn len(&self, category: Category) -> usize {
        self.table(category).len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty() && self.vars.is_empty()
    }

    fn table(&self, category: Category) -> &HashMap<String, u32> {
        match (category, self.lock_ids) {
            (Category::Lock, LockIds::Separate) => &self.locks,
            _ => &self.vars,
        }
    }

    fn table_mut(&mut self, category: Category) -> &mut HashMap<String, u32> {
        match (category, self.lock_ids) {
            (Category::Lock, LockIds::Separate) => &mut self.locks,
            _ => &mut self.vars,
        }
    }
}
