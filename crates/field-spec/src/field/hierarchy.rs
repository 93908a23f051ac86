//! Position of a field inside nested, repeating structures.

use super::Field;

impl Field {
    /// Base names of the ancestors, outermost first.
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    pub fn set_hierarchy(&mut self, hierarchy: Vec<String>) -> &mut Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Entry positions within each repeating ancestor.
    pub fn hierarchy_index(&self) -> &[usize] {
        &self.hierarchy_index
    }

    /// Sets the entry positions; an empty list becomes `[0]`.
    pub fn set_hierarchy_index(&mut self, index: Vec<usize>) -> &mut Self {
        self.hierarchy_index = if index.is_empty() { vec![0] } else { index };
        self
    }

    pub fn is_root(&self) -> bool {
        self.hierarchy.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.hierarchy.len()
    }

    /// Key under which a datastore keeps this field's value.
    ///
    /// Root fields use their name. Nested fields join the ancestor chain, the
    /// base name and the entry positions: `_slides|title|0`.
    pub fn storage_key(&self) -> String {
        if self.is_root() {
            return self.name.clone();
        }
        let index = self
            .hierarchy_index
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(":");
        format!(
            "{}{}|{}|{}",
            self.name_prefix,
            self.hierarchy.join("|"),
            self.base_name,
            index
        )
    }

    /// Copies of the child templates positioned at entry `index`.
    ///
    /// Each child inherits this field's datastore as a default and takes its
    /// value from the matching key of the entry row, when present.
    pub fn entry_fields(&self, index: usize) -> Vec<Field> {
        let mut hierarchy = self.hierarchy.clone();
        hierarchy.push(self.base_name.clone());

        let mut hierarchy_index = if self.is_root() {
            Vec::new()
        } else {
            self.hierarchy_index.clone()
        };
        hierarchy_index.push(index);

        let row = self.value_set.rows().get(index);

        self.children()
            .iter()
            .map(|template| {
                let mut child = template.clone();
                child
                    .set_hierarchy(hierarchy.clone())
                    .set_hierarchy_index(hierarchy_index.clone());
                if let Some(datastore) = &self.datastore {
                    child.set_datastore(datastore.clone(), true);
                }
                if let Some(value) = row.and_then(|row| row.get(child.base_name())) {
                    child.set_value(value.clone());
                }
                child
            })
            .collect()
    }

    /// Number of entries currently held by a repeating field.
    pub fn entry_count(&self) -> usize {
        self.value_set.rows().len()
    }
}
