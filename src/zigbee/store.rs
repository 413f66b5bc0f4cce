//! # Attribute Store
//!
//! Holds every attribute the bridge can report or answer reads for, keyed by
//! (endpoint, cluster, attribute id). The telegram parser updates values in
//! place; the report encoder and the command engine only read.

use crate::error::P1Error;
use crate::zigbee::attribute::{AttributeDescriptor, AttributeKey};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    attributes: HashMap<AttributeKey, AttributeDescriptor>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, replacing any previous one with the same key.
    pub fn insert(&mut self, descriptor: AttributeDescriptor) {
        self.attributes.insert(descriptor.key(), descriptor);
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&AttributeDescriptor> {
        self.attributes.get(key)
    }

    pub fn contains(&self, key: &AttributeKey) -> bool {
        self.attributes.contains_key(key)
    }

    /// Looks up an attribute for a read request on `endpoint`/`cluster`.
    pub fn lookup(
        &self,
        endpoint: u8,
        cluster: u16,
        attribute: u16,
    ) -> Result<&AttributeDescriptor, P1Error> {
        self.attributes
            .get(&AttributeKey::new(endpoint, cluster, attribute))
            .ok_or(P1Error::UnsupportedAttribute(attribute))
    }

    /// Updates a value in place, returning `true` if it changed.
    pub fn update(&mut self, key: &AttributeKey, value: Vec<u8>) -> Result<bool, P1Error> {
        self.attributes
            .get_mut(key)
            .ok_or(P1Error::UnsupportedAttribute(key.attribute))?
            .set_value(value)
    }

    /// Unsigned value of a set fixed-width attribute.
    pub fn uint(&self, key: &AttributeKey) -> Option<u64> {
        self.get(key).and_then(AttributeDescriptor::as_uint)
    }

    /// Resolves keys to descriptors in the given order, skipping unknown and unset ones.
    pub fn resolve<'a>(&'a self, keys: &[AttributeKey]) -> Vec<&'a AttributeDescriptor> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .filter(|descriptor| descriptor.is_set())
            .collect()
    }

    /// All descriptors of one endpoint, ordered by cluster and attribute id.
    pub fn endpoint_attributes(&self, endpoint: u8) -> Vec<&AttributeDescriptor> {
        let mut attributes: Vec<_> = self
            .attributes
            .values()
            .filter(|descriptor| descriptor.key().endpoint == endpoint)
            .collect();
        attributes.sort_by_key(|descriptor| descriptor.key());
        attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zigbee::attribute::ZclDataType;

    fn store() -> AttributeStore {
        let mut store = AttributeStore::new();
        store.insert(AttributeDescriptor::unset(
            AttributeKey::new(1, 0x0702, 0x0100),
            ZclDataType::Uint48,
        ));
        store.insert(
            AttributeDescriptor::with_uint(AttributeKey::new(1, 0x0702, 0x0302), ZclDataType::Uint24, 1000)
                .unwrap(),
        );
        store
    }

    #[test]
    fn test_lookup_is_scoped_by_endpoint_and_cluster() {
        let store = store();
        assert!(store.lookup(1, 0x0702, 0x0302).is_ok());
        assert!(matches!(
            store.lookup(2, 0x0702, 0x0302),
            Err(P1Error::UnsupportedAttribute(0x0302))
        ));
        assert!(store.lookup(1, 0x0B04, 0x0302).is_err());
    }

    #[test]
    fn test_update_unknown_key() {
        let mut store = store();
        let result = store.update(&AttributeKey::new(1, 0x0702, 0x7777), vec![0]);
        assert!(matches!(result, Err(P1Error::UnsupportedAttribute(0x7777))));
    }

    #[test]
    fn test_resolve_skips_unset() {
        let store = store();
        let keys = [
            AttributeKey::new(1, 0x0702, 0x0100),
            AttributeKey::new(1, 0x0702, 0x0302),
            AttributeKey::new(1, 0x0702, 0x9999),
        ];
        let resolved = store.resolve(&keys);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].key().attribute, 0x0302);
    }

    #[test]
    fn test_endpoint_attributes_sorted_per_endpoint() {
        let mut store = store();
        store.insert(AttributeDescriptor::unset(
            AttributeKey::new(2, 0x0702, 0x0000),
            ZclDataType::Uint48,
        ));
        store.insert(AttributeDescriptor::unset(
            AttributeKey::new(1, 0x0000, 0x0004),
            ZclDataType::CharString,
        ));

        let ids: Vec<(u16, u16)> = store
            .endpoint_attributes(1)
            .iter()
            .map(|d| (d.key().cluster, d.key().attribute))
            .collect();
        assert_eq!(ids, vec![(0x0000, 0x0004), (0x0702, 0x0100), (0x0702, 0x0302)]);
        assert_eq!(store.endpoint_attributes(2).len(), 1);
        assert!(store.endpoint_attributes(3).is_empty());
    }
}
