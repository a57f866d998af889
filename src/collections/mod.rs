pub mod skiplist;

/// A key/value pair stored by the in-memory index.
#[derive(Default)]
pub struct Entry<K: Default, V: Default> {
    pub key: K,
    pub value: V,
}

impl<K: Default, V: Default> Entry<K, V> {
    pub fn key_value(self) -> (K, V) {
        (self.key, self.value)
    }

    pub fn key_value_clone(&self) -> (K, V)
    where
        K: Clone,
        V: Clone,
    {
        (self.key.clone(), self.value.clone())
    }
}
