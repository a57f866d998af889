use crate::collections::Entry;
use rand::Rng;
use std::ptr;

/// Fraction of the nodes with level `i` pointers that also have level `i+1`
/// pointers. 1/4 is a good value for speed and space; use 1/2 if variability
/// of running times is a concern.
pub const DEFAULT_P: f64 = 0.25;

/// Ceiling on a node's height.
pub const DEFAULT_MAX_LEVEL: usize = 32;

/// Ordering injected into a skip list; a "less than" relationship over keys.
pub type LessFn<K> = Box<dyn Fn(&K, &K) -> bool + Send + Sync>;

struct Node<K: Default, V: Default> {
    entry: Entry<K, V>,
    /// Successor links; index is the level, length is the node's height.
    forward: Vec<*mut Node<K, V>>,
}

impl<K: Default, V: Default> Node<K, V> {
    fn new(entry: Entry<K, V>, level: usize) -> *mut Node<K, V> {
        Box::into_raw(Box::new(Node {
            entry,
            forward: vec![ptr::null_mut(); level + 1],
        }))
    }
}

/// A probabilistic ordered map.
///
/// Keys are ordered by the injected `less` function; keys that compare equal
/// collide, so the list is a map rather than a multi-map.
///
/// Concurrent reads of a stable list are safe. A writer must be serialized
/// externally with respect to any other access, and iterators are valid only
/// while the list is not being mutated.
///
/// # Examples
///
/// ```
/// use sstlite::collections::skiplist::SkipList;
///
/// let mut list = SkipList::new(Box::new(|a: &i32, b: &i32| a < b));
/// list.put(3, "three");
/// list.put(1, "one");
/// assert_eq!(list.get(&3), Some(&"three"));
/// assert_eq!(list.min(), Some((&1, &"one")));
/// ```
pub struct SkipList<K: Default, V: Default> {
    head: *mut Node<K, V>,
    length: usize,
    p: f64,
    max_level: usize,
    less: LessFn<K>,
}

unsafe impl<K: Default + Send, V: Default + Send> Send for SkipList<K, V> {}
unsafe impl<K: Default + Send + Sync, V: Default + Send + Sync> Sync for SkipList<K, V> {}

impl<K: Default, V: Default> SkipList<K, V> {
    /// Creates an empty list ordered by `less`, with the default `P` and
    /// level ceiling.
    pub fn new(less: LessFn<K>) -> SkipList<K, V> {
        Self::with_params(less, DEFAULT_P, DEFAULT_MAX_LEVEL)
    }

    pub fn with_params(less: LessFn<K>, p: f64, max_level: usize) -> SkipList<K, V> {
        debug_assert!(max_level >= 1);
        SkipList {
            head: Node::new(Entry::default(), 0),
            length: 0,
            p,
            max_level,
            less,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Current top level; the level of an empty list is 0.
    fn level(&self) -> usize {
        unsafe { (*self.head).forward.len() - 1 }
    }

    /// Geometric level draw with ratio `p`, capped at `max_level - 1`.
    fn random_level(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut n = 0;
        while rng.gen::<f64>() < self.p && n < self.max_level - 1 {
            n += 1;
        }
        n
    }

    fn keys_eq(&self, a: &K, b: &K) -> bool {
        !(self.less)(a, b) && !(self.less)(b, a)
    }

    /// Descends from `start` and returns the first node whose key is greater
    /// or equal to `key`, or null if no such node exists.
    ///
    /// When `update` is given it receives, per level, the rightmost node that
    /// precedes the returned position; it must cover every level of `start`.
    unsafe fn find_ge(
        &self,
        start: *mut Node<K, V>,
        mut update: Option<&mut [*mut Node<K, V>]>,
        key: &K,
    ) -> *mut Node<K, V> {
        let mut current = start;
        let mut i = (*current).forward.len() - 1;
        loop {
            let mut next = (&(*current).forward)[i];
            while !next.is_null() && (self.less)(&(*next).entry.key, key) {
                current = next;
                next = (&(*current).forward)[i];
            }
            if let Some(ref mut u) = update {
                u[i] = current;
            }
            if i == 0 {
                return next;
            }
            i -= 1;
        }
    }

    /// Returns the value stored under a key equal to `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        unsafe {
            let node = self.find_ge(self.head, None, key);
            if !node.is_null() && self.keys_eq(&(*node).entry.key, key) {
                Some(&(*node).entry.value)
            } else {
                None
            }
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Puts `key` into the list; an existing equal key has its value
    /// replaced.
    pub fn put(&mut self, key: K, value: V) {
        unsafe {
            let level = self.level();
            let mut update: Vec<*mut Node<K, V>> = vec![self.head; level + 1];
            let node = self.find_ge(self.head, Some(&mut update), &key);
            if !node.is_null() && self.keys_eq(&(*node).entry.key, &key) {
                (*node).entry.value = value;
                return;
            }

            let new_level = self.random_level();
            if new_level > level {
                for _ in level + 1..=new_level {
                    update.push(self.head);
                    (*self.head).forward.push(ptr::null_mut());
                }
            }

            let new_node = Node::new(Entry { key, value }, new_level);
            for i in 0..=new_level {
                (&mut (*new_node).forward)[i] = (&(*update[i]).forward)[i];
                (&mut (*update[i]).forward)[i] = new_node;
            }
            self.length += 1;
        }
    }

    /// Removes the entry equal to `key` and returns it.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        unsafe {
            let level = self.level();
            let mut update: Vec<*mut Node<K, V>> = vec![self.head; level + 1];
            let node = self.find_ge(self.head, Some(&mut update), key);
            if node.is_null() || !self.keys_eq(&(*node).entry.key, key) {
                return None;
            }

            let mut i = 0;
            while i <= self.level() && (&(*update[i]).forward)[i] == node {
                (&mut (*update[i]).forward)[i] = (&(*node).forward)[i];
                i += 1;
            }

            // Shrink the head while its top levels point nowhere.
            while self.level() > 0 && (&(*self.head).forward)[self.level()].is_null() {
                (*self.head).forward.pop();
            }

            self.length -= 1;
            let removed = *Box::from_raw(node);
            Some(removed.entry.key_value())
        }
    }

    /// First entry in key order.
    pub fn min(&self) -> Option<(&K, &V)> {
        unsafe {
            let first = (&(*self.head).forward)[0];
            if first.is_null() {
                None
            } else {
                Some((&(*first).entry.key, &(*first).entry.value))
            }
        }
    }

    /// Last entry in key order.
    pub fn max(&self) -> Option<(&K, &V)> {
        unsafe {
            let mut current = self.head;
            for i in (0..=self.level()).rev() {
                while !(&(*current).forward)[i].is_null() {
                    current = (&(*current).forward)[i];
                }
            }
            if current == self.head {
                None
            } else {
                Some((&(*current).entry.key, &(*current).entry.value))
            }
        }
    }

    /// First entry whose key is greater or equal to `key`.
    pub fn greater_or_equal(&self, key: &K) -> Option<(&K, &V)> {
        unsafe {
            let node = self.find_ge(self.head, None, key);
            if node.is_null() {
                None
            } else {
                Some((&(*node).entry.key, &(*node).entry.value))
            }
        }
    }

    /// Forward cursor over the list. `next` yields entries in key order;
    /// after a [`seek`](Iter::seek) the cursor reads through
    /// [`key`](Iter::key) and [`value`](Iter::value).
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            node: self.head,
        }
    }
}

impl<K: Default, V: Default> Drop for SkipList<K, V> {
    fn drop(&mut self) {
        unsafe {
            let mut node = self.head;
            while !node.is_null() {
                let next = (&(*node).forward)[0];
                drop(Box::from_raw(node));
                node = next;
            }
        }
    }
}

/// Iteration over the contents of a [`SkipList`].
pub struct Iter<'a, K: Default, V: Default> {
    list: &'a SkipList<K, V>,
    /// Current position; the head sentinel before the first `next`.
    node: *mut Node<K, V>,
}

impl<'a, K: Default, V: Default> Iter<'a, K, V> {
    /// Whether the cursor rests on an entry.
    pub fn valid(&self) -> bool {
        !self.node.is_null() && self.node != self.list.head
    }

    pub fn key(&self) -> Option<&'a K> {
        if self.valid() {
            unsafe { Some(&(*self.node).entry.key) }
        } else {
            None
        }
    }

    pub fn value(&self) -> Option<&'a V> {
        if self.valid() {
            unsafe { Some(&(*self.node).entry.value) }
        } else {
            None
        }
    }

    /// Moves the cursor to the first entry with key greater or equal to
    /// `key` and reports whether one exists. The cursor only moves forward;
    /// an exhausted cursor restarts from the front of the list.
    pub fn seek(&mut self, key: &K) -> bool {
        let start = if self.node.is_null() {
            self.list.head
        } else {
            self.node
        };
        self.node = unsafe { self.list.find_ge(start, None, key) };
        self.valid()
    }
}

impl<'a, K: Default, V: Default> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            if self.node.is_null() {
                return None;
            }
            self.node = (&(*self.node).forward)[0];
            if self.node.is_null() {
                None
            } else {
                Some((&(*self.node).entry.key, &(*self.node).entry.value))
            }
        }
    }
}
