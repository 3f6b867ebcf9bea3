//! Generic doubly-linked list
//!
//! This crate provides the ordered sequence container used by forkcase suites
//! to hold their registered test cases. Nodes are heap allocated and linked in
//! both directions, so both ends support O(1) insertion and removal.
//!
//! Positional access (`get`, `pop_at`) is one-based, counted from the front.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::boxed::Box;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

use static_assertions::assert_impl_all;

/// A single list node.
struct Node<T> {
    next: Option<NonNull<Node<T>>>,
    prev: Option<NonNull<Node<T>>>,
    item: T,
}

impl<T> Node<T> {
    fn boxed(item: T) -> NonNull<Node<T>> {
        let node = Box::new(Node {
            next: None,
            prev: None,
            item,
        });
        NonNull::from(Box::leak(node))
    }
}

/// Owning doubly-linked list.
///
/// Items are stored front to back. `push_back` appends after the last item,
/// `push_front` inserts before the first one.
pub struct List<T> {
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
    marker: PhantomData<Box<Node<T>>>,
}

// Safety: the list owns its nodes exclusively; sending or sharing the list
// is equivalent to sending or sharing the items it contains.
unsafe impl<T: Send> Send for List<T> {}
unsafe impl<T: Sync> Sync for List<T> {}

assert_impl_all!(List<u32>: Send, Sync, Default);

impl<T> List<T> {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            marker: PhantomData,
        }
    }

    /// Number of items in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert an item before the current first item.
    pub fn push_front(&mut self, item: T) {
        let node = Node::boxed(item);
        // Safety: `node` was just allocated and is not linked anywhere;
        // `self.head`, when present, is a live node owned by this list.
        unsafe {
            (*node.as_ptr()).next = self.head;
            match self.head {
                Some(head) => (*head.as_ptr()).prev = Some(node),
                None => self.tail = Some(node),
            }
        }
        self.head = Some(node);
        self.len += 1;
    }

    /// Append an item after the current last item.
    pub fn push_back(&mut self, item: T) {
        let node = Node::boxed(item);
        // Safety: see `push_front`.
        unsafe {
            (*node.as_ptr()).prev = self.tail;
            match self.tail {
                Some(tail) => (*tail.as_ptr()).next = Some(node),
                None => self.head = Some(node),
            }
        }
        self.tail = Some(node);
        self.len += 1;
    }

    /// Remove and return the first item, or `None` if the list is empty.
    pub fn try_pop_front(&mut self) -> Option<T> {
        self.head.map(|node| {
            // Safety: `node` is the live head of this list.
            unsafe { self.unlink(node) }
        })
    }

    /// Remove and return the last item, or `None` if the list is empty.
    pub fn try_pop_back(&mut self) -> Option<T> {
        self.tail.map(|node| {
            // Safety: `node` is the live tail of this list.
            unsafe { self.unlink(node) }
        })
    }

    /// Remove and return the first item.
    ///
    /// # Panics
    /// Panics if the list is empty.
    pub fn pop_front(&mut self) -> T {
        match self.try_pop_front() {
            Some(item) => item,
            None => panic!("pop_front: trying to pop from empty list"),
        }
    }

    /// Remove and return the last item.
    ///
    /// # Panics
    /// Panics if the list is empty.
    pub fn pop_back(&mut self) -> T {
        match self.try_pop_back() {
            Some(item) => item,
            None => panic!("pop_back: trying to pop from empty list"),
        }
    }

    /// First item, if any.
    pub fn front(&self) -> Option<&T> {
        // Safety: `head` is a live node owned by this list.
        self.head.map(|node| unsafe { &(*node.as_ptr()).item })
    }

    /// Last item, if any.
    pub fn back(&self) -> Option<&T> {
        // Safety: `tail` is a live node owned by this list.
        self.tail.map(|node| unsafe { &(*node.as_ptr()).item })
    }

    /// Item at one-based position `pos`, or `None` when out of range.
    pub fn try_get(&self, pos: usize) -> Option<&T> {
        // Safety: `node_at` only returns live nodes owned by this list.
        self.node_at(pos).map(|node| unsafe { &(*node.as_ptr()).item })
    }

    /// Item at one-based position `pos`.
    ///
    /// # Panics
    /// Panics if `pos` is 0 or greater than the list length.
    pub fn get(&self, pos: usize) -> &T {
        match self.try_get(pos) {
            Some(item) => item,
            None => panic!("get: index {} out of bounds (len {})", pos, self.len),
        }
    }

    /// Remove and return the item at one-based position `pos`.
    ///
    /// # Panics
    /// Panics if `pos` is 0 or greater than the list length.
    pub fn pop_at(&mut self, pos: usize) -> T {
        match self.node_at(pos) {
            // Safety: `node_at` only returns live nodes owned by this list.
            Some(node) => unsafe { self.unlink(node) },
            None => panic!("pop_at: index {} out of bounds (len {})", pos, self.len),
        }
    }

    /// Iterate from front to back.
    ///
    /// Every call returns a fresh iterator; it yields exactly `len()` items
    /// and then `None`.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            head: self.head,
            tail: self.tail,
            remaining: self.len,
            marker: PhantomData,
        }
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        while self.try_pop_front().is_some() {}
    }

    /// Replace the contents of this list with a copy of `from`, in order.
    pub fn copy_from(&mut self, from: &List<T>)
    where
        T: Clone,
    {
        self.clear();
        self.append(from);
    }

    /// Push a copy of every item of `from` to the back of this list, in order.
    pub fn append(&mut self, from: &List<T>)
    where
        T: Clone,
    {
        for item in from.iter() {
            self.push_back(item.clone());
        }
    }

    /// Locate the node at one-based `pos`, walking from the nearer end.
    fn node_at(&self, pos: usize) -> Option<NonNull<Node<T>>> {
        if pos < 1 || pos > self.len {
            return None;
        }

        // Safety: every `next`/`prev` link followed below stays within the
        // `len` live nodes of this list because `pos` was bounds checked.
        unsafe {
            if pos <= self.len / 2 + 1 {
                let mut node = self.head?;
                for _ in 1..pos {
                    node = (*node.as_ptr()).next?;
                }
                Some(node)
            } else {
                let mut node = self.tail?;
                for _ in pos..self.len {
                    node = (*node.as_ptr()).prev?;
                }
                Some(node)
            }
        }
    }

    /// Detach `node` from the list, free it and return its item.
    ///
    /// # Safety
    /// `node` must be a live node owned by this list.
    unsafe fn unlink(&mut self, node: NonNull<Node<T>>) -> T {
        let boxed = Box::from_raw(node.as_ptr());
        match boxed.prev {
            Some(prev) => (*prev.as_ptr()).next = boxed.next,
            None => self.head = boxed.next,
        }
        match boxed.next {
            Some(next) => (*next.as_ptr()).prev = boxed.prev,
            None => self.tail = boxed.prev,
        }
        self.len -= 1;
        boxed.item
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = List::new();
        list.extend(iter);
        list
    }
}

/// Borrowing front-to-back iterator over a [`List`].
pub struct Iter<'a, T> {
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    remaining: usize,
    marker: PhantomData<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.head.map(|node| {
            // Safety: the borrow of the list keeps every node alive for 'a.
            let node = unsafe { &*node.as_ptr() };
            self.remaining -= 1;
            self.head = node.next;
            &node.item
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.tail.map(|node| {
            // Safety: see `next`.
            let node = unsafe { &*node.as_ptr() };
            self.remaining -= 1;
            self.tail = node.prev;
            &node.item
        })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

/// Owning iterator over a [`List`].
pub struct IntoIter<T> {
    list: List<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.try_pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len, Some(self.list.len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.list.try_pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { list: self }
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
