//! Handle-indexed storage for pieces and stacks.
//!
//! Backed by `im::Vector`, so cloning an arena is O(1) and a snapshot taken
//! before a move shares structure with the live board until something is
//! written.

use im::Vector;
use std::marker::PhantomData;
use std::ops::Index;

use super::piece::{Piece, PieceId};
use super::stack::{Stack, StackId};

/// A handle into an [`Arena`].
pub trait Handle: Copy {
    fn slot(self) -> usize;
}

impl Handle for PieceId {
    fn slot(self) -> usize {
        self.index()
    }
}

impl Handle for StackId {
    fn slot(self) -> usize {
        self.index()
    }
}

/// Append-only storage addressed by stable handles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arena<H, T: Clone> {
    items: Vector<T>,
    _handle: PhantomData<H>,
}

impl<H: Handle, T: Clone> Arena<H, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vector::new(),
            _handle: PhantomData,
        }
    }

    /// Append an item. Handles are assigned in insertion order.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    #[must_use]
    pub fn get(&self, handle: H) -> Option<&T> {
        self.items.get(handle.slot())
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.items.get_mut(handle.slot())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<H: Handle, T: Clone> Default for Arena<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle, T: Clone> Index<H> for Arena<H, T> {
    type Output = T;

    fn index(&self, handle: H) -> &T {
        &self.items[handle.slot()]
    }
}

/// All pieces of a game.
pub type Pieces = Arena<PieceId, Piece>;

/// All stacks of a game.
pub type Stacks = Arena<StackId, Stack>;
