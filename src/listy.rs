use std::{
    fmt::{self, Debug, Display},
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::Index,
};

/// A handle to an element of a `Listy`. Handles stay valid while other
/// elements are inserted or removed, and go dead once their own element
/// is removed (a recycled slot gets a fresh generation).
pub struct ListyElement<T>(usize, u32, PhantomData<fn() -> T>);

impl<T> ListyElement<T> {
    fn new(slot: usize, generation: u32) -> ListyElement<T> {
        ListyElement(slot, generation, PhantomData)
    }
}

impl<T> Clone for ListyElement<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ListyElement<T> {}

impl<T> PartialEq for ListyElement<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl<T> Eq for ListyElement<T> {}

impl<T> Hash for ListyElement<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
        self.1.hash(state);
    }
}

impl<T> Debug for ListyElement<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ListyElement({}@{})", self.0, self.1)
    }
}

impl<T> Display for ListyElement<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: Option<T>,
    generation: u32,
    pred: Option<usize>,
    succ: Option<usize>,
}

/// A doubly linked list stored in a slab, so that neighbours of any
/// element can be reached in O(1) from a handle.
#[derive(Clone, Debug)]
pub struct Listy<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    first: Option<usize>,
    last: Option<usize>,
    len: usize,
}

impl<T> Listy<T> {
    pub fn new() -> Listy<T> {
        Listy::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Listy<T> {
        Listy {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            first: None,
            last: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_front(&mut self, value: T) -> ListyElement<T> {
        let x = self.alloc(value);
        match self.first {
            None => {
                self.last = Some(x);
            }
            Some(fst) => {
                self.nodes[x].succ = Some(fst);
                self.nodes[fst].pred = Some(x);
            }
        }
        self.first = Some(x);
        self.handle(x)
    }

    pub fn push_back(&mut self, value: T) -> ListyElement<T> {
        let x = self.alloc(value);
        match self.last {
            None => {
                self.first = Some(x);
            }
            Some(lst) => {
                self.nodes[x].pred = Some(lst);
                self.nodes[lst].succ = Some(x);
            }
        }
        self.last = Some(x);
        self.handle(x)
    }

    /// Insert `value` immediately after the element `ptr` refers to.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is dead.
    pub fn insert_after(&mut self, ptr: &ListyElement<T>, value: T) -> ListyElement<T> {
        let w = self.live_slot(ptr);
        let y = self.nodes[w].succ;
        let x = self.alloc(value);
        self.nodes[x].pred = Some(w);
        self.nodes[x].succ = y;
        self.nodes[w].succ = Some(x);
        match y {
            None => self.last = Some(x),
            Some(y) => self.nodes[y].pred = Some(x),
        }
        self.handle(x)
    }

    pub fn get(&self, ptr: &ListyElement<T>) -> Option<&T> {
        self.slot(ptr).and_then(|x| self.nodes[x].value.as_ref())
    }

    pub fn prev(&self, ptr: &ListyElement<T>) -> Option<ListyElement<T>> {
        let x = self.slot(ptr)?;
        self.nodes[x].pred.map(|w| self.handle(w))
    }

    pub fn next(&self, ptr: &ListyElement<T>) -> Option<ListyElement<T>> {
        let x = self.slot(ptr)?;
        self.nodes[x].succ.map(|y| self.handle(y))
    }

    /// Remove the element `ptr` refers to. Removing through a dead handle
    /// is a no-op returning `None`.
    pub fn remove(&mut self, ptr: &ListyElement<T>) -> Option<T> {
        let x = self.slot(ptr)?;
        self.unlink(x)
    }

    pub fn iter(&self) -> ListyIter<'_, T> {
        ListyIter {
            list: self,
            cur: self.first,
        }
    }

    fn handle(&self, x: usize) -> ListyElement<T> {
        ListyElement::new(x, self.nodes[x].generation)
    }

    fn slot(&self, ptr: &ListyElement<T>) -> Option<usize> {
        match self.nodes.get(ptr.0) {
            Some(node) if node.generation == ptr.1 && node.value.is_some() => Some(ptr.0),
            _ => None,
        }
    }

    fn live_slot(&self, ptr: &ListyElement<T>) -> usize {
        self.slot(ptr)
            .unwrap_or_else(|| panic!("attempt to dereference dead {:?}", ptr))
    }

    fn alloc(&mut self, value: T) -> usize {
        self.len += 1;
        match self.free.pop() {
            Some(x) => {
                let node = &mut self.nodes[x];
                node.value = Some(value);
                node.pred = None;
                node.succ = None;
                x
            }
            None => {
                self.nodes.push(Node {
                    value: Some(value),
                    generation: 0,
                    pred: None,
                    succ: None,
                });
                self.nodes.len() - 1
            }
        }
    }

    fn unlink(&mut self, x: usize) -> Option<T> {
        let (w, y) = (self.nodes[x].pred, self.nodes[x].succ);
        match w {
            None => self.first = y,
            Some(w) => self.nodes[w].succ = y,
        }
        match y {
            None => self.last = w,
            Some(y) => self.nodes[y].pred = w,
        }
        let node = &mut self.nodes[x];
        node.pred = None;
        node.succ = None;
        node.generation = node.generation.wrapping_add(1);
        let res = node.value.take();
        if res.is_some() {
            self.len -= 1;
            self.free.push(x);
        }
        res
    }

    #[allow(dead_code)]
    fn sanity_check(&self) {
        let mut n = 0;
        let mut prev: Option<usize> = None;
        let mut cur = self.first;
        while let Some(x) = cur {
            assert!(self.nodes[x].value.is_some());
            assert_eq!(self.nodes[x].pred, prev);
            prev = Some(x);
            cur = self.nodes[x].succ;
            n += 1;
        }
        assert_eq!(self.last, prev);
        assert_eq!(n, self.len);
        assert_eq!(self.len + self.free.len(), self.nodes.len());
    }
}

impl<T> Default for Listy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<ListyElement<T>> for Listy<T> {
    type Output = T;

    fn index(&self, ptr: ListyElement<T>) -> &T {
        let x = self.live_slot(&ptr);
        match &self.nodes[x].value {
            Some(v) => v,
            None => unreachable!(),
        }
    }
}

pub struct ListyIter<'a, T> {
    list: &'a Listy<T>,
    cur: Option<usize>,
}

impl<'a, T> Iterator for ListyIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let x = self.cur?;
        let node = &self.list.nodes[x];
        self.cur = node.succ;
        node.value.as_ref()
    }
}
