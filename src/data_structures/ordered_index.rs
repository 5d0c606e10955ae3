//! Balanced ordered index used by the bucket queue to locate D1 blocks.
//!
//! A classic red-black tree kept in a growable arena of nodes addressed by
//! integer index (slot 0 is the NIL sentinel), so parent/child links never
//! form ownership cycles. Keys are the per-block upper bounds; values are
//! block handles.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    left: usize,
    right: usize,
    parent: usize,
    color: Color,
}

/// A balanced ordered map over `Copy` keys supporting exact, predecessor
/// (`floor`), and successor (`ceiling`) lookups in O(log n).
#[derive(Debug, Clone)]
pub struct OrderedIndex<K, V> {
    /// Node arena; index 0 is the NIL sentinel once allocated.
    nodes: Vec<Node<K, V>>,
    /// Free node slots available for reuse.
    free: Vec<usize>,
    root: usize,
    len: usize,
}

const NIL: usize = 0;

impl<K, V> OrderedIndex<K, V>
where
    K: Ord + Copy,
    V: Copy,
{
    pub fn new() -> Self {
        OrderedIndex {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn alloc(&mut self, key: K, value: V) -> usize {
        if self.nodes.is_empty() {
            // The sentinel borrows the first key/value; it is never compared
            // or returned, only used as a black leaf/parent placeholder.
            self.nodes.push(Node {
                key,
                value,
                left: NIL,
                right: NIL,
                parent: NIL,
                color: Color::Black,
            });
        }
        let node = Node {
            key,
            value,
            left: NIL,
            right: NIL,
            parent: NIL,
            color: Color::Red,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn locate(&self, key: &K) -> usize {
        let mut x = self.root;
        while x != NIL {
            match key.cmp(&self.nodes[x].key) {
                std::cmp::Ordering::Less => x = self.nodes[x].left,
                std::cmp::Ordering::Greater => x = self.nodes[x].right,
                std::cmp::Ordering::Equal => return x,
            }
        }
        NIL
    }

    /// Exact lookup.
    pub fn get(&self, key: &K) -> Option<V> {
        let x = self.locate(key);
        if x == NIL {
            None
        } else {
            Some(self.nodes[x].value)
        }
    }

    /// Greatest entry with key ≤ `key` (predecessor query).
    pub fn floor(&self, key: &K) -> Option<(K, V)> {
        let mut x = self.root;
        let mut best = NIL;
        while x != NIL {
            if self.nodes[x].key <= *key {
                best = x;
                x = self.nodes[x].right;
            } else {
                x = self.nodes[x].left;
            }
        }
        if best == NIL {
            None
        } else {
            Some((self.nodes[best].key, self.nodes[best].value))
        }
    }

    /// Smallest entry with key ≥ `key` (successor query).
    pub fn ceiling(&self, key: &K) -> Option<(K, V)> {
        let mut x = self.root;
        let mut best = NIL;
        while x != NIL {
            if self.nodes[x].key >= *key {
                best = x;
                x = self.nodes[x].left;
            } else {
                x = self.nodes[x].right;
            }
        }
        if best == NIL {
            None
        } else {
            Some((self.nodes[best].key, self.nodes[best].value))
        }
    }

    /// Entry with the smallest key.
    pub fn min(&self) -> Option<(K, V)> {
        if self.root == NIL {
            return None;
        }
        let m = self.subtree_min(self.root);
        Some((self.nodes[m].key, self.nodes[m].value))
    }

    fn subtree_min(&self, mut x: usize) -> usize {
        while self.nodes[x].left != NIL {
            x = self.nodes[x].left;
        }
        x
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.nodes[x].right;
        self.nodes[x].right = self.nodes[y].left;
        if self.nodes[y].left != NIL {
            let yl = self.nodes[y].left;
            self.nodes[yl].parent = x;
        }
        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.nodes[xp].left == x {
            self.nodes[xp].left = y;
        } else {
            self.nodes[xp].right = y;
        }
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.nodes[x].left;
        self.nodes[x].left = self.nodes[y].right;
        if self.nodes[y].right != NIL {
            let yr = self.nodes[y].right;
            self.nodes[yr].parent = x;
        }
        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.nodes[xp].right == x {
            self.nodes[xp].right = y;
        } else {
            self.nodes[xp].left = y;
        }
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    /// Inserts a key/value pair. If the key is already present its value is
    /// replaced and the old value returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut y = NIL;
        let mut x = self.root;
        while x != NIL {
            y = x;
            match key.cmp(&self.nodes[x].key) {
                std::cmp::Ordering::Less => x = self.nodes[x].left,
                std::cmp::Ordering::Greater => x = self.nodes[x].right,
                std::cmp::Ordering::Equal => {
                    let old = self.nodes[x].value;
                    self.nodes[x].value = value;
                    return Some(old);
                }
            }
        }
        let z = self.alloc(key, value);
        self.nodes[z].parent = y;
        if y == NIL {
            self.root = z;
        } else if key < self.nodes[y].key {
            self.nodes[y].left = z;
        } else {
            self.nodes[y].right = z;
        }
        self.insert_fixup(z);
        self.len += 1;
        None
    }

    fn insert_fixup(&mut self, mut z: usize) {
        while self.nodes[self.nodes[z].parent].color == Color::Red {
            let p = self.nodes[z].parent;
            let g = self.nodes[p].parent;
            if p == self.nodes[g].left {
                let uncle = self.nodes[g].right;
                if self.nodes[uncle].color == Color::Red {
                    self.nodes[p].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    z = g;
                } else {
                    if z == self.nodes[p].right {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.nodes[z].parent;
                    let g = self.nodes[p].parent;
                    self.nodes[p].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.nodes[g].left;
                if self.nodes[uncle].color == Color::Red {
                    self.nodes[p].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    z = g;
                } else {
                    if z == self.nodes[p].left {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.nodes[z].parent;
                    let g = self.nodes[p].parent;
                    self.nodes[p].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    self.rotate_left(g);
                }
            }
            if z == self.root {
                break;
            }
        }
        let root = self.root;
        self.nodes[root].color = Color::Black;
    }

    fn transplant(&mut self, u: usize, v: usize) {
        let up = self.nodes[u].parent;
        if up == NIL {
            self.root = v;
        } else if u == self.nodes[up].left {
            self.nodes[up].left = v;
        } else {
            self.nodes[up].right = v;
        }
        // The sentinel's parent is deliberately updated too; delete_fixup
        // walks through it.
        self.nodes[v].parent = up;
    }

    /// Removes the entry with this key, returning its value if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let z = self.locate(key);
        if z == NIL {
            return None;
        }
        let removed = self.nodes[z].value;

        let mut y = z;
        let mut y_color = self.nodes[y].color;
        let x;
        if self.nodes[z].left == NIL {
            x = self.nodes[z].right;
            self.transplant(z, x);
        } else if self.nodes[z].right == NIL {
            x = self.nodes[z].left;
            self.transplant(z, x);
        } else {
            y = self.subtree_min(self.nodes[z].right);
            y_color = self.nodes[y].color;
            x = self.nodes[y].right;
            if self.nodes[y].parent == z {
                self.nodes[x].parent = y;
            } else {
                self.transplant(y, x);
                let zr = self.nodes[z].right;
                self.nodes[y].right = zr;
                self.nodes[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.nodes[z].left;
            self.nodes[y].left = zl;
            self.nodes[zl].parent = y;
            self.nodes[y].color = self.nodes[z].color;
        }
        if y_color == Color::Black {
            self.delete_fixup(x);
        }
        self.free.push(z);
        self.len -= 1;
        Some(removed)
    }

    fn delete_fixup(&mut self, mut x: usize) {
        while x != self.root && self.nodes[x].color == Color::Black {
            let p = self.nodes[x].parent;
            if x == self.nodes[p].left {
                let mut w = self.nodes[p].right;
                if self.nodes[w].color == Color::Red {
                    self.nodes[w].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_left(p);
                    w = self.nodes[self.nodes[x].parent].right;
                }
                let wl = self.nodes[w].left;
                let wr = self.nodes[w].right;
                if self.nodes[wl].color == Color::Black && self.nodes[wr].color == Color::Black {
                    self.nodes[w].color = Color::Red;
                    x = self.nodes[x].parent;
                } else {
                    if self.nodes[wr].color == Color::Black {
                        self.nodes[wl].color = Color::Black;
                        self.nodes[w].color = Color::Red;
                        self.rotate_right(w);
                        w = self.nodes[self.nodes[x].parent].right;
                    }
                    let p = self.nodes[x].parent;
                    self.nodes[w].color = self.nodes[p].color;
                    self.nodes[p].color = Color::Black;
                    let wr = self.nodes[w].right;
                    self.nodes[wr].color = Color::Black;
                    self.rotate_left(p);
                    x = self.root;
                }
            } else {
                let mut w = self.nodes[p].left;
                if self.nodes[w].color == Color::Red {
                    self.nodes[w].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_right(p);
                    w = self.nodes[self.nodes[x].parent].left;
                }
                let wl = self.nodes[w].left;
                let wr = self.nodes[w].right;
                if self.nodes[wr].color == Color::Black && self.nodes[wl].color == Color::Black {
                    self.nodes[w].color = Color::Red;
                    x = self.nodes[x].parent;
                } else {
                    if self.nodes[wl].color == Color::Black {
                        self.nodes[wr].color = Color::Black;
                        self.nodes[w].color = Color::Red;
                        self.rotate_left(w);
                        w = self.nodes[self.nodes[x].parent].left;
                    }
                    let p = self.nodes[x].parent;
                    self.nodes[w].color = self.nodes[p].color;
                    self.nodes[p].color = Color::Black;
                    let wl = self.nodes[w].left;
                    self.nodes[wl].color = Color::Black;
                    self.rotate_right(p);
                    x = self.root;
                }
            }
        }
        self.nodes[x].color = Color::Black;
    }
}

impl<K, V> Default for OrderedIndex<K, V>
where
    K: Ord + Copy,
    V: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}
