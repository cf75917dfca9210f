use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Integer handle into one of the registry's indexed collections.
///
/// The type parameter only tags which collection the index belongs to, so a
/// `MaterialId` can never be passed where a `RenderId` is expected.
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

// Manually implement Clone/Copy/Eq/Hash without requiring anything of T
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

impl<T> Handle<T> {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn slot(&self) -> usize {
        self.index as usize
    }
}

pub type ShaderId = Handle<super::shader::Shader>;
pub type MaterialId = Handle<super::material::Material>;
pub type RenderId = Handle<super::render_object::RenderObject>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_copy() {
        let h1: Handle<String> = Handle::new(5);
        let h2 = h1;
        let h3 = h1;
        assert_eq!(h1.index(), h2.index());
        assert_eq!(h1.index(), h3.index());
    }

    #[test]
    fn handles_order_by_index() {
        let mut ids = vec![MaterialId::new(3), MaterialId::new(0), MaterialId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![MaterialId::new(0), MaterialId::new(2), MaterialId::new(3)]);
        assert_eq!(format!("{:?}", ids[1]), "#2");
    }
}
