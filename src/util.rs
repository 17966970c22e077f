use core::ops::{Index, IndexMut};
use core::slice::SliceIndex;

// Marks a branch the executors can never take. Checked when prohibit-unsafe is
// enabled, assumed otherwise.
macro_rules! rs_unreachable {
    ($msg:expr) => {
        if cfg!(feature = "prohibit-unsafe") {
            unreachable!($msg)
        } else {
            unsafe { core::hint::unreachable_unchecked() }
        }
    };
}

/// Indexing which is bounds checked in debug builds, and in release builds
/// only if prohibit-unsafe is enabled.
/// The executors index the instruction arena with IPs taken from patched
/// edges, which always land inside the arena.
pub trait DebugCheckIndex<Idx>: Index<Idx> + IndexMut<Idx> {
    fn iat(&self, index: Idx) -> &Self::Output;
    fn mat(&mut self, index: Idx) -> &mut Self::Output;
}

macro_rules! impl_debug_check_index {
    ($container:ty) => {
        impl<Idx, T> DebugCheckIndex<Idx> for $container
        where
            Idx: SliceIndex<[T]> + Clone,
        {
            #[inline(always)]
            fn iat(&self, idx: Idx) -> &Self::Output {
                debug_assert!(self.get(idx.clone()).is_some(), "Index out of bounds");
                if cfg!(feature = "prohibit-unsafe") {
                    self.index(idx)
                } else {
                    unsafe { self.get_unchecked(idx) }
                }
            }

            #[inline(always)]
            fn mat(&mut self, idx: Idx) -> &mut Self::Output {
                debug_assert!(self.get(idx.clone()).is_some(), "Index out of bounds");
                if cfg!(feature = "prohibit-unsafe") {
                    self.index_mut(idx)
                } else {
                    unsafe { self.get_unchecked_mut(idx) }
                }
            }
        }
    };
}

impl_debug_check_index!(Vec<T>);
impl_debug_check_index!([T]);
