use std::fmt;

use tracing::error;

use crate::family::ComponentFamily;

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-width bitset with one bit per component family.
///
/// Used both as an entity's live signature and as a system's requirement. The width is
/// chosen at configuration time and never changes afterwards. Masks are built and
/// mutated only inside this crate, with ids handed out by the family registry, so every
/// set bit lies inside the width.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ComponentMask {
    words: Box<[u64]>,
    width: usize,
}

impl ComponentMask {
    /// An all-zero mask able to hold `width` families.
    pub(crate) fn with_width(width: usize) -> Self {
        let words = vec![0u64; width.div_ceil(WORD_BITS)].into_boxed_slice();
        Self { words, width }
    }

    /// Number of families this mask can represent.
    pub fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn set(&mut self, family: ComponentFamily) {
        let bit = family.index();
        if bit >= self.width {
            error!(bit, width = self.width, "component family outside mask width");
            debug_assert!(false, "family {bit} outside mask width {}", self.width);
            return;
        }
        self.words[bit / WORD_BITS] |= 1u64 << (bit % WORD_BITS);
    }

    pub(crate) fn clear(&mut self, family: ComponentFamily) {
        let bit = family.index();
        if bit < self.width {
            self.words[bit / WORD_BITS] &= !(1u64 << (bit % WORD_BITS));
        }
    }

    pub fn contains(&self, family: ComponentFamily) -> bool {
        let bit = family.index();
        bit < self.width && self.words[bit / WORD_BITS] & (1u64 << (bit % WORD_BITS)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate the families whose bit is set, lowest first.
    pub fn families(&self) -> impl Iterator<Item = ComponentFamily> + '_ {
        (0..self.width)
            .filter(move |&bit| self.words[bit / WORD_BITS] & (1u64 << (bit % WORD_BITS)) != 0)
            .map(ComponentFamily::from_index)
    }

    /// True when every bit of `requirement` is also set here.
    pub fn matches(&self, requirement: &ComponentMask) -> bool {
        requirement.words.iter().enumerate().all(|(i, &req)| {
            let have = self.words.get(i).copied().unwrap_or(0);
            have & req == req
        })
    }

    /// True when `self` matches `requirement` but `old` did not.
    pub fn became_matching(&self, old: &ComponentMask, requirement: &ComponentMask) -> bool {
        self.matches(requirement) && !old.matches(requirement)
    }

    /// True when `old` matched `requirement` but `self` no longer does.
    pub fn became_non_matching(&self, old: &ComponentMask, requirement: &ComponentMask) -> bool {
        old.matches(requirement) && !self.matches(requirement)
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.families().map(|family| family.index()))
            .finish()
    }
}
