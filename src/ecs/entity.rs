use slotmap::{Key, new_key_type};

new_key_type! {
    /// Opaque entity handle.
    ///
    /// Packs a slot index and a generation. A handle whose entity was destroyed
    /// keeps its old generation, so every lookup through the [`Registry`]
    /// rejects it instead of aliasing whatever reuses the slot.
    ///
    /// [`Registry`]: crate::ecs::Registry
    pub struct Entity;
}

impl Entity {
    /// Slot index, reused after destruction.
    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        (self.data().as_ffi() & 0xffff_ffff) as u32
    }

    /// Slot generation, bumped every time the slot is recycled.
    #[inline]
    #[must_use]
    pub fn generation(self) -> u32 {
        (self.data().as_ffi() >> 32) as u32
    }

    /// Packed `generation << 32 | index` representation.
    #[inline]
    #[must_use]
    pub fn to_bits(self) -> u64 {
        self.data().as_ffi()
    }
}
