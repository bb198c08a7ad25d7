//! Registry mapping tile identifiers to the visuals they are drawn with.

use std::collections::HashMap;

use hexmap_core::{AnimationRef, HexShape, ImageRef, TileAttribute, TileId};
use tracing::debug;

use crate::GridError;

/// Identifier allocated to a binding by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u32);

impl BindingId {
    /// Numeric value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// What a binding draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingVisual {
    /// A static packed image.
    Image(ImageRef),
    /// An animation whose current frame is drawn every frame.
    Animation(AnimationRef),
}

/// Renderable definition associated with a tile identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileBinding {
    id: BindingId,
    tile_id: TileId,
    visual: BindingVisual,
    attribute: Option<TileAttribute>,
}

impl TileBinding {
    /// Identifier allocated by the registry.
    #[must_use]
    pub const fn id(&self) -> BindingId {
        self.id
    }

    /// Tile identifier the binding resolves.
    #[must_use]
    pub const fn tile_id(&self) -> TileId {
        self.tile_id
    }

    /// Visual drawn for cells holding the tile identifier.
    #[must_use]
    pub const fn visual(&self) -> BindingVisual {
        self.visual
    }

    /// Static image, when the binding is not animated.
    #[must_use]
    pub const fn image(&self) -> Option<ImageRef> {
        match self.visual {
            BindingVisual::Image(image) => Some(image),
            BindingVisual::Animation(_) => None,
        }
    }

    /// Animation, when the binding is animated.
    #[must_use]
    pub const fn animation(&self) -> Option<AnimationRef> {
        match self.visual {
            BindingVisual::Animation(animation) => Some(animation),
            BindingVisual::Image(_) => None,
        }
    }

    /// Attribute tag supplied when the binding was created.
    #[must_use]
    pub const fn attribute(&self) -> Option<TileAttribute> {
        self.attribute
    }
}

/// Cache key for generated hexagon outlines.
///
/// Two shapes share an outline whenever their five dimensions agree; the
/// origin does not matter because outlines are drawn relative to each cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct OutlineKey {
    width: i32,
    height: i32,
    start_width: i32,
    mid_height: i32,
    end_height: i32,
}

impl OutlineKey {
    fn of(shape: &HexShape) -> Self {
        Self {
            width: shape.width(),
            height: shape.height(),
            start_width: shape.start_width(),
            mid_height: shape.mid_height(),
            end_height: shape.end_height(),
        }
    }
}

/// Append-mostly registry of tile bindings owned by a grid.
///
/// Bindings can only be added while the registry is active. Closing the
/// registry drops every binding and hands back the outline images it cached
/// so the owner can release them.
#[derive(Debug)]
pub struct TileBindingRegistry {
    active: bool,
    bindings: Vec<TileBinding>,
    animations: Vec<AnimationRef>,
    playing: bool,
    next_id: u32,
    generation: u64,
    outlines: HashMap<OutlineKey, ImageRef>,
}

impl TileBindingRegistry {
    /// Creates an empty, active registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: true,
            bindings: Vec::new(),
            animations: Vec::new(),
            playing: false,
            next_id: 0,
            generation: 0,
            outlines: HashMap::new(),
        }
    }

    /// Binds `tile_id` to a static image.
    ///
    /// A previous binding for the same identifier is replaced.
    pub fn put_tile(
        &mut self,
        tile_id: TileId,
        image: ImageRef,
        attribute: Option<TileAttribute>,
    ) -> Result<BindingId, GridError> {
        self.insert(tile_id, BindingVisual::Image(image), attribute)
    }

    /// Binds `tile_id` to an animation.
    ///
    /// A previous binding for the same identifier is replaced.
    pub fn put_animation_tile(
        &mut self,
        tile_id: TileId,
        animation: AnimationRef,
        attribute: Option<TileAttribute>,
    ) -> Result<BindingId, GridError> {
        self.insert(tile_id, BindingVisual::Animation(animation), attribute)
    }

    /// Binds every identifier to the image of the same number.
    pub fn register_identity<I>(&mut self, ids: I) -> Result<(), GridError>
    where
        I: IntoIterator<Item = u32>,
    {
        for id in ids {
            let _ = self.put_tile(TileId::new(id), ImageRef::new(id), None)?;
        }
        Ok(())
    }

    /// Binding that draws cells holding `tile_id`, if any.
    #[must_use]
    pub fn binding_for(&self, tile_id: TileId) -> Option<&TileBinding> {
        self.bindings
            .iter()
            .find(|binding| binding.tile_id == tile_id)
    }

    /// Removes the binding for `tile_id`, returning it if it existed.
    pub fn remove_binding(&mut self, tile_id: TileId) -> Option<TileBinding> {
        let position = self
            .bindings
            .iter()
            .position(|binding| binding.tile_id == tile_id)?;
        let removed = self.bindings.remove(position);
        self.forget_animation(&removed);
        self.generation = self.generation.wrapping_add(1);
        debug!(tile_id = tile_id.get(), "removed tile binding");
        Some(removed)
    }

    /// Reports whether any animated binding remains registered.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.playing
    }

    /// Animations currently registered through bindings.
    #[must_use]
    pub fn active_animations(&self) -> &[AnimationRef] {
        &self.animations
    }

    /// Iterator over the registered bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TileBinding> {
        self.bindings.iter()
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Reports whether no binding is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether new bindings may still be added.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Counter bumped whenever a binding is added or removed.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Outline image for cells of `shape`, generated on first use.
    ///
    /// Returns `None` once the registry has been closed.
    pub fn outline_for<F>(&mut self, shape: &HexShape, create: F) -> Option<ImageRef>
    where
        F: FnOnce(&HexShape) -> ImageRef,
    {
        if !self.active {
            return None;
        }
        let key = OutlineKey::of(shape);
        Some(*self.outlines.entry(key).or_insert_with(|| create(shape)))
    }

    /// Deactivates the registry, dropping all bindings.
    ///
    /// Returns the cached outline images so the owner can release them.
    pub fn close(&mut self) -> Vec<ImageRef> {
        if !self.active {
            return Vec::new();
        }
        self.active = false;
        self.playing = false;
        self.animations.clear();
        self.bindings.clear();
        self.generation = self.generation.wrapping_add(1);
        let mut released: Vec<ImageRef> = self.outlines.drain().map(|(_, image)| image).collect();
        released.sort();
        debug!(released = released.len(), "closed tile binding registry");
        released
    }

    fn insert(
        &mut self,
        tile_id: TileId,
        visual: BindingVisual,
        attribute: Option<TileAttribute>,
    ) -> Result<BindingId, GridError> {
        if !self.active {
            return Err(GridError::InactiveRegistry);
        }

        let id = BindingId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let binding = TileBinding {
            id,
            tile_id,
            visual,
            attribute,
        };

        if let BindingVisual::Animation(animation) = visual {
            self.animations.push(animation);
            self.playing = true;
        }

        match self
            .bindings
            .iter()
            .position(|existing| existing.tile_id == tile_id)
        {
            Some(position) => {
                let replaced = std::mem::replace(&mut self.bindings[position], binding);
                self.forget_animation(&replaced);
            }
            None => self.bindings.push(binding),
        }

        self.generation = self.generation.wrapping_add(1);
        debug!(tile_id = tile_id.get(), binding = id.get(), "registered tile binding");
        Ok(id)
    }

    fn forget_animation(&mut self, binding: &TileBinding) {
        if let Some(animation) = binding.animation() {
            if let Some(position) = self.animations.iter().position(|entry| *entry == animation) {
                let _ = self.animations.remove(position);
            }
        }
        if self.animations.is_empty() {
            self.playing = false;
        }
    }
}

impl Default for TileBindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
