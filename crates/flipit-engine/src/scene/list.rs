use super::{DrawCmd, SortKey, ZIndex};

/// A single draw item: sort key + command.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub key: SortKey,
    pub cmd: DrawCmd,
}

/// Recorded draw stream for a frame.
///
/// - `push()` is O(1)
/// - paint-order iteration reuses an internal index buffer; no per-frame
///   allocation once warmed
/// - [`layers`](Self::layers) lists the distinct z values so the scene
///   renderer can paint rects, circles and text of one layer before moving to
///   the next
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
    next_order: u32,

    sorted_indices: Vec<usize>,
    sorted_dirty: bool,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded items. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
        self.next_order = 0;
        self.sorted_dirty = true;
        self.sorted_indices.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns items in insertion order.
    #[inline]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    /// Pushes a draw command with the given z-index.
    #[inline]
    pub fn push(&mut self, z: ZIndex, cmd: DrawCmd) {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);

        self.items.push(DrawItem {
            key: SortKey::new(z, order),
            cmd,
        });

        self.sorted_dirty = true;
    }

    /// Iterates items in paint order without cloning draw commands.
    pub fn iter_in_paint_order(&mut self) -> impl Iterator<Item = &DrawItem> {
        if self.sorted_dirty {
            self.rebuild_sorted_indices();
        }

        self.sorted_indices.iter().map(|&i| &self.items[i])
    }

    /// Distinct z values present in the list, back-to-front.
    pub fn layers(&mut self) -> Vec<ZIndex> {
        let mut layers: Vec<ZIndex> = self.iter_in_paint_order().map(|item| item.key.z).collect();
        layers.dedup();
        layers
    }

    fn rebuild_sorted_indices(&mut self) {
        self.sorted_indices.clear();
        self.sorted_indices.extend(0..self.items.len());

        // SortKey includes insertion order, so the sort is total and stable.
        self.sorted_indices
            .sort_by(|&a, &b| self.items[a].key.cmp(&self.items[b].key));

        self.sorted_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2};
    use crate::paint::Color;

    fn z_of(list: &mut DrawList) -> Vec<i32> {
        list.iter_in_paint_order().map(|i| i.key.z.0).collect()
    }

    #[test]
    fn paint_order_sorts_by_z_then_insertion() {
        let mut list = DrawList::new();
        list.push_solid_rect(ZIndex(2), Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        list.push_solid_circle(ZIndex(0), Vec2::new(1.0, 1.0), 1.0, Color::BLACK);
        list.push_solid_rect(ZIndex(0), Rect::new(2.0, 2.0, 1.0, 1.0), Color::BLACK);

        assert_eq!(z_of(&mut list), vec![0, 0, 2]);

        let first = list.iter_in_paint_order().next().map(|i| i.key.order);
        assert_eq!(first, Some(1));
    }

    #[test]
    fn layers_are_distinct_and_ascending() {
        let mut list = DrawList::new();
        for z in [3, 1, 3, 0, 1] {
            list.push_solid_rect(ZIndex(z), Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        }
        assert_eq!(list.layers(), vec![ZIndex(0), ZIndex(1), ZIndex(3)]);
    }

    #[test]
    fn clear_resets_items_and_order() {
        let mut list = DrawList::new();
        list.push_solid_rect(ZIndex(0), Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        list.clear();
        assert!(list.is_empty());
        assert!(list.layers().is_empty());

        list.push_solid_rect(ZIndex(0), Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        assert_eq!(list.items()[0].key.order, 0);
    }
}
