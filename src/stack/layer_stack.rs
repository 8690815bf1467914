use crate::foundation::core::LayerId;
use crate::foundation::error::{EneftyError, EneftyResult};
use crate::stack::layer::Layer;
use crate::stack::variant::{Variant, VariantSource};

/// Ordered layers, index 0 bottom-most.
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

/// One drawable entry of a [`Composition`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionEntry {
    /// Layer the entry comes from.
    pub layer: LayerId,
    /// Selected variant index within that layer.
    pub variant: usize,
    /// Where the variant's pixels live.
    pub source: VariantSource,
}

/// Value snapshot of what the stack currently shows, bottom to front.
///
/// Layers without a selection contribute nothing and are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composition {
    /// Drawable entries in compositing order.
    pub entries: Vec<CompositionEntry>,
}

/// Parts of a layer as stored in a project document.
#[derive(Clone, Debug)]
pub struct LayerParts {
    /// Display name; blank names fall back to the positional default.
    pub name: String,
    /// Variants in order.
    pub variants: Vec<Variant>,
    /// Selected index.
    pub selected: Option<usize>,
}

fn default_layer_name(position: usize) -> String {
    format!("Layer {}", position + 1)
}

impl LayerStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a whole stack from stored layers. Every layer gets a fresh id.
    pub fn from_parts(parts: Vec<LayerParts>) -> EneftyResult<Self> {
        let mut stack = Self::new();
        for (pos, p) in parts.into_iter().enumerate() {
            let id = LayerId::fresh();
            let name = if p.name.trim().is_empty() {
                default_layer_name(pos)
            } else {
                p.name
            };
            stack
                .layers
                .push(Layer::restore(id, name, p.variants, p.selected)?);
        }
        Ok(stack)
    }

    fn layer_mut(&mut self, index: usize) -> EneftyResult<&mut Layer> {
        let len = self.layers.len();
        self.layers.get_mut(index).ok_or_else(|| {
            EneftyError::validation(format!("layer index {index} out of range ({len} layers)"))
        })
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Return `true` when the stack has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers bottom to front.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer at a stack position.
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Look a layer up by identity.
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    /// Current stack position of a layer.
    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    /// Append an empty layer named after its position.
    pub fn add_layer(&mut self) -> LayerId {
        let id = LayerId::fresh();
        let name = default_layer_name(self.layers.len());
        self.layers.push(Layer::new(id, name));
        id
    }

    /// Remove the layer at `index`.
    pub fn remove_layer(&mut self, index: usize) -> EneftyResult<Layer> {
        self.layer_mut(index)?;
        Ok(self.layers.remove(index))
    }

    /// Replace the order wholesale. `new_order[i]` is the current position of the layer that
    /// should end up at position `i`; it must be a permutation of `0..len`.
    pub fn reorder(&mut self, new_order: &[usize]) -> EneftyResult<()> {
        if new_order.len() != self.layers.len() {
            return Err(EneftyError::validation(format!(
                "reorder expects {} positions, got {}",
                self.layers.len(),
                new_order.len()
            )));
        }
        let mut seen = vec![false; self.layers.len()];
        for &i in new_order {
            match seen.get_mut(i) {
                Some(s) if !*s => *s = true,
                Some(_) => {
                    return Err(EneftyError::validation(format!(
                        "reorder lists position {i} twice"
                    )));
                }
                None => {
                    return Err(EneftyError::validation(format!(
                        "reorder position {i} out of range"
                    )));
                }
            }
        }

        let mut old: Vec<Option<Layer>> = std::mem::take(&mut self.layers)
            .into_iter()
            .map(Some)
            .collect();
        self.layers = new_order
            .iter()
            .filter_map(|&i| old[i].take())
            .collect();
        Ok(())
    }

    /// Swap the layer at `index` with its neighbour `delta` positions away.
    ///
    /// Returns `false` (and changes nothing) when the target position is outside the stack.
    pub fn move_layer(&mut self, index: usize, delta: isize) -> bool {
        let Some(target) = index.checked_add_signed(delta) else {
            return false;
        };
        if index >= self.layers.len() || target >= self.layers.len() {
            return false;
        }
        self.layers.swap(index, target);
        true
    }

    /// Rename a layer. A blank name resets it to the positional default.
    pub fn rename_layer(&mut self, index: usize, name: &str) -> EneftyResult<()> {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            default_layer_name(index)
        } else {
            trimmed.to_string()
        };
        self.layer_mut(index)?.set_name(name);
        Ok(())
    }

    /// Select a variant on the layer at `layer_index`, or clear the selection with `None`.
    pub fn set_selection(&mut self, layer_index: usize, variant: Option<usize>) -> EneftyResult<()> {
        self.layer_mut(layer_index)?.set_selected(variant)
    }

    /// Select a variant on a layer addressed by identity.
    ///
    /// Fails when the layer is no longer in the stack or the index is out of range.
    pub fn select_by_id(&mut self, id: LayerId, variant: usize) -> EneftyResult<()> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or_else(|| EneftyError::validation(format!("{id} is no longer in the stack")))?;
        layer.set_selected(Some(variant))
    }

    /// Append a variant to a layer, returning its index.
    pub fn add_variant(&mut self, layer_index: usize, variant: Variant) -> EneftyResult<usize> {
        Ok(self.layer_mut(layer_index)?.push_variant(variant))
    }

    /// Remove a variant from a layer, adjusting the selection.
    pub fn remove_variant(
        &mut self,
        layer_index: usize,
        variant_index: usize,
    ) -> EneftyResult<Variant> {
        self.layer_mut(layer_index)?.remove_variant(variant_index)
    }

    /// Variant count of every layer, bottom to front.
    pub fn variant_counts(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::variant_count).collect()
    }

    /// Layers that can take part in bulk generation (at least one variant), with their counts.
    pub fn participating(&self) -> Vec<(LayerId, usize)> {
        self.layers
            .iter()
            .filter(|l| l.variant_count() > 0)
            .map(|l| (l.id(), l.variant_count()))
            .collect()
    }

    /// Snapshot the currently selected variants in compositing order.
    pub fn composition(&self) -> Composition {
        let entries = self
            .layers
            .iter()
            .filter_map(|l| {
                let variant = l.selected()?;
                let v = l.variants().get(variant)?;
                Some(CompositionEntry {
                    layer: l.id(),
                    variant,
                    source: v.source().clone(),
                })
            })
            .collect();
        Composition { entries }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stack/layer_stack.rs"]
mod tests;
