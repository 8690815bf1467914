use crate::foundation::core::LayerId;
use crate::foundation::error::{EneftyError, EneftyResult};
use crate::stack::variant::Variant;

/// One member of the layer stack: a named list of alternative images plus the current pick.
///
/// Invariant: `selected`, when set, is a valid index into `variants`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    id: LayerId,
    name: String,
    variants: Vec<Variant>,
    selected: Option<usize>,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: String) -> Self {
        Self {
            id,
            name,
            variants: Vec::new(),
            selected: None,
        }
    }

    /// Rebuild a layer from persisted parts, checking the selection invariant.
    pub(crate) fn restore(
        id: LayerId,
        name: String,
        variants: Vec<Variant>,
        selected: Option<usize>,
    ) -> EneftyResult<Self> {
        let mut layer = Self::new(id, name);
        layer.variants = variants;
        layer.set_selected(selected)?;
        Ok(layer)
    }

    /// Stable identity.
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variants in insertion order.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Number of variants.
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Selected variant index, `None` when the layer draws nothing.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The selected variant, if any.
    pub fn selected_variant(&self) -> Option<&Variant> {
        self.selected.and_then(|i| self.variants.get(i))
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_selected(&mut self, selected: Option<usize>) -> EneftyResult<()> {
        if let Some(i) = selected
            && i >= self.variants.len()
        {
            return Err(EneftyError::validation(format!(
                "variant index {i} out of range for '{}' ({} variants)",
                self.name,
                self.variants.len()
            )));
        }
        self.selected = selected;
        Ok(())
    }

    /// Append a variant; the first variant of an unselected layer becomes the selection.
    pub(crate) fn push_variant(&mut self, variant: Variant) -> usize {
        self.variants.push(variant);
        if self.selected.is_none() && self.variants.len() == 1 {
            self.selected = Some(0);
        }
        self.variants.len() - 1
    }

    /// Remove a variant and keep the selection pointing at the same logical variant.
    ///
    /// Removing the selected variant falls back to index 0 (or `None` once empty).
    pub(crate) fn remove_variant(&mut self, index: usize) -> EneftyResult<Variant> {
        if index >= self.variants.len() {
            return Err(EneftyError::validation(format!(
                "variant index {index} out of range for '{}' ({} variants)",
                self.name,
                self.variants.len()
            )));
        }
        let removed = self.variants.remove(index);
        self.selected = match self.selected {
            Some(sel) if sel == index => {
                if self.variants.is_empty() {
                    None
                } else {
                    Some(0)
                }
            }
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };
        Ok(removed)
    }
}
