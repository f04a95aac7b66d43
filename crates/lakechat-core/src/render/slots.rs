//! Chart instance registry keyed by timeline slot.
//!
//! A display layer that reuses slots (list virtualization, redraws) must
//! never leave two live chart instances behind one slot. The registry owns
//! every instance it creates and always releases the old one before drawing
//! into a reused slot.

use std::collections::BTreeMap;

use lakechat_types::chart::ChartSpec;
use lakechat_types::error::RenderError;
use lakechat_types::message::Message;
use tracing::debug;

use super::reply::{MessageView, view};

/// External graphing capability that turns a `ChartSpec` into a live instance.
pub trait ChartSurface {
    /// Handle to a drawn chart, returned to `release` when the slot is reused.
    type Instance;

    fn draw(&mut self, slot: usize, spec: &ChartSpec) -> Result<Self::Instance, RenderError>;

    fn release(&mut self, slot: usize, instance: Self::Instance);
}

struct LiveChart<I> {
    spec: ChartSpec,
    instance: I,
}

/// Owns at most one live chart instance per slot.
pub struct ChartSlotRegistry<S: ChartSurface> {
    surface: S,
    live: BTreeMap<usize, LiveChart<S::Instance>>,
}

impl<S: ChartSurface> ChartSlotRegistry<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            live: BTreeMap::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Draw `spec` into `slot`, releasing whatever the slot held before.
    ///
    /// If drawing fails the slot is left empty.
    pub fn attach(&mut self, slot: usize, spec: &ChartSpec) -> Result<(), RenderError> {
        self.release(slot);
        let instance = self.surface.draw(slot, spec)?;
        self.live.insert(
            slot,
            LiveChart {
                spec: spec.clone(),
                instance,
            },
        );
        debug!(slot, kind = %spec.kind, "Chart attached");
        Ok(())
    }

    /// Release the instance in `slot`, if any. Returns whether one was live.
    pub fn release(&mut self, slot: usize) -> bool {
        match self.live.remove(&slot) {
            Some(chart) => {
                self.surface.release(slot, chart.instance);
                true
            }
            None => false,
        }
    }

    /// Bring the live instances in line with a timeline.
    ///
    /// Chart messages get an instance (redrawn only if the spec changed),
    /// every other slot and every slot past the end is released. Returns the
    /// number of charts drawn.
    pub fn sync(&mut self, messages: &[Message]) -> Result<usize, RenderError> {
        let stale: Vec<usize> = self
            .live
            .keys()
            .copied()
            .filter(|&slot| {
                messages
                    .get(slot)
                    .is_none_or(|message| !view(message).is_chart())
            })
            .collect();
        for slot in stale {
            self.release(slot);
        }

        let mut drawn = 0;
        for (slot, message) in messages.iter().enumerate() {
            if let MessageView::Chart { spec, .. } = view(message) {
                let unchanged = self
                    .live
                    .get(&slot)
                    .is_some_and(|chart| &chart.spec == spec);
                if !unchanged {
                    self.attach(slot, spec)?;
                    drawn += 1;
                }
            }
        }
        Ok(drawn)
    }

    pub fn is_live(&self, slot: usize) -> bool {
        self.live.contains_key(&slot)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Release every live instance.
    pub fn clear(&mut self) {
        let slots: Vec<usize> = self.live.keys().copied().collect();
        for slot in slots {
            self.release(slot);
        }
    }
}

impl<S: ChartSurface> Drop for ChartSlotRegistry<S> {
    fn drop(&mut self) {
        self.clear();
    }
}
