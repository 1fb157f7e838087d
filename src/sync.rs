//! Field Synchronizer: owns every registered field and the process-wide pen
//! settings, and keeps presentations in step with their value slots.

use crate::codec::ImageBlob;
use crate::config::{PenConfig, PenSettings, POLL_INTERVAL};
use crate::error::{Result, SigpadError};
use crate::field::{FieldId, Presentation, SignatureField, ValueSlot};

use std::time::Duration;

pub struct FieldSynchronizer {
    fields: Vec<SignatureField>,
    pen: PenSettings,
    poll_interval: Duration,
}

impl FieldSynchronizer {
    pub fn new(pen: PenConfig) -> Self {
        Self {
            fields: Vec::new(),
            pen: PenSettings::new(pen),
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// How often the host should call [`FieldSynchronizer::poll`].
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn pen(&self) -> &PenSettings {
        &self.pen
    }

    /// Runtime pen setter. Returns the width actually applied.
    pub fn set_pen_width(&mut self, px: f64) -> f64 {
        self.pen.set_width(px)
    }

    /// Binds an explicit presentation/slot pair and applies its initial state.
    pub fn register(&mut self, presentation: Box<dyn Presentation>, slot: Box<dyn ValueSlot>) -> FieldId {
        let id = FieldId(self.fields.len());
        let field = SignatureField::new(id, presentation, slot, self.pen.config());
        log::debug!("registered field {:?} (signed: {})", id, field.is_signed());
        self.fields.push(field);
        id
    }

    pub fn field(&self, id: FieldId) -> Option<&SignatureField> {
        self.fields.get(id.0)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut SignatureField> {
        self.fields.get_mut(id.0)
    }

    pub fn fields(&self) -> impl Iterator<Item = &SignatureField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Handler for the slot's change/input signals.
    pub fn notify_changed(&mut self, id: FieldId) -> Result<bool> {
        let field = self.fields.get_mut(id.0).ok_or(SigpadError::UnknownField(id.0))?;
        let changed = field.reconcile();
        if changed {
            log::debug!("field {id:?} reconciled after change signal");
        }
        Ok(changed)
    }

    /// Fallback poll tick. Compares raw strings only; returns the fields that
    /// were reconciled.
    pub fn poll(&mut self) -> Vec<FieldId> {
        let mut changed = Vec::new();
        for field in &mut self.fields {
            if field.poll() {
                log::debug!("field {:?} changed outside the commit path", field.id());
                changed.push(field.id());
            }
        }
        changed
    }

    /// Re-reads the field's options for activation and returns the pen width
    /// the session should use. `None` if the field can no longer be opened.
    pub fn prepare_activation(&mut self, id: FieldId) -> Option<f64> {
        let global = self.pen.current();
        let config = *self.pen.config();
        let Some(field) = self.fields.get_mut(id.0) else {
            log::error!("activation for unknown field {id:?}");
            return None;
        };
        if !field.has_slot() {
            log::error!("field {id:?} lost its value slot; not opening");
            return None;
        }
        field.refresh_options(&config);
        Some(field.effective_pen_width(global))
    }

    pub fn commit(&mut self, id: FieldId, blob: ImageBlob) -> Result<()> {
        let field = self.fields.get_mut(id.0).ok_or(SigpadError::UnknownField(id.0))?;
        field.commit(blob)
    }
}

impl Default for FieldSynchronizer {
    fn default() -> Self {
        Self::new(PenConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::config::ATTR_LINE_WIDTH;
    use crate::field::Preview;
    use crate::field::fakes::{FakeRegion, FakeSlot};

    const IMG: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn register(sync: &mut FieldSynchronizer, region: &FakeRegion, slot: &FakeSlot) -> FieldId {
        sync.register(Box::new(region.clone()), Box::new(slot.clone()))
    }

    #[test]
    fn ids_follow_registration_order() {
        let mut sync = FieldSynchronizer::default();
        let a = register(&mut sync, &FakeRegion::default(), &FakeSlot::default());
        let b = register(&mut sync, &FakeRegion::default(), &FakeSlot::with_value(IMG));
        assert_eq!((a, b), (FieldId(0), FieldId(1)));
        assert!(!sync.field(a).unwrap().is_signed());
        assert!(sync.field(b).unwrap().is_signed());
        assert_eq!(sync.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn poll_reports_only_mutated_fields() {
        let mut sync = FieldSynchronizer::default();
        let slot_a = FakeSlot::default();
        let slot_b = FakeSlot::default();
        let region_b = FakeRegion::default();
        register(&mut sync, &FakeRegion::default(), &slot_a);
        let b = register(&mut sync, &region_b, &slot_b);

        assert!(sync.poll().is_empty());
        slot_b.set(IMG);
        assert_eq!(sync.poll(), vec![b]);
        assert!(matches!(region_b.0.borrow().last(), Some(Preview::Signed(_))));
        assert!(sync.poll().is_empty());
    }

    #[test]
    fn change_signal_reconciles_immediately() {
        let mut sync = FieldSynchronizer::default();
        let slot = FakeSlot::with_value(IMG);
        let id = register(&mut sync, &FakeRegion::default(), &slot);

        slot.set("");
        assert!(sync.notify_changed(id).unwrap());
        assert!(!sync.field(id).unwrap().is_signed());
        assert!(matches!(sync.notify_changed(FieldId(9)), Err(SigpadError::UnknownField(9))));
    }

    #[test]
    fn activation_width_prefers_field_override() {
        let mut sync = FieldSynchronizer::default();
        let plain = register(&mut sync, &FakeRegion::default(), &FakeSlot::default());
        let region = FakeRegion::with_attrs(&[(ATTR_LINE_WIDTH, "7")]);
        let thick = register(&mut sync, &region, &FakeSlot::default());

        sync.set_pen_width(4.0);
        assert_eq!(sync.prepare_activation(plain), Some(4.0));
        assert_eq!(sync.prepare_activation(thick), Some(7.0));
        // The override does not leak into the global width.
        assert_eq!(sync.pen().current(), 4.0);

        region.0.borrow_mut().attrs.remove(ATTR_LINE_WIDTH);
        assert_eq!(sync.prepare_activation(thick), Some(4.0));
    }

    #[test]
    fn activation_refuses_field_without_slot() {
        let mut sync = FieldSynchronizer::default();
        let id = register(&mut sync, &FakeRegion::default(), &FakeSlot::default());
        sync.field_mut(id).unwrap().detach_slot();
        assert_eq!(sync.prepare_activation(id), None);
        assert_eq!(sync.prepare_activation(FieldId(5)), None);
    }

    #[test]
    fn commit_updates_slot_without_triggering_poll() {
        let mut sync = FieldSynchronizer::default();
        let slot = FakeSlot::default();
        let id = register(&mut sync, &FakeRegion::default(), &slot);

        sync.commit(id, codec::decode(IMG).unwrap()).unwrap();
        assert_eq!(slot.get(), IMG);
        assert!(sync.poll().is_empty());
    }

    #[test]
    fn commit_into_detached_field_is_refused() {
        let mut sync = FieldSynchronizer::default();
        let id = register(&mut sync, &FakeRegion::default(), &FakeSlot::default());
        sync.field_mut(id).unwrap().detach_slot();

        assert!(matches!(
            sync.commit(id, codec::decode(IMG).unwrap()),
            Err(SigpadError::MissingSlot(0))
        ));
        assert!(!sync.field(id).unwrap().is_signed());
    }
}
