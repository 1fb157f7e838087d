//! Adjacency-based pairing, layered over [`FieldSynchronizer::register`].
//!
//! A host that lays out its form as "presentation region followed by a marked
//! value holder" can hand every region and its next sibling to [`discover`]
//! instead of registering pairs itself.

use crate::field::{FieldId, Presentation, ValueSlot};
use crate::sync::FieldSynchronizer;

/// Class a value holder carries to be paired with the region before it.
pub const VALUE_MARKER: &str = "sigpad_output";

/// The element following a presentation region.
pub trait Sibling {
    fn has_marker(&self, marker: &str) -> bool;
    fn into_slot(self: Box<Self>) -> Box<dyn ValueSlot>;
}

pub struct Candidate {
    pub presentation: Box<dyn Presentation>,
    pub next_sibling: Option<Box<dyn Sibling>>,
}

impl Candidate {
    pub fn new(presentation: Box<dyn Presentation>, next_sibling: Option<Box<dyn Sibling>>) -> Self {
        Self {
            presentation,
            next_sibling,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Discovered {
    pub registered: Vec<FieldId>,
    /// Positions (in candidate order) of regions left inert.
    pub skipped: Vec<usize>,
}

/// Registers every candidate whose next sibling carries `marker`. Mis-paired
/// regions are logged and skipped; the rest of the page is unaffected.
pub fn discover<I>(sync: &mut FieldSynchronizer, candidates: I, marker: &str) -> Discovered
where
    I: IntoIterator<Item = Candidate>,
{
    let mut out = Discovered::default();
    for (index, candidate) in candidates.into_iter().enumerate() {
        match candidate.next_sibling {
            Some(sibling) if sibling.has_marker(marker) => {
                let id = sync.register(candidate.presentation, sibling.into_slot());
                out.registered.push(id);
            }
            Some(_) => {
                log::warn!("signature region #{index}: next sibling is not marked {marker:?}; skipped");
                out.skipped.push(index);
            }
            None => {
                log::warn!("signature region #{index} has no value holder; skipped");
                out.skipped.push(index);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fakes::{FakeRegion, FakeSlot};

    struct FakeSibling {
        classes: Vec<&'static str>,
        slot: FakeSlot,
    }

    impl Sibling for FakeSibling {
        fn has_marker(&self, marker: &str) -> bool {
            self.classes.iter().any(|c| *c == marker)
        }

        fn into_slot(self: Box<Self>) -> Box<dyn ValueSlot> {
            Box::new(self.slot)
        }
    }

    fn candidate(sibling: Option<Vec<&'static str>>) -> Candidate {
        Candidate::new(
            Box::new(FakeRegion::default()),
            sibling.map(|classes| {
                Box::new(FakeSibling {
                    classes,
                    slot: FakeSlot::default(),
                }) as Box<dyn Sibling>
            }),
        )
    }

    #[test]
    fn pairs_marked_siblings_and_skips_the_rest() {
        let mut sync = FieldSynchronizer::default();
        let found = discover(
            &mut sync,
            vec![
                candidate(Some(vec!["form-control", VALUE_MARKER])),
                candidate(Some(vec!["form-control"])),
                candidate(None),
                candidate(Some(vec![VALUE_MARKER])),
            ],
            VALUE_MARKER,
        );
        assert_eq!(found.registered, vec![FieldId(0), FieldId(1)]);
        assert_eq!(found.skipped, vec![1, 2]);
        assert_eq!(sync.len(), 2);
    }

    #[test]
    fn custom_marker_is_honoured() {
        let mut sync = FieldSynchronizer::default();
        let found = discover(&mut sync, vec![candidate(Some(vec!["sig-value"]))], "sig-value");
        assert_eq!(found.registered.len(), 1);
    }
}
