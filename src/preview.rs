//! Preview handles for selected images.
//!
//! Every accepted image holds a [`PreviewHandle`] allocated from a
//! [`PreviewRegistry`]. Dropping the handle releases it, so removing an image
//! or discarding the controller cannot leak one.

use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Default)]
struct Slots {
    next_id: u64,
    live: BTreeSet<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    slots: Rc<RefCell<Slots>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, name: &str) -> PreviewHandle {
        let mut slots = self.slots.borrow_mut();
        slots.next_id += 1;
        let id = slots.next_id;
        slots.live.insert(id);
        trace!(id, name, "preview acquired");
        PreviewHandle {
            id,
            url: format!("preview:{id}/{name}"),
            slots: Rc::clone(&self.slots),
        }
    }

    pub fn live(&self) -> usize {
        self.slots.borrow().live.len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        parse_id(url).is_some_and(|id| self.slots.borrow().live.contains(&id))
    }
}

fn parse_id(url: &str) -> Option<u64> {
    url.strip_prefix("preview:")?.split('/').next()?.parse().ok()
}

pub struct PreviewHandle {
    id: u64,
    url: String,
    slots: Rc<RefCell<Slots>>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("url", &self.url).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.slots.borrow_mut().live.remove(&self.id);
        trace!(id = self.id, "preview released");
    }
}

/// One row of the preview grid, in selection order.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewItem {
    pub index: usize,
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub url: String,
}
