#![forbid(unsafe_code)]

//! Eager image loading for sections an in-page link is about to reveal.
//!
//! Every `a[href]` is watched until it comes within [`PREFETCH_MARGIN`] of the
//! viewport. At that point it stops being watched and, if it targets an
//! in-page section (`#id`), the lazy images inside that section are switched
//! to `loading="eager"`.

use tracing::debug;

use crate::geometry::intersects_with_margin;
use crate::page::{ElementId, Page};

/// Distance around the viewport at which anchors count as near.
pub const PREFETCH_MARGIN: f64 = 200.0;

#[derive(Debug, Default)]
pub struct Prefetcher {
    watched: Vec<ElementId>,
}

impl Prefetcher {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            watched: Vec::new(),
        }
    }

    /// Start watching every anchor and check them once.
    pub fn watch<P: Page>(&mut self, page: &mut P) {
        self.watched = page.query_all("a[href]");
        self.check(page);
    }

    /// Anchors not yet near the viewport.
    #[must_use]
    pub fn watched(&self) -> usize {
        self.watched.len()
    }

    /// Handle anchors that came near the viewport.
    pub fn check<P: Page>(&mut self, page: &mut P) {
        if self.watched.is_empty() {
            return;
        }
        let viewport = page.viewport();
        let (near, far): (Vec<_>, Vec<_>) = self.watched.iter().copied().partition(|&anchor| {
            intersects_with_margin(&page.bounding_rect(anchor), viewport, PREFETCH_MARGIN)
        });
        self.watched = far;
        for anchor in near {
            prefetch_target(anchor, page);
        }
    }
}

fn prefetch_target<P: Page>(anchor: ElementId, page: &mut P) {
    let Some(href) = page.attribute(anchor, "href") else {
        return;
    };
    let Some(id) = href.strip_prefix('#').filter(|id| !id.is_empty()) else {
        return;
    };
    let Some(section) = page.element_by_id(id) else {
        return;
    };
    let images = page.query_within(section, "img[loading=\"lazy\"]");
    for &img in &images {
        page.set_attribute(img, "loading", "eager");
    }
    if !images.is_empty() {
        debug!(section = id, images = images.len(), "prefetching section images");
    }
}
