use crossterm::event::KeyCode;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Months rendered on either side of the anchor month at first mount.
pub const INITIAL_REACH: i32 = 24;
/// Distance from a container edge, in scroll units, that triggers extension.
pub const EXTEND_THRESHOLD: i32 = 800;
/// Months added per extension.
pub const EXTEND_STEP: i32 = 6;
/// Hard cap on `end - start`; growth past it slides the window instead.
pub const MAX_SPAN: i32 = 180;
/// Gap kept between the header and a jumped-to month's top edge.
pub const JUMP_MARGIN: i32 = 8;

/// Scroll container geometry, in the same units as recorded month heights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub scroll_top: i32,
    pub client_height: i32,
    pub scroll_height: i32,
}

/// What a scroll transition did to the window range. `scroll_adjust` is the
/// amount the embedding view must add to its scroll position to keep the
/// content under the viewport stable when months are prepended or trimmed.
/// Prepended months are priced at the default estimate here; a view that can
/// measure them should reprice the added range (`start()` plus
/// `added_before`) from its own measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeUpdate {
    pub added_before: i32,
    pub added_after: i32,
    pub removed_before: i32,
    pub removed_after: i32,
    pub scroll_adjust: i32,
}

impl RangeUpdate {
    pub fn is_noop(&self) -> bool {
        *self == RangeUpdate::default()
    }
}

/// Sliding window of month offsets relative to the anchor (current) month.
///
/// Owns the range, the per-offset visibility ratios reported by the view, and
/// the per-offset rendered heights, so the scrolling/visibility algorithm is
/// independent of any particular UI binding.
#[derive(Debug)]
pub struct MonthWindow {
    start: i32,
    end: i32,
    header_height: i32,
    default_height: i32,
    heights: HashMap<i32, i32>,
    ratios: HashMap<i32, f64>,
    current: i32,
}

impl MonthWindow {
    pub fn new(header_height: i32, default_height: i32) -> Self {
        MonthWindow {
            start: -INITIAL_REACH,
            end: INITIAL_REACH,
            header_height,
            default_height: default_height.max(1),
            heights: HashMap::new(),
            ratios: HashMap::new(),
            current: 0,
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn span(&self) -> i32 {
        self.end - self.start
    }

    pub fn offsets(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    pub fn contains(&self, offset: i32) -> bool {
        offset >= self.start && offset <= self.end
    }

    /// Offset whose month label the header currently shows.
    pub fn current_offset(&self) -> i32 {
        self.current
    }

    /// Records a measured month height. Months never measured (not mounted
    /// yet) fall back to the default estimate.
    pub fn record_height(&mut self, offset: i32, height: i32) {
        if self.contains(offset) && height > 0 {
            self.heights.insert(offset, height);
        }
    }

    pub fn height_of(&self, offset: i32) -> i32 {
        self.heights.get(&offset).copied().unwrap_or(self.default_height)
    }

    /// Top edge of a month in content coordinates.
    pub fn month_top(&self, offset: i32) -> i32 {
        (self.start..offset).map(|o| self.height_of(o)).sum()
    }

    pub fn total_height(&self) -> i32 {
        self.offsets().map(|o| self.height_of(o)).sum()
    }

    /// Scroll-driven transition: nearing the top extends the window backward,
    /// nearing the bottom extends it forward; when the span would pass the
    /// cap, the opposite edge is trimmed so the window slides.
    pub fn on_scroll(&mut self, m: ScrollMetrics) -> RangeUpdate {
        let mut update = RangeUpdate::default();
        if m.scroll_top < EXTEND_THRESHOLD {
            self.start -= EXTEND_STEP;
            update.added_before = EXTEND_STEP;
            update.scroll_adjust = EXTEND_STEP * self.default_height;
            if self.span() > MAX_SPAN {
                self.end -= EXTEND_STEP;
                update.removed_after = EXTEND_STEP;
            }
        } else if m.scroll_top + m.client_height > m.scroll_height - EXTEND_THRESHOLD {
            self.end += EXTEND_STEP;
            update.added_after = EXTEND_STEP;
            if self.span() > MAX_SPAN {
                let trimmed: i32 = (self.start..self.start + EXTEND_STEP)
                    .map(|o| self.height_of(o))
                    .sum();
                self.start += EXTEND_STEP;
                update.removed_before = EXTEND_STEP;
                update.scroll_adjust = -trimmed;
            }
        }
        if !update.is_noop() {
            self.prune();
        }
        update
    }

    /// One batch of visibility updates: the offset with the highest ratio
    /// becomes current. Returns the new offset only when it changed, so the
    /// header update stays a no-op otherwise.
    pub fn on_visibility_batch(&mut self, batch: &[(i32, f64)]) -> Option<i32> {
        let mut best: Option<(i32, f64)> = None;
        for &(offset, ratio) in batch {
            if !self.contains(offset) {
                continue;
            }
            self.ratios.insert(offset, ratio);
            match best {
                Some((_, best_ratio)) if ratio <= best_ratio => {}
                _ => best = Some((offset, ratio)),
            }
        }
        let (offset, _) = best?;
        if offset == self.current {
            return None;
        }
        self.current = offset;
        Some(offset)
    }

    /// At least half the month's height lies inside the container's vertical
    /// bounds, after excluding the header band from the top.
    pub fn mostly_visible(&self, offset: i32, m: ScrollMetrics) -> bool {
        if !self.contains(offset) {
            return false;
        }
        let height = self.height_of(offset);
        let top = self.month_top(offset) - m.scroll_top;
        let bottom = top + height;
        let visible_top = top.max(self.header_height);
        let visible_bottom = bottom.min(m.client_height);
        let visible = (visible_bottom - visible_top).max(0);
        f64::from(visible) / f64::from(height.max(1)) >= 0.5
    }

    /// First mostly-visible offset, used by keyboard navigation. Falls back
    /// to the anchor month when nothing qualifies.
    pub fn first_mostly_visible(&self, m: ScrollMetrics) -> i32 {
        self.offsets()
            .find(|&o| self.mostly_visible(o, m))
            .unwrap_or(0)
    }

    /// Scroll position that puts the month's top just below the header.
    pub fn jump_target(&self, offset: i32) -> i32 {
        self.month_top(offset) - self.header_height - JUMP_MARGIN
    }

    // Drop bookkeeping for offsets that left the window; the view recreates
    // its observations from the new range.
    fn prune(&mut self) {
        let (start, end) = (self.start, self.end);
        self.heights.retain(|o, _| *o >= start && *o <= end);
        self.ratios.retain(|o, _| *o >= start && *o <= end);
        if !self.contains(self.current) {
            self.current = self.current.clamp(start, end);
        }
    }
}

/// Month-jump commands produced by the arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    PreviousMonth,
    NextMonth,
}

/// Explicit keyboard subscription: arrow keys translate to month jumps only
/// while attached, so detached instances never collide over the bindings.
#[derive(Debug, Default)]
pub struct MonthKeymap {
    attached: bool,
}

impl MonthKeymap {
    pub fn new() -> Self {
        MonthKeymap::default()
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// While attached the arrows are claimed entirely: the caller must not
    /// fall through to default scrolling for a translated key.
    pub fn translate(&self, code: KeyCode) -> Option<NavCommand> {
        if !self.attached {
            return None;
        }
        match code {
            KeyCode::Left | KeyCode::Up => Some(NavCommand::PreviousMonth),
            KeyCode::Right | KeyCode::Down => Some(NavCommand::NextMonth),
            _ => None,
        }
    }
}
