use std::fmt;

/// Fetch lifecycle of one list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// User-visible footer of a list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListStatus {
    #[default]
    Loading,
    More,
    Exhausted,
    Empty,
    Failed,
    MissingContest,
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ListStatus::Loading => "Loading...",
            ListStatus::More => "Pull up to load more",
            ListStatus::Exhausted => "No more entries",
            ListStatus::Empty => "No data yet",
            ListStatus::Failed => "Load failed",
            ListStatus::MissingContest => "Missing contest id",
        };
        f.write_str(text)
    }
}

/// Claim on the next page of a list. Only the holder of the current
/// generation may append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub page: u32,
    pub size: u32,
}

/// Append-only paginated list with a per-list in-flight guard.
#[derive(Clone, Debug)]
pub struct PagedList<T> {
    page: u32,
    page_size: u32,
    has_more: bool,
    items: Vec<T>,
    in_flight: bool,
    generation: u64,
    phase: LoadPhase,
    status: ListStatus,
}

impl<T> PagedList<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            has_more: true,
            items: Vec::new(),
            in_flight: false,
            generation: 0,
            phase: LoadPhase::Idle,
            status: ListStatus::Loading,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn status(&self) -> ListStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ListStatus) {
        self.status = status;
    }

    /// Back to page 1 with nothing loaded. Any fetch still outstanding
    /// belongs to the old generation and will be discarded.
    pub fn reset(&mut self) {
        self.page = 1;
        self.items.clear();
        self.has_more = true;
        self.in_flight = false;
        self.generation = self.generation.wrapping_add(1);
        self.phase = LoadPhase::Idle;
        self.status = ListStatus::Loading;
    }

    /// Claims the next page, or `None` while a fetch is outstanding or the
    /// list is exhausted.
    pub fn begin(&mut self) -> Option<PageTicket> {
        if self.in_flight || !self.has_more {
            return None;
        }
        self.in_flight = true;
        self.phase = LoadPhase::Loading;
        Some(PageTicket {
            generation: self.generation,
            page: self.page,
            size: self.page_size,
        })
    }

    pub fn is_current(&self, ticket: &PageTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Appends a fetched page. Returns false for a stale ticket, leaving
    /// the list untouched.
    pub fn complete(&mut self, ticket: &PageTicket, items: Vec<T>, has_more: bool) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = false;
        self.items.extend(items);
        self.page = ticket.page.saturating_add(1);
        self.has_more = has_more;
        self.phase = LoadPhase::Loaded;
        self.status = if has_more {
            ListStatus::More
        } else if self.items.is_empty() {
            ListStatus::Empty
        } else {
            ListStatus::Exhausted
        };
        true
    }

    /// Records a failed fetch; items and cursor stay as they were.
    pub fn fail(&mut self, ticket: &PageTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = false;
        self.phase = LoadPhase::Error;
        self.status = ListStatus::Failed;
        true
    }

    /// True while the list holds no more than its first page.
    pub fn on_first_page(&self) -> bool {
        self.items.len() <= self.page_size as usize
    }
}
