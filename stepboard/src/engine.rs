//! Leaderboard view-state engine.
//!
//! Owns the ongoing and ended lists, the current selection and the pinned
//! "my rank" row. All state sits behind one async mutex that is never held
//! across a network call or a geometry measurement, so the two segments can
//! fetch concurrently while each list admits one fetch at a time.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{Backend, RankQuery};
use crate::geometry::{first_screen_count, GeometryProbe};
use crate::handoff::{Handoff, HandoffSlot};
use crate::models::{EndedContest, Segment, Tab};
use crate::paging::ListStatus;
use crate::registry::{index_ongoing_by_recurrence, locked_tabs, ContestRegistry, OngoingByTab, TabLocks};
use crate::session::Session;
use crate::state::BoardState;
use crate::viewer;

/// What a load request ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and applied.
    Fetched,
    /// Nothing was fetched: a fetch was in flight, the list was exhausted,
    /// or there was no contest to fetch for.
    Skipped,
    /// The fetch failed; loaded rows were kept.
    Failed,
    /// The fetch finished after a reset and its result was dropped.
    Stale,
}

enum SegmentAction {
    Bootstrap,
    Load,
    Recompute,
}

pub struct Leaderboard {
    backend: Arc<dyn Backend>,
    session: Arc<Session>,
    registry: ContestRegistry,
    probe: Arc<dyn GeometryProbe>,
    handoff: Arc<HandoffSlot>,
    state: Mutex<BoardState>,
}

impl Leaderboard {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Arc<Session>,
        probe: Arc<dyn GeometryProbe>,
    ) -> Self {
        Self {
            registry: ContestRegistry::new(Arc::clone(&backend)),
            backend,
            session,
            probe,
            handoff: Arc::new(HandoffSlot::new()),
            state: Mutex::new(BoardState::default()),
        }
    }

    /// Shares a hand-off mailbox with the screens that navigate here.
    pub fn with_handoff(mut self, handoff: Arc<HandoffSlot>) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn handoff(&self) -> Arc<HandoffSlot> {
        Arc::clone(&self.handoff)
    }

    pub fn registry(&self) -> &ContestRegistry {
        &self.registry
    }

    pub async fn snapshot(&self) -> BoardState {
        self.state.lock().await.clone()
    }

    /// Entry point each time the screen becomes visible.
    pub async fn activate(&self) {
        if let Err(err) = self.backend.ensure_authenticated().await {
            warn!(?err, "authentication failed; leaderboard stays idle");
            return;
        }

        match self.handoff.take() {
            Some(handoff) => {
                info!(
                    contest_id = handoff.contest_id,
                    goto_ended = handoff.goto_ended,
                    "opening handed-off contest"
                );
                self.apply_handoff(handoff).await;
            }
            None => {
                let (needs_bootstrap, segment) = {
                    let state = self.state.lock().await;
                    (
                        state.ongoing.list.is_empty() || state.selection.contest_id.is_none(),
                        state.selection.segment,
                    )
                };
                if needs_bootstrap {
                    self.bootstrap().await;
                } else if segment == Segment::Ongoing {
                    self.compute_visibility(Segment::Ongoing).await;
                }
            }
        }

        self.load_viewer().await;
    }

    async fn apply_handoff(&self, handoff: Handoff) {
        if handoff.goto_ended {
            self.open_ended_ranking(handoff.contest_id).await;
            return;
        }

        let by_tab = self.rebuild_index().await;
        let locks = TabLocks::for_handed(handoff.contest_type, &by_tab);
        {
            let mut state = self.state.lock().await;
            state.selection.segment = Segment::Ongoing;
            state.selection.tab = locks.default_tab;
            state.selection.locked_tabs = locks.locked;
            state.selection.contest_id = Some(handoff.contest_id);
            state.selection.contest_type = handoff.contest_type;
            state.ongoing.reset();
            state.ongoing.my = None;
        }
        self.load_page(Segment::Ongoing, true).await;
    }

    /// Picks the first running contest (day, then week, then month) and
    /// loads its board.
    async fn bootstrap(&self) -> LoadOutcome {
        let by_tab = self.rebuild_index().await;
        let locks = TabLocks::from_index(&by_tab);
        let contest_id = by_tab.default_selection().map(|(_, id)| id);
        {
            let mut state = self.state.lock().await;
            state.selection.tab = locks.default_tab;
            state.selection.contest_id = contest_id;
            state.selection.contest_type = contest_id.map(|_| locks.default_tab.recurrence());
            state.ongoing.reset();
            state.ongoing.my = None;
        }
        debug!(?contest_id, tab = %locks.default_tab, "bootstrapped ongoing selection");
        self.load_page(Segment::Ongoing, true).await
    }

    /// Refreshes the per-tab contest index. A failed fetch with nothing
    /// cached keeps the previous index.
    async fn rebuild_index(&self) -> OngoingByTab {
        let listing = self.registry.list_contests().await;
        let mut state = self.state.lock().await;
        if listing.warning.is_some() && listing.contests.is_empty() {
            return state.by_tab;
        }
        let by_tab = index_ongoing_by_recurrence(&listing.contests);
        state.by_tab = by_tab;
        state.selection.locked_tabs = locked_tabs(&by_tab);
        by_tab
    }

    pub async fn select_segment(&self, segment: Segment) {
        let action = {
            let mut state = self.state.lock().await;
            if state.selection.segment == segment {
                return;
            }
            state.selection.segment = segment;
            match segment {
                Segment::Ongoing if state.ongoing.list.is_empty() => {
                    if state.selection.contest_id.is_none() {
                        SegmentAction::Bootstrap
                    } else {
                        SegmentAction::Load
                    }
                }
                Segment::Ended if state.ended.contests.is_empty() => SegmentAction::Load,
                _ => SegmentAction::Recompute,
            }
        };

        debug!(segment = %segment, "segment selected");
        match action {
            SegmentAction::Bootstrap => {
                self.bootstrap().await;
            }
            SegmentAction::Load => {
                self.load_page(segment, true).await;
            }
            SegmentAction::Recompute => self.compute_visibility(segment).await,
        }
    }

    /// Switches the ongoing board to another recurrence. Locked tabs, the
    /// current tab and tabs without a running contest are ignored.
    pub async fn select_tab(&self, tab: Tab) {
        let contest_id = {
            let mut state = self.state.lock().await;
            if state.selection.locked_tabs.contains(&tab) || state.selection.tab == tab {
                return;
            }
            let contest_id = match state.by_tab.get(tab) {
                Some(id) => id,
                None => return,
            };
            state.selection.tab = tab;
            state.selection.contest_id = Some(contest_id);
            state.selection.contest_type = Some(tab.recurrence());
            state.ongoing.reset();
            state.ongoing.my = None;
            contest_id
        };

        info!(tab = %tab, contest_id, "tab selected");
        self.load_page(Segment::Ongoing, true).await;
    }

    pub async fn load_page(&self, segment: Segment, reset: bool) -> LoadOutcome {
        match segment {
            Segment::Ongoing => self.load_ongoing(reset).await,
            Segment::Ended => self.load_ended(reset).await,
        }
    }

    /// Next page of whichever segment is showing.
    pub async fn load_more(&self) -> LoadOutcome {
        let segment = self.state.lock().await.selection.segment;
        self.load_page(segment, false).await
    }

    /// Reloads the showing segment from its first page.
    pub async fn refresh(&self) -> LoadOutcome {
        let (segment, has_contest, ranking_epoch) = {
            let state = self.state.lock().await;
            (
                state.selection.segment,
                state.selection.contest_id.is_some(),
                state.ended.ranking.as_ref().map(|ranking| ranking.epoch),
            )
        };

        match segment {
            Segment::Ongoing if !has_contest => self.bootstrap().await,
            Segment::Ongoing => self.load_page(Segment::Ongoing, true).await,
            Segment::Ended => {
                let (list, ranking) = tokio::join!(self.load_ended(true), async {
                    match ranking_epoch {
                        Some(epoch) => Some(self.reload_ended_ranking(epoch).await),
                        None => None,
                    }
                });
                match ranking {
                    Some(LoadOutcome::Failed) => LoadOutcome::Failed,
                    _ => list,
                }
            }
        }
    }

    async fn load_ongoing(&self, reset: bool) -> LoadOutcome {
        let (ticket, contest_id, scope) = {
            let mut state = self.state.lock().await;
            if state.ongoing.list.in_flight() {
                debug!("ongoing fetch already in flight");
                return LoadOutcome::Skipped;
            }
            let contest_id = match state.selection.contest_id {
                Some(id) => id,
                None => {
                    state.ongoing.list.set_status(ListStatus::MissingContest);
                    return LoadOutcome::Skipped;
                }
            };
            if reset {
                state.ongoing.reset();
            }
            let ticket = match state.ongoing.list.begin() {
                Some(ticket) => ticket,
                None => return LoadOutcome::Skipped,
            };
            (ticket, contest_id, state.selection.tab)
        };

        debug!(contest_id, scope = %scope, page = ticket.page, "fetching leaderboard page");
        let result = self
            .backend
            .leaderboard_page(RankQuery {
                contest_id,
                page: ticket.page,
                size: ticket.size,
                scope,
            })
            .await;

        {
            let mut state = self.state.lock().await;
            match result {
                Ok(page) => {
                    let count = page.items.len();
                    if !state
                        .ongoing
                        .list
                        .complete(&ticket, page.items, page.has_more)
                    {
                        debug!(contest_id, page = ticket.page, "discarding stale leaderboard page");
                        return LoadOutcome::Stale;
                    }
                    info!(contest_id, scope = %scope, page = ticket.page, rows = count, "leaderboard page loaded");
                }
                Err(err) => {
                    if !state.ongoing.list.fail(&ticket) {
                        return LoadOutcome::Stale;
                    }
                    warn!(?err, contest_id, scope = %scope, page = ticket.page, "leaderboard page failed");
                    return LoadOutcome::Failed;
                }
            }
        }

        if reset && self.load_my_rank(ticket.generation, contest_id, scope).await {
            self.compute_visibility(Segment::Ongoing).await;
        }
        LoadOutcome::Fetched
    }

    /// Returns false when the list was reset while the rank was in flight.
    async fn load_my_rank(&self, generation: u64, contest_id: u64, scope: Tab) -> bool {
        let my = match self.backend.my_rank(contest_id, scope).await {
            Ok(my) => my,
            Err(err) => {
                warn!(?err, contest_id, scope = %scope, "my rank unavailable");
                None
            }
        };
        let mut state = self.state.lock().await;
        if state.ongoing.list.generation() != generation {
            return false;
        }
        state.ongoing.my = my;
        true
    }

    async fn load_ended(&self, reset: bool) -> LoadOutcome {
        let ticket = {
            let mut state = self.state.lock().await;
            if state.ended.contests.in_flight() {
                debug!("ended fetch already in flight");
                return LoadOutcome::Skipped;
            }
            if reset {
                state.ended.contests.reset();
            }
            match state.ended.contests.begin() {
                Some(ticket) => ticket,
                None => return LoadOutcome::Skipped,
            }
        };

        let result = self
            .backend
            .ended_contests(ticket.page, ticket.size)
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(page) => {
                if !state
                    .ended
                    .contests
                    .complete(&ticket, page.items, page.has_more)
                {
                    return LoadOutcome::Stale;
                }
                let BoardState { ended, .. } = &mut *state;
                if let Some(ranking) = ended.ranking.as_mut() {
                    if ranking.title.is_empty() || ranking.title == fallback_title(ranking.contest_id) {
                        ranking.title = ranking_title(ended.contests.items(), ranking.contest_id);
                    }
                }
                debug!(page = ticket.page, "ended contests loaded");
                LoadOutcome::Fetched
            }
            Err(err) => {
                if !state.ended.contests.fail(&ticket) {
                    return LoadOutcome::Stale;
                }
                warn!(?err, page = ticket.page, "ended contests failed");
                LoadOutcome::Failed
            }
        }
    }

    /// Shows the final ranking of one finished contest.
    pub async fn open_ended_ranking(&self, contest_id: u64) {
        let epoch = {
            let mut state = self.state.lock().await;
            state.selection.segment = Segment::Ended;
            state.ended.open(contest_id)
        };
        info!(contest_id, epoch, "opening ended ranking");
        tokio::join!(self.load_ended(true), self.load_ended_ranking(epoch));
    }

    pub async fn close_ended_ranking(&self) {
        self.state.lock().await.ended.ranking = None;
    }

    async fn reload_ended_ranking(&self, epoch: u64) -> LoadOutcome {
        {
            let mut state = self.state.lock().await;
            match state.ended.ranking.as_mut() {
                Some(ranking) if ranking.epoch == epoch => ranking.board.reset(),
                _ => return LoadOutcome::Skipped,
            }
        }
        self.load_ended_ranking(epoch).await
    }

    /// Responses are applied only while the ranking opened as `epoch` is
    /// still the one on screen.
    async fn load_ended_ranking(&self, epoch: u64) -> LoadOutcome {
        let (contest_id, ticket) = {
            let mut state = self.state.lock().await;
            let ranking = match state.ended.ranking.as_mut() {
                Some(ranking) if ranking.epoch == epoch => ranking,
                _ => return LoadOutcome::Skipped,
            };
            ranking.board.clear_visibility();
            ranking.board.my = None;
            match ranking.board.list.begin() {
                Some(ticket) => (ranking.contest_id, ticket),
                None => return LoadOutcome::Skipped,
            }
        };

        let query = RankQuery {
            contest_id,
            page: ticket.page,
            size: ticket.size,
            scope: Tab::Day,
        };
        let (page, my) = tokio::join!(
            self.backend.leaderboard_page(query),
            self.backend.my_rank(contest_id, Tab::Day)
        );
        let my = my.unwrap_or_else(|err| {
            warn!(?err, contest_id, "my rank unavailable for ended contest");
            None
        });

        {
            let mut state = self.state.lock().await;
            let title = ranking_title(state.ended.contests.items(), contest_id);
            let ranking = match state.ended.ranking.as_mut() {
                Some(ranking) if ranking.epoch == epoch => ranking,
                _ => {
                    debug!(contest_id, epoch, "discarding ranking for a replaced view");
                    return LoadOutcome::Stale;
                }
            };
            match page {
                Ok(page) => {
                    if !ranking.board.list.complete(&ticket, page.items, page.has_more) {
                        return LoadOutcome::Stale;
                    }
                    ranking.board.my = my;
                    ranking.title = title;
                }
                Err(err) => {
                    ranking.board.my = None;
                    if !ranking.board.list.fail(&ticket) {
                        return LoadOutcome::Stale;
                    }
                    warn!(?err, contest_id, "ended ranking failed");
                    return LoadOutcome::Failed;
                }
            }
        }

        self.compute_visibility(Segment::Ended).await;
        LoadOutcome::Fetched
    }

    /// Measures the list and decides whether the viewer's row is pinned.
    pub async fn compute_visibility(&self, segment: Segment) {
        let scroll_epoch = {
            let mut state = self.state.lock().await;
            match state.board_mut(segment) {
                Some(board) => {
                    board.clear_visibility();
                    board.scroll_epoch
                }
                None => return,
            }
        };

        let geometry = self.probe.measure(segment).await;
        let count = first_screen_count(geometry);

        let mut state = self.state.lock().await;
        if let Some(board) = state.board_mut(segment) {
            if board.scroll_epoch != scroll_epoch {
                // Scrolled while measuring; keep the row hidden.
                board.first_screen_count = count;
                debug!(segment = %segment, first_screen_count = count, "scrolled during measurement");
                return;
            }
            board.apply_visibility(count);
            debug!(
                segment = %segment,
                first_screen_count = count,
                show_my_row = board.show_my_row,
                "visibility recomputed"
            );
        }
    }

    /// Any scroll drops the pinned row until the next recomputation.
    pub async fn on_scroll(&self, segment: Segment) {
        let mut state = self.state.lock().await;
        if let Some(board) = state.board_mut(segment) {
            board.scrolled();
        }
    }

    /// Host reported a viewport change.
    pub async fn on_resize(&self) {
        let segment = self.state.lock().await.selection.segment;
        self.compute_visibility(segment).await;
    }

    pub async fn load_viewer(&self) {
        match viewer::load_viewer(self.backend.as_ref(), &self.session).await {
            Ok(viewer) => self.state.lock().await.viewer = Some(viewer),
            Err(err) => warn!(?err, "viewer profile unavailable"),
        }
    }
}

fn fallback_title(contest_id: u64) -> String {
    format!("Contest #{}", contest_id)
}

fn ranking_title(contests: &[EndedContest], contest_id: u64) -> String {
    contests
        .iter()
        .find(|contest| contest.contest_id == contest_id)
        .map(|contest| contest.title.clone())
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| fallback_title(contest_id))
}
