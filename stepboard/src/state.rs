use std::collections::BTreeSet;

use crate::constants::{ENDED_PAGE_SIZE, ENDED_RANKING_SIZE, ONGOING_PAGE_SIZE};
use crate::models::{EndedContest, MyRank, RankEntry, Recurrence, Segment, Tab};
use crate::paging::PagedList;
use crate::registry::OngoingByTab;
use crate::viewer::Viewer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub segment: Segment,
    pub tab: Tab,
    pub contest_id: Option<u64>,
    pub contest_type: Option<Recurrence>,
    pub locked_tabs: BTreeSet<Tab>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            segment: Segment::Ongoing,
            tab: Tab::Day,
            contest_id: None,
            contest_type: None,
            locked_tabs: BTreeSet::new(),
        }
    }
}

/// A ranked list plus the viewer's own row and whether to pin it.
#[derive(Clone, Debug)]
pub struct RankBoard {
    pub list: PagedList<RankEntry>,
    pub my: Option<MyRank>,
    pub show_my_row: bool,
    pub first_screen_count: usize,
    /// Bumped by every scroll.
    pub scroll_epoch: u64,
}

impl RankBoard {
    pub fn new(page_size: u32) -> Self {
        Self {
            list: PagedList::new(page_size),
            my: None,
            show_my_row: false,
            first_screen_count: 0,
            scroll_epoch: 0,
        }
    }

    pub fn reset(&mut self) {
        self.list.reset();
        self.show_my_row = false;
        self.first_screen_count = 0;
    }

    /// Clears the pin and the measurement ahead of a re-measure.
    pub fn clear_visibility(&mut self) {
        self.show_my_row = false;
        self.first_screen_count = 0;
    }

    pub fn scrolled(&mut self) {
        self.show_my_row = false;
        self.scroll_epoch = self.scroll_epoch.wrapping_add(1);
    }

    pub fn apply_visibility(&mut self, first_screen_count: usize) {
        self.first_screen_count = first_screen_count;
        self.show_my_row = should_pin(
            self.list.items(),
            self.list.page_size(),
            self.my.as_ref(),
            first_screen_count,
        );
    }
}

/// Whether the viewer's row must be pinned below the first screen.
///
/// Only evaluated while the list still holds first-page data. The row is
/// pinned when the viewer's rank is past the first screen and either sits
/// in the loaded rows or lies beyond the first page.
pub fn should_pin(
    items: &[RankEntry],
    page_size: u32,
    my: Option<&MyRank>,
    first_screen_count: usize,
) -> bool {
    let page_size = page_size as usize;
    if items.len() > page_size || first_screen_count == 0 {
        return false;
    }
    let my = match my {
        Some(my) => my,
        None => return false,
    };
    let rank = my.rank as usize;
    if rank <= first_screen_count {
        return false;
    }
    let loaded = items.iter().any(|entry| entry.rank == my.rank);
    loaded || rank > page_size
}

/// Ranking of one finished contest, opened from the ended list.
#[derive(Clone, Debug)]
pub struct EndedRanking {
    pub contest_id: u64,
    /// Distinguishes successive opens, including of the same contest.
    pub epoch: u64,
    pub title: String,
    pub board: RankBoard,
}

impl EndedRanking {
    pub fn new(contest_id: u64, epoch: u64) -> Self {
        Self {
            contest_id,
            epoch,
            title: String::new(),
            board: RankBoard::new(ENDED_RANKING_SIZE),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EndedSegment {
    pub contests: PagedList<EndedContest>,
    pub ranking: Option<EndedRanking>,
    opened: u64,
}

impl EndedSegment {
    /// Replaces the ranking with a fresh one; responses for any earlier
    /// ranking no longer match its epoch.
    pub fn open(&mut self, contest_id: u64) -> u64 {
        self.opened = self.opened.wrapping_add(1);
        self.ranking = Some(EndedRanking::new(contest_id, self.opened));
        self.opened
    }
}

/// Everything the leaderboard screen renders.
#[derive(Clone, Debug)]
pub struct BoardState {
    pub selection: Selection,
    pub by_tab: OngoingByTab,
    pub ongoing: RankBoard,
    pub ended: EndedSegment,
    pub viewer: Option<Viewer>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            by_tab: OngoingByTab::default(),
            ongoing: RankBoard::new(ONGOING_PAGE_SIZE),
            ended: EndedSegment {
                contests: PagedList::new(ENDED_PAGE_SIZE),
                ranking: None,
                opened: 0,
            },
            viewer: None,
        }
    }
}

impl BoardState {
    /// The board whose pinned row belongs to `segment`, if one is shown.
    pub fn board_mut(&mut self, segment: Segment) -> Option<&mut RankBoard> {
        match segment {
            Segment::Ongoing => Some(&mut self.ongoing),
            Segment::Ended => self.ended.ranking.as_mut().map(|ranking| &mut ranking.board),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(count: u32) -> Vec<RankEntry> {
        (1..=count)
            .map(|rank| RankEntry {
                rank,
                user_id: format!("u{}", rank),
                display_name: format!("runner {}", rank),
                metric: 10_000 - rank as u64,
            })
            .collect()
    }

    fn me(rank: u32) -> MyRank {
        RankEntry {
            rank,
            user_id: "me".to_string(),
            display_name: "me".to_string(),
            metric: 1,
        }
    }

    #[test]
    fn rank_on_first_screen_is_not_pinned() {
        assert!(!should_pin(&entries(30), 30, Some(&me(5)), 8));
        assert!(!should_pin(&entries(30), 30, Some(&me(8)), 8));
    }

    #[test]
    fn loaded_rank_below_first_screen_is_pinned() {
        assert!(should_pin(&entries(30), 30, Some(&me(20)), 8));
    }

    #[test]
    fn rank_beyond_first_page_is_pinned() {
        assert!(should_pin(&entries(30), 30, Some(&me(120)), 8));
    }

    #[test]
    fn rank_missing_from_short_list_is_not_pinned() {
        // 12 rows loaded, rank 20 is neither loaded nor past the page size.
        assert!(!should_pin(&entries(12), 30, Some(&me(20)), 8));
    }

    #[test]
    fn deep_pagination_never_pins() {
        assert!(!should_pin(&entries(60), 30, Some(&me(20)), 8));
    }

    #[test]
    fn reopening_a_ranking_moves_to_a_new_epoch() {
        let mut state = BoardState::default();
        let first = state.ended.open(5);
        let second = state.ended.open(5);
        assert_ne!(first, second);
        assert_eq!(state.ended.ranking.as_ref().map(|ranking| ranking.epoch), Some(second));
    }

    #[test]
    fn scrolling_bumps_the_epoch() {
        let mut board = RankBoard::new(30);
        board.show_my_row = true;
        board.scrolled();
        assert!(!board.show_my_row);
        assert_eq!(board.scroll_epoch, 1);
    }

    #[test]
    fn no_rank_no_pin() {
        assert!(!should_pin(&entries(30), 30, None, 8));
        assert!(!should_pin(&entries(30), 30, Some(&me(20)), 0));
    }
}
