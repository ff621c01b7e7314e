use std::fmt::Write;

use crate::models::{RankEntry, Segment, Tab};
use crate::paging::ListStatus;
use crate::state::{BoardState, RankBoard};

const RULE: &str = "----------------------------------------";

/// Plain-text rendering of the leaderboard screen.
pub fn render_board(state: &BoardState) -> String {
    let mut out = String::new();

    if let Some(viewer) = &state.viewer {
        let name = if viewer.profile.nickname.is_empty() {
            viewer.profile.uid.as_str()
        } else {
            viewer.profile.nickname.as_str()
        };
        let _ = write!(out, "{}  {} steps this week", name, viewer.profile.week_steps);
        let tier = viewer.tier.to_string();
        if !tier.is_empty() {
            let _ = write!(out, "  [{}", tier);
            if let Some(until) = &viewer.member_until {
                let _ = write!(out, " until {}", until);
            }
            out.push(']');
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", segment_bar(state.selection.segment));

    match state.selection.segment {
        Segment::Ongoing => {
            let _ = writeln!(out, "{}", tab_bar(state));
            let _ = writeln!(out, "{}", RULE);
            render_rank_board(&mut out, &state.ongoing);
        }
        Segment::Ended => match &state.ended.ranking {
            Some(ranking) => {
                let _ = writeln!(out, "{}", ranking.title);
                let _ = writeln!(out, "{}", RULE);
                render_rank_board(&mut out, &ranking.board);
            }
            None => {
                let _ = writeln!(out, "{}", RULE);
                for contest in state.ended.contests.items() {
                    let _ = write!(out, "#{:<6} {}", contest.contest_id, contest.title);
                    if let Some(rank) = contest.my_rank {
                        let _ = write!(out, "  (you: #{})", rank);
                    }
                    if contest.claim_id.is_some() {
                        out.push_str("  [prize]");
                    }
                    out.push('\n');
                }
                render_footer(&mut out, state.ended.contests.status());
            }
        },
    }

    out
}

fn segment_bar(active: Segment) -> String {
    [Segment::Ongoing, Segment::Ended]
        .into_iter()
        .map(|segment| {
            if segment == active {
                format!("[{}]", segment)
            } else {
                format!(" {} ", segment)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn tab_bar(state: &BoardState) -> String {
    Tab::ALL
        .into_iter()
        .map(|tab| {
            if tab == state.selection.tab {
                format!("[{}]", tab)
            } else if state.selection.locked_tabs.contains(&tab) {
                format!(" {}* ", tab)
            } else {
                format!(" {} ", tab)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_rank_board(out: &mut String, board: &RankBoard) {
    let my_rank = board.my.as_ref().map(|my| my.rank);
    for entry in board.list.items() {
        let marker = if Some(entry.rank) == my_rank { '>' } else { ' ' };
        out.push(marker);
        render_row(out, entry);
    }
    render_footer(out, board.list.status());

    if board.show_my_row {
        if let Some(my) = &board.my {
            let _ = writeln!(out, "{}", RULE);
            out.push('*');
            render_row(out, my);
        }
    }
}

fn render_row(out: &mut String, entry: &RankEntry) {
    let _ = writeln!(
        out,
        "{:>4}  {:<20} {:>8}",
        entry.rank, entry.display_name, entry.metric
    );
}

fn render_footer(out: &mut String, status: ListStatus) {
    let _ = writeln!(out, "  {}", status);
}
