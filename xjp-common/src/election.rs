//! General-election rank badges
//!
//! Admins type rank text freely: `14`, `14位`, `十四位`, `圈外`, `加入前`.
//! [`RankBadge::classify`] turns that into a badge with a tier and colour.

use std::fmt;

use crate::model::history::is_joined_before_text;

/// Ranks at or below this are in the selection tier
pub const SELECTION_CUTOFF: u32 = 12;
/// Ranks at or below this (and above [`SELECTION_CUTOFF`]) are under-girls
pub const UNDER_GIRLS_CUTOFF: u32 = 19;

const OUT_OF_RANKING: &str = "圈外";
const RANK_SUFFIX: char = '位';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankTier {
    Selection,
    UnderGirls,
}

/// Badge colour, from most to least prominent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Gold,
    Silver,
    Pink,
    Selection,
    UnderGirls,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankBadge {
    /// Empty rank text
    None,
    JoinedBefore,
    OutOfRanking,
    Ranked { rank: u32, tier: RankTier },
    /// Unrecognized text, shown as typed
    FreeText(String),
}

fn chinese_digit(c: char) -> Option<u32> {
    "零一二三四五六七八九".chars().position(|d| d == c).map(|p| p as u32)
}

/// Parse `十四`, `二十`, `七`, `二十三` and similar (up to 99).
fn parse_chinese_numeral(text: &str) -> Option<u32> {
    let chars: Vec<char> = text.chars().collect();
    match chars.iter().position(|&c| c == '十') {
        None if chars.len() == 1 => chinese_digit(chars[0]),
        None => None,
        Some(ten_at) => {
            let tens = match &chars[..ten_at] {
                [] => 1,
                [d] => chinese_digit(*d)?,
                _ => return None,
            };
            let ones = match &chars[ten_at + 1..] {
                [] => 0,
                [d] => chinese_digit(*d)?,
                _ => return None,
            };
            Some(tens * 10 + ones)
        }
    }
}

/// Number in rank text: the first run of ASCII digits, else a Chinese numeral
/// with the `位` suffix removed.
fn parse_rank_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    if !digits.is_empty() {
        return digits.parse().ok();
    }
    let stripped: String = text.chars().filter(|&c| c != RANK_SUFFIX).collect();
    parse_chinese_numeral(stripped.trim())
}

impl RankBadge {
    pub fn classify(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return RankBadge::None;
        }
        if is_joined_before_text(text) {
            return RankBadge::JoinedBefore;
        }
        if text == OUT_OF_RANKING {
            return RankBadge::OutOfRanking;
        }
        match parse_rank_number(text) {
            Some(0) | None => RankBadge::FreeText(text.to_string()),
            Some(rank) if rank > UNDER_GIRLS_CUTOFF => RankBadge::OutOfRanking,
            Some(rank) if rank > SELECTION_CUTOFF => RankBadge::Ranked {
                rank,
                tier: RankTier::UnderGirls,
            },
            Some(rank) => RankBadge::Ranked {
                rank,
                tier: RankTier::Selection,
            },
        }
    }

    pub fn color(&self) -> BadgeColor {
        match self {
            RankBadge::Ranked { rank: 1, .. } => BadgeColor::Gold,
            RankBadge::Ranked { rank: 2, .. } => BadgeColor::Silver,
            RankBadge::Ranked { rank: 3..=7, .. } => BadgeColor::Pink,
            RankBadge::Ranked {
                tier: RankTier::Selection,
                ..
            } => BadgeColor::Selection,
            RankBadge::Ranked {
                tier: RankTier::UnderGirls,
                ..
            } => BadgeColor::UnderGirls,
            _ => BadgeColor::Neutral,
        }
    }
}

impl fmt::Display for RankBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankBadge::None => f.write_str("—"),
            RankBadge::JoinedBefore => f.write_str("Joined before"),
            RankBadge::OutOfRanking => f.write_str("Out of ranking"),
            RankBadge::Ranked {
                rank,
                tier: RankTier::Selection,
            } => write!(f, "#{} (selection)", rank),
            RankBadge::Ranked {
                rank,
                tier: RankTier::UnderGirls,
            } => write!(f, "#{} (UG)", rank),
            RankBadge::FreeText(text) => f.write_str(text),
        }
    }
}
