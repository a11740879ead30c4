//! Fight card filtering and ranking projection.
//!
//! The projection is pure: it is recomputed from the current card set on
//! every request and never writes anything back.

use serde::{Deserialize, Serialize};
use taisen_db::entities::fighter::Gender;

use super::views::FightCardView;

/// Filter value meaning "no preference".
pub const NO_PREFERENCE: &str = "指定なし";

/// Number of podium places.
pub const PODIUM_SIZE: usize = 3;

/// Last rank shown among the contenders.
pub const CONTENDERS_END: usize = 10;

/// Remainder cards shown before the first "more".
pub const REMAINDER_INITIAL: usize = 30;

/// Remainder cards added by each further page.
pub const REMAINDER_STEP: usize = 20;

/// Ranking filter. Every criterion is optional and they combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingFilter {
    /// Organization name.
    #[serde(default)]
    pub organization: Option<String>,
    /// Weight class name.
    #[serde(default)]
    pub weight_class: Option<String>,
    /// Substring of either fighter's name.
    #[serde(default)]
    pub keyword: Option<String>,
    /// Both fighters must have this gender.
    #[serde(default)]
    pub gender: Option<Gender>,
}

impl RankingFilter {
    /// Fold empty strings and the "no preference" sentinel into `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            organization: wildcard(self.organization),
            weight_class: wildcard(self.weight_class),
            keyword: self
                .keyword
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            gender: self.gender,
        }
    }

    /// Whether a card satisfies every criterion.
    #[must_use]
    pub fn matches(&self, card: &FightCardView) -> bool {
        let organization = self
            .organization
            .as_deref()
            .filter(|o| *o != NO_PREFERENCE && !o.is_empty())
            .is_none_or(|o| card.organization.name == o);
        let weight_class = self
            .weight_class
            .as_deref()
            .filter(|w| *w != NO_PREFERENCE && !w.is_empty())
            .is_none_or(|w| card.weight_class.name == w);
        let keyword = self
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .is_none_or(|k| {
                let needle = k.to_lowercase();
                card.fighter1.name.to_lowercase().contains(&needle)
                    || card.fighter2.name.to_lowercase().contains(&needle)
            });
        let gender = self
            .gender
            .is_none_or(|g| card.fighter1.gender == g && card.fighter2.gender == g);

        organization && weight_class && keyword && gender
    }
}

fn wildcard(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != NO_PREFERENCE)
}

/// Medal for the podium places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    /// Rank 1.
    Gold,
    /// Rank 2.
    Silver,
    /// Rank 3.
    Bronze,
}

impl Medal {
    /// Medal for a 1-based rank, if any.
    #[must_use]
    pub const fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }
}

/// A card with its 1-based rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCard {
    /// 1-based position after sorting.
    pub rank: usize,
    /// Podium medal, ranks 1 to 3 only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medal: Option<Medal>,
    /// The ranked card.
    pub card: FightCardView,
}

/// Filtered and ranked cards, split into display sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingProjection {
    /// Ranks 1 to 3.
    pub podium: Vec<RankedCard>,
    /// Ranks 4 to 10.
    pub contenders: Vec<RankedCard>,
    /// Rank 11 onwards.
    pub remainder: Vec<RankedCard>,
}

/// One window of the remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainderPage {
    /// Requested window index.
    pub page: usize,
    /// Cards in this window.
    pub cards: Vec<RankedCard>,
    /// Whether later windows hold more cards.
    pub has_more: bool,
}

impl RankingProjection {
    /// Total number of ranked cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.podium.len() + self.contenders.len() + self.remainder.len()
    }

    /// Whether nothing matched the filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remainder window `page`. Page 0 holds the first 30 cards and each
    /// later page the next 20.
    #[must_use]
    pub fn remainder_page(&self, page: usize) -> RemainderPage {
        let (start, size) = if page == 0 {
            (0, REMAINDER_INITIAL)
        } else {
            let start = (page - 1)
                .saturating_mul(REMAINDER_STEP)
                .saturating_add(REMAINDER_INITIAL);
            (start, REMAINDER_STEP)
        };
        let start = start.min(self.remainder.len());
        let end = start.saturating_add(size).min(self.remainder.len());

        RemainderPage {
            page,
            cards: self.remainder[start..end].to_vec(),
            has_more: end < self.remainder.len(),
        }
    }
}

/// Filter, sort by popularity (stable), and partition `cards`.
#[must_use]
pub fn project_ranking(cards: &[FightCardView], filter: &RankingFilter) -> RankingProjection {
    let mut matched: Vec<&FightCardView> = cards.iter().filter(|c| filter.matches(c)).collect();
    matched.sort_by(|a, b| b.popularity_votes.cmp(&a.popularity_votes));

    let mut projection = RankingProjection::default();
    for (index, card) in matched.into_iter().enumerate() {
        let rank = index + 1;
        let ranked = RankedCard {
            rank,
            medal: Medal::for_rank(rank),
            card: card.clone(),
        };
        if rank <= PODIUM_SIZE {
            projection.podium.push(ranked);
        } else if rank <= CONTENDERS_END {
            projection.contenders.push(ranked);
        } else {
            projection.remainder.push(ranked);
        }
    }
    projection
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::ledger::PredictionSplit;
    use crate::services::views::{FighterRef, OrganizationRef, WeightClassRef};
    use chrono::Utc;
    use uuid::Uuid;

    fn card(
        id: i32,
        names: (&str, &str),
        org: &str,
        class: &str,
        gender: Gender,
        popularity: i32,
    ) -> FightCardView {
        FightCardView {
            id,
            fighter1: FighterRef {
                id: id * 10,
                name: names.0.to_string(),
                gender,
            },
            fighter2: FighterRef {
                id: id * 10 + 1,
                name: names.1.to_string(),
                gender,
            },
            organization: OrganizationRef {
                id: 1,
                name: org.to_string(),
            },
            weight_class: WeightClassRef {
                id: 1,
                name: class.to_string(),
                gender,
            },
            fighter1_votes: 0,
            fighter2_votes: 0,
            popularity_votes: popularity,
            prediction_split: PredictionSplit {
                fighter1_percent: 50,
                fighter2_percent: 50,
            },
            created_by: Uuid::nil(),
            created_at: Utc::now().into(),
        }
    }

    fn sample() -> Vec<FightCardView> {
        vec![
            card(1, ("Mikuru Asakura", "Kai Asakura"), "RIZIN", "Featherweight", Gender::Male, 5),
            card(2, ("Kyoji Horiguchi", "Hiromasa Ougikubo"), "UFC", "Flyweight", Gender::Male, 12),
            card(3, ("Seika Izawa", "Ayaka Hamasaki"), "RIZIN", "Atomweight", Gender::Female, 8),
            card(4, ("Yutaka Saito", "Juntaro Ushiku"), "RIZIN", "Featherweight", Gender::Male, 12),
        ]
    }

    fn ids(cards: &[RankedCard]) -> Vec<i32> {
        cards.iter().map(|c| c.card.id).collect()
    }

    #[test]
    fn test_no_preference_returns_everything_sorted() {
        let filter = RankingFilter {
            organization: Some(NO_PREFERENCE.to_string()),
            weight_class: Some(NO_PREFERENCE.to_string()),
            keyword: Some(String::new()),
            gender: None,
        };

        let projection = project_ranking(&sample(), &filter);

        assert_eq!(projection.len(), 4);
        // Ties keep input order.
        assert_eq!(ids(&projection.podium), vec![2, 4, 3]);
        assert_eq!(ids(&projection.contenders), vec![1]);
        assert_eq!(projection.podium[0].medal, Some(Medal::Gold));
        assert_eq!(projection.podium[2].medal, Some(Medal::Bronze));
        assert_eq!(projection.contenders[0].medal, None);
        assert_eq!(projection.contenders[0].rank, 4);
    }

    #[test]
    fn test_keyword_is_case_insensitive_on_either_fighter() {
        let filter = RankingFilter {
            keyword: Some("asakura".to_string()),
            ..Default::default()
        };

        let projection = project_ranking(&sample(), &filter);
        assert_eq!(ids(&projection.podium), vec![1]);

        let filter = RankingFilter {
            keyword: Some("OUGI".to_string()),
            ..Default::default()
        };
        let projection = project_ranking(&sample(), &filter);
        assert_eq!(ids(&projection.podium), vec![2]);
    }

    #[test]
    fn test_keyword_property_holds_for_every_result() {
        let cards = sample();
        for keyword in ["a", "ka", "SAKI", "zzz", "i"] {
            let filter = RankingFilter {
                keyword: Some(keyword.to_string()),
                ..Default::default()
            };
            let projection = project_ranking(&cards, &filter);
            let needle = keyword.to_lowercase();
            for ranked in projection
                .podium
                .iter()
                .chain(&projection.contenders)
                .chain(&projection.remainder)
            {
                assert!(
                    ranked.card.fighter1.name.to_lowercase().contains(&needle)
                        || ranked.card.fighter2.name.to_lowercase().contains(&needle)
                );
            }
        }
    }

    #[test]
    fn test_filters_combine() {
        let filter = RankingFilter {
            organization: Some("RIZIN".to_string()),
            weight_class: Some("Featherweight".to_string()),
            keyword: None,
            gender: Some(Gender::Male),
        };

        let projection = project_ranking(&sample(), &filter);
        assert_eq!(ids(&projection.podium), vec![4, 1]);

        let filter = RankingFilter {
            organization: Some("RIZIN".to_string()),
            gender: Some(Gender::Female),
            ..Default::default()
        };
        let projection = project_ranking(&sample(), &filter);
        assert_eq!(ids(&projection.podium), vec![3]);
    }

    #[test]
    fn test_gender_requires_both_fighters() {
        let mut mixed = card(9, ("A", "B"), "RIZIN", "Open", Gender::Male, 100);
        mixed.fighter2.gender = Gender::Female;

        let filter = RankingFilter {
            gender: Some(Gender::Male),
            ..Default::default()
        };
        assert!(!filter.matches(&mixed));
    }

    #[test]
    fn test_normalized() {
        let filter = RankingFilter {
            organization: Some(NO_PREFERENCE.to_string()),
            weight_class: Some("  ".to_string()),
            keyword: Some(" Kai ".to_string()),
            gender: Some(Gender::Male),
        }
        .normalized();

        assert_eq!(filter.organization, None);
        assert_eq!(filter.weight_class, None);
        assert_eq!(filter.keyword.as_deref(), Some("Kai"));
    }

    #[test]
    fn test_remainder_paging() {
        let cards: Vec<FightCardView> = (1..=70)
            .map(|i| card(i, ("A", "B"), "RIZIN", "Open", Gender::Male, 1000 - i))
            .collect();

        let projection = project_ranking(&cards, &RankingFilter::default());
        assert_eq!(projection.podium.len(), 3);
        assert_eq!(projection.contenders.len(), 7);
        assert_eq!(projection.remainder.len(), 60);
        assert_eq!(projection.remainder[0].rank, 11);

        let first = projection.remainder_page(0);
        assert_eq!(first.cards.len(), 30);
        assert_eq!(first.cards[0].rank, 11);
        assert!(first.has_more);

        let second = projection.remainder_page(1);
        assert_eq!(second.cards.len(), 20);
        assert_eq!(second.cards[0].rank, 41);
        assert!(second.has_more);

        let third = projection.remainder_page(2);
        assert_eq!(third.cards.len(), 10);
        assert!(!third.has_more);

        let past_end = projection.remainder_page(9);
        assert!(past_end.cards.is_empty());
        assert!(!past_end.has_more);
    }

    #[test]
    fn test_huge_page_is_empty() {
        let cards: Vec<FightCardView> = (1..=40)
            .map(|i| card(i, ("A", "B"), "RIZIN", "Open", Gender::Male, 1000 - i))
            .collect();
        let projection = project_ranking(&cards, &RankingFilter::default());

        let page = projection.remainder_page(usize::MAX);
        assert_eq!(page.page, usize::MAX);
        assert!(page.cards.is_empty());
        assert!(!page.has_more);

        assert!(RankingProjection::default()
            .remainder_page(usize::MAX)
            .cards
            .is_empty());
    }

    #[test]
    fn test_empty_input() {
        let projection = project_ranking(&[], &RankingFilter::default());
        assert!(projection.is_empty());
        assert!(!projection.remainder_page(0).has_more);
    }
}
