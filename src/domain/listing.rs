//! Filter, sort and paginate NFT snapshots for display

use std::cmp::Ordering;

use super::nft::{Nft, Rarity};

/// Default number of records per page
pub const PAGE_SIZE: usize = 8;

/// Rarity category selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Rarity(Rarity),
}

impl CategoryFilter {
    pub fn matches(&self, nft: &Nft) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Rarity(rarity) => nft.rarity == *rarity,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Rarity(rarity) => rarity.label(),
        }
    }

    /// All -> Common -> ... -> Super Rare -> All
    pub fn next(&self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Rarity(Rarity::Common),
            CategoryFilter::Rarity(Rarity::Common) => CategoryFilter::Rarity(Rarity::Uncommon),
            CategoryFilter::Rarity(Rarity::Uncommon) => CategoryFilter::Rarity(Rarity::Rare),
            CategoryFilter::Rarity(Rarity::Rare) => CategoryFilter::Rarity(Rarity::SuperRare),
            CategoryFilter::Rarity(Rarity::SuperRare) => CategoryFilter::All,
        }
    }

    /// `all`, or anything `Rarity::parse` accepts
    pub fn parse(input: &str) -> Option<Self> {
        let value = input.trim();
        if value.eq_ignore_ascii_case("all") || value == "0" {
            return Some(CategoryFilter::All);
        }
        Rarity::parse(value).map(CategoryFilter::Rarity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    PriceAsc,
    PriceDesc,
    LikesDesc,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::PriceAsc => "Price: Low to High",
            SortKey::PriceDesc => "Price: High to Low",
            SortKey::LikesDesc => "Most Liked",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortKey::PriceAsc => SortKey::PriceDesc,
            SortKey::PriceDesc => SortKey::LikesDesc,
            SortKey::LikesDesc => SortKey::PriceAsc,
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "asc" | "price" | "price-asc" | "low" => Some(SortKey::PriceAsc),
            "desc" | "price-desc" | "high" => Some(SortKey::PriceDesc),
            "likes" | "liked" | "popular" => Some(SortKey::LikesDesc),
            _ => None,
        }
    }

    fn compare(&self, a: &Nft, b: &Nft) -> Ordering {
        match self {
            SortKey::PriceAsc => a.price.total_cmp(&b.price),
            SortKey::PriceDesc => b.price.total_cmp(&a.price),
            SortKey::LikesDesc => b.likes.cmp(&a.likes),
        }
    }
}

/// User-facing query state of one screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub category: CategoryFilter,
    pub search: String,
    pub sort: SortKey,
}

impl ListingQuery {
    /// Category AND text predicate
    pub fn matches(&self, nft: &Nft) -> bool {
        self.category.matches(nft) && nft.matches_text(&self.needle())
    }

    /// Filtered and sorted view; ties keep input order
    pub fn apply<'a>(&self, items: &'a [Nft]) -> Vec<&'a Nft> {
        let needle = self.needle();
        let mut view: Vec<&Nft> = items
            .iter()
            .filter(|nft| self.category.matches(nft) && nft.matches_text(&needle))
            .collect();
        view.sort_by(|a, b| self.sort.compare(a, b));
        view
    }

    fn needle(&self) -> String {
        self.search.trim().to_lowercase()
    }
}

/// 1-based page of `page_size` items; empty for page 0 or past the end
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nft(id: u64, rarity: u8, price: f64, likes: u64, name: &str) -> Nft {
        Nft {
            id,
            owner: "0xowner".into(),
            creator: "0xcreator".into(),
            name: name.into(),
            description: format!("description of {}", name),
            uri: String::new(),
            price,
            for_sale: true,
            rarity: Rarity::from_u64(rarity as u64).unwrap(),
            likes,
        }
    }

    fn ids(view: &[&Nft]) -> Vec<u64> {
        view.iter().map(|n| n.id).collect()
    }

    fn sample() -> Vec<Nft> {
        let rarities = [1, 1, 2, 3, 4, 1, 2, 3, 4, 1];
        rarities
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let name = if i % 3 == 0 { "Dragon" } else { "Cat" };
                nft(i as u64, *r, (10 - i) as f64 * 0.5, (i * 7 % 5) as u64, name)
            })
            .collect()
    }

    #[test]
    fn test_category_filter_selects_exact_rarity() {
        let items = sample();
        let query = ListingQuery {
            category: CategoryFilter::Rarity(Rarity::Common),
            ..Default::default()
        };
        let view = query.apply(&items);
        assert_eq!(view.len(), 4);
        assert!(view.iter().all(|n| n.rarity == Rarity::Common));

        let all = ListingQuery::default().apply(&items);
        assert_eq!(all.len(), items.len());
    }

    #[test]
    fn test_text_filter_is_trimmed_and_case_insensitive() {
        let items = sample();
        let query = ListingQuery {
            search: "  drAGon ".into(),
            ..Default::default()
        };
        let view = query.apply(&items);
        assert_eq!(view.len(), 4);
        assert!(view.iter().all(|n| n.name == "Dragon"));

        let query = ListingQuery {
            search: "description OF cat".into(),
            ..Default::default()
        };
        assert_eq!(query.apply(&items).len(), 6);
    }

    #[test]
    fn test_filters_commute() {
        let items = sample();
        let query = ListingQuery {
            category: CategoryFilter::Rarity(Rarity::Uncommon),
            search: "cat".into(),
            sort: SortKey::PriceAsc,
        };

        let category_first: Vec<u64> = items
            .iter()
            .filter(|n| query.category.matches(n))
            .filter(|n| n.matches_text("cat"))
            .map(|n| n.id)
            .collect();
        let text_first: Vec<u64> = items
            .iter()
            .filter(|n| n.matches_text("cat"))
            .filter(|n| query.category.matches(n))
            .map(|n| n.id)
            .collect();
        assert_eq!(category_first, text_first);

        let mut combined = ids(&query.apply(&items));
        combined.sort();
        let mut expected = category_first;
        expected.sort();
        assert_eq!(combined, expected);
    }

    #[test]
    fn test_sort_by_price() {
        let items = vec![
            nft(1, 1, 5.0, 0, "a"),
            nft(2, 1, 1.0, 0, "b"),
            nft(3, 1, 3.0, 0, "c"),
            nft(4, 1, 2.0, 0, "d"),
        ];
        let asc = ListingQuery::default().apply(&items);
        let prices: Vec<f64> = asc.iter().map(|n| n.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0, 5.0]);

        let desc = ListingQuery {
            sort: SortKey::PriceDesc,
            ..Default::default()
        }
        .apply(&items);
        let mut reversed = ids(&asc);
        reversed.reverse();
        assert_eq!(ids(&desc), reversed);
    }

    #[test]
    fn test_sort_is_stable_and_sorted() {
        let items = vec![
            nft(1, 1, 2.0, 3, "a"),
            nft(2, 1, 1.0, 3, "b"),
            nft(3, 1, 2.0, 9, "c"),
            nft(4, 1, 1.0, 0, "d"),
        ];
        let asc = ListingQuery::default().apply(&items);
        assert_eq!(ids(&asc), vec![2, 4, 1, 3]);
        assert!(asc.windows(2).all(|w| w[0].price <= w[1].price));

        let liked = ListingQuery {
            sort: SortKey::LikesDesc,
            ..Default::default()
        }
        .apply(&items);
        assert_eq!(ids(&liked), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_paginate_partitions_input() {
        let items: Vec<u32> = (0..19).collect();
        let pages = page_count(items.len(), PAGE_SIZE);
        assert_eq!(pages, 3);

        let mut joined = Vec::new();
        for page in 1..=pages {
            joined.extend_from_slice(paginate(&items, page, PAGE_SIZE));
        }
        assert_eq!(joined, items);
        assert_eq!(paginate(&items, 3, PAGE_SIZE).len(), 19 - 2 * PAGE_SIZE);
    }

    #[test]
    fn test_paginate_out_of_range() {
        let items: Vec<u32> = (0..5).collect();
        assert!(paginate(&items, 0, PAGE_SIZE).is_empty());
        assert!(paginate(&items, 2, PAGE_SIZE).is_empty());
        assert_eq!(paginate(&items, 1, PAGE_SIZE), &items[..]);
        assert!(paginate::<u32>(&[], 1, PAGE_SIZE).is_empty());
        assert_eq!(page_count(0, PAGE_SIZE), 0);
        assert_eq!(page_count(16, PAGE_SIZE), 2);
    }

    #[test]
    fn test_category_and_sort_cycle() {
        let mut category = CategoryFilter::All;
        for _ in 0..5 {
            category = category.next();
        }
        assert_eq!(category, CategoryFilter::All);
        assert_eq!(SortKey::LikesDesc.next(), SortKey::PriceAsc);
        assert_eq!(
            CategoryFilter::parse("rare"),
            Some(CategoryFilter::Rarity(Rarity::Rare))
        );
        assert_eq!(CategoryFilter::parse("ALL"), Some(CategoryFilter::All));
        assert_eq!(SortKey::parse("likes"), Some(SortKey::LikesDesc));
    }
}
