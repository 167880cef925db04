//! Title/name to URL slug, and the per-namespace slug index.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::hash::Hash;

static STRIPPED_PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\u{2019}'".,!?():]"#)
        .expect("punctuation regex should compile")
});

static NON_ALPHANUMERIC_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9]+").expect("separator regex should compile")
});

/// Derive a lowercase, dash-separated slug from a display name.
///
/// Pure and total: the same input always yields the same slug, and input
/// made only of punctuation yields an empty string.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = STRIPPED_PUNCTUATION.replace_all(lowered.trim(), "");
    let anded = stripped.replace('&', "and");
    NON_ALPHANUMERIC_RUN
        .replace_all(&anded, "-")
        .trim_matches('-')
        .to_string()
}

/// Bidirectional `slug <-> id` map for one namespace.
///
/// Built in input order. When two names produce the same slug the later id
/// wins the `slug -> id` direction; both ids keep their `id -> slug` entry.
#[derive(Debug, Clone)]
pub struct SlugIndex<Id> {
    slug_to_id: HashMap<String, Id>,
    id_to_slug: HashMap<Id, String>,
}

impl<Id> Default for SlugIndex<Id> {
    fn default() -> Self {
        Self {
            slug_to_id: HashMap::new(),
            id_to_slug: HashMap::new(),
        }
    }
}

impl<Id> SlugIndex<Id>
where
    Id: Clone + Eq + Hash,
{
    /// Indexes `(id, name)` rows in order.
    pub fn build<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Id, &'a str)>,
    {
        let mut index = Self::default();
        for (id, name) in rows {
            let slug = slugify(name);
            index.slug_to_id.insert(slug.clone(), id.clone());
            index.id_to_slug.insert(id, slug);
        }
        index
    }

    /// Id currently owning `slug`.
    pub fn id_for(&self, slug: &str) -> Option<&Id> {
        self.slug_to_id.get(slug)
    }

    /// Slug generated for `id`.
    pub fn slug_for(&self, id: &Id) -> Option<&str> {
        self.id_to_slug.get(id).map(String::as_str)
    }

    /// Number of distinct slugs (collisions count once).
    pub fn len(&self) -> usize {
        self.slug_to_id.len()
    }

    /// `true` when nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.slug_to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_titles() {
        assert_eq!(
            slugify("The Empire Strikes Back"),
            "the-empire-strikes-back"
        );
        assert_eq!(slugify("A New Hope: Part I"), "a-new-hope-part-i");
        assert_eq!(slugify("Return of the Jedi"), "return-of-the-jedi");
        assert_eq!(slugify("Obi-Wan Kenobi"), "obi-wan-kenobi");
        assert_eq!(slugify("R2-D2"), "r2-d2");
    }

    #[test]
    fn punctuation_and_ampersand() {
        assert_eq!(slugify("Han & Chewie"), "han-and-chewie");
        assert_eq!(slugify("Padmé's \"Ship\" (1999)"), "padm-s-ship-1999");
        assert_eq!(slugify("Rogue One\u{2019}s Story"), "rogue-ones-story");
        assert_eq!(slugify("  --Wait, what?!--  "), "wait-what");
    }

    #[test]
    fn degenerate_input_is_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
        assert_eq!(slugify("?!.,:()"), "");
    }

    #[test]
    fn idempotent_and_well_formed() {
        let titles = [
            "The Phantom Menace",
            "Attack of the Clones",
            "Revenge of the Sith",
            "A New Hope: Part I",
            "Ki-Adi-Mundi",
            "Beru Whitesun lars",
            "Jabba Desilijic Tiure",
            "IG-88",
            "  Darth   Vader  ",
            "Mon Mothma & Friends!!",
            "Ünïcödé Tïtle",
        ];
        for title in titles {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "not idempotent for {title:?}");
            assert!(!once.chars().any(char::is_whitespace), "{once:?}");
            assert!(!once.chars().any(|c| c.is_ascii_uppercase()), "{once:?}");
            assert!(!once.starts_with('-') && !once.ends_with('-'), "{once:?}");
            assert!(!once.contains("--"), "{once:?}");
        }
    }

    #[test]
    fn collision_keeps_later_id() {
        let index = SlugIndex::build([
            ("first".to_string(), "Star Wars"),
            ("second".to_string(), "star wars!"),
        ]);

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.id_for("star-wars").map(String::as_str),
            Some("second")
        );
        assert_eq!(index.slug_for(&"first".to_string()), Some("star-wars"));
        assert_eq!(index.slug_for(&"second".to_string()), Some("star-wars"));
    }

    #[test]
    fn unknown_slug_is_absent() {
        let index = SlugIndex::build([(1_u32, "A New Hope")]);
        assert_eq!(index.id_for("a-new-hope"), Some(&1));
        assert_eq!(index.id_for("new-hope"), None);
    }
}
