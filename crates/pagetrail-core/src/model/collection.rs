use serde::{Deserialize, Serialize};

use crate::errors::{HistoryError, Result};

/// Field holding a row's stable identifier.
pub const ID_KEY: &str = "id";

/// Field holding a row's explicit position in an ordered collection.
pub const POSITION_KEY: &str = "position";

/// Field holding the scalar of a value-set row.
pub const VALUE_KEY: &str = "value";

/// Child collections hanging off a page.
///
/// Declaration order matters: collections that others reference come first,
/// so iterating [`CollectionKind::ALL`] visits parents before children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Categories,
    Links,
    SocialIcons,
    Labels,
    BackgroundColors,
    AccentColors,
}

/// How rows of a collection are identified and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionShape {
    /// Rows carry a stable id and an explicit position; diffed by id.
    Ordered,
    /// Rows have no caller-stable id and are replaced wholesale on each write.
    Unordered,
    /// Rows are bare scalar values; diffed as a set.
    ValueSet,
}

/// A field in one collection that holds the id of a row in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub target: CollectionKind,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 6] = [
        CollectionKind::Categories,
        CollectionKind::Links,
        CollectionKind::SocialIcons,
        CollectionKind::Labels,
        CollectionKind::BackgroundColors,
        CollectionKind::AccentColors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Categories => "categories",
            CollectionKind::Links => "links",
            CollectionKind::SocialIcons => "social_icons",
            CollectionKind::Labels => "labels",
            CollectionKind::BackgroundColors => "background_colors",
            CollectionKind::AccentColors => "accent_colors",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        CollectionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| HistoryError::UnknownCollection {
                name: name.to_string(),
            })
    }

    pub fn shape(&self) -> CollectionShape {
        match self {
            CollectionKind::Categories | CollectionKind::Links | CollectionKind::SocialIcons => {
                CollectionShape::Ordered
            }
            CollectionKind::Labels => CollectionShape::Unordered,
            CollectionKind::BackgroundColors | CollectionKind::AccentColors => {
                CollectionShape::ValueSet
            }
        }
    }

    /// The foreign-key field this collection carries, if any.
    pub fn reference(&self) -> Option<Reference> {
        match self {
            CollectionKind::Links => Some(Reference {
                field: "category_id",
                target: CollectionKind::Categories,
            }),
            _ => None,
        }
    }

    /// True when some other collection points at rows of this one.
    pub fn is_referenced(&self) -> bool {
        CollectionKind::ALL
            .iter()
            .filter_map(|k| k.reference())
            .any(|r| r.target == *self)
    }

    /// Singular noun used in summaries.
    pub fn singular(&self) -> &'static str {
        match self {
            CollectionKind::Categories => "category",
            CollectionKind::Links => "link",
            CollectionKind::SocialIcons => "social icon",
            CollectionKind::Labels => "label",
            CollectionKind::BackgroundColors => "background color",
            CollectionKind::AccentColors => "accent color",
        }
    }

    /// Plural noun used in summaries.
    pub fn plural(&self) -> &'static str {
        match self {
            CollectionKind::Categories => "categories",
            CollectionKind::Links => "links",
            CollectionKind::SocialIcons => "social icons",
            CollectionKind::Labels => "labels",
            CollectionKind::BackgroundColors => "background colors",
            CollectionKind::AccentColors => "accent colors",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for kind in CollectionKind::ALL {
            assert_eq!(CollectionKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(CollectionKind::parse("widgets").is_err());
    }

    #[test]
    fn test_referenced_collections_precede_referrers() {
        for (i, kind) in CollectionKind::ALL.iter().enumerate() {
            if let Some(r) = kind.reference() {
                let target_pos = CollectionKind::ALL
                    .iter()
                    .position(|k| *k == r.target)
                    .unwrap();
                assert!(target_pos < i, "{} must come after {}", kind, r.target);
            }
        }
    }

    #[test]
    fn test_categories_are_referenced_by_links() {
        assert!(CollectionKind::Categories.is_referenced());
        assert!(!CollectionKind::Links.is_referenced());
        assert_eq!(
            CollectionKind::Links.reference().map(|r| r.field),
            Some("category_id")
        );
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for kind in CollectionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
