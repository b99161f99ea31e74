use bitflags::bitflags;

bitflags! {
    /// Static list of what a site adapter can do. Callers use it to decide which query fields
    /// and actions are meaningful.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SiteCapabilities: u8 {
        const KEYWORD = 0b0000_0001;
        const RATING = 0b0000_0010;
        const RESOLUTION = 0b0000_0100;
        const SCORE = 0b0000_1000;
        const ACCOUNT = 0b0001_0000;
        const MULTI_KEYWORDS = 0b0010_0000;
        const STAR = 0b0100_0000;
    }
}

/// A sub-feed of a site, selected by `SearchQuery::menu_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    /// Listing this feed needs a logged in account.
    pub requires_account: bool,
}

impl Category {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            requires_account: false,
        }
    }

    pub const fn with_account(name: &'static str) -> Self {
        Self {
            name,
            requires_account: true,
        }
    }
}

/// Every adapter exposes at least this feed at index 0.
pub const LATEST: Category = Category::new("Latest/Search");
