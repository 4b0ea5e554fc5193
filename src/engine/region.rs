use serde::{Deserialize, Serialize};

/// Region bucket used for priors, competition multipliers, and calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKey {
    Wirye,
    Bundang,
    Gangnam,
    Seocho,
    Songpa,
    Seongnam,
    Default,
}

impl RegionKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wirye => "Wirye",
            Self::Bundang => "Bundang-gu",
            Self::Gangnam => "Gangnam-gu",
            Self::Seocho => "Seocho-gu",
            Self::Songpa => "Songpa-gu",
            Self::Seongnam => "Seongnam-si",
            Self::Default => "default",
        }
    }
}

struct RegionDef {
    key: RegionKey,
    keywords: &'static [&'static str],
}

/// Ordered most-specific-first; Wirye straddles Songpa and Seongnam, so its
/// keyword must win before the broader district names are tried.
const REGION_DEFS: &[RegionDef] = &[
    RegionDef {
        key: RegionKey::Wirye,
        keywords: &["위례"],
    },
    RegionDef {
        key: RegionKey::Bundang,
        keywords: &["분당구", "분당"],
    },
    RegionDef {
        key: RegionKey::Gangnam,
        keywords: &["강남구"],
    },
    RegionDef {
        key: RegionKey::Seocho,
        keywords: &["서초구"],
    },
    RegionDef {
        key: RegionKey::Songpa,
        keywords: &["송파구"],
    },
    RegionDef {
        key: RegionKey::Seongnam,
        keywords: &["성남시", "성남"],
    },
];

/// Resolve a region from a free-text facility address. Unknown or empty
/// addresses fall back to [`RegionKey::Default`].
pub fn resolve_region(address: &str) -> RegionKey {
    if address.is_empty() {
        return RegionKey::Default;
    }
    for def in REGION_DEFS {
        for keyword in def.keywords {
            if address.contains(keyword) {
                return def.key;
            }
        }
    }
    RegionKey::Default
}
