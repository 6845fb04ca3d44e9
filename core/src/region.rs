//! Player region, derived from the CRM locale/translation tag.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Es,
    Br,
    Int,
}

impl Region {
    /// Derive the region from a translation tag such as `pt_BR` or `es_MX`.
    /// Missing or unrecognized tags fall back to international.
    pub fn from_translation(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Region::Int;
        };
        match tag.trim().to_lowercase().as_str() {
            "es_ar" | "es_es" | "es_la" | "es_mx" | "es" => Region::Es,
            "pt_br" | "pt-br" | "pt" => Region::Br,
            _ => Region::Int,
        }
    }

    /// Stable storage code. This is what goes into the database.
    pub fn code(&self) -> &'static str {
        match self {
            Region::Es => "es",
            Region::Br => "br",
            Region::Int => "int",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "es" => Some(Region::Es),
            "br" => Some(Region::Br),
            "int" => Some(Region::Int),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Region::Es => "Spanish",
            Region::Br => "Brazil",
            Region::Int => "International",
        }
    }

    pub const ALL: [Region; 3] = [Region::Es, Region::Br, Region::Int];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_tags_map_to_regions() {
        assert_eq!(Region::from_translation(Some("pt_BR")), Region::Br);
        assert_eq!(Region::from_translation(Some(" es_MX ")), Region::Es);
        assert_eq!(Region::from_translation(Some("en_US")), Region::Int);
        assert_eq!(Region::from_translation(None), Region::Int);
    }

    #[test]
    fn codes_round_trip() {
        for region in Region::ALL {
            assert_eq!(Region::from_code(region.code()), Some(region));
        }
    }
}
