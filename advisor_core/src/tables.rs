//! Static lookup tables: the "database" tail of the producer's fallback
//! chains and the glyph vocabulary of the mini-map.

use crate::normalize::title_case;

/// Host era index to display name.
pub fn era_name(index: i64) -> String {
    let name = match index {
        0 => "Ancient",
        1 => "Classical",
        2 => "Medieval",
        3 => "Renaissance",
        4 => "Industrial",
        5 => "Modern",
        6 => "Atomic",
        7 => "Information",
        8 => "Future",
        _ => return format!("Era {index}"),
    };
    name.to_string()
}

/// Unit kind (lowercase, underscored) to two-character map glyph.
pub const UNIT_GLYPHS: &[(&str, &str)] = &[
    ("warrior", "Wr"),
    ("scout", "Sc"),
    ("settler", "St"),
    ("builder", "Bl"),
    ("archer", "Ar"),
    ("slinger", "Sl"),
    ("spearman", "Sp"),
    ("horseman", "Hr"),
    ("knight", "Kn"),
    ("swordsman", "Sw"),
    ("crossbowman", "Xb"),
    ("catapult", "Ca"),
    ("musketman", "Mu"),
    ("cavalry", "Cv"),
    ("infantry", "In"),
    ("tank", "Tk"),
    ("trader", "Tr"),
    ("missionary", "Ms"),
    ("apostle", "Ap"),
    ("great_general", "GG"),
    ("great_admiral", "GA"),
    ("great_prophet", "GP"),
    ("great_scientist", "GS"),
    ("great_engineer", "GE"),
    ("great_merchant", "GM"),
];

/// Glyph for a unit kind, falling back to the first two letters.
pub fn unit_glyph(kind: &str) -> String {
    let key = kind.to_ascii_lowercase().replace(' ', "_");
    for (name, glyph) in UNIT_GLYPHS {
        if *name == key {
            return (*glyph).to_string();
        }
    }
    let short: String = kind.chars().filter(|c| c.is_ascii_alphabetic()).take(2).collect();
    if short.is_empty() {
        "Un".to_string()
    } else {
        title_case(&short)
    }
}

/// Legend labels in fixed importance order; only glyphs actually present on
/// a rendered map are listed.
pub const GLYPH_LEGEND: &[(&str, &str)] = &[
    ("C*", "Capital(0,0)"),
    ("Ct", "City"),
    ("!B", "Barb"),
    ("!E", "Enemy"),
    ("Wr", "Warrior"),
    ("Sc", "Scout"),
    ("St", "Settler"),
    ("Bl", "Builder"),
    ("Ar", "Archer"),
    ("Sl", "Slinger"),
    ("Sp", "Spearman"),
    ("Hr", "Horseman"),
    ("Kn", "Knight"),
    ("Sw", "Swordsman"),
    ("Xb", "Crossbow"),
    ("Ca", "Catapult"),
    ("Mu", "Musket"),
    ("Cv", "Cavalry"),
    ("In", "Infantry"),
    ("Tk", "Tank"),
    ("Tr", "Trader"),
    ("Ms", "Missionary"),
    ("Ap", "Apostle"),
    ("GG", "Gr.General"),
    ("GA", "Gr.Admiral"),
    ("GP", "Gr.Prophet"),
    ("GS", "Gr.Scientist"),
    ("GE", "Gr.Engineer"),
    ("GM", "Gr.Merchant"),
    ("^^", "Mountain"),
    ("/\\", "Hills"),
    ("Fo", "Forest"),
    ("Jg", "Jungle"),
    ("..", "Desert"),
    ("::", "Water"),
    ("Im", "Improved"),
    ("--", "Open"),
    ("??", "Fog"),
];

/// Words marking a tile as carrying a strategic or luxury resource.
pub const RESOURCE_WORDS: &[&str] = &[
    "iron", "horse", "coal", "oil", "uranium", "aluminum", "niter", "spice", "silk", "dye",
    "ivory", "fur", "cotton", "sugar", "wine", "incense", "marble", "copper", "diamond", "jade",
    "silver", "gold", "pearl", "whale", "crab", "fish", "deer", "cattle", "sheep", "stone",
    "rice", "wheat", "maize", "banana", "citrus", "coffee", "tobacco", "tea", "mercury", "salt",
    "amber", "gypsum", "honey", "truffles", "olives", "turtle", "cocoa",
];

/// Terrain features worth keeping through the fog trimmer on their own.
pub const NOTABLE_FEATURES: &[&str] = &[
    "forest",
    "marsh",
    "jungle",
    "rainforest",
    "floodplains",
    "oasis",
    "reef",
];

pub fn mentions_resource(text_lower: &str) -> bool {
    RESOURCE_WORDS.iter().any(|word| text_lower.contains(word))
}

pub fn mentions_notable_feature(text_lower: &str) -> bool {
    NOTABLE_FEATURES.iter().any(|word| text_lower.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_indices_resolve() {
        assert_eq!(era_name(0), "Ancient");
        assert_eq!(era_name(7), "Information");
        assert_eq!(era_name(42), "Era 42");
        assert_eq!(era_name(-1), "Era -1");
    }

    #[test]
    fn unit_glyphs_fall_back_to_initials() {
        assert_eq!(unit_glyph("Warrior"), "Wr");
        assert_eq!(unit_glyph("Great General"), "GG");
        assert_eq!(unit_glyph("Pikeman"), "Pi");
        assert_eq!(unit_glyph("123"), "Un");
    }

    #[test]
    fn legend_glyphs_are_unique_enough_to_render() {
        for (glyph, _) in GLYPH_LEGEND {
            assert_eq!(glyph.chars().count(), 2, "glyph {glyph:?} must be 2 chars");
        }
    }

    #[test]
    fn resource_and_feature_words_match_inside_text() {
        assert!(mentions_resource("plains forest spices"));
        assert!(!mentions_resource("plains hills"));
        assert!(mentions_notable_feature("grassland rainforest"));
        assert!(!mentions_notable_feature("tundra hills"));
    }
}
