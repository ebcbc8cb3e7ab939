//! Display normalization for the host's verbose identifier strings.
//!
//! The producer forwards identifiers like `BUILDING_MONUMENT` or
//! `CIVIC_CODE_OF_LAWS`; everything the consumer surfaces goes through here
//! first.

/// Category prefixes stripped from identifiers, most specific first.
pub const CATEGORY_PREFIXES: &[&str] = &[
    "GREAT_PERSON_",
    "CIVILIZATION_",
    "IMPROVEMENT_",
    "GOVERNMENT_",
    "PROMOTION_",
    "BUILDING_",
    "DISTRICT_",
    "RESOURCE_",
    "RELIGION_",
    "TERRAIN_",
    "FEATURE_",
    "PROJECT_",
    "BELIEF_",
    "POLICY_",
    "WONDER_",
    "LEADER_",
    "CIVIC_",
    "TECH_",
    "UNIT_",
    "ERA_",
];

/// Convert one identifier to display case: strip the first matching category
/// prefix, replace underscores with spaces, title-case each word.
/// Already-clean strings pass through untouched.
pub fn normalize(identifier: &str) -> String {
    if identifier.is_empty() {
        return String::new();
    }
    let starts_lower = identifier
        .chars()
        .next()
        .map(|c| c.is_lowercase())
        .unwrap_or(false);
    if !identifier.contains('_') || starts_lower {
        return identifier.to_string();
    }

    let mut rest = identifier;
    for prefix in CATEGORY_PREFIXES {
        if let Some(head) = rest.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                rest = &rest[prefix.len()..];
                break;
            }
        }
    }

    title_case(&rest.replace('_', " "))
}

/// Normalize identifier-shaped tokens embedded in a flat display string:
/// `"UNIT_WARRIOR 18,18 100hp 2/2m"` becomes `"Warrior 18,18 100hp 2/2m"`.
/// Tokens that are not SCREAMING_SNAKE identifiers are left alone.
pub fn normalize_in_text(text: &str) -> String {
    text.split(' ')
        .map(normalize_token)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove one trailing exact-match occurrence of `terrain` from `feature`,
/// so names like "Floodplains Grassland" over Grassland do not repeat the
/// underlying terrain. Case-sensitive and anchored at the end; a feature
/// that IS the terrain name is left untouched.
pub fn strip_redundant_terrain(feature: &str, terrain: &str) -> String {
    if terrain.is_empty() || feature == terrain {
        return feature.to_string();
    }
    match feature.strip_suffix(terrain) {
        Some(rest) => {
            let trimmed = rest.trim_end();
            if trimmed.is_empty() {
                feature.to_string()
            } else {
                trimmed.to_string()
            }
        }
        None => feature.to_string(),
    }
}

pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_token(token: &str) -> String {
    if !token.is_ascii() {
        return token.to_string();
    }
    let bytes = token.as_bytes();
    let Some(start) = bytes.iter().position(|b| b.is_ascii_uppercase()) else {
        return token.to_string();
    };
    let core_len = bytes[start..]
        .iter()
        .position(|b| !(b.is_ascii_uppercase() || b.is_ascii_digit() || *b == b'_'))
        .unwrap_or(bytes.len() - start);
    let core = &token[start..start + core_len];
    if is_screaming_snake(core) {
        format!(
            "{}{}{}",
            &token[..start],
            normalize(core),
            &token[start + core_len..]
        )
    } else {
        token.to_string()
    }
}

fn is_screaming_snake(core: &str) -> bool {
    core.len() >= 3
        && core.contains('_')
        && core.starts_with(|c: char| c.is_ascii_uppercase())
        && core.ends_with(|c: char| c.is_ascii_uppercase() || c.is_ascii_digit())
}
