//! Plain-text rendering of an enriched snapshot for the terminal.
//!
//! This is the inspector's debug view at the prompt-builder boundary: the
//! same `EnrichedSnapshot` + `ChangeSet` a prompt builder would consume,
//! printed for a human.

use advisor_core::format::trim_number;
use advisor_core::EnrichedSnapshot;

pub fn render_summary(snapshot: &EnrichedSnapshot) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!("=== CHANGES ===\n{}", snapshot.changes.summary()));

    let mut state_lines = vec![format!(
        "Turn {} | Era: {} | {} ({})",
        snapshot.turn, snapshot.era, snapshot.civilization, snapshot.leader
    )];
    state_lines.push(format!(
        "Gold: {} ({}/turn) | Science: {}/turn | Culture: {}/turn",
        trim_number(snapshot.raw.gold),
        trim_number(snapshot.raw.gold_per_turn),
        trim_number(snapshot.raw.science_per_turn),
        trim_number(snapshot.raw.culture_per_turn)
    ));
    if snapshot.raw.faith_per_turn != 0.0 || snapshot.raw.faith_balance != 0.0 {
        state_lines.push(format!(
            "Faith: {}/turn (balance {})",
            trim_number(snapshot.raw.faith_per_turn),
            trim_number(snapshot.raw.faith_balance)
        ));
    }
    if let Some(tech) = snapshot.raw.tech.as_deref() {
        state_lines.push(format!(
            "Researching: {} ({}%)",
            advisor_core::normalize(tech),
            trim_number(snapshot.raw.tech_pct)
        ));
    }
    if let Some(civic) = snapshot.raw.civic.as_deref() {
        state_lines.push(format!(
            "Developing: {} ({}%)",
            advisor_core::normalize(civic),
            trim_number(snapshot.raw.civic_pct)
        ));
    }
    sections.push(format!("=== STATE ===\n{}", state_lines.join("\n")));

    let mut decision_lines: Vec<String> = Vec::new();
    if snapshot.decisions.has_settler {
        match snapshot.decisions.settler_location {
            Some(coord) => decision_lines.push(format!("Settler active at {coord}")),
            None => decision_lines.push("Settler active".to_string()),
        }
    }
    if snapshot.needs_tech {
        decision_lines.push("Choose tech: nothing being researched".to_string());
    }
    if snapshot.needs_civic {
        decision_lines.push("Choose civic: nothing being developed".to_string());
    }
    if !snapshot.decisions.cities_idle.is_empty() {
        decision_lines.push(format!(
            "Set production: {} idle",
            snapshot.decisions.cities_idle.join(", ")
        ));
    }
    if !snapshot.decisions.units_with_moves.is_empty() {
        decision_lines.push(format!(
            "{} unit(s) with moves left",
            snapshot.decisions.units_with_moves.len()
        ));
    }
    if snapshot.decisions.threat_count > 0 {
        decision_lines.push(format!(
            "{} hostile unit(s) visible",
            snapshot.decisions.threat_count
        ));
    }
    if decision_lines.is_empty() {
        decision_lines.push("No immediate decisions required.".to_string());
    }
    sections.push(format!("=== DECISIONS ===\n{}", decision_lines.join("\n")));

    if !snapshot.cities.is_empty() {
        let mut city_lines = vec![format!("=== CITIES ({}) ===", snapshot.cities.len())];
        for city in &snapshot.cities {
            let status = if city.needs_production {
                "NEEDS PRODUCTION".to_string()
            } else {
                let turns = city
                    .production_turns
                    .map(|t| format!(" ({t}t)"))
                    .unwrap_or_default();
                format!(
                    "Building {}{}",
                    city.production.as_deref().unwrap_or("?"),
                    turns
                )
            };
            let growth = city
                .growth_turns
                .map(|t| format!(" | Growth in {t}t"))
                .unwrap_or_default();
            let mut line = format!("{} (pop {}): {}{}", city.name, city.population, status, growth);
            if let Some(offset) = city.offset.filter(|_| !city.is_capital) {
                line.push_str(&format!(" | at [{:+},{:+}]", offset.x, offset.y));
            }
            city_lines.push(line);
        }
        sections.push(city_lines.join("\n"));
    }

    if !snapshot.threats.is_empty() {
        let mut threat_lines = vec![format!("=== THREATS ({}) ===", snapshot.threats.len())];
        for threat in &snapshot.threats {
            threat_lines.push(threat.display.clone());
        }
        sections.push(threat_lines.join("\n"));
    }

    sections.push(snapshot.mini_map.to_string());

    sections.join("\n\n")
}
