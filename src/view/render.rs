use std::{collections::BTreeSet, fmt::Write};

use serde::Serialize;

use crate::{catalog::Catalog, documents::Pokemon};

use super::{filter, FilterCriteria, Stats};

/// Everything the page needs to redraw after a state change.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct View {
    /// Inner markup of the grid container.
    pub grid: String,
    pub stats: Stats,

    /// Number of cards in `grid`.
    pub shown: usize,

    /// Id of a card that was just caught.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celebrate: Option<u64>,
}

impl View {
    pub fn build(catalog: &Catalog, caught: &BTreeSet<u64>, criteria: &FilterCriteria) -> Self {
        let entries = filter(catalog, caught, criteria);
        View {
            grid: render_grid(&entries, caught),
            stats: Stats::new(catalog, caught),
            shown: entries.len(),
            celebrate: None,
        }
    }

    /// View shown when the catalog could not be loaded.
    pub fn failed(error: &str) -> Self {
        View {
            grid: render_error(error),
            ..Default::default()
        }
    }
}

/// Grid markup for `entries`, or the empty state when nothing matched.
pub fn render_grid(entries: &[&Pokemon], caught: &BTreeSet<u64>) -> String {
    if entries.is_empty() {
        return render_empty();
    }

    let mut markup = String::new();
    for pokemon in entries {
        render_card(&mut markup, pokemon, caught.contains(&pokemon.id));
    }
    markup
}

pub fn render_card(out: &mut String, pokemon: &Pokemon, caught: bool) {
    let class = match caught {
        true => "pokemon-card caught",
        false => "pokemon-card",
    };
    let _ = write!(
        out,
        r#"<div class="{class}" data-id="{id}"><div class="card-header"><span class="pokemon-number">{number}</span><span class="shiny-indicator">✨</span></div><div class="card-body"><h2 class="pokemon-name">{name}</h2><p class="pokemon-name-en">{name_en}</p><div class="pokemon-types">"#,
        id = pokemon.id,
        number = pokemon.display_number(),
        name = escape(&pokemon.name),
        name_en = escape(&pokemon.name_en),
    );
    for category in &pokemon.types {
        let category = escape(category);
        let _ = write!(
            out,
            r#"<span class="type-badge type-{category}">{category}</span>"#
        );
    }
    let _ = write!(
        out,
        r#"</div></div><div class="card-footer"><p class="pokemon-location">📍 {location}</p></div></div>"#,
        location = escape(&pokemon.location),
    );
}

pub fn render_empty() -> String {
    r#"<div class="empty-state"><div class="empty-state-icon">😢</div><p class="empty-state-text">No Pokémon found</p></div>"#.to_owned()
}

pub fn render_error(error: &str) -> String {
    format!(
        r#"<div class="empty-state error"><div class="empty-state-icon">❌</div><p class="empty-state-text">Failed to load the Pokémon data.<br>{}</p></div>"#,
        escape(error)
    )
}

/// Escapes text for HTML element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
