use std::fmt::Write;

use crate::{progress::BackendMode, session::SHORTCUTS};

use super::{escape, FilterCriteria, StatusFilter, View};

/// Confirmation asked before wiping the progress.
pub fn reset_prompt(mode: BackendMode) -> String {
    match mode {
        BackendMode::Shared => "⚠️ You are about to reset the SHARED progress!\n\n\
             🌐 This affects EVERY player of the challenge!\n\n\
             This cannot be undone. Continue?"
            .to_owned(),
        BackendMode::Local => "⚠️ You are about to reset your local progress!\n\n\
             💾 Only the progress saved on this device is affected.\n\n\
             This cannot be undone. Continue?"
            .to_owned(),
    }
}

pub fn reset_done_message() -> &'static str {
    "✅ Progress reset!"
}

/// The full document served at `/`.
pub fn page(
    view: &View,
    categories: &[String],
    criteria: &FilterCriteria,
    mode: BackendMode,
) -> String {
    let mut html = String::with_capacity(view.grid.len() + 8 * 1024);
    html.push_str(HEAD);

    let mode_label = match mode {
        BackendMode::Shared => "🌐 Shared progress",
        BackendMode::Local => "💾 Local progress",
    };
    let _ = write!(
        html,
        r#"<header><h1>✨ Shiny Dex</h1><p class="mode">{mode_label}</p><div class="stats"><span id="caught-count">{caught}</span> / <span id="total-count">{total}</span> · <span id="percentage">{percentage}%</span></div><div class="progress"><div id="progress-bar" style="width: {width}"></div></div></header>"#,
        caught = view.stats.caught,
        total = view.stats.total,
        percentage = view.stats.percentage,
        width = view.stats.progress_width(),
    );

    let _ = write!(
        html,
        r#"<section class="controls"><input id="search-input" type="search" placeholder="Search by name or number (Ctrl+K)" value="{query}" autocomplete="off"><select id="type-filter"><option value="all">All types</option>"#,
        query = escape(&criteria.query),
    );
    for category in categories {
        let selected = match criteria.category.as_value() == category.as_str() {
            true => " selected",
            false => "",
        };
        let category = escape(category);
        let _ = write!(
            html,
            r#"<option value="{category}"{selected}>{category}</option>"#
        );
    }
    html.push_str(r#"</select><select id="status-filter">"#);
    for (status, label) in [
        (StatusFilter::All, "All"),
        (StatusFilter::Caught, "Caught"),
        (StatusFilter::Uncaught, "Not caught"),
    ] {
        let value = match status {
            StatusFilter::All => "all",
            StatusFilter::Caught => "caught",
            StatusFilter::Uncaught => "uncaught",
        };
        let selected = match criteria.status == status {
            true => " selected",
            false => "",
        };
        let _ = write!(
            html,
            r#"<option value="{value}"{selected}>{label}</option>"#
        );
    }
    html.push_str(
        r#"</select><button id="export-btn">Export</button><label class="import">Import<input id="import-input" type="file" accept="application/json"></label><button id="reset-btn">Reset</button></section>"#,
    );

    let _ = write!(
        html,
        r#"<main id="pokemon-grid" class="pokemon-grid">{grid}</main>"#,
        grid = view.grid
    );

    let shortcuts = serde_json::to_string(&SHORTCUTS).unwrap_or_else(|_| "[]".to_owned());
    let prompt = serde_json::to_string(&reset_prompt(mode)).unwrap_or_default();
    let _ = write!(
        html,
        "<script>const SHORTCUTS = {shortcuts}; const RESET_PROMPT = {prompt};</script>"
    );
    html.push_str("<script>");
    html.push_str(SCRIPT);
    html.push_str("</script></body></html>");
    html
}

const HEAD: &str = r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>Shiny Dex</title><style>
body { font-family: system-ui, sans-serif; margin: 0; background: #14161f; color: #f1f1f1; }
header, .controls { padding: 1rem 2rem; }
.progress { background: #2a2d3a; border-radius: 6px; height: 10px; overflow: hidden; }
#progress-bar { background: linear-gradient(90deg, #f7d02c, #ee8130); height: 100%; transition: width 0.3s; }
.controls { display: flex; flex-wrap: wrap; gap: 0.5rem; }
.import input { display: none; }
.pokemon-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 1rem; padding: 1rem 2rem; }
.pokemon-card { background: #22252f; border-radius: 12px; padding: 0.8rem; cursor: pointer; opacity: 0.6; }
.pokemon-card.caught { opacity: 1; box-shadow: 0 0 12px #f7d02c; }
.shiny-indicator { float: right; visibility: hidden; }
.pokemon-card.caught .shiny-indicator { visibility: visible; }
.type-badge { display: inline-block; margin-right: 0.3rem; padding: 0.1rem 0.5rem; border-radius: 8px; background: #3a3f52; font-size: 0.8rem; }
.empty-state { grid-column: 1 / -1; text-align: center; padding: 3rem; }
.empty-state-icon { font-size: 3rem; }
@keyframes fadeIn { from { opacity: 0; transform: scale(0.9); } to { opacity: 1; transform: scale(1); } }
</style></head><body>"#;

const SCRIPT: &str = r#"
const post = (url, body) => fetch(url, {
  method: 'POST',
  headers: { 'Content-Type': 'application/json' },
  body: body === undefined ? undefined : JSON.stringify(body),
});

function applyView(view) {
  document.getElementById('pokemon-grid').innerHTML = view.grid;
  document.getElementById('caught-count').textContent = view.stats.caught;
  document.getElementById('total-count').textContent = view.stats.total;
  document.getElementById('percentage').textContent = view.stats.percentage + '%';
  document.getElementById('progress-bar').style.width = view.stats.percentage + '%';
  if (view.celebrate !== undefined) {
    const card = document.querySelector(`[data-id="${view.celebrate}"]`);
    if (card) {
      card.style.animation = 'none';
      setTimeout(() => { card.style.animation = 'fadeIn 0.5s ease-out'; }, 10);
    }
  }
}

async function reset() {
  if (!confirm(RESET_PROMPT)) return;
  const done = await post('/api/reset', { confirmed: true });
  const body = await done.json();
  alert(body.message || body.error);
}

document.getElementById('pokemon-grid').addEventListener('click', (e) => {
  const card = e.target.closest('.pokemon-card');
  if (card) post(`/api/toggle/${card.dataset.id}`);
});
document.getElementById('search-input').addEventListener('input', (e) => {
  post('/api/search', { query: e.target.value });
});
document.getElementById('type-filter').addEventListener('change', (e) => {
  post('/api/filter', { category: e.target.value });
});
document.getElementById('status-filter').addEventListener('change', (e) => {
  post('/api/filter', { status: e.target.value });
});
document.getElementById('reset-btn').addEventListener('click', reset);
document.getElementById('export-btn').addEventListener('click', () => {
  window.location = '/api/export';
});
document.getElementById('import-input').addEventListener('change', async (e) => {
  const file = e.target.files[0];
  if (!file) return;
  const resp = await fetch('/api/import', { method: 'POST', body: await file.text() });
  const body = await resp.json();
  alert(resp.ok ? `✅ ${body.count} Pokémon imported` : `❌ ${body.error}`);
  e.target.value = '';
});

document.addEventListener('keydown', async (e) => {
  const chord = { key: e.key, ctrl: e.ctrlKey, meta: e.metaKey, shift: e.shiftKey };
  const known = SHORTCUTS.some((s) => (chord.ctrl || chord.meta)
    && s.key === chord.key.toLowerCase() && s.shift === chord.shift);
  if (!known) return;
  e.preventDefault();
  const resp = await post('/api/key', chord);
  const reply = await resp.json();
  if (reply.action === 'focusSearch') {
    document.getElementById('search-input').focus();
  } else if (reply.action === 'reset') {
    reset();
  }
});

new EventSource('/api/events').addEventListener('view', (e) => applyView(JSON.parse(e.data)));
"#;
