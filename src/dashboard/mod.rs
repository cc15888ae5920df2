use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::{AnalysisEngine, Autopilot};
use crate::prediction::PredictionResult;
use crate::schedule::{LeagueSelector, Match, TimePeriod};
use crate::state::settings::{AppSettings, SettingsPatch};
use crate::state::AppCore;

#[derive(Clone)]
pub struct AppState {
    pub core: AppCore,
    pub engine: AnalysisEngine,
    pub autopilot: Autopilot,
}

/// Build the Axum router for the dashboard and JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/board", get(board_handler))
        .route("/api/matches/:id/analyze", post(analyze_handler))
        .route("/api/predictions/clear", post(clear_handler))
        .route("/api/settings", get(settings_handler).put(update_settings_handler))
        .route("/api/logs", get(logs_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn index_handler() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

#[derive(Debug, Deserialize)]
struct BoardParams {
    date: Option<NaiveDate>,
    league: Option<String>,
    q: Option<String>,
    period: Option<TimePeriod>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BoardEntry {
    #[serde(flatten)]
    fixture: Match,
    prediction: Option<PredictionResult>,
    in_flight: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BoardResponse {
    date: NaiveDate,
    league: LeagueSelector,
    query: String,
    period: TimePeriod,
    status: String,
    autopilot: bool,
    total: usize,
    analyzed: usize,
    matches: Vec<BoardEntry>,
}

/// GET /api/board?date=&league=&q=&period=
///
/// Parameters that are present update the stored view selection — the
/// autopilot scans the same slice the user is looking at. Absent parameters
/// keep their current values.
async fn board_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BoardParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let league = match params.league.as_deref() {
        Some(raw) => Some(
            LeagueSelector::parse(raw)
                .ok_or((StatusCode::BAD_REQUEST, format!("unknown league '{raw}'")))?,
        ),
        None => None,
    };

    state
        .core
        .set_view(params.date, league, params.q, params.period);

    let view = state.core.view();
    let entries = state.core.board_entries();
    let settings = state.core.settings();
    let analyzed = entries
        .iter()
        .filter(|(_, prediction, _)| prediction.is_some())
        .count();

    let response = BoardResponse {
        date: view.date,
        league: view.league,
        query: view.query,
        period: view.period,
        status: state.core.status(),
        autopilot: settings.autopilot,
        total: entries.len(),
        analyzed,
        matches: entries
            .into_iter()
            .map(|(fixture, prediction, in_flight)| BoardEntry {
                fixture,
                prediction,
                in_flight,
            })
            .collect(),
    };
    Ok(Json(response))
}

/// POST /api/matches/:id/analyze
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(m) = state.core.find_match(&id) else {
        return Err((StatusCode::NOT_FOUND, format!("unknown match '{id}'")));
    };
    if state.core.is_in_flight(&id) {
        return Err((StatusCode::CONFLICT, "analysis already in flight".to_string()));
    }

    state.engine.spawn_analysis(m);
    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "status": "started" }))))
}

/// POST /api/predictions/clear
async fn clear_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.core.clear_predictions();
    state.core.push_log("Prediction cache flushed");
    Json(serde_json::json!({ "status": "cleared" }))
}

/// GET /api/settings
async fn settings_handler(State(state): State<Arc<AppState>>) -> Json<AppSettings> {
    Json(state.core.settings())
}

/// PUT /api/settings — partial merge; persists and re-syncs the autopilot so
/// enable/disable and speed changes take effect immediately.
async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SettingsPatch>,
) -> Json<AppSettings> {
    let settings = state.core.update_settings(|s| patch.apply(s));
    state.autopilot.sync();
    Json(settings)
}

/// GET /api/logs
async fn logs_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.core.logs())
}

/// Embedded single-file dashboard (HTML + CSS + JS).
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Matchscout</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --amber: #ffb020;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  .badge { padding: .2rem .6rem; border-radius: 4px; font-size: .75rem; font-weight: 700; text-transform: uppercase; }
  .badge.on { background: var(--green); color: #000; }
  .badge.off { background: var(--border); color: var(--muted); }
  #status-line { margin-left: auto; color: var(--accent); font-size: .8rem; }
  main { padding: 1.5rem 2rem; display: grid; grid-template-columns: 280px 1fr; gap: 1.5rem; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1rem; }
  .panel h2 { font-size: .8rem; text-transform: uppercase; color: var(--muted); letter-spacing: .06em; margin-bottom: .7rem; }
  .controls { display: flex; flex-direction: column; gap: 1rem; align-self: start; }
  .row { display: flex; gap: .4rem; flex-wrap: wrap; }
  button, select, input[type=text] {
    background: var(--bg); color: var(--text); border: 1px solid var(--border);
    border-radius: 6px; padding: .45rem .7rem; font-size: .8rem; cursor: pointer;
  }
  input[type=text] { width: 100%; cursor: text; }
  select { width: 100%; }
  button:hover { border-color: var(--accent); }
  button.active { background: var(--accent); border-color: var(--accent); color: #fff; }
  label.toggle { display: flex; align-items: center; gap: .5rem; font-size: .8rem; color: var(--muted); }
  #grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(270px, 1fr)); gap: 1rem; align-self: start; }
  .match-card { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1rem; }
  .match-card .teams { font-weight: 700; margin-bottom: .2rem; }
  .match-card .meta { color: var(--muted); font-size: .75rem; margin-bottom: .6rem; }
  .probbar { display: flex; height: 8px; border-radius: 4px; overflow: hidden; margin-bottom: .4rem; }
  .probbar .home { background: var(--green); }
  .probbar .draw { background: var(--amber); }
  .probbar .away { background: var(--red); }
  .probs { display: flex; justify-content: space-between; font-size: .75rem; color: var(--muted); margin-bottom: .5rem; }
  .bet { font-size: .8rem; color: var(--accent); margin-bottom: .5rem; }
  .sources { font-size: .7rem; }
  .sources a { color: var(--muted); display: block; text-decoration: none; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
  .sources a:hover { color: var(--accent); }
  #logs { font-family: monospace; font-size: .72rem; color: var(--muted); max-height: 180px; overflow-y: auto; }
  .empty { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; grid-column: 1/-1; }
  .spin { color: var(--accent); font-size: .8rem; }
</style>
</head>
<body>
<header>
  <h1>⚽ Matchscout</h1>
  <span class="badge off" id="auto-badge">Autopilot</span>
  <span id="status-line">–</span>
</header>

<main>
  <div class="controls">
    <div class="panel">
      <h2>Date</h2>
      <div class="row">
        <button onclick="shiftDate(-1)">◀</button>
        <button onclick="resetDate()">Today</button>
        <button onclick="shiftDate(1)">▶</button>
        <span id="date-label" style="align-self:center;font-size:.8rem;color:var(--muted)"></span>
      </div>
    </div>
    <div class="panel">
      <h2>Window</h2>
      <div class="row" id="period-row">
        <button data-period="all" class="active">All</button>
        <button data-period="morning">Morning</button>
        <button data-period="afternoon">Afternoon</button>
        <button data-period="evening">Evening</button>
      </div>
    </div>
    <div class="panel">
      <h2>League</h2>
      <select id="league-select"><option value="all">All leagues</option></select>
    </div>
    <div class="panel">
      <h2>Search</h2>
      <input type="text" id="search" placeholder="Find a club...">
    </div>
    <div class="panel">
      <h2>Engine</h2>
      <label class="toggle"><input type="checkbox" id="autopilot"> Autopilot</label>
      <label class="toggle"><input type="checkbox" id="turbo"> Turbo ticks</label>
      <label class="toggle"><input type="checkbox" id="injuries"> Weigh injuries</label>
      <label class="toggle"><input type="checkbox" id="hw-accel"> GPU rendering</label>
      <label class="toggle">Risk
        <select id="risk">
          <option value="conservative">Conservative</option>
          <option value="balanced" selected>Balanced</option>
          <option value="aggressive">Aggressive</option>
        </select>
      </label>
      <label class="toggle">Model
        <select id="model">
          <option value="gemini-3-flash-preview">Gemini 3 Flash</option>
          <option value="gemini-3-pro-preview">Gemini 3 Pro</option>
        </select>
      </label>
      <button onclick="clearCache()" style="margin-top:.6rem">Flush prediction cache</button>
    </div>
    <div class="panel">
      <h2>Activity</h2>
      <div id="logs"></div>
    </div>
  </div>

  <div id="grid"><div class="empty">Loading…</div></div>
</main>

<script>
const LEAGUES = [
  ["champions-league","Champions League"],["europa-league","Europa League"],
  ["premier-league","Premier League"],["la-liga","La Liga"],["serie-a","Serie A"],
  ["bundesliga","Bundesliga"],["ligue1","Ligue 1"],["liga-portugal","Liga Portugal"],
  ["eredivisie","Eredivisie"],["belgian-pro","Pro League"],["super-lig","Süper Lig"],
  ["greek-super-league","Super League GR"],["scottish-prem","Premiership"],
];
const sel = document.getElementById('league-select');
for (const [slug, name] of LEAGUES) {
  const o = document.createElement('option');
  o.value = slug; o.textContent = name;
  sel.appendChild(o);
}

let currentDate = null;  // set from the first board response
let pending = {};        // params to send with the next poll

function param(k, v) { pending[k] = v; loadBoard(); }

sel.onchange = () => param('league', sel.value);
document.getElementById('period-row').querySelectorAll('button').forEach(b => {
  b.onclick = () => {
    document.querySelectorAll('#period-row button').forEach(x => x.classList.remove('active'));
    b.classList.add('active');
    param('period', b.dataset.period);
  };
});

// Search is debounced 300 ms before it affects filtering.
let searchTimer = null;
document.getElementById('search').addEventListener('input', e => {
  clearTimeout(searchTimer);
  searchTimer = setTimeout(() => param('q', e.target.value), 300);
});

function shiftDate(days) {
  if (!currentDate) return;
  const d = new Date(currentDate + 'T00:00:00Z');
  d.setUTCDate(d.getUTCDate() + days);
  param('date', d.toISOString().slice(0, 10));
}
function resetDate() { param('date', new Date().toISOString().slice(0, 10)); }

async function clearCache() { await fetch('/api/predictions/clear', { method: 'POST' }); loadBoard(); }

async function analyze(id) {
  await fetch(`/api/matches/${id}/analyze`, { method: 'POST' });
  loadBoard();
}

function card(entry) {
  const p = entry.prediction;
  let body;
  if (entry.inFlight) {
    body = '<div class="spin">Analyzing…</div>';
  } else if (p) {
    const srcs = (p.sources || []).map(s =>
      `<a href="${s.uri}" target="_blank" rel="noopener">↗ ${s.title}</a>`).join('');
    body = `
      <div class="probbar">
        <div class="home" style="width:${p.homeWinProb}%"></div>
        <div class="draw" style="width:${p.drawProb}%"></div>
        <div class="away" style="width:${p.awayWinProb}%"></div>
      </div>
      <div class="probs"><span>H ${p.homeWinProb}%</span><span>D ${p.drawProb}%</span><span>A ${p.awayWinProb}%</span></div>
      <div class="bet">▸ ${p.recommendedBet} · conf ${Math.round(p.confidence)}</div>
      <details>
        <summary style="cursor:pointer;font-size:.75rem;color:var(--muted)">Details</summary>
        <p style="font-size:.75rem;margin:.4rem 0">${p.reasoning}</p>
        <p style="font-size:.72rem;color:var(--muted)">${(p.keyFactors || []).join(' · ')}</p>
      </details>
      <div class="sources">${srcs}</div>`;
  } else {
    body = `<button onclick="analyze('${entry.id}')">Analyze</button>`;
  }
  return `<div class="match-card">
    <div class="teams">${entry.homeTeam} vs ${entry.awayTeam}</div>
    <div class="meta">${entry.league} · ${entry.date} ${entry.kickoff}</div>
    ${body}
  </div>`;
}

async function loadBoard() {
  const qs = new URLSearchParams(pending).toString();
  pending = {};
  const r = await fetch('/api/board' + (qs ? '?' + qs : ''));
  if (!r.ok) return;
  const b = await r.json();
  currentDate = b.date;
  document.getElementById('date-label').textContent = b.date;
  document.getElementById('status-line').textContent = b.status;
  const badge = document.getElementById('auto-badge');
  badge.textContent = 'Autopilot ' + (b.autopilot ? 'ON' : 'OFF');
  badge.className = 'badge ' + (b.autopilot ? 'on' : 'off');
  sel.value = b.league;
  const grid = document.getElementById('grid');
  grid.innerHTML = b.matches.length
    ? b.matches.map(card).join('')
    : '<div class="empty">No fixtures in this window</div>';
}

async function loadSettings() {
  const r = await fetch('/api/settings');
  if (!r.ok) return;
  const s = await r.json();
  document.getElementById('autopilot').checked = s.autopilot;
  document.getElementById('turbo').checked = s.autopilotSpeed === 'turbo';
  document.getElementById('injuries').checked = s.includeInjuries;
  document.getElementById('hw-accel').checked = s.hardwareAcceleration;
  document.getElementById('risk').value = s.riskLevel;
  document.getElementById('model').value = s.aiModel;
  document.body.style.filter = s.hardwareAcceleration ? '' : 'none';
}

async function putSettings(patch) {
  await fetch('/api/settings', {
    method: 'PUT',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(patch),
  });
  loadSettings();
}
document.getElementById('autopilot').onchange = e => putSettings({ autopilot: e.target.checked });
document.getElementById('turbo').onchange = e => putSettings({ autopilotSpeed: e.target.checked ? 'turbo' : 'normal' });
document.getElementById('injuries').onchange = e => putSettings({ includeInjuries: e.target.checked });
document.getElementById('hw-accel').onchange = e => putSettings({ hardwareAcceleration: e.target.checked });
document.getElementById('risk').onchange = e => putSettings({ riskLevel: e.target.value });
document.getElementById('model').onchange = e => putSettings({ aiModel: e.target.value });

async function loadLogs() {
  const r = await fetch('/api/logs');
  if (!r.ok) return;
  const logs = await r.json();
  const el = document.getElementById('logs');
  el.innerHTML = logs.map(l => `<div>&gt;&gt; ${l}</div>`).join('');
  el.scrollTop = el.scrollHeight;
}

loadSettings();
loadBoard();
loadLogs();
setInterval(() => { loadBoard(); loadLogs(); }, 4000);
</script>
</body>
</html>"#;
