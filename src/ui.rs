use crate::models::{Day, HabitCardView, UserId};

pub fn render_index(user: Option<&UserId>, today: Day, cards: &[HabitCardView]) -> String {
    let user_label = user.map(UserId::as_str).unwrap_or("");
    let initial = serde_json::to_string(cards).unwrap_or_else(|_| "[]".to_string());

    INDEX_HTML
        .replace("{{USER}}", &escape_html(user_label))
        .replace("{{TODAY}}", &today.to_string())
        .replace("{{COUNT}}", &cards.len().to_string())
        .replace("{{INITIAL}}", &escape_script(&initial))
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// keeps `</script>` inside JSON from closing the data block
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habits</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f3f6ec;
      --bg-2: #cfe3c5;
      --ink: #2b2a28;
      --accent: #3f8f5a;
      --accent-2: #2f4858;
      --danger: #c63b2b;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e6f0dc 60%, #f4f7ef 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      justify-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(900px, 100%);
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: end;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    .subtitle {
      margin: 4px 0 0;
      color: #5f5c57;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      color: white;
      background: var(--accent-2);
    }

    button:disabled {
      opacity: 0.6;
      cursor: progress;
    }

    button.done {
      background: var(--accent);
    }

    button.danger {
      background: var(--danger);
    }

    button.ghost {
      background: transparent;
      color: var(--accent-2);
      padding: 4px 10px;
    }

    dialog {
      border: none;
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 24px;
      width: min(420px, 90vw);
    }

    dialog form {
      display: grid;
      gap: 12px;
    }

    input[type="text"] {
      font: inherit;
      padding: 10px 14px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.25);
    }

    .habits {
      display: grid;
      gap: 18px;
    }

    .habit {
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 22px;
      display: grid;
      gap: 14px;
    }

    .habit-head {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
      justify-content: space-between;
    }

    .habit-title {
      font-size: 1.2rem;
      font-weight: 600;
    }

    .habit-actions {
      display: flex;
      gap: 8px;
    }

    .month {
      display: flex;
      align-items: center;
      justify-content: space-between;
      color: #6b645d;
    }

    .calendar {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
    }

    .calendar .dow {
      text-align: center;
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8b857d;
    }

    .calendar .day {
      padding: 8px 0;
      border-radius: 12px;
      background: white;
      color: var(--ink);
      font-weight: 500;
    }

    .calendar .day.selected {
      background: var(--accent);
      color: white;
    }

    .calendar .day.today {
      outline: 2px solid var(--accent-2);
    }

    .status {
      min-height: 1.2em;
      font-size: 0.95rem;
      color: #6b645d;
    }

    .status[data-type="error"] {
      color: var(--danger);
    }

    .empty {
      color: #6f6a65;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1>Habits</h1>
        <p class="subtitle"><span id="count">{{COUNT}}</span> tracked &middot; signed in as <strong id="user">{{USER}}</strong> &middot; today is {{TODAY}}</p>
      </div>
      <button id="open-create" type="button">Create Habit</button>
    </header>

    <dialog id="create-dialog">
      <form id="create-form" method="post" action="/habits/create">
        <strong>Create New Habit</strong>
        <input id="create-title" name="title" type="text" maxlength="200" required autocomplete="off" />
        <button type="submit">Add</button>
      </form>
    </dialog>

    <div class="status" id="status"></div>
    <section class="habits" id="habits"></section>
  </main>

  <script type="application/json" id="initial">{{INITIAL}}</script>
  <script>
    const USER = document.getElementById('user').textContent;
    const TODAY = '{{TODAY}}';
    const habitsEl = document.getElementById('habits');
    const countEl = document.getElementById('count');
    const statusEl = document.getElementById('status');
    const dialog = document.getElementById('create-dialog');
    const createForm = document.getElementById('create-form');
    const titleInput = document.getElementById('create-title');

    const cards = new Map();

    const setStatus = (message, type, retry) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
      if (retry) {
        const button = document.createElement('button');
        button.className = 'ghost';
        button.type = 'button';
        button.textContent = 'Retry';
        button.addEventListener('click', () => {
          setStatus('', '');
          retry();
        });
        statusEl.append(' ', button);
      }
    };

    const api = async (method, path, body) => {
      const headers = { 'content-type': 'application/json' };
      if (USER) {
        headers['x-user-id'] = USER;
      }
      const res = await fetch(path, {
        method,
        headers,
        body: body === undefined ? undefined : JSON.stringify(body)
      });
      if (!res.ok) {
        let message = 'Request failed';
        let retryable = false;
        try {
          const err = await res.json();
          message = err.error || message;
          retryable = Boolean(err.retryable);
        } catch (_) {}
        const error = new Error(message);
        error.retryable = retryable;
        throw error;
      }
      return res.status === 204 ? null : res.json();
    };

    const pad = (n) => String(n).padStart(2, '0');
    const dayKey = (y, m, d) => `${y}-${pad(m + 1)}-${pad(d)}`;

    const accept = (card, view) => {
      card.view = view;
      card.confirmed = [...view.completed_dates];
      card.selection = [...view.completed_dates];
      card.pending = false;
    };

    const renderCard = (card) => {
      const { view } = card;
      card.el.querySelector('.habit-title').textContent = view.title;
      const toggleBtn = card.el.querySelector('.toggle');
      toggleBtn.textContent = view.completed_today ? 'Completed' : 'Complete';
      toggleBtn.classList.toggle('done', view.completed_today);
      toggleBtn.disabled = card.pending;

      const first = new Date(card.year, card.month, 1);
      const days = new Date(card.year, card.month + 1, 0).getDate();
      const offset = (first.getDay() + 6) % 7;
      card.el.querySelector('.month-label').textContent =
        first.toLocaleDateString(undefined, { month: 'long', year: 'numeric' });

      const grid = card.el.querySelector('.calendar');
      grid.innerHTML = '';
      ['Mo', 'Tu', 'We', 'Th', 'Fr', 'Sa', 'Su'].forEach((name) => {
        const cell = document.createElement('span');
        cell.className = 'dow';
        cell.textContent = name;
        grid.append(cell);
      });
      for (let i = 0; i < offset; i += 1) {
        grid.append(document.createElement('span'));
      }
      for (let d = 1; d <= days; d += 1) {
        const key = dayKey(card.year, card.month, d);
        const cell = document.createElement('button');
        cell.type = 'button';
        cell.className = 'day';
        cell.textContent = d;
        cell.classList.toggle('selected', card.selection.includes(key));
        cell.classList.toggle('today', key === TODAY);
        cell.addEventListener('click', () => onDayClick(card, key));
        grid.append(cell);
      }
    };

    const sendSelection = async (card, previous, selected) => {
      card.pending = true;
      card.selection = selected;
      renderCard(card);
      try {
        const res = await api('POST', `/api/habits/${card.view.id}/selection`, { previous, selected });
        accept(card, res.card);
        setStatus('Saved', 'ok');
      } catch (err) {
        card.selection = [...card.confirmed];
        card.pending = false;
        setStatus(err.message, 'error', err.retryable ? () => sendSelection(card, previous, selected) : null);
      }
      renderCard(card);
    };

    const onDayClick = (card, key) => {
      if (card.pending) {
        return;
      }
      const previous = [...card.selection];
      const selected = previous.includes(key)
        ? previous.filter((day) => day !== key)
        : [...previous, key];
      sendSelection(card, previous, selected);
    };

    const toggleToday = async (card) => {
      card.pending = true;
      renderCard(card);
      try {
        accept(card, await api('POST', `/api/habits/${card.view.id}/toggle`, {}));
        setStatus('', '');
      } catch (err) {
        card.pending = false;
        setStatus(err.message, 'error', err.retryable ? () => toggleToday(card) : null);
      }
      renderCard(card);
    };

    const deleteHabit = async (card) => {
      try {
        await api('DELETE', `/api/habits/${card.view.id}`);
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error', err.retryable ? () => deleteHabit(card) : null);
      }
    };

    const buildCard = (view) => {
      const el = document.createElement('article');
      el.className = 'habit';
      el.innerHTML = `
        <div class="habit-head">
          <span class="habit-title"></span>
          <div class="habit-actions">
            <button type="button" class="toggle"></button>
            <button type="button" class="danger delete">Delete</button>
          </div>
        </div>
        <div class="month">
          <button type="button" class="ghost prev">&larr;</button>
          <span class="month-label"></span>
          <button type="button" class="ghost next">&rarr;</button>
        </div>
        <div class="calendar"></div>`;
      const [y, m] = TODAY.split('-').map(Number);
      const card = { el, year: y, month: m - 1 };
      accept(card, view);
      el.querySelector('.toggle').addEventListener('click', () => toggleToday(card));
      el.querySelector('.delete').addEventListener('click', () => deleteHabit(card));
      el.querySelector('.prev').addEventListener('click', () => {
        card.month -= 1;
        if (card.month < 0) { card.month = 11; card.year -= 1; }
        renderCard(card);
      });
      el.querySelector('.next').addEventListener('click', () => {
        card.month += 1;
        if (card.month > 11) { card.month = 0; card.year += 1; }
        renderCard(card);
      });
      return card;
    };

    const renderList = (views) => {
      const seen = new Set();
      views.forEach((view) => {
        seen.add(view.id);
        let card = cards.get(view.id);
        if (card) {
          accept(card, view);
        } else {
          card = buildCard(view);
          cards.set(view.id, card);
        }
        habitsEl.append(card.el);
        renderCard(card);
      });
      for (const [id, card] of cards) {
        if (!seen.has(id)) {
          card.el.remove();
          cards.delete(id);
        }
      }
      countEl.textContent = views.length;
      if (!views.length) {
        habitsEl.innerHTML = '<p class="empty">No habits yet.</p>';
      } else {
        habitsEl.querySelectorAll('.empty').forEach((el) => el.remove());
      }
    };

    const refresh = async () => {
      const res = await api('GET', '/api/habits');
      renderList(res.habits);
    };

    document.getElementById('open-create').addEventListener('click', () => dialog.showModal());

    createForm.addEventListener('submit', (event) => {
      event.preventDefault();
      const title = titleInput.value.trim();
      titleInput.value = '';
      dialog.close();
      if (!title) {
        setStatus('Title must not be empty', 'error');
        return;
      }
      api('POST', '/api/habits', { title })
        .then(refresh)
        .catch((err) => setStatus(err.message, 'error'));
    });

    renderList(JSON.parse(document.getElementById('initial').textContent));
    if (!USER) {
      setStatus('No user: send an x-user-id header or set APP_DEFAULT_USER.', 'error');
    }
  </script>
</body>
</html>
"#;
