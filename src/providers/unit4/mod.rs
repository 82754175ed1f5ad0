//! Unit4 timesheet driven through a WebDriver browser session.
//!
//! Unit4 has no API for time entry, so every operation is a sequence of
//! clicks on the timesheet page. Elements are located by their visible text
//! with small scripts that tag the match, then clicked or typed into through
//! WebDriver so the page sees real input events.

pub mod grid;
pub mod labels;
pub mod session;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use std::time::Duration;

use super::TimesheetDestination;
use crate::config::{SyncSettings, UiLocale, Unit4Config};
use crate::model::entry::{marker, DestinationEntry};
use crate::model::week::{label_date, DateRange, IsoWeek};
use crate::util::console;
use crate::util::retry::retry;
use grid::{parse_grid, GridCell};
use labels::{is_login_title, UiLabels};
use session::{SessionStore, StoredCookie};

const KEY_TAB: &str = "\u{E004}";
const KEY_ESCAPE: &str = "\u{E00C}";
const TARGET: &str = "[data-tu4-target='1']";
const SETTLE: Duration = Duration::from_millis(500);
const WEEK_LOAD: Duration = Duration::from_secs(3);
const PAGE_LOAD_POLLS: u32 = 15;

/// Shared prelude of every page script: clears old tags and defines helpers.
const PRELUDE: &str = r#"
document.querySelectorAll('[data-tu4-target]').forEach(e => e.removeAttribute('data-tu4-target'));
const visible = e => !!(e.offsetWidth || e.offsetHeight || e.getClientRects().length);
const tag = e => { e.setAttribute('data-tu4-target', '1'); return true; };
const leaves = sel => Array.from(document.querySelectorAll(sel)).filter(e => visible(e) && e.children.length === 0);
"#;

const TAG_BY_TEXT: &str = r#"
const [text] = arguments;
const hit = Array.from(document.querySelectorAll('button, a, input[type=button], input[type=submit], span, div, td, li, legend'))
  .find(e => visible(e) && ((e.innerText || e.value || '').trim() === text));
return hit ? tag(hit) : false;
"#;

const TAG_BY_TITLE: &str = r#"
const [title] = arguments;
const hit = Array.from(document.querySelectorAll('[title]')).find(e => visible(e) && e.title.trim() === title);
return hit ? tag(hit) : false;
"#;

const TAG_INPUT_BY_LABEL: &str = r#"
const [label] = arguments;
const inputs = Array.from(document.querySelectorAll('input:not([type=hidden]):not([type=checkbox]), textarea')).filter(visible);
for (const l of leaves('label, span, td, div')) {
  if (l.innerText.trim().replace(/\s*\*$/, '') !== label) continue;
  let input = l.htmlFor ? document.getElementById(l.htmlFor) : null;
  if (!input) input = inputs.find(i => l.compareDocumentPosition(i) & Node.DOCUMENT_POSITION_FOLLOWING);
  if (input) return tag(input);
}
return false;
"#;

const TAG_ROW_CHECKBOX: &str = r#"
const [marker] = arguments;
const starts = s => (s || '').trim().startsWith(marker);
for (const tr of document.querySelectorAll('tr')) {
  const cells = Array.from(tr.children);
  if (cells.length < 10) continue;
  const hit = cells.some(c => starts(c.title) || starts(c.innerText)
    || Array.from(c.querySelectorAll('input, textarea')).some(i => starts(i.value)));
  if (!hit) continue;
  const box = tr.querySelector('input[type=checkbox]');
  if (!box) return 'no-checkbox';
  box.scrollIntoView({block: 'center'});
  return tag(box) ? 'found' : 'not-found';
}
return 'not-found';
"#;

const READ_GRID: &str = r#"
return Array.from(document.querySelectorAll('tr')).map(tr =>
  Array.from(tr.children).filter(c => c.tagName === 'TD' || c.tagName === 'TH').map(c => {
    const input = c.querySelector('input:not([type=hidden]):not([type=checkbox]), textarea');
    return { text: (c.innerText || '').trim(), title: c.title || '', value: input ? (input.value || '') : '' };
  }));
"#;

const ANY_TEXT_VISIBLE: &str = r#"
const [texts] = arguments;
return leaves('button, a, span, div, td, label').some(e => texts.includes(e.innerText.trim()));
"#;

const DAY_LABELS: &str = r#"
const re = /^(Mo|Di|Mi|Do|Fr|Sa|So|Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s+\d+[\/.]\d+/;
return leaves('td, span, div').map(e => e.innerText.trim()).filter(t => re.test(t));
"#;

const TAG_HOURS_CELL: &str = r#"
const [label] = arguments;
const day = leaves('td, span, div').find(e => e.innerText.trim() === label);
const row = day && day.closest('tr');
if (!row) return false;
const numeric = /^[\d:,.]+$/;
const cells = Array.from(row.querySelectorAll('td')).filter(c => visible(c) && numeric.test(c.innerText.trim()));
return cells.length ? tag(cells[cells.length - 1]) : false;
"#;

const TAG_ACTIVE_INPUT: &str = r#"
const e = document.activeElement;
return e && (e.tagName === 'INPUT' || e.tagName === 'TEXTAREA') ? tag(e) : false;
"#;

pub struct Unit4Browser {
    client: Client,
    url: String,
    headless: bool,
    locale: UiLocale,
    labels: &'static UiLabels,
    activity: String,
    session: SessionStore,
    retries: u32,
    retry_delay: Duration,
    week: Option<IsoWeek>,
    editable: Option<bool>,
}

impl Unit4Browser {
    pub async fn connect(config: &Unit4Config, settings: &SyncSettings, session: SessionStore) -> Result<Self> {
        let mut caps = serde_json::Map::new();
        if config.headless {
            caps.insert(
                "goog:chromeOptions".into(),
                json!({"args": ["--headless=new", "--window-size=1920,1080"]}),
            );
            caps.insert("moz:firefoxOptions".into(), json!({"args": ["-headless"]}));
        }
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .with_context(|| {
                format!(
                    "Unit4: Cannot start a browser via WebDriver at {}. Is chromedriver or geckodriver running?",
                    config.webdriver_url
                )
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            headless: config.headless,
            locale: config.locale,
            labels: UiLabels::for_locale(config.locale),
            activity: config.activity.clone(),
            session,
            retries: settings.max_retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            week: None,
            editable: None,
        })
    }

    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    async fn script(&self, body: &str, args: Vec<Value>) -> Result<Value> {
        let script = format!("{PRELUDE}{body}");
        Ok(self.client.execute(&script, args).await?)
    }

    async fn script_flag(&self, body: &str, args: Vec<Value>) -> Result<bool> {
        Ok(self.script(body, args).await?.as_bool().unwrap_or(false))
    }

    async fn click_tagged(&self) -> Result<()> {
        self.client.find(Locator::Css(TARGET)).await?.click().await?;
        Ok(())
    }

    /// Click the first visible element whose text is exactly `text`.
    async fn click_text(&self, text: &str) -> Result<bool> {
        if !self.script_flag(TAG_BY_TEXT, vec![json!(text)]).await? {
            return Ok(false);
        }
        self.click_tagged().await?;
        Ok(true)
    }

    /// Best-effort click for dialogs that may or may not be open.
    async fn dismiss(&self, text: &str) {
        if let Err(e) = self.click_text(text).await {
            tracing::debug!(text, error = %e, "dismiss failed");
        }
    }

    /// Type `value` into the input labelled `label` and leave the field.
    async fn fill_field(&self, label: &str, value: &str) -> Result<()> {
        if !self.script_flag(TAG_INPUT_BY_LABEL, vec![json!(label)]).await? {
            bail!("field '{label}' not found");
        }
        let input = self.client.find(Locator::Css(TARGET)).await?;
        input.click().await?;
        input.clear().await?;
        input.send_keys(value).await?;
        input.send_keys(KEY_TAB).await?;
        tokio::time::sleep(SETTLE).await;
        Ok(())
    }

    async fn press_escape(&self) -> Result<()> {
        self.client.find(Locator::Css("body")).await?.send_keys(KEY_ESCAPE).await?;
        Ok(())
    }

    /// Switch into the iframe holding the timesheet, or stay on the top page.
    async fn enter_content_frame(&self) -> Result<()> {
        self.client.enter_frame(None).await?;
        let frames = self.client.find_all(Locator::Css("iframe")).await?;
        for (index, frame) in frames.iter().enumerate() {
            let src = frame.attr("src").await?.unwrap_or_default();
            if src.contains("ContentContainer") {
                let index = u16::try_from(index).context("too many frames")?;
                self.client.enter_frame(Some(index)).await?;
                return Ok(());
            }
        }
        Ok(())
    }

    async fn save_session(&self) -> Result<()> {
        let cookies: Vec<StoredCookie> = self
            .client
            .get_all_cookies()
            .await?
            .iter()
            .map(StoredCookie::from_cookie)
            .collect();
        self.session.save(&cookies)?;
        tracing::info!(count = cookies.len(), "saved Unit4 session");
        Ok(())
    }

    async fn restore_session(&self) -> Result<()> {
        let Some(cookies) = self.session.load() else {
            return Ok(());
        };
        for cookie in cookies {
            let name = cookie.name.clone();
            if let Err(e) = self.client.add_cookie(cookie.into_cookie()).await {
                tracing::debug!(name, error = %e, "cookie rejected");
            }
        }
        self.client.goto(&self.url).await?;
        Ok(())
    }

    async fn open_timesheet(&self) -> Result<()> {
        self.client.enter_frame(None).await?;
        if !self.click_text(self.labels.menu).await? {
            println!("[!] Menu '{}' not found.", self.labels.menu);
            println!("    Navigate to the timesheet manually, then press ENTER...");
            wait_for_enter().await?;
        }

        for _ in 0..PAGE_LOAD_POLLS {
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.enter_content_frame().await?;
            if self
                .script_flag(TAG_INPUT_BY_LABEL, vec![json!(self.labels.week_field)])
                .await?
            {
                return Ok(());
            }
        }
        bail!("Unit4: timesheet did not load (no '{}' field)", self.labels.week_field)
    }

    async fn set_week_once(&self, week: IsoWeek) -> Result<()> {
        self.enter_content_frame().await?;
        self.fill_field(self.labels.week_field, &week.to_string()).await
    }

    async fn show_week(&mut self, week: IsoWeek) -> Result<()> {
        if self.week == Some(week) {
            return Ok(());
        }
        retry("set week", self.retries, self.retry_delay, || self.set_week_once(week))
            .await
            .with_context(|| format!("Unit4: could not open week {week}"))?;
        tokio::time::sleep(WEEK_LOAD).await;
        tracing::info!(%week, "opened Unit4 week");
        self.week = Some(week);
        self.editable = None;
        Ok(())
    }

    /// Fails when the shown week has been submitted and is read-only.
    async fn ensure_editable(&mut self) -> Result<()> {
        if self.editable.is_none() {
            let locked: Vec<&str> = self.labels.status_locked.to_vec();
            let mut editable = false;
            for _ in 0..10 {
                self.enter_content_frame().await?;
                if self.script_flag(ANY_TEXT_VISIBLE, vec![json!(locked)]).await? {
                    break;
                }
                if self.script_flag(ANY_TEXT_VISIBLE, vec![json!([self.labels.add])]).await? {
                    editable = true;
                    break;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            self.editable = Some(editable);
        }
        match (self.editable, self.week) {
            (Some(true), _) => Ok(()),
            (_, Some(week)) => bail!("Unit4: week {week} is not editable (already submitted?)"),
            _ => bail!("Unit4: no week opened"),
        }
    }

    async fn read_grid(&self) -> Result<Vec<Vec<GridCell>>> {
        self.enter_content_frame().await?;
        let rows = self.script(READ_GRID, vec![]).await?;
        serde_json::from_value(rows).context("Unit4: unexpected grid structure")
    }

    fn format_hours(&self, hours: f64) -> String {
        let s = format!("{hours:.2}");
        match self.locale {
            UiLocale::De => s.replace('.', ","),
            UiLocale::En => s,
        }
    }

    async fn fill_hours_once(&self, date: NaiveDate, week: IsoWeek, hours: &str) -> Result<()> {
        let labels: Vec<String> = serde_json::from_value(self.script(DAY_LABELS, vec![]).await?)?;
        if labels.is_empty() {
            self.click_text(self.labels.time_details).await?;
            tokio::time::sleep(Duration::from_secs(1)).await;
            bail!("time details not expanded yet");
        }
        let label = labels
            .iter()
            .find(|l| label_date(l, week) == Some(date))
            .ok_or_else(|| anyhow!("no time details row for {date} (found {labels:?})"))?;

        if !self.script_flag(TAG_HOURS_CELL, vec![json!(label)]).await? {
            bail!("no hours cell in row '{label}'");
        }
        let cell = self.client.find(Locator::Css(TARGET)).await?;
        cell.click().await?;
        cell.click().await?;
        tokio::time::sleep(SETTLE).await;

        if !self.script_flag(TAG_ACTIVE_INPUT, vec![]).await? {
            bail!("hours cell did not become editable");
        }
        let input = self.client.find(Locator::Css(TARGET)).await?;
        input.clear().await?;
        input.send_keys(hours).await?;
        input.send_keys(KEY_TAB).await?;
        tokio::time::sleep(SETTLE).await;
        Ok(())
    }

    async fn fill_entry_form(&self, entry: &DestinationEntry, week: IsoWeek) -> Result<()> {
        if !self.click_text(self.labels.add).await? {
            bail!("'{}' button not found", self.labels.add);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        if !self.script_flag(TAG_BY_TITLE, vec![json!(self.labels.details)]).await? {
            bail!("detail view of the new row not found");
        }
        self.click_tagged().await?;
        tokio::time::sleep(WEEK_LOAD).await;

        self.fill_field(self.labels.work_order, entry.cost_center.as_str())
            .await
            .context("work order")?;
        if let Err(e) = self.fill_field(self.labels.activity, &self.activity).await {
            tracing::warn!(error = %e, "activity not filled");
        }
        self.fill_field(self.labels.description, &entry.text)
            .await
            .context("description")?;
        if let Err(e) = self.fill_field(self.labels.ticket, &entry.ticket).await {
            tracing::warn!(error = %e, ticket = %entry.ticket, "ticket not filled");
        }

        let hours = self.format_hours(entry.hours);
        retry("fill hours", self.retries, self.retry_delay, || {
            self.fill_hours_once(entry.date, week, &hours)
        })
        .await
        .context("hours")?;

        if !self.click_text(self.labels.ok).await? {
            bail!("'{}' button not found", self.labels.ok);
        }
        tokio::time::sleep(WEEK_LOAD).await;
        Ok(())
    }
}

async fn wait_for_enter() -> Result<()> {
    console::read_line(std::io::stdin()).await?;
    Ok(())
}

#[async_trait]
impl TimesheetDestination for Unit4Browser {
    async fn login(&mut self) -> Result<()> {
        self.client
            .goto(&self.url)
            .await
            .with_context(|| format!("Unit4: Cannot open {}", self.url))?;
        self.restore_session().await?;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let title = self.client.title().await?;
        if is_login_title(&title) {
            if self.headless {
                bail!("Unit4: session expired. Log in once with unit4.headless = false to refresh it.");
            }
            println!("[!] Unit4 session expired or not logged in.");
            println!("    Log in in the browser window (2FA may be required), then press ENTER...");
            wait_for_enter().await?;
        }
        self.save_session().await?;
        self.week = None;
        self.open_timesheet().await
    }

    async fn list_entries(&mut self, range: &DateRange) -> Result<Vec<DestinationEntry>> {
        let mut entries = Vec::new();
        for week in IsoWeek::span(IsoWeek::of(range.start), IsoWeek::of(range.end))? {
            self.show_week(week).await?;
            if let Err(e) = self.press_escape().await {
                tracing::debug!(%week, error = %e, "escape failed");
            }
            let rows = self.read_grid().await?;
            let found: Vec<DestinationEntry> = parse_grid(&rows, week)
                .into_iter()
                .filter(|e| range.contains(e.date))
                .collect();
            tracing::debug!(%week, rows = rows.len(), entries = found.len(), "read Unit4 grid");
            entries.extend(found);
        }
        Ok(entries)
    }

    async fn delete_entry(&mut self, entry: &DestinationEntry) -> Result<()> {
        let id = entry
            .worklog_id()
            .ok_or_else(|| anyhow!("refusing to delete an entry without a worklog marker"))?;
        self.show_week(IsoWeek::of(entry.date)).await?;
        self.ensure_editable().await?;

        self.dismiss(self.labels.ok).await;
        let found = self.script(TAG_ROW_CHECKBOX, vec![json!(marker(id))]).await?;
        match found.as_str() {
            Some("found") => self.click_tagged().await?,
            Some(other) => bail!("row {} {other}", marker(id)),
            None => bail!("row {} not found", marker(id)),
        }
        tokio::time::sleep(SETTLE).await;

        if !self.click_text(self.labels.delete).await? {
            bail!("'{}' button not found", self.labels.delete);
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.dismiss(self.labels.confirm_yes).await;
        self.dismiss(self.labels.ok).await;
        tokio::time::sleep(SETTLE).await;
        Ok(())
    }

    async fn create_entry(&mut self, entry: &DestinationEntry) -> Result<()> {
        let week = IsoWeek::of(entry.date);
        self.show_week(week).await?;
        self.ensure_editable().await?;
        self.enter_content_frame().await?;

        if let Err(e) = self.fill_entry_form(entry, week).await {
            self.dismiss(self.labels.cancel).await;
            self.dismiss(self.labels.ok).await;
            return Err(e);
        }
        Ok(())
    }

    async fn save(&mut self) -> Result<()> {
        self.enter_content_frame().await?;
        let mut saved = self.click_text(self.labels.save).await?;
        if !saved {
            self.client.enter_frame(None).await?;
            saved = self.click_text(self.labels.save).await?;
        }
        if !saved {
            bail!("Unit4: '{}' button not found. Save manually in the browser.", self.labels.save);
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.enter_content_frame().await?;
        self.dismiss(self.labels.ok).await;
        Ok(())
    }
}
