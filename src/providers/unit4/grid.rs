use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::entry::{DestinationEntry, MARKER_PREFIX};
use crate::model::mapping::CostCenterCode;
use crate::model::week::{label_date, IsoWeek};
use crate::util::patterns;

/// Rows with fewer direct cells are layout tables, not timesheet lines.
const MIN_CELLS: usize = 10;

/// One `<td>` of the timesheet grid as read from the page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GridCell {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: String,
}

impl GridCell {
    /// Non-empty texts of the cell, most specific first. Long descriptions are
    /// cut in the visible text but complete in the tooltip.
    fn contents(&self) -> impl Iterator<Item = &str> {
        [&self.title, &self.value, &self.text]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Column index of each weekday in the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DayColumns(Vec<(usize, NaiveDate)>);

/// Locate the header row (`Mo 2/02`, `Di 3/02`, ...) and map its columns to dates.
pub fn day_columns(rows: &[Vec<GridCell>], week: IsoWeek) -> Option<DayColumns> {
    rows.iter().find_map(|row| {
        let columns: Vec<(usize, NaiveDate)> = row
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| label_date(&cell.text, week).map(|d| (i, d)))
            .collect();
        (columns.len() >= 5).then_some(DayColumns(columns))
    })
}

fn find_ticket(cells: &[GridCell]) -> Option<String> {
    let whole = cells.iter().flat_map(GridCell::contents).find(|c| {
        patterns::find_ticket(c).is_some_and(|t| t.len() == c.len())
    });
    whole
        .or_else(|| cells.iter().flat_map(GridCell::contents).find_map(patterns::find_ticket))
        .map(String::from)
}

fn find_cost_center(cells: &[GridCell]) -> Option<CostCenterCode> {
    cells
        .iter()
        .flat_map(GridCell::contents)
        .find_map(patterns::find_cost_center)
        .and_then(|c| CostCenterCode::parse(c).ok())
}

fn find_marked_text(cells: &[GridCell]) -> Option<String> {
    cells
        .iter()
        .flat_map(GridCell::contents)
        .find(|c| c.starts_with(MARKER_PREFIX))
        .map(String::from)
}

/// Parse one grid row. The entry date is the first day with booked time and
/// the hours are the row total; rows without time fall on the week's Monday.
pub fn parse_row(cells: &[GridCell], days: Option<&DayColumns>, week: IsoWeek) -> Option<DestinationEntry> {
    if cells.len() < MIN_CELLS {
        return None;
    }
    let cost_center = find_cost_center(cells)?;
    let text = find_marked_text(cells).unwrap_or_default();
    let ticket = find_ticket(cells).unwrap_or_default();

    let mut date = None;
    let mut hours = 0.0;
    if let Some(DayColumns(columns)) = days {
        for (index, day) in columns {
            let booked = cells
                .get(*index)
                .and_then(|c| {
                    [c.value.as_str(), c.text.as_str()]
                        .into_iter()
                        .find_map(patterns::parse_hours)
                })
                .unwrap_or(0.0);
            if booked > 0.0 {
                date.get_or_insert(*day);
                hours += booked;
            }
        }
    }

    Some(DestinationEntry {
        date: date.unwrap_or_else(|| week.monday()),
        cost_center,
        ticket,
        text,
        hours,
    })
}

pub fn parse_grid(rows: &[Vec<GridCell>], week: IsoWeek) -> Vec<DestinationEntry> {
    let days = day_columns(rows, week);
    rows.iter()
        .filter_map(|row| parse_row(row, days.as_ref(), week))
        .collect()
}
