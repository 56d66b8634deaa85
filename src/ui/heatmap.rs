// Heatmap rendering for the failure timeline.
// Draws the date x job matrix with ratatui widgets into an off-screen buffer.

use std::fs;
use std::path::Path;

use ratatui::{prelude::*, widgets::*};

use crate::error::Result;
use crate::state::{TimelineEntry, TimelineMatrix};

const TITLE: &str = " CI Failures Over Time ";
const AXIS_LABEL: &str = "Jobs \\ Date";
const DATE_WIDTH: u16 = 10;
const COLUMN_SPACING: u16 = 1;

/// Shading from lowest to highest failure count.
const SHADES: [&str; 4] = ["░", "▒", "▓", "█"];

/// Glyph for `count` relative to the busiest cell, blank for zero.
fn shade(count: u64, max: u64) -> &'static str {
    if count == 0 || max == 0 {
        return "";
    }
    let level = (count * SHADES.len() as u64).div_ceil(max).clamp(1, SHADES.len() as u64);
    SHADES[level as usize - 1]
}

fn cell_text(count: u64, max: u64) -> String {
    if count == 0 {
        return String::new();
    }
    // Bar on the left, count right-aligned.
    let digits = count.to_string();
    let bar_width = (DATE_WIDTH as usize).saturating_sub(digits.len() + 1);
    format!("{} {}", shade(count, max).repeat(bar_width), digits)
}

/// Render the matrix into a buffer just large enough to hold it.
pub fn render(matrix: &TimelineMatrix) -> Buffer {
    let job_width = matrix
        .jobs
        .iter()
        .map(|j| j.chars().count())
        .chain([AXIS_LABEL.len()])
        .max()
        .unwrap_or(0) as u16;

    let max = matrix.max();
    let legend = format!(
        "Failures per day: {} low .. {} high (max {})",
        SHADES[0],
        SHADES[SHADES.len() - 1],
        max
    );

    let dates = matrix.dates.len() as u16;
    let rows = matrix.jobs.len() as u16;
    let table_width = job_width.saturating_add(dates.saturating_mul(DATE_WIDTH + COLUMN_SPACING));
    let width = table_width
        .max(legend.chars().count() as u16)
        .max(TITLE.len() as u16)
        .saturating_add(2);
    // Borders, header plus its margin, job rows, legend.
    let height = 2 + 2 + rows.saturating_add(1);

    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);

    let block = Block::bordered().title(TITLE);
    let inner = block.inner(area);
    block.render(area, &mut buf);

    let [table_area, legend_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    let header = Row::new(
        std::iter::once(Cell::from(AXIS_LABEL)).chain(
            matrix
                .dates
                .iter()
                .map(|d| Cell::from(d.format("%Y-%m-%d").to_string())),
        ),
    )
    .bottom_margin(1);

    let body = matrix.jobs.iter().zip(&matrix.counts).map(|(job, counts)| {
        Row::new(
            std::iter::once(Cell::from(job.as_str())).chain(
                counts
                    .iter()
                    .map(|&count| Cell::from(Line::from(cell_text(count, max)).right_aligned())),
            ),
        )
    });

    let widths = std::iter::once(Constraint::Length(job_width))
        .chain(matrix.dates.iter().map(|_| Constraint::Length(DATE_WIDTH)));

    let table = Table::new(body, widths)
        .header(header)
        .column_spacing(COLUMN_SPACING);
    Widget::render(table, table_area, &mut buf);

    Paragraph::new(legend).render(legend_area, &mut buf);

    buf
}

/// Plain text of a buffer, one line per row with trailing blanks trimmed.
pub fn buffer_to_text(buf: &Buffer) -> String {
    let area = buf.area;
    let mut lines = Vec::with_capacity(area.height as usize);
    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buf[(x, y)].symbol())
            .collect();
        lines.push(line.trim_end().to_string());
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Build the matrix for `entries`, render it, and overwrite `path`.
pub fn write_heatmap(entries: &[TimelineEntry], path: &Path) -> Result<()> {
    let matrix = TimelineMatrix::from_entries(entries);
    let text = buffer_to_text(&render(&matrix));
    fs::write(path, text)?;
    Ok(())
}
