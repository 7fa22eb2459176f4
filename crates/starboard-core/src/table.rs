// Fixed-column Markdown table rendering for small pre-rendered strings.
use crate::error::Error;
use crate::Result;

/// Render `cells` into a Markdown table with `columns` columns.
///
/// GitHub insists on a header row, so the first row of cells doubles as the
/// header and a `|-|-|` separator follows it. A trailing half-full row keeps
/// the full column count so the grid stays rectangular. Cells must not
/// contain line breaks - that would tear the table apart.
pub fn render_table(cells: &[String], columns: usize) -> Result<String> {
    if columns == 0 {
        return Err(Error::Render("a table needs at least one column".into()));
    }

    if let Some(position) = cells
        .iter()
        .position(|cell| cell.contains('\n') || cell.contains('\r'))
    {
        return Err(Error::Render(format!(
            "cell {position} contains a line break"
        )));
    }

    let render_row = |chunk: &[String]| {
        let mut row = String::from("|");
        for index in 0..columns {
            row.push_str(chunk.get(index).map(String::as_str).unwrap_or(""));
            row.push('|');
        }
        row
    };

    let mut rows = cells.chunks(columns);

    // Blank first and last lines keep the table a paragraph of its own when
    // spliced between the markers.
    let mut lines = vec![String::new()];
    lines.push(render_row(rows.next().unwrap_or(&[])));
    lines.push(format!("|{}", "-|".repeat(columns)));
    lines.extend(rows.map(render_row));
    lines.push(String::new());

    Ok(lines.join("\n"))
}
