//! Table detection from text alignment (no ruling lines required).
//!
//! A table region is a run of consecutive lines that each split into
//! several cells at wide gaps, where the cells' left edges line up on a
//! small set of column anchors shared by at least two rows. A region whose
//! cells cannot all be assigned to distinct anchors within tolerance is
//! demoted back to ordinary lines rather than emitted with a guessed grid.

use crate::model::{BBox, Table, TableCell, TextBlock, TextSpan};

use super::lines::Line;
use super::lists::{is_bullet_marker, is_number_marker};
use super::ClassifierConfig;

/// A table built from `lines[start..end]`.
#[derive(Debug, Clone)]
pub(crate) struct TableRegion {
    pub start: usize,
    pub end: usize,
    pub table: Table,
}

/// Find all table regions among the page's lines.
pub(crate) fn detect_tables(lines: &[Line], config: &ClassifierConfig) -> Vec<TableRegion> {
    let segments: Vec<Vec<&[TextSpan]>> =
        lines.iter().map(|l| l.segments(config.cell_gap)).collect();

    let is_candidate = |i: usize| {
        let n = segments[i].len();
        n >= config.min_table_columns && n <= config.max_table_columns
    };

    let mut regions = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !is_candidate(i) {
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        while i < lines.len() && is_candidate(i) {
            let gap = lines[i].bbox.y0 - lines[i - 1].bbox.y1;
            if gap > config.table_row_gap_factor * lines[i - 1].font_size {
                break;
            }
            i += 1;
        }

        if i - start < config.min_table_rows {
            continue;
        }
        match build_table(&lines[start..i], &segments[start..i], config) {
            Some(table) => {
                log::debug!(
                    "TableDetector: table at lines {}..{} ({}x{})",
                    start,
                    i,
                    table.row_count(),
                    table.column_count()
                );
                regions.push(TableRegion {
                    start,
                    end: i,
                    table,
                });
            }
            None => log::debug!("TableDetector: demoted lines {}..{} to prose", start, i),
        }
    }

    regions
}

/// Column anchors: clusters of cell left edges recurring in at least two rows.
fn column_anchors(rows: &[Vec<&[TextSpan]>], tolerance: f32) -> Vec<f32> {
    let mut edges: Vec<(f32, usize)> = rows
        .iter()
        .enumerate()
        .flat_map(|(row, cells)| cells.iter().map(move |c| (c[0].bbox.x0, row)))
        .collect();
    edges.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut anchors = Vec::new();
    let mut cluster: Vec<(f32, usize)> = Vec::new();
    let mut flush = |cluster: &mut Vec<(f32, usize)>| {
        let mut rows_seen: Vec<usize> = cluster.iter().map(|(_, r)| *r).collect();
        rows_seen.sort_unstable();
        rows_seen.dedup();
        if rows_seen.len() >= 2 {
            let mean = cluster.iter().map(|(x, _)| x).sum::<f32>() / cluster.len() as f32;
            anchors.push(mean);
        }
        cluster.clear();
    };

    for edge in edges {
        if let Some(last) = cluster.last() {
            if edge.0 - last.0 > tolerance {
                flush(&mut cluster);
            }
        }
        cluster.push(edge);
    }
    if !cluster.is_empty() {
        flush(&mut cluster);
    }

    anchors
}

/// Index of the anchor within `tolerance` of `x`, if any.
fn nearest_anchor(x: f32, anchors: &[f32], tolerance: f32) -> Option<usize> {
    anchors
        .iter()
        .enumerate()
        .map(|(i, a)| (i, (x - a).abs()))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn build_table(
    lines: &[Line],
    rows: &[Vec<&[TextSpan]>],
    config: &ClassifierConfig,
) -> Option<Table> {
    let anchors = column_anchors(rows, config.column_tolerance);
    if anchors.len() < config.min_table_columns || anchors.len() > config.max_table_columns {
        log::debug!("TableDetector: {} column anchors, rejecting", anchors.len());
        return None;
    }

    if is_list_pattern(rows, anchors.len()) {
        log::debug!("Skipping table region: rows look like a list");
        return None;
    }

    let mut grid = Vec::with_capacity(rows.len());
    for (row_index, cells) in rows.iter().enumerate() {
        let mut row: Vec<TableCell> = (0..anchors.len())
            .map(|column| TableCell {
                row: row_index,
                column,
                content: None,
            })
            .collect();
        for cell in cells {
            let column = nearest_anchor(cell[0].bbox.x0, &anchors, config.column_tolerance)?;
            if row[column].content.is_some() {
                return None;
            }
            row[column].content = Some(TextBlock::from_lines(vec![cell.to_vec()]));
        }
        grid.push(row);
    }

    let bbox = BBox::union_all(lines.iter().map(|l| &l.bbox)).unwrap_or_default();
    // Column edges start at the leftmost cell so the first column is not clipped.
    let mut columns = anchors;
    columns[0] = columns[0].min(bbox.x0);

    Some(Table {
        rows: grid,
        columns,
        bbox,
    })
}

/// Check if the rows actually represent a numbered or bulleted list.
///
/// When a PDF has a numbered list like "1. Item", the number and text often
/// become separate spans at different X positions, which looks like a
/// multi-column table. This catches that false positive.
fn is_list_pattern(rows: &[Vec<&[TextSpan]>], column_count: usize) -> bool {
    if rows.is_empty() {
        return false;
    }

    let mut bullet_count = 0;
    let mut number_count = 0;
    for cells in rows {
        let Some(first) = cells.first() else {
            continue;
        };
        let text: String = first.iter().map(|s| s.text.as_str()).collect();
        if is_bullet_marker(&text) {
            bullet_count += 1;
        } else if is_number_marker(&text) {
            number_count += 1;
        }
    }

    let bullet_ratio = bullet_count as f32 / rows.len() as f32;
    let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;

    // Bullet markers are almost never real table data
    if bullet_ratio >= 0.5 {
        return true;
    }

    // Numbered first columns are only rejected for two-column layouts, so
    // real tables with an index column survive.
    column_count == 2 && total_ratio >= 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::lines::group_lines;
    use crate::model::FontDescriptor;

    fn make_span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(
            text,
            BBox::new(x, y, x + text.len() as f32 * 6.0, y + 12.0),
            FontDescriptor::from_font_name("Helvetica", 12.0),
        )
    }

    fn detect(spans: Vec<TextSpan>) -> (Vec<Line>, Vec<TableRegion>) {
        let config = ClassifierConfig::default();
        let lines = group_lines(spans, &config);
        let regions = detect_tables(&lines, &config);
        (lines, regions)
    }

    #[test]
    fn test_simple_table() {
        let (_, regions) = detect(vec![
            make_span("Name", 72.0, 100.0),
            make_span("Age", 200.0, 100.0),
            make_span("Alice", 72.0, 116.0),
            make_span("30", 200.0, 116.0),
            make_span("Bob", 72.0, 132.0),
            make_span("25", 201.0, 132.0),
        ]);
        assert_eq!(regions.len(), 1);
        let table = &regions[0].table;
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.rows[2][1].text(), "25");
    }

    #[test]
    fn test_missing_cell_is_placeholder() {
        let (_, regions) = detect(vec![
            make_span("A", 72.0, 100.0),
            make_span("B", 150.0, 100.0),
            make_span("C", 250.0, 100.0),
            make_span("D", 72.0, 116.0),
            make_span("F", 250.0, 116.0),
            make_span("G", 72.0, 132.0),
            make_span("H", 150.0, 132.0),
            make_span("I", 250.0, 132.0),
        ]);
        assert_eq!(regions.len(), 1);
        let table = &regions[0].table;
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert!(table.rows[1][1].content.is_none());
        assert_eq!(table.rows[1][2].text(), "F");
    }

    #[test]
    fn test_misaligned_region_demoted() {
        // Second-row cell sits between anchors; no grid is guessed.
        let (_, regions) = detect(vec![
            make_span("A", 72.0, 100.0),
            make_span("B", 200.0, 100.0),
            make_span("C", 72.0, 116.0),
            make_span("D", 200.0, 116.0),
            make_span("E", 72.0, 132.0),
            make_span("F", 140.0, 132.0),
        ]);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_column_tolerance_boundary() {
        let rows = |third_x: f32| {
            vec![
                make_span("Name", 72.0, 100.0),
                make_span("Age", 200.0, 100.0),
                make_span("Alice", 72.0, 116.0),
                make_span("30", 200.0, 116.0),
                make_span("Bob", 72.0, 132.0),
                make_span("25", third_x, 132.0),
            ]
        };

        // exactly column_tolerance (8pt) from the column's other edges
        let (_, regions) = detect(rows(208.0));
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].table.column_count(), 2);
        assert_eq!(regions[0].table.rows[2][1].text(), "25");

        let (_, regions) = detect(rows(208.5));
        assert!(regions.is_empty());
    }

    #[test]
    fn test_single_row_not_table() {
        let (_, regions) = detect(vec![make_span("A", 72.0, 100.0), make_span("B", 200.0, 100.0)]);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_list_pattern_not_table() {
        let (_, regions) = detect(vec![
            make_span("•", 72.0, 100.0),
            make_span("First item", 100.0, 100.0),
            make_span("•", 72.0, 116.0),
            make_span("Second item", 100.0, 116.0),
        ]);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_numbered_list_not_table() {
        let (_, regions) = detect(vec![
            make_span("1.", 72.0, 100.0),
            make_span("Install the package", 100.0, 100.0),
            make_span("2.", 72.0, 116.0),
            make_span("Run the command", 100.0, 116.0),
        ]);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_large_gap_splits_regions() {
        let (_, regions) = detect(vec![
            make_span("A", 72.0, 100.0),
            make_span("B", 200.0, 100.0),
            make_span("C", 72.0, 116.0),
            make_span("D", 200.0, 116.0),
            make_span("E", 72.0, 300.0),
            make_span("F", 200.0, 300.0),
            make_span("G", 72.0, 316.0),
            make_span("H", 200.0, 316.0),
        ]);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].end, 2);
        assert_eq!(regions[1].start, 2);
    }
}
