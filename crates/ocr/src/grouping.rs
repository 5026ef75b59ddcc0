use crate::types::{Detection, Line};

/// Default maximum center-to-center distance (pixels) for two detections to share a line.
pub const DEFAULT_LINE_THRESHOLD_PX: f64 = 10.0;

/// Group detections into lines ordered by vertical position.
///
/// Detections are ordered by vertical center and walked once. A detection
/// joins the open line when its center is within `threshold` pixels of the
/// center of the detection added just before it; otherwise the open line is
/// closed and a new one starts. Closed lines never reopen, so a detection
/// cannot migrate back to an earlier line even if it is geometrically closer.
pub fn group_lines(detections: &[Detection], threshold: f64) -> Vec<Line> {
    let mut placed: Vec<(f64, &Detection)> =
        detections.iter().map(|d| (d.vertical_center(), d)).collect();
    // Stable: equal centers keep the backend's order.
    placed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut lines = Vec::new();
    let mut group: Vec<(f64, &Detection)> = Vec::new();

    for (center, det) in placed {
        if let Some(&(last_center, _)) = group.last() {
            if (center - last_center).abs() > threshold {
                lines.push(close_group(&group));
                group.clear();
            }
        }
        group.push((center, det));
    }
    if !group.is_empty() {
        lines.push(close_group(&group));
    }

    tracing::debug!(detections = detections.len(), lines = lines.len(), "grouped detections");
    lines
}

fn close_group(group: &[(f64, &Detection)]) -> Line {
    let tokens: Vec<String> = group.iter().map(|(_, d)| d.text.clone()).collect();
    let vertical_position = group.iter().map(|(c, _)| c).sum::<f64>() / group.len() as f64;
    Line { vertical_position, text: tokens.join(" "), tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(x: i32, y: i32, text: &str) -> Detection {
        Detection::from_rect(x, y, 30, 10, text, 0.9)
    }

    #[test]
    fn empty_input_yields_no_lines() {
        assert!(group_lines(&[], DEFAULT_LINE_THRESHOLD_PX).is_empty());
    }

    #[test]
    fn words_on_same_band_share_a_line() {
        let dets = vec![word(0, 100, "Grand"), word(40, 103, "Total"), word(90, 101, "110.00")];
        let lines = group_lines(&dets, DEFAULT_LINE_THRESHOLD_PX);
        assert_eq!(lines.len(), 1);
        // Accumulation order follows vertical center, not x.
        assert_eq!(lines[0].tokens, vec!["Grand", "110.00", "Total"]);
        assert_eq!(lines[0].text, "Grand 110.00 Total");
        assert!((lines[0].vertical_position - 106.333).abs() < 0.01);
    }

    #[test]
    fn lines_are_ordered_top_to_bottom() {
        let dets = vec![word(0, 200, "bottom"), word(0, 10, "top"), word(0, 100, "middle")];
        let lines = group_lines(&dets, DEFAULT_LINE_THRESHOLD_PX);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["top", "middle", "bottom"]);
        assert!(lines.windows(2).all(|w| w[0].vertical_position <= w[1].vertical_position));
    }

    #[test]
    fn chained_drift_stays_on_one_line() {
        // Each step is within the threshold of the previous member.
        let dets = vec![word(0, 0, "a"), word(10, 8, "b"), word(20, 16, "c")];
        assert_eq!(group_lines(&dets, DEFAULT_LINE_THRESHOLD_PX).len(), 1);
    }

    #[test]
    fn closed_line_never_reopens() {
        let dets = vec![word(0, 0, "a"), word(0, 30, "b"), word(0, 45, "c")];
        let lines = group_lines(&dets, DEFAULT_LINE_THRESHOLD_PX);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn missing_geometry_sorts_to_top() {
        let dets = vec![word(0, 50, "body"), Detection::new(vec![], "orphan", 0.4)];
        let lines = group_lines(&dets, DEFAULT_LINE_THRESHOLD_PX);
        assert_eq!(lines[0].text, "orphan");
        assert_eq!(lines[0].vertical_position, 0.0);
    }

    #[test]
    fn regrouping_a_line_reproduces_it() {
        let dets = vec![word(0, 40, "WALMART"), word(60, 42, "SUPERCENTER")];
        let line = group_lines(&dets, DEFAULT_LINE_THRESHOLD_PX).remove(0);

        let y = line.vertical_position.round() as i32;
        let fresh: Vec<Detection> = line
            .tokens
            .iter()
            .map(|t| Detection::new(vec![[0, y], [10, y]], t.clone(), 1.0))
            .collect();
        let regrouped = group_lines(&fresh, DEFAULT_LINE_THRESHOLD_PX);

        assert_eq!(regrouped.len(), 1);
        assert_eq!(regrouped[0].text, line.text);
        assert_eq!(regrouped[0].tokens, line.tokens);
    }

    #[test]
    fn threshold_is_configurable() {
        let dets = vec![word(0, 0, "a"), word(0, 20, "b")];
        assert_eq!(group_lines(&dets, 10.0).len(), 2);
        assert_eq!(group_lines(&dets, 25.0).len(), 1);
    }
}
